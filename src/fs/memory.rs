use crate::fs::{AsyncFileSystem, EntryKind, FileSystem};
use async_trait::async_trait;
use libc::{ELOOP, ENOTDIR};
use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    ffi::{OsStr, OsString},
    io,
    path::{Component, Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Same limit Linux applies before giving up with `ELOOP`
const MAX_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir,
    File,
    Symlink(PathBuf),
}

#[derive(Debug)]
enum Step {
    Root,
    Parent,
    Name(OsString),
}

fn steps_of(path: &Path) -> impl Iterator<Item = Step> + '_ {
    path.components().filter_map(|comp| match comp {
        Component::RootDir | Component::Prefix(_) => Some(Step::Root),
        Component::ParentDir => Some(Step::Parent),
        Component::Normal(name) => Some(Step::Name(name.to_owned())),
        Component::CurDir => None,
    })
}

#[derive(Debug, Default)]
struct Tree {
    nodes: BTreeMap<PathBuf, Node>,
    failing: HashSet<PathBuf>,
}

/**
 An in-memory filesystem with directories, files and symlinks.

 Relative paths are taken relative to `/`. Listings come back sorted by name, which keeps
 traversal order deterministic. Paths registered with [`MemoryFs::fail_on`] answer every
 `kind`/`read_dir` call with a permission error, so error routing can be exercised.

 The tree sits behind a mutex and can be changed while a traversal is running.
*/
#[derive(Debug, Default)]
pub struct MemoryFs {
    tree: Mutex<Tree>,
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lexically normalises `path` against `/`
    fn normalise(path: &Path) -> PathBuf {
        let mut out = PathBuf::from("/");
        for step in steps_of(path) {
            match step {
                Step::Root => out = PathBuf::from("/"),
                Step::Parent => {
                    out.pop();
                }
                Step::Name(name) => out.push(name),
            }
        }
        out
    }

    fn insert_parents(tree: &mut Tree, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor == Path::new("/") {
                break;
            }
            tree.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    fn insert(&self, path: &Path, node: Node) -> &Self {
        let path = Self::normalise(path);
        let mut tree = self.lock();
        Self::insert_parents(&mut tree, &path);
        tree.nodes.insert(path, node);
        drop(tree);
        self
    }

    /// Creates a directory along with any missing parents
    pub fn add_dir<P: AsRef<Path>>(&self, path: P) -> &Self {
        self.insert(path.as_ref(), Node::Dir)
    }

    /// Creates an empty file along with any missing parent directories
    pub fn add_file<P: AsRef<Path>>(&self, path: P) -> &Self {
        self.insert(path.as_ref(), Node::File)
    }

    /// Creates a symlink at `link` pointing at `target`; relative targets resolve against the link's directory
    pub fn add_symlink<P: AsRef<Path>, T: AsRef<Path>>(&self, link: P, target: T) -> &Self {
        self.insert(link.as_ref(), Node::Symlink(target.as_ref().to_path_buf()))
    }

    /// Removes `path` and everything below it
    pub fn remove<P: AsRef<Path>>(&self, path: P) -> &Self {
        let path = Self::normalise(path.as_ref());
        self.lock().nodes.retain(|key, _| !key.starts_with(&path));
        self
    }

    /// Makes every `kind` and `read_dir` call on exactly `path` fail with a permission error
    pub fn fail_on<P: AsRef<Path>>(&self, path: P) -> &Self {
        let path = Self::normalise(path.as_ref());
        self.lock().failing.insert(path);
        self
    }

    fn check_failing(tree: &Tree, path: &Path) -> io::Result<()> {
        if tree.failing.contains(path) {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        } else {
            Ok(())
        }
    }

    /// Walks `path` component by component, following links on the way.
    /// The final component's link is only followed when `follow_last` is set.
    fn locate(tree: &Tree, path: &Path, follow_last: bool) -> io::Result<PathBuf> {
        let mut pending: VecDeque<Step> = steps_of(&Self::normalise(path)).collect();
        let mut current = PathBuf::from("/");
        let mut hops = 0;

        while let Some(step) = pending.pop_front() {
            match step {
                Step::Root => current = PathBuf::from("/"),
                Step::Parent => {
                    current.pop();
                }
                Step::Name(name) => {
                    let candidate = current.join(&name);
                    let is_last = pending.is_empty();
                    match tree.nodes.get(&candidate) {
                        None => return Err(io::Error::from(io::ErrorKind::NotFound)),
                        Some(Node::Symlink(target)) if follow_last || !is_last => {
                            hops += 1;
                            if hops > MAX_HOPS {
                                return Err(io::Error::from_raw_os_error(ELOOP));
                            }
                            // the target's steps are replayed from the link's directory
                            for target_step in steps_of(target).collect::<Vec<_>>().into_iter().rev()
                            {
                                pending.push_front(target_step);
                            }
                        }
                        Some(Node::File) if !is_last => {
                            return Err(io::Error::from_raw_os_error(ENOTDIR));
                        }
                        Some(_) => current = candidate,
                    }
                }
            }
        }

        Ok(current)
    }

    fn children(tree: &Tree, dir: &Path) -> Vec<OsString> {
        tree.nodes
            .range(dir.to_path_buf()..)
            .take_while(|(key, _)| key.starts_with(dir))
            .filter(|(key, _)| key.parent() == Some(dir))
            .filter_map(|(key, _)| key.file_name().map(OsStr::to_os_string))
            .collect()
    }
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        Self::locate(&self.lock(), path, true).is_ok()
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let tree = self.lock();
        Self::check_failing(&tree, &Self::normalise(path))?;
        let location = match Self::locate(&tree, path, false) {
            Ok(location) => location,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EntryKind::NonExistent),
            Err(e) => return Err(e),
        };
        Ok(match tree.nodes.get(&location) {
            Some(Node::Dir) => EntryKind::Directory,
            Some(Node::File) => EntryKind::File,
            Some(Node::Symlink(_)) => EntryKind::Symlink,
            // only `/` has no node of its own
            None => EntryKind::Directory,
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let tree = self.lock();
        Self::check_failing(&tree, &Self::normalise(path))?;
        let location = Self::locate(&tree, path, true)?;
        match tree.nodes.get(&location) {
            Some(Node::Dir) | None => Ok(Self::children(&tree, &location)),
            Some(_) => Err(io::Error::from_raw_os_error(ENOTDIR)),
        }
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        Self::locate(&self.lock(), path, true)
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(Self::normalise(path))
    }
}

#[async_trait]
impl AsyncFileSystem for MemoryFs {
    async fn read_dir_async(&self, path: &Path) -> io::Result<Vec<OsString>> {
        tokio::task::yield_now().await;
        self.read_dir(path)
    }

    async fn real_path_async(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::task::yield_now().await;
        self.real_path(path)
    }
}
