use crate::{
    ErrorHandler, FindError, Pattern,
    error::fail_loudly,
    fs::{AsyncFileSystem, FileSystem, OsFs},
    walk::{
        Collect, Each,
        finder_builder::FinderBuilder,
        traverse::Walk,
        types::{Emit, Handler, Target},
    },
};
use core::{fmt, num::NonZeroU32};
use std::path::{Path, PathBuf};

/**
The `Finder` struct is the main entry point for finding files and directories.

Each call walks a directory tree from a root, resolving symlinks with a bounded depth, and
hands back every file or every directory it meets, optionally narrowed by a [`Pattern`].

Three call shapes exist for each [`Target`]:
- blocking, returning a list: [`Finder::file_sync`], [`Finder::dir_sync`]
- async, delivering the list: [`Finder::file`], [`Finder::dir`]
- async, pushing each entry to an action: [`Finder::each_file`], [`Finder::each_dir`]

A `Finder` is bound to one [`FileSystem`]; [`Finder::init`] builds one against any
implementation, e.g. a [`MemoryFs`](crate::fs::MemoryFs) sandbox.

# Examples
```no_run
use rfind::{Finder, Pattern};

let finder = Finder::new();
let all = finder.file_sync("/tmp/t")?;
let text = finder.file_sync_matching(Pattern::regex(r"\.txt$")?, "/tmp/t")?;
let subdirs = finder.dir_sync("/tmp/t")?;
# Ok::<(), rfind::FindError>(())
```
*/
pub struct Finder<F = OsFs> {
    /// Filesystem every call is answered by
    pub(crate) fs: F,
    /// Handler used when a call does not install its own, `None` fails loudly
    pub(crate) handler: Option<ErrorHandler>,
    /// Indirections followed before a link counts as unresolved
    pub(crate) max_link_depth: u32,
    /// Descend into symlinked directories
    pub(crate) follow_symlinks: bool,
    /// Deepest level listed, the root's children are at depth 1
    pub(crate) max_depth: Option<NonZeroU32>,
}

impl Finder<OsFs> {
    /// A finder over the real filesystem that fails loudly on any error
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        FinderBuilder::new().build()
    }

    /// Start configuring a finder
    #[must_use]
    #[inline]
    pub fn init() -> FinderBuilder<OsFs> {
        FinderBuilder::new()
    }
}

impl Default for Finder<OsFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Finder<F> {
    /// A finder answering every question through `fs`, otherwise default
    #[must_use]
    pub fn with_filesystem(fs: F) -> Self {
        FinderBuilder::new().filesystem(fs).build()
    }

    /// Returns a reference to the underlying filesystem
    #[inline]
    #[must_use]
    pub const fn filesystem(&self) -> &F {
        &self.fs
    }

    #[inline]
    pub(crate) fn handler(&self) -> &Handler {
        self.handler.as_deref().unwrap_or(&fail_loudly)
    }

    /// Sets up the per-call state of one traversal
    pub(crate) fn walk<'a>(
        &'a self,
        target: Target,
        handler: &'a Handler,
        emit: &'a mut Emit<'a>,
    ) -> Walk<'a, F> {
        let mut walk = Walk::new(&self.fs, target, handler, emit);
        walk.max_link_depth = self.max_link_depth;
        walk.follow_symlinks = self.follow_symlinks;
        walk.max_depth = self.max_depth;
        walk
    }

    /**
    Walks `root` to completion and returns every entry of `target` that passes `pattern`.

    The pattern is applied to the finished list, not during the walk.

    # Errors
    Returns [`FindError::NotExist`] straight away if `root` (or a directory inside it) is gone
    by the time it is listed. Every other failure goes to the finder's error handler, and
    comes back here if the handler returns it.
    */
    pub fn collect_sync<P: AsRef<Path>>(
        &self,
        target: Target,
        pattern: &Pattern,
        root: P,
    ) -> Result<Vec<PathBuf>, FindError> {
        let mut found = Vec::new();
        {
            let mut push = |path: PathBuf| found.push(path);
            self.walk(target, self.handler(), &mut push)
                .run_sync(root.as_ref())?;
        }
        if !pattern.is_any() {
            found.retain(|path| pattern.matches(path));
        }
        Ok(found)
    }

    /**
    Every file below `root`, blocking.

    # Errors
    See [`Finder::collect_sync`]
    */
    #[inline]
    pub fn file_sync<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>, FindError> {
        self.collect_sync(Target::File, &Pattern::Any, root)
    }

    /**
    Every file below `root` matching `pattern`, blocking.

    # Errors
    See [`Finder::collect_sync`]
    */
    #[inline]
    pub fn file_sync_matching<T: Into<Pattern>, P: AsRef<Path>>(
        &self,
        pattern: T,
        root: P,
    ) -> Result<Vec<PathBuf>, FindError> {
        self.collect_sync(Target::File, &pattern.into(), root)
    }

    /**
    Every directory below `root`, blocking. The root itself is not included.

    # Errors
    See [`Finder::collect_sync`]
    */
    #[inline]
    pub fn dir_sync<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>, FindError> {
        self.collect_sync(Target::Directory, &Pattern::Any, root)
    }

    /**
    Every directory below `root` matching `pattern`, blocking.

    # Errors
    See [`Finder::collect_sync`]
    */
    #[inline]
    pub fn dir_sync_matching<T: Into<Pattern>, P: AsRef<Path>>(
        &self,
        pattern: T,
        root: P,
    ) -> Result<Vec<PathBuf>, FindError> {
        self.collect_sync(Target::Directory, &pattern.into(), root)
    }
}

impl<F: AsyncFileSystem> Finder<F> {
    /// Every entry of `target` below `root`, delivered as one list once the walk is done
    #[inline]
    pub fn collect<P: AsRef<Path>>(&self, target: Target, root: P) -> Collect<'_, F> {
        Collect::new(self, target, root.as_ref())
    }

    /// Calls `action` for every entry of `target` below `root` as it is found
    #[inline]
    pub fn each<P, A>(&self, target: Target, root: P, action: A) -> Each<'_, F, A>
    where
        P: AsRef<Path>,
        A: FnMut(PathBuf) + Send,
    {
        Each::new(self, target, root.as_ref(), action)
    }

    /// Every file below `root`, delivered as one list once the walk is done. Await the handle.
    #[inline]
    pub fn file<P: AsRef<Path>>(&self, root: P) -> Collect<'_, F> {
        self.collect(Target::File, root)
    }

    /// Every directory below `root`, delivered as one list once the walk is done. Await the handle.
    #[inline]
    pub fn dir<P: AsRef<Path>>(&self, root: P) -> Collect<'_, F> {
        self.collect(Target::Directory, root)
    }

    /// Calls `action` for every file below `root` as it is found. Await the handle.
    #[inline]
    pub fn each_file<P, A>(&self, root: P, action: A) -> Each<'_, F, A>
    where
        P: AsRef<Path>,
        A: FnMut(PathBuf) + Send,
    {
        self.each(Target::File, root, action)
    }

    /// Calls `action` for every directory below `root` as it is found. Await the handle.
    #[inline]
    pub fn each_dir<P, A>(&self, root: P, action: A) -> Each<'_, F, A>
    where
        P: AsRef<Path>,
        A: FnMut(PathBuf) + Send,
    {
        self.each(Target::Directory, root, action)
    }
}

impl<F: fmt::Debug> fmt::Debug for Finder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finder")
            .field("fs", &self.fs)
            .field("custom_handler", &self.handler.is_some())
            .field("max_link_depth", &self.max_link_depth)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
