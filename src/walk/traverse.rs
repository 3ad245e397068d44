use crate::{
    FindError,
    fs::{EntryKind, FileSystem},
    walk::{
        resolver::{Resolved, Resolver},
        types::{Emit, Handler, Step, Target},
    },
};
use core::num::NonZeroU32;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

/**
 State for one traversal call.

 Lives exactly as long as one `file_sync`/`dir`/`each_file`... invocation. Nothing here is
 shared between calls, in particular the error handler is whatever the call was given.
*/
pub(crate) struct Walk<'a, F: ?Sized> {
    pub(crate) fs: &'a F,
    pub(crate) target: Target,
    pub(crate) handler: &'a Handler,
    pub(crate) emit: &'a mut Emit<'a>,
    pub(crate) max_link_depth: u32,
    pub(crate) follow_symlinks: bool,
    pub(crate) max_depth: Option<NonZeroU32>,
    /// Link targets already expanded through a followed symlink
    pub(crate) visited: HashSet<PathBuf>,
}

impl<'a, F: FileSystem + ?Sized> Walk<'a, F> {
    pub(crate) fn new(
        fs: &'a F,
        target: Target,
        handler: &'a Handler,
        emit: &'a mut Emit<'a>,
    ) -> Self {
        Self {
            fs,
            target,
            handler,
            emit,
            max_link_depth: crate::walk::MAX_LINK_DEPTH,
            follow_symlinks: false,
            max_depth: None,
            visited: HashSet::new(),
        }
    }

    pub(crate) fn resolver(&self) -> Resolver<'a, F> {
        Resolver {
            fs: self.fs,
            handler: self.handler,
            max_depth: self.max_link_depth,
        }
    }

    /// Hands `error` to the handler, `Ok` means carry on
    pub(crate) fn report(&self, error: FindError) -> Result<(), FindError> {
        let shown = error.to_string();
        (self.handler)(error)?;
        debug!(error = %shown, "error swallowed by handler");
        Ok(())
    }

    /// One fresh `lstat`-style look at `path`; `None` when the handler swallowed a failure
    pub(crate) fn classify(&self, path: &Path) -> Result<Option<EntryKind>, FindError> {
        match self.fs.kind(path) {
            Ok(EntryKind::NonExistent) => {
                self.report(FindError::NotExist(path.to_path_buf()))?;
                Ok(None)
            }
            Ok(kind) => Ok(Some(kind)),
            Err(e) => {
                self.report(FindError::from_io(path, e))?;
                Ok(None)
            }
        }
    }

    #[inline]
    pub(crate) fn emit(&mut self, path: &Path, kind: Target) {
        if self.target == kind {
            (self.emit)(path.to_path_buf());
        }
    }

    #[inline]
    pub(crate) fn may_descend(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth < max.get())
    }

    /// Decides what a symlink is once its resolution is known
    pub(crate) fn link_step(&mut self, origin: Resolved) -> Result<Step, FindError> {
        let target = match origin {
            Resolved::Path(target) => target,
            // unresolved links end the branch like files do
            Resolved::Unresolved => return Ok(Step::File),
            Resolved::Failed => return Ok(Step::Skip),
        };
        if !self.fs.exists(&target) {
            return Ok(Step::File);
        }
        Ok(match self.classify(&target)? {
            None => Step::Skip,
            Some(EntryKind::Directory) => {
                let descend = self.follow_symlinks && self.visited.insert(target.clone());
                Step::LinkedDir { target, descend }
            }
            Some(_) => Step::File,
        })
    }

    /// Where the listing of `root` comes from, `None` when there is nothing to list
    fn listing_root(&self, root: &Path) -> Result<Option<PathBuf>, FindError> {
        let Some(kind) = self.classify(root)? else {
            return Ok(None);
        };
        let listing = if kind.is_symlink() {
            match self.resolver().resolve(root)? {
                Resolved::Path(resolved) => resolved,
                Resolved::Unresolved | Resolved::Failed => return Ok(None),
            }
        } else {
            root.to_path_buf()
        };

        Ok(match self.classify(&listing)? {
            Some(EntryKind::Directory) => Some(listing),
            _ => None,
        })
    }

    fn step_sync(&mut self, entry: &Path) -> Result<Step, FindError> {
        match self.classify(entry)? {
            None => Ok(Step::Skip),
            Some(EntryKind::Directory) => Ok(Step::Dir),
            Some(EntryKind::Symlink) => {
                let origin = self.resolver().resolve(entry)?;
                self.link_step(origin)
            }
            Some(_) => Ok(Step::File),
        }
    }

    /**
     Walks `root` to completion, blocking.

     A missing root, or a directory that disappears before it is listed, aborts the whole
     walk with [`FindError::NotExist`] without consulting the handler.
    */
    pub(crate) fn run_sync(&mut self, root: &Path) -> Result<(), FindError> {
        debug!(root = %root.display(), target = ?self.target, "starting blocking traversal");
        self.walk_sync(root, 0)?;
        debug!(root = %root.display(), "blocking traversal finished");
        Ok(())
    }

    fn walk_sync(&mut self, root: &Path, depth: u32) -> Result<(), FindError> {
        if !self.fs.exists(root) {
            return Err(FindError::NotExist(root.to_path_buf()));
        }
        match self.listing_root(root)? {
            Some(listing) => self.list_sync(root, &listing, depth),
            None => Ok(()),
        }
    }

    /// Lists `listing` and handles each entry, naming them under `root`
    fn list_sync(&mut self, root: &Path, listing: &Path, depth: u32) -> Result<(), FindError> {
        trace!(dir = %listing.display(), "listing");
        let names = match self.fs.read_dir(listing) {
            Ok(names) => names,
            Err(e) => {
                let error = FindError::from_io(listing, e);
                if error.is_not_exist() {
                    return Err(error);
                }
                self.report(error)?;
                return Ok(());
            }
        };

        let depth = depth + 1;
        for name in names {
            let entry = root.join(name);
            match self.step_sync(&entry)? {
                Step::Skip => {}
                Step::File => self.emit(&entry, Target::File),
                Step::Dir => {
                    self.emit(&entry, Target::Directory);
                    if self.may_descend(depth) {
                        self.walk_sync(&entry, depth)?;
                    }
                }
                Step::LinkedDir { target, descend } => {
                    self.emit(&entry, Target::Directory);
                    if descend && self.may_descend(depth) {
                        self.list_sync(&entry, &target, depth)?;
                    }
                }
            }
        }
        Ok(())
    }
}
