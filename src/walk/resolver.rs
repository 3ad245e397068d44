use crate::{
    FindError, is_broken_link,
    fs::{AsyncFileSystem, FileSystem},
    walk::types::Handler,
};
use std::path::{Path, PathBuf};
use tracing::trace;

/// How many indirections are followed before a link is declared unresolved
pub const MAX_LINK_DEPTH: u32 = 5;

/// Where a resolution ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolved {
    /// A concrete path, or a dangling/looping link's own path
    Path(PathBuf),
    /// The depth ran out while still looking at a link
    Unresolved,
    /// A failure was handed to the error handler and swallowed
    Failed,
}

/**
 Resolves symlinks through a bounded number of indirections.

 A dangling or looping link is not an error, the link's own path comes back unchanged and the
 caller finds out it does not exist. A failure the handler swallows comes back as
 [`Resolved::Failed`] so the caller can skip the entry rather than guess at it. There is no
 visited set, the depth bound alone guarantees termination.
*/
pub(crate) struct Resolver<'a, F: ?Sized> {
    pub(crate) fs: &'a F,
    pub(crate) handler: &'a Handler,
    pub(crate) max_depth: u32,
}

/// Outcome of looking at one link in the chain
enum Hop {
    Done(Resolved),
    Follow,
}

/// Outcome of reading one link
enum Read {
    Origin(PathBuf),
    Done(Resolved),
}

impl<F: FileSystem + ?Sized> Resolver<'_, F> {
    fn absolute(&self, path: &Path) -> Result<Resolved, FindError> {
        match self.fs.absolute(path) {
            Ok(abs) => Ok(Resolved::Path(abs)),
            Err(e) => {
                (self.handler)(FindError::from_io(path, e))?;
                Ok(Resolved::Failed)
            }
        }
    }

    /// Everything up to the point where the link has to be read
    fn inspect(&self, path: &Path, depth: u32) -> Result<Hop, FindError> {
        // the chain already moved once and the link target vanished in between
        if depth < self.max_depth && !self.fs.exists(path) {
            return self.absolute(path).map(Hop::Done);
        }

        let is_link = match self.fs.is_symlink(path) {
            Ok(is_link) => is_link,
            Err(e) => {
                (self.handler)(FindError::from_io(path, e))?;
                return Ok(Hop::Done(Resolved::Failed));
            }
        };

        if !is_link {
            self.absolute(path).map(Hop::Done)
        } else if depth == 0 {
            trace!(path = %path.display(), "link depth exhausted");
            Ok(Hop::Done(Resolved::Unresolved))
        } else {
            Ok(Hop::Follow)
        }
    }

    /// What to do with the result of reading one link
    fn after_read(&self, path: PathBuf, read: std::io::Result<PathBuf>) -> Result<Read, FindError> {
        match read {
            Ok(origin) => Ok(Read::Origin(origin)),
            Err(e) if is_broken_link(&e) => {
                trace!(path = %path.display(), "broken link");
                Ok(Read::Done(Resolved::Path(path)))
            }
            Err(e) => {
                (self.handler)(FindError::from_io(&path, e))?;
                Ok(Read::Done(Resolved::Failed))
            }
        }
    }

    /// Blocking resolution of `path`
    pub(crate) fn resolve(&self, path: &Path) -> Result<Resolved, FindError> {
        let mut current = path.to_path_buf();
        let mut depth = self.max_depth;
        loop {
            if let Hop::Done(resolved) = self.inspect(&current, depth)? {
                return Ok(resolved);
            }
            let read = self.fs.real_path(&current);
            match self.after_read(current, read)? {
                Read::Origin(origin) => {
                    trace!(origin = %origin.display(), depth, "followed link");
                    current = origin;
                    depth -= 1;
                }
                Read::Done(resolved) => return Ok(resolved),
            }
        }
    }
}

impl<F: AsyncFileSystem + ?Sized> Resolver<'_, F> {
    /// Same as [`Resolver::resolve`], reading each link without blocking
    pub(crate) async fn resolve_async(&self, path: &Path) -> Result<Resolved, FindError> {
        let mut current = path.to_path_buf();
        let mut depth = self.max_depth;
        loop {
            if let Hop::Done(resolved) = self.inspect(&current, depth)? {
                return Ok(resolved);
            }
            let read = self.fs.real_path_async(&current).await;
            match self.after_read(current, read)? {
                Read::Origin(origin) => {
                    trace!(origin = %origin.display(), depth, "followed link");
                    current = origin;
                    depth -= 1;
                }
                Read::Done(resolved) => return Ok(resolved),
            }
        }
    }
}
