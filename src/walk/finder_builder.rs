use crate::{
    ErrorHandler, FindError,
    fs::{FileSystem, OsFs},
    walk::{MAX_LINK_DEPTH, finder::Finder},
};
use core::num::NonZeroU32;
use std::sync::Arc;

/**
 A builder for creating a `Finder` instance with customisable options.

 This is also how a finder gets bound to a filesystem other than the real one, and how it
 gets an error handler other than "fail on everything".
*/
pub struct FinderBuilder<F = OsFs> {
    pub(crate) fs: F,
    pub(crate) handler: Option<ErrorHandler>,
    pub(crate) max_link_depth: u32,
    pub(crate) follow_symlinks: bool,
    pub(crate) max_depth: Option<NonZeroU32>,
}

impl FinderBuilder<OsFs> {
    /// Creates a builder over the real filesystem with default options
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fs: OsFs,
            handler: None,
            max_link_depth: MAX_LINK_DEPTH,
            follow_symlinks: false,
            max_depth: None,
        }
    }
}

impl Default for FinderBuilder<OsFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> FinderBuilder<F> {
    /// Answer every question through `fs` instead
    #[must_use]
    pub fn filesystem<G: FileSystem>(self, fs: G) -> FinderBuilder<G> {
        FinderBuilder {
            fs,
            handler: self.handler,
            max_link_depth: self.max_link_depth,
            follow_symlinks: self.follow_symlinks,
            max_depth: self.max_depth,
        }
    }

    /**
     Set the handler consulted when the filesystem reports a failure.

     Return `Ok(())` to skip past the failure, or an error to abort the traversal with it.
     Without a handler every failure aborts.
    */
    #[must_use]
    pub fn error_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(FindError) -> Result<(), FindError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Set how many indirections a symlink may take before counting as unresolved, defaults to 5
    #[must_use]
    pub const fn max_link_depth(mut self, depth: u32) -> Self {
        self.max_link_depth = depth;
        self
    }

    /// Sets whether to descend into symlinked directories (default: false).
    ///
    /// Each link target is expanded once per traversal, so links back up the tree terminate.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    /// Set maximum search depth, 0 or `None` means unlimited
    #[must_use]
    pub const fn max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = match max_depth {
            Some(num) => NonZeroU32::new(num),
            None => None,
        };
        self
    }
}

impl<F: FileSystem> FinderBuilder<F> {
    /// Builds a [`Finder`] instance with the configured options.
    #[must_use]
    pub fn build(self) -> Finder<F> {
        Finder {
            fs: self.fs,
            handler: self.handler,
            max_link_depth: self.max_link_depth,
            follow_symlinks: self.follow_symlinks,
            max_depth: self.max_depth,
        }
    }
}
