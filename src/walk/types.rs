use crate::FindError;
use core::{future::Future, pin::Pin};

/// Which category of entry a traversal collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "A walk collects files or directories")]
pub enum Target {
    File,
    Directory,
}

/// Borrowed form of [`ErrorHandler`](crate::ErrorHandler) that the engine works with
pub(crate) type Handler = dyn Fn(FindError) -> Result<(), FindError> + Send + Sync;

/// Sink receiving every entry of the target type, in traversal order
pub(crate) type Emit<'a> = dyn FnMut(std::path::PathBuf) + Send + 'a;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a listed entry turned out to be
#[derive(Debug)]
pub(crate) enum Step {
    /// Classification failed and the handler swallowed the error
    Skip,
    File,
    Dir,
    /// A symlink resolving to an existing directory, `descend` only when links are followed
    LinkedDir {
        target: std::path::PathBuf,
        descend: bool,
    },
}
