use libc::{EACCES, ELOOP, ENOENT, ENOTDIR, EPERM};
use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug)]
/// An error type for traversal operations.
///
/// Every failure a [`Finder`](crate::Finder) can report is one of these. Broken symlinks
/// (dangling targets and resolution loops) never show up here, the resolver absorbs them.
pub enum FindError {
    /// The root, or a directory about to be listed, does not exist
    NotExist(PathBuf),
    /// Permission was refused while inspecting or listing a path
    AccessDenied { path: PathBuf, source: io::Error },
    /// A path that was expected to be a directory is not one
    NotADirectory(PathBuf),
    /// Any other failure surfaced by the filesystem
    Io { path: PathBuf, source: io::Error },
    /// A regex pattern failed to compile
    InvalidPattern(regex::Error),
}

impl FindError {
    /// Attaches a path to an IO error, mapping well known OS codes to their own variants.
    #[must_use]
    pub fn from_io<P: AsRef<Path>>(path: P, error: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if error.kind() == io::ErrorKind::NotFound {
            return Self::NotExist(path);
        }

        match error.raw_os_error() {
            Some(ENOENT) => Self::NotExist(path),
            Some(ENOTDIR) => Self::NotADirectory(path),
            Some(EACCES | EPERM) => Self::AccessDenied {
                path,
                source: error,
            },
            _ if error.kind() == io::ErrorKind::PermissionDenied => Self::AccessDenied {
                path,
                source: error,
            },
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// The path the error concerns, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotExist(path) | Self::NotADirectory(path) => Some(path),
            Self::AccessDenied { path, .. } | Self::Io { path, .. } => Some(path),
            Self::InvalidPattern(_) => None,
        }
    }

    /// Returns true for [`FindError::NotExist`]
    #[must_use]
    pub const fn is_not_exist(&self) -> bool {
        matches!(self, Self::NotExist(_))
    }
}

impl From<regex::Error> for FindError {
    fn from(error: regex::Error) -> Self {
        Self::InvalidPattern(error)
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl fmt::Display for FindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotExist(path) => write!(f, "{} does not exist.", path.display()),
            Self::AccessDenied { path, source } => {
                write!(f, "Access denied: {}: {source}", path.display())
            }
            Self::NotADirectory(path) => write!(f, "Not a directory: {}", path.display()),
            Self::Io { path, source } => write!(f, "IO error: {}: {source}", path.display()),
            Self::InvalidPattern(e) => write!(f, "Regex error: {e}"),
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl std::error::Error for FindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AccessDenied { source, .. } | Self::Io { source, .. } => Some(source),
            Self::InvalidPattern(e) => Some(e),
            Self::NotExist(_) | Self::NotADirectory(_) => None,
        }
    }
}

/// Returns true when a link resolution failure means "dangling or looping link".
///
/// Those are absorbed by the resolver and turned into an unresolved result rather than reported.
#[must_use]
pub fn is_broken_link(error: &io::Error) -> bool {
    matches!(error.raw_os_error(), Some(ENOENT | ELOOP)) || error.kind() == io::ErrorKind::NotFound
}

/**
 A callback consulted whenever the filesystem reports a failure during traversal.

 Returning `Ok(())` swallows the error and lets the traversal carry on from where it was,
 returning `Err` aborts the traversal with that error.
*/
pub type ErrorHandler = Arc<dyn Fn(FindError) -> Result<(), FindError> + Send + Sync>;

/// The default handler, every error aborts the traversal
#[inline]
pub fn fail_loudly(error: FindError) -> Result<(), FindError> {
    Err(error)
}

/// A handler that logs and swallows every error
#[inline]
#[allow(clippy::unnecessary_wraps)] // has to fit the handler signature
pub fn ignore(error: FindError) -> Result<(), FindError> {
    tracing::warn!("ignoring traversal error: {error}");
    Ok(())
}
