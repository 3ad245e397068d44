use crate::fs::EntryKind;
use async_trait::async_trait;
use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

/**
 The filesystem primitives the walker is built on.

 Implementations only answer questions about paths, nothing here reads file contents
 or modifies anything. The walker never caches answers, every step asks again.
*/
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists, following symlinks (a dangling link does not exist)
    fn exists(&self, path: &Path) -> bool;

    /**
     Classifies `path` without following a final symlink.

     A missing path is `Ok(EntryKind::NonExistent)`, anything else that stops the lookup is an `Err`.
    */
    fn kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Lists the base names inside the directory `path`, in listing order
    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /**
     Resolves every symlink in `path`, returning the concrete location it designates.

     # Errors
     A dangling target must surface as `ENOENT`/`NotFound` and a resolution cycle as `ELOOP`,
     see [`is_broken_link`](crate::is_broken_link).
    */
    fn real_path(&self, path: &Path) -> io::Result<PathBuf>;

    /// Lexical absolute form of `path`, symlinks are left alone
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }

    #[inline]
    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        self.kind(path).map(EntryKind::is_dir)
    }

    #[inline]
    fn is_file(&self, path: &Path) -> io::Result<bool> {
        self.kind(path).map(EntryKind::is_file)
    }

    #[inline]
    fn is_symlink(&self, path: &Path) -> io::Result<bool> {
        self.kind(path).map(EntryKind::is_symlink)
    }
}

/// Non-blocking versions of the two expensive primitives.
///
/// Each call is a suspension point for the async walker.
#[async_trait]
pub trait AsyncFileSystem: FileSystem {
    async fn read_dir_async(&self, path: &Path) -> io::Result<Vec<OsString>>;

    async fn real_path_async(&self, path: &Path) -> io::Result<PathBuf>;
}

impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        (**self).kind(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        (**self).read_dir(path)
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).real_path(path)
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).absolute(path)
    }
}

#[async_trait]
impl<T: AsyncFileSystem + ?Sized> AsyncFileSystem for std::sync::Arc<T> {
    async fn read_dir_async(&self, path: &Path) -> io::Result<Vec<OsString>> {
        (**self).read_dir_async(path).await
    }

    async fn real_path_async(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).real_path_async(path).await
    }
}
