use crate::fs::{AsyncFileSystem, EntryKind, FileSystem};
use async_trait::async_trait;
use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

/**
 The real filesystem.

 Blocking calls go straight to `std::fs`, the async calls go through `tokio::fs`.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    #[inline]
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[inline]
    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        match fs::symlink_metadata(path) {
            Ok(metadata) => Ok(EntryKind::from_metadata(&metadata)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::NonExistent),
            Err(e) => Err(e),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|ent| ent.file_name()))
            .collect()
    }

    #[inline]
    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

#[async_trait]
impl AsyncFileSystem for OsFs {
    async fn read_dir_async(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut names = Vec::with_capacity(16);
        while let Some(entry) = reader.next_entry().await? {
            names.push(entry.file_name());
        }
        Ok(names)
    }

    async fn real_path_async(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }
}
