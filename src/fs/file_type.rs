use std::fs::Metadata;

/// Represents the kind of a path as seen without following its final component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Fifos, sockets, devices. The walker treats these like files
    Other,
    NonExistent,
}

impl EntryKind {
    #[must_use]
    #[inline]
    /// Classifies `symlink_metadata` output
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    #[must_use]
    #[inline]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    #[must_use]
    #[inline]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    #[must_use]
    #[inline]
    pub const fn is_symlink(self) -> bool {
        matches!(self, Self::Symlink)
    }
}
