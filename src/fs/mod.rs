mod file_type;
mod filesystem;
mod memory;
mod os;

pub use file_type::EntryKind;
pub use filesystem::{AsyncFileSystem, FileSystem};
pub use memory::MemoryFs;
pub use os::OsFs;
