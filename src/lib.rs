//! Recursive file and directory finding.
//!
//! A [`Finder`] walks a directory tree from a root and hands back every file, or every
//! directory, below it. Symlinks are resolved through at most [`MAX_LINK_DEPTH`] indirections,
//! so link cycles and dangling links terminate instead of hanging. Each traversal can run
//! blocking and return a list, or run as a single-threaded async chain that either delivers the
//! list or pushes entries to an action in depth first, listing order.
//!
//! ```no_run
//! use rfind::Finder;
//!
//! let finder = Finder::new();
//! for path in finder.file_sync_matching("Cargo.toml", ".")? {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), rfind::FindError>(())
//! ```
#![allow(clippy::pub_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_inline_in_public_items)]

mod error;
pub mod fs;
mod util;
mod walk;

pub use error::{ErrorHandler, FindError, fail_loudly, ignore, is_broken_link};
pub use util::{Pattern, PrintOptions, Printer};
pub use walk::{Collect, Each, Finder, FinderBuilder, MAX_LINK_DEPTH, Target};

mod test;
