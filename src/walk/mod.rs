mod async_traverse;
mod finder;
mod finder_builder;
mod handles;
mod resolver;
mod traverse;
mod types;

pub use finder::Finder;
pub use finder_builder::FinderBuilder;
pub use handles::{Collect, Each};
pub use resolver::MAX_LINK_DEPTH;
pub use types::Target;
