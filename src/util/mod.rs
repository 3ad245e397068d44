mod pattern;
mod printer;

pub use pattern::Pattern;
pub use printer::{PrintOptions, Printer};
