mod front_matter;
mod page;

pub use front_matter::*;
pub use page::*;
