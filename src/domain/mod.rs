mod day;
mod entry;
mod money;

pub use day::*;
pub use entry::*;
pub use money::*;
