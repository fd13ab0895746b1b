pub mod application;
pub mod domain;
pub mod storage;

pub use domain::*;
pub use storage::Repository;
