pub mod catalog;
pub mod control;
pub mod generation;

pub use catalog::*;
pub use control::*;
pub use generation::*;
