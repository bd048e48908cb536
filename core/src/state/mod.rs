pub mod ballot;
pub mod round;
pub mod vote;

pub use ballot::*;
pub use round::*;
pub use vote::*;
