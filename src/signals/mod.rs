//! Vote collection and weighted-majority reduction.

pub mod engine;
pub mod pool;

pub use engine::*;
pub use pool::*;
