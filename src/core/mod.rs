//! Core application primitives (trading loop, status server)

pub mod http;
pub mod trader;

pub use http::*;
pub use trader::*;
