//! Weighted-vote crypto trading agent: indicator rules and a learned
//! classifier vote, a pool reduces the votes, and a loop dispatches orders
//! when the combined decision changes.

pub mod common;
pub mod config;
pub mod core;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod services;
pub mod signals;
