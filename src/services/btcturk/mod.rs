pub mod client;
pub mod messages;

pub use client::{BtcTurkClient, BtcTurkConfig, DEFAULT_BASE_URL, DEFAULT_MARKET_DATA_URL};
