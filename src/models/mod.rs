//! Shared data models spanning the engine layers.

pub mod candle;
pub mod indicators;
pub mod signal;

pub use candle::{Candle, PriceSeries, SeriesError};
pub use indicators::{
    AtrSeries, BollingerSeries, DynamicRsiSeries, MacdSeries, StochasticSeries,
};
pub use signal::Signal;
