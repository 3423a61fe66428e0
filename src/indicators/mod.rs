pub mod combined;
pub mod error;
pub mod registry;

pub mod momentum;
pub mod trend;
pub mod volatility;

pub use error::IndicatorError;
pub use registry::*;
