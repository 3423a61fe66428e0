use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical trade decision produced by a strategy or by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        }
    }

    /// Gauge encoding: 1 buy, 0 hold, -1 sell.
    pub fn as_score(&self) -> f64 {
        match self {
            Signal::Buy => 1.0,
            Signal::Hold => 0.0,
            Signal::Sell => -1.0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
