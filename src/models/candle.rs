use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("candle timestamps must be strictly increasing (bar {index} at {timestamp})")]
    NotIncreasing {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Chronological OHLCV bars for one symbol.
///
/// Construction checks ordering once; afterwards the series is read-only and
/// indicators derive new columns from it instead of writing into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (index, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NotIncreasing {
                    index: index + 1,
                    timestamp: pair[1].timestamp,
                });
            }
        }
        Ok(Self { candles })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// The most recent `limit` bars as a new series.
    pub fn tail(&self, limit: usize) -> Self {
        let start = self.candles.len().saturating_sub(limit);
        Self {
            candles: self.candles[start..].to_vec(),
        }
    }
}
