//! Feature extraction for the learned signal.

use crate::common::math::pct_change;
use crate::indicators::trend::calculate_sma;
use crate::models::PriceSeries;
use serde::{Deserialize, Serialize};

pub const SMA_FAST: usize = 50;
pub const SMA_SLOW: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    /// Trailing return only.
    Minimal,
    /// Trailing return, SMA(50), SMA(200) and volume.
    Full,
}

impl FeatureSet {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            FeatureSet::Minimal => &["returns"],
            FeatureSet::Full => &["returns", "sma_50", "sma_200", "volume"],
        }
    }

    pub fn width(&self) -> usize {
        self.names().len()
    }

    /// Index of the first bar whose features are all defined.
    pub fn warmup(&self) -> usize {
        match self {
            FeatureSet::Minimal => 1,
            FeatureSet::Full => 1usize.max(SMA_FAST - 1).max(SMA_SLOW - 1),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minimal" => Some(FeatureSet::Minimal),
            "full" => Some(FeatureSet::Full),
            _ => None,
        }
    }
}

/// Labelled rows ready for fitting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map(Vec::len).unwrap_or(0)
    }

    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// Per-bar feature vectors; `None` where any feature is undefined.
pub fn feature_rows(series: &PriceSeries, set: FeatureSet) -> Vec<Option<Vec<f64>>> {
    let returns = pct_change(&series.closes());
    match set {
        FeatureSet::Minimal => returns.into_iter().map(|r| r.map(|r| vec![r])).collect(),
        FeatureSet::Full => {
            let fast = calculate_sma(series, SMA_FAST);
            let slow = calculate_sma(series, SMA_SLOW);
            let volumes = series.volumes();
            (0..series.len())
                .map(|i| match (returns[i], fast[i], slow[i]) {
                    (Some(r), Some(f), Some(s)) => Some(vec![r, f, s, volumes[i]]),
                    _ => None,
                })
                .collect()
        }
    }
}

/// Rows with defined features and a known next bar. Label 1 when the next
/// close is higher than the current one.
pub fn build_dataset(series: &PriceSeries, set: FeatureSet) -> Dataset {
    let closes = series.closes();
    let rows = feature_rows(series, set);
    let mut dataset = Dataset::default();
    for (i, row) in rows.into_iter().enumerate() {
        if i + 1 >= closes.len() {
            break;
        }
        if let Some(row) = row {
            dataset.features.push(row);
            dataset.labels.push(u8::from(closes[i + 1] > closes[i]));
        }
    }
    dataset
}

/// Features of the most recent bar, if defined.
pub fn latest_features(series: &PriceSeries, set: FeatureSet) -> Option<Vec<f64>> {
    feature_rows(series, set).pop().flatten()
}
