//! Stochastic Oscillator

use crate::common::math;
use crate::indicators::error::{ensure_history, IndicatorError};
use crate::indicators::registry::{IndicatorCategory, SignalRule};
use crate::models::{PriceSeries, Signal, StochasticSeries};

/// %K = 100 * (close - lowest low) / (highest high - lowest low) over
/// `k_period` bars; %D = SMA(%K, d_period). A flat range leaves %K undefined.
pub fn calculate_stochastic(series: &PriceSeries, k_period: usize, d_period: usize) -> StochasticSeries {
    let closes = series.closes();
    let highest = math::rolling_max(&series.highs(), k_period);
    let lowest = math::rolling_min(&series.lows(), k_period);

    let k: Vec<Option<f64>> = closes
        .iter()
        .zip(highest.iter().zip(lowest.iter()))
        .map(|(close, (high, low))| {
            let (high, low) = ((*high)?, (*low)?);
            let range = high - low;
            if range == 0.0 {
                return None;
            }
            Some(100.0 * (close - low) / range)
        })
        .collect();
    let d = math::rolling_mean_opt(&k, d_period);

    StochasticSeries { k, d }
}

/// Oversold and turning up buys, overbought and turning down sells.
pub fn stochastic_decision(k: Option<f64>, prev_k: Option<f64>, oversold: f64, overbought: f64) -> Signal {
    let (Some(k), Some(prev_k)) = (k, prev_k) else {
        return Signal::Hold;
    };
    if k < oversold && k > prev_k {
        Signal::Buy
    } else if k > overbought && k < prev_k {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

#[derive(Debug, Clone)]
pub struct StochasticRule {
    pub k_period: usize,
    pub d_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for StochasticRule {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
            oversold: 20.0,
            overbought: 80.0,
        }
    }
}

impl SignalRule for StochasticRule {
    fn name(&self) -> &'static str {
        "stochastic"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_bars(&self) -> usize {
        self.k_period + 1
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let result = calculate_stochastic(series, self.k_period, self.d_period);
        let (k, prev_k) = math::last_two(&result.k);
        Ok(stochastic_decision(k, prev_k, self.oversold, self.overbought))
    }
}
