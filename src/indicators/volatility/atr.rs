//! ATR (Average True Range) indicator

use crate::common::math;
use crate::indicators::error::{ensure_history, IndicatorError};
use crate::indicators::registry::{IndicatorCategory, SignalRule};
use crate::models::{AtrSeries, PriceSeries, Signal};

/// Calculate ATR (Average True Range)
///
/// True range needs the previous close, so the first bar has none. ATR is the
/// simple rolling mean of true range; `running_mean` is the expanding mean of
/// ATR used as its baseline.
pub fn calculate_atr(series: &PriceSeries, period: usize) -> AtrSeries {
    let candles = series.candles();
    let true_range: Vec<Option<f64>> = (0..candles.len())
        .map(|i| {
            if i == 0 {
                None
            } else {
                Some(math::true_range(
                    candles[i].high,
                    candles[i].low,
                    candles[i - 1].close,
                ))
            }
        })
        .collect();

    let atr = math::rolling_mean_opt(&true_range, period);
    let running_mean = math::expanding_mean(&atr);

    AtrSeries {
        true_range,
        atr,
        running_mean,
    }
}

/// Rising volatility from a quiet base buys; fading volatility from an
/// elevated level sells.
pub fn atr_decision(atr: Option<f64>, prev_atr: Option<f64>, running_mean: Option<f64>) -> Signal {
    let (Some(atr), Some(prev_atr), Some(mean)) = (atr, prev_atr, running_mean) else {
        return Signal::Hold;
    };
    if atr > prev_atr && atr < mean {
        Signal::Buy
    } else if atr < prev_atr && atr > mean {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

#[derive(Debug, Clone)]
pub struct AtrRule {
    pub period: usize,
}

impl Default for AtrRule {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl SignalRule for AtrRule {
    fn name(&self) -> &'static str {
        "atr"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Volatility
    }

    fn min_bars(&self) -> usize {
        self.period + 2
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let result = calculate_atr(series, self.period);
        let (atr, prev_atr) = math::last_two(&result.atr);
        let running_mean = result.running_mean.last().copied().flatten();
        Ok(atr_decision(atr, prev_atr, running_mean))
    }
}
