//! MACD (Moving Average Convergence Divergence) indicator

use crate::common::math;
use crate::indicators::error::{ensure_history, IndicatorError};
use crate::indicators::registry::{IndicatorCategory, SignalRule};
use crate::models::{MacdSeries, PriceSeries, Signal};

/// Calculate MACD indicator
///
/// MACD = EMA(fast) - EMA(slow)
/// Signal = EMA(signal_period) of MACD
/// Histogram = MACD - Signal
///
/// Each EMA needs as many observations as its span before it is defined.
pub fn calculate_macd(
    series: &PriceSeries,
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdSeries {
    let closes = math::lift(&series.closes());
    let fast = math::ewm_mean(&closes, fast_period, fast_period);
    let slow = math::ewm_mean(&closes, slow_period, slow_period);

    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = math::ewm_mean(&macd, signal_period, signal_period);
    let histogram = macd
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

/// Crossing direction gated by the distance between the lines.
pub fn macd_decision(macd: Option<f64>, signal: Option<f64>, momentum_threshold: f64) -> Signal {
    let (Some(macd), Some(signal)) = (macd, signal) else {
        return Signal::Hold;
    };
    let momentum = (macd - signal).abs();
    if momentum <= momentum_threshold {
        return Signal::Hold;
    }
    if macd > signal {
        Signal::Buy
    } else if macd < signal {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

#[derive(Debug, Clone)]
pub struct MacdRule {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub momentum_threshold: f64,
}

impl Default for MacdRule {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            momentum_threshold: 0.001,
        }
    }
}

impl SignalRule for MacdRule {
    fn name(&self) -> &'static str {
        "macd"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_bars(&self) -> usize {
        self.slow_period.max(self.fast_period) + self.signal_period
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let result = calculate_macd(series, self.fast_period, self.slow_period, self.signal_period);
        let last = series.len() - 1;
        Ok(macd_decision(
            result.macd[last],
            result.signal[last],
            self.momentum_threshold,
        ))
    }
}
