//! Rules that require RSI and MACD to agree.

use crate::indicators::error::{ensure_history, IndicatorError};
use crate::indicators::momentum::{calculate_macd, rsi_at, RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::indicators::registry::{IndicatorCategory, SignalRule};
use crate::models::{PriceSeries, Signal};

struct Readings {
    rsi: Option<f64>,
    macd: Option<f64>,
    signal: Option<f64>,
}

fn latest_readings(
    series: &PriceSeries,
    rsi_period: usize,
    fast: usize,
    slow: usize,
    signal: usize,
) -> Readings {
    let closes = series.closes();
    let last = closes.len() - 1;
    let macd = calculate_macd(series, fast, slow, signal);
    Readings {
        rsi: rsi_at(&closes, last, rsi_period),
        macd: macd.macd[last],
        signal: macd.signal[last],
    }
}

fn combined_min_bars(rsi_period: usize, fast: usize, slow: usize, signal: usize) -> usize {
    (rsi_period + 1).max(slow.max(fast) + signal)
}

/// Oversold RSI with MACD above its signal buys; overbought RSI with MACD
/// below its signal sells.
#[derive(Debug, Clone)]
pub struct RsiMacdRule {
    pub rsi_period: usize,
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for RsiMacdRule {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl SignalRule for RsiMacdRule {
    fn name(&self) -> &'static str {
        "rsi_macd"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Composite
    }

    fn min_bars(&self) -> usize {
        combined_min_bars(self.rsi_period, self.fast_period, self.slow_period, self.signal_period)
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let r = latest_readings(
            series,
            self.rsi_period,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );
        let (Some(rsi), Some(macd), Some(signal)) = (r.rsi, r.macd, r.signal) else {
            return Ok(Signal::Hold);
        };
        Ok(if rsi < RSI_OVERSOLD && macd > signal {
            Signal::Buy
        } else if rsi > RSI_OVERBOUGHT && macd < signal {
            Signal::Sell
        } else {
            Signal::Hold
        })
    }
}

/// RSI and MACD vote separately; the rule only speaks when both votes exist
/// and agree.
#[derive(Debug, Clone)]
pub struct TwoStepRule {
    pub rsi_period: usize,
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for TwoStepRule {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl SignalRule for TwoStepRule {
    fn name(&self) -> &'static str {
        "two_step"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Composite
    }

    fn min_bars(&self) -> usize {
        combined_min_bars(self.rsi_period, self.fast_period, self.slow_period, self.signal_period)
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let r = latest_readings(
            series,
            self.rsi_period,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );

        let rsi_vote = match r.rsi {
            Some(rsi) if rsi < RSI_OVERSOLD => Some(Signal::Buy),
            Some(rsi) if rsi > RSI_OVERBOUGHT => Some(Signal::Sell),
            _ => None,
        };
        let macd_vote = match (r.macd, r.signal) {
            (Some(m), Some(s)) if m > s => Some(Signal::Buy),
            (Some(m), Some(s)) if m < s => Some(Signal::Sell),
            _ => None,
        };

        Ok(match (rsi_vote, macd_vote) {
            (Some(a), Some(b)) if a == b => a,
            _ => Signal::Hold,
        })
    }
}
