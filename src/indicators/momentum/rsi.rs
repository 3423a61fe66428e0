//! RSI (Relative Strength Index) indicator
//!
//! RSI = 100 - (100 / (1 + RS)), RS = average gain / average loss over the
//! deltas ending at a bar. A window without losses has no defined RSI.

use crate::common::math;
use crate::indicators::error::{ensure_history, IndicatorError};
use crate::indicators::registry::{IndicatorCategory, SignalRule};
use crate::models::{DynamicRsiSeries, PriceSeries, Signal};

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// RSI at bar `end` using the `period` deltas that end there.
pub fn rsi_at(closes: &[f64], end: usize, period: usize) -> Option<f64> {
    if period == 0 || end < period || end >= closes.len() {
        return None;
    }

    let mut gain = 0.0;
    let mut loss = 0.0;
    for i in (end + 1 - period)..=end {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gain += change;
        } else {
            loss -= change;
        }
    }

    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;
    if avg_loss == 0.0 {
        return None;
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// Calculate RSI for every bar with a fixed period
pub fn calculate_rsi(series: &PriceSeries, period: usize) -> Vec<Option<f64>> {
    let closes = series.closes();
    (0..closes.len())
        .map(|end| rsi_at(&closes, end, period))
        .collect()
}

/// RSI whose period stretches with realized volatility.
///
/// Each bar gets `round(base * (1 + vol / threshold))` (at least 2), where
/// `vol` is the rolling sample std of close-to-close returns over `base_period`
/// bars; bars without a volatility reading fall back to `base_period`.
pub fn calculate_dynamic_rsi(
    series: &PriceSeries,
    base_period: usize,
    volatility_threshold: f64,
) -> DynamicRsiSeries {
    let closes = series.closes();
    let volatility = math::rolling_std_opt(&math::pct_change(&closes), base_period);

    let period: Vec<usize> = volatility
        .iter()
        .map(|vol| {
            let scaled = vol
                .filter(|v| v.is_finite() && volatility_threshold > 0.0)
                .map(|v| (base_period as f64 * (1.0 + v / volatility_threshold)).round() as usize)
                .unwrap_or(base_period);
            scaled.max(2)
        })
        .collect();

    let rsi = period
        .iter()
        .enumerate()
        .map(|(end, &p)| rsi_at(&closes, end, p))
        .collect();

    DynamicRsiSeries {
        volatility,
        period,
        rsi,
    }
}

pub fn rsi_decision(rsi: Option<f64>, oversold: f64, overbought: f64) -> Signal {
    match rsi {
        Some(value) if value < oversold => Signal::Buy,
        Some(value) if value > overbought => Signal::Sell,
        _ => Signal::Hold,
    }
}

/// Fixed-period RSI threshold rule
#[derive(Debug, Clone)]
pub struct RsiRule {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiRule {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: RSI_OVERSOLD,
            overbought: RSI_OVERBOUGHT,
        }
    }
}

impl SignalRule for RsiRule {
    fn name(&self) -> &'static str {
        "rsi_static"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_bars(&self) -> usize {
        self.period + 1
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let closes = series.closes();
        let rsi = rsi_at(&closes, closes.len() - 1, self.period);
        Ok(rsi_decision(rsi, self.oversold, self.overbought))
    }
}

/// Volatility-scaled RSI threshold rule
#[derive(Debug, Clone)]
pub struct DynamicRsiRule {
    pub base_period: usize,
    pub volatility_threshold: f64,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for DynamicRsiRule {
    fn default() -> Self {
        Self {
            base_period: 14,
            volatility_threshold: 0.02,
            oversold: RSI_OVERSOLD,
            overbought: RSI_OVERBOUGHT,
        }
    }
}

impl SignalRule for DynamicRsiRule {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn category(&self) -> IndicatorCategory {
        IndicatorCategory::Momentum
    }

    fn min_bars(&self) -> usize {
        self.base_period + 1
    }

    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        ensure_history(series.len(), self.min_bars())?;
        let result = calculate_dynamic_rsi(series, self.base_period, self.volatility_threshold);

        let last = series.len() - 1;
        let period = result.period[last];
        // Volatility can stretch the latest period past the available history.
        ensure_history(series.len(), period + 1)?;

        Ok(rsi_decision(result.rsi[last], self.oversold, self.overbought))
    }
}
