//! SMA (Simple Moving Average) indicator

use crate::common::math;
use crate::models::PriceSeries;

/// Rolling mean of closes. Used as a feature and as the Bollinger trend line;
/// it has no standalone decision rule.
pub fn calculate_sma(series: &PriceSeries, period: usize) -> Vec<Option<f64>> {
    math::rolling_mean(&series.closes(), period)
}
