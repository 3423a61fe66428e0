//! Decision rule trait and the name registry used by configuration.

use crate::indicators::combined::{RsiMacdRule, TwoStepRule};
use crate::indicators::error::IndicatorError;
use crate::indicators::momentum::{DynamicRsiRule, MacdRule, RsiRule, StochasticRule};
use crate::indicators::volatility::{AtrRule, BollingerRule};
use crate::models::{PriceSeries, Signal};

/// Indicator category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorCategory {
    Momentum,
    Volatility,
    Composite,
}

/// A strategy that maps a price series to one categorical vote.
pub trait SignalRule: Send + Sync {
    /// Pool key for this rule's vote
    fn name(&self) -> &'static str;

    fn category(&self) -> IndicatorCategory;

    /// Bars required before `evaluate` can produce a decision
    fn min_bars(&self) -> usize;

    /// Inspect the latest bar(s) and decide. Fails with
    /// `IndicatorError::InsufficientData` when the series is too short.
    fn evaluate(&self, series: &PriceSeries) -> Result<Signal, IndicatorError>;
}

/// Rule names accepted in weight configuration, besides the learned signal.
pub const RULE_NAMES: &[&str] = &[
    "bollinger",
    "macd",
    "rsi",
    "rsi_static",
    "stochastic",
    "atr",
    "rsi_macd",
    "two_step",
];

/// Build a rule with default parameters from its configured name.
pub fn rule_by_name(name: &str) -> Option<Box<dyn SignalRule>> {
    let rule: Box<dyn SignalRule> = match name {
        "bollinger" => Box::new(BollingerRule::default()),
        "macd" => Box::new(MacdRule::default()),
        "rsi" => Box::new(DynamicRsiRule::default()),
        "rsi_static" => Box::new(RsiRule::default()),
        "stochastic" => Box::new(StochasticRule::default()),
        "atr" => Box::new(AtrRule::default()),
        "rsi_macd" => Box::new(RsiMacdRule::default()),
        "two_step" => Box::new(TwoStepRule::default()),
        _ => return None,
    };
    Some(rule)
}
