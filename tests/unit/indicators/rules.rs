//! Decision rules on engineered series

use quorum::indicators::momentum::{DynamicRsiRule, MacdRule, RsiRule, StochasticRule};
use quorum::indicators::volatility::{AtrRule, BollingerRule};
use quorum::indicators::{rule_by_name, IndicatorError, SignalRule, RULE_NAMES};
use quorum::models::Signal;

use crate::support::*;

#[test]
fn rsi_buys_a_strictly_declining_series() {
    let series = series_from_closes(&declining(40));
    assert_eq!(RsiRule::default().evaluate(&series).unwrap(), Signal::Buy);
    assert_eq!(DynamicRsiRule::default().evaluate(&series).unwrap(), Signal::Buy);
}

#[test]
fn rsi_sells_an_overbought_rally() {
    let series = series_from_closes(&rising_with_dip(40));
    assert_eq!(RsiRule::default().evaluate(&series).unwrap(), Signal::Sell);
}

#[test]
fn rsi_holds_without_losses() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let series = series_from_closes(&closes);
    assert_eq!(RsiRule::default().evaluate(&series).unwrap(), Signal::Hold);
}

#[test]
fn rsi_requires_history() {
    let series = series_from_closes(&declining(10));
    assert_eq!(
        RsiRule::default().evaluate(&series),
        Err(IndicatorError::InsufficientData {
            required: 15,
            available: 10
        })
    );
    assert!(DynamicRsiRule::default().evaluate(&series).is_err());
}

#[test]
fn bollinger_buys_a_crash_below_the_band() {
    let mut closes: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
    closes.push(80.0);
    let series = series_from_closes(&closes);
    assert_eq!(BollingerRule::default().evaluate(&series).unwrap(), Signal::Buy);
}

#[test]
fn bollinger_sells_a_spike_above_the_band() {
    let mut closes: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
    closes.push(120.0);
    let series = series_from_closes(&closes);
    assert_eq!(BollingerRule::default().evaluate(&series).unwrap(), Signal::Sell);
}

#[test]
fn bollinger_holds_inside_the_bands() {
    let closes: Vec<f64> = (0..61).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
    let series = series_from_closes(&closes);
    assert_eq!(BollingerRule::default().evaluate(&series).unwrap(), Signal::Hold);
}

#[test]
fn bollinger_needs_the_trend_window() {
    let series = series_from_closes(&declining(50));
    assert_eq!(
        BollingerRule::default().evaluate(&series),
        Err(IndicatorError::InsufficientData {
            required: 51,
            available: 50
        })
    );
}

#[test]
fn macd_follows_momentum_turns() {
    let rule = MacdRule::default();
    assert_eq!(rule.evaluate(&series_from_closes(&decelerating_decline())).unwrap(), Signal::Buy);
    assert_eq!(rule.evaluate(&series_from_closes(&decelerating_rally())).unwrap(), Signal::Sell);
}

#[test]
fn macd_holds_on_a_flat_series() {
    let series = series_from_closes(&[100.0; 50]);
    assert_eq!(MacdRule::default().evaluate(&series).unwrap(), Signal::Hold);
}

#[test]
fn macd_requires_signal_line_history() {
    let rule = MacdRule::default();
    assert_eq!(rule.min_bars(), 35);
    assert!(rule.evaluate(&series_from_closes(&[100.0; 34])).is_err());
}

#[test]
fn stochastic_buys_an_uptick_from_the_bottom() {
    let mut closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
    let last = *closes.last().unwrap();
    closes.push(last + 0.3);
    let series = series_from_closes(&closes);
    assert_eq!(StochasticRule::default().evaluate(&series).unwrap(), Signal::Buy);
}

#[test]
fn stochastic_sells_a_downtick_from_the_top() {
    let mut closes: Vec<f64> = (0..30).map(|i| 70.0 + i as f64).collect();
    let last = *closes.last().unwrap();
    closes.push(last - 0.3);
    let series = series_from_closes(&closes);
    assert_eq!(StochasticRule::default().evaluate(&series).unwrap(), Signal::Sell);
}

#[test]
fn stochastic_holds_on_a_flat_range() {
    // high == low on every bar: %K is undefined, not an error
    let series = ranges(&[0.0; 20]);
    assert_eq!(StochasticRule::default().evaluate(&series), Ok(Signal::Hold));
}

#[test]
fn atr_buys_rising_but_below_average_volatility() {
    let mut widths = vec![10.0; 30];
    widths.extend(vec![1.0; 30]);
    widths.push(2.0);
    assert_eq!(AtrRule::default().evaluate(&ranges(&widths)).unwrap(), Signal::Buy);
}

#[test]
fn atr_sells_falling_but_above_average_volatility() {
    let mut widths = vec![1.0; 30];
    widths.extend(vec![10.0; 30]);
    widths.push(9.0);
    assert_eq!(AtrRule::default().evaluate(&ranges(&widths)).unwrap(), Signal::Sell);
}

#[test]
fn atr_requires_two_extra_bars() {
    let rule = AtrRule::default();
    assert_eq!(rule.min_bars(), 16);
    assert!(rule.evaluate(&ranges(&[1.0; 15])).is_err());
    assert!(rule.evaluate(&ranges(&[1.0; 16])).is_ok());
}

#[test]
fn registry_builds_every_named_rule() {
    for name in RULE_NAMES {
        let rule = rule_by_name(name).unwrap_or_else(|| panic!("missing rule {}", name));
        assert_eq!(rule.name(), *name);
    }
    assert!(rule_by_name("ml").is_none());
    assert!(rule_by_name("vwap").is_none());
}

#[test]
fn rules_never_hold_on_short_series() {
    let series = series_from_closes(&[100.0, 99.0]);
    for name in RULE_NAMES {
        let rule = rule_by_name(name).unwrap();
        assert!(
            matches!(rule.evaluate(&series), Err(IndicatorError::InsufficientData { .. })),
            "{} should report missing history",
            name
        );
    }
}
