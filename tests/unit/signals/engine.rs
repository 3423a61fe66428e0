//! Unit tests for the signal engine

use quorum::indicators::IndicatorError;
use quorum::models::Signal;
use quorum::signals::{EngineError, SignalEngine, SignalPool};

use crate::support::*;

fn weights(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs.iter().map(|(n, w)| (n.to_string(), *w)).collect()
}

#[test]
fn from_weights_skips_the_learned_signal() {
    let engine = SignalEngine::from_weights(&weights(&[("rsi_static", 1), ("ml", 2), ("macd", 1)])).unwrap();
    assert_eq!(engine.rule_names(), vec!["rsi_static", "macd"]);
}

#[test]
fn from_weights_rejects_unknown_rules() {
    let result = SignalEngine::from_weights(&weights(&[("vwap", 1)]));
    assert_eq!(result.err(), Some(EngineError::UnknownRule("vwap".to_string())));
}

#[test]
fn collect_votes_separates_skipped_rules() {
    let engine = SignalEngine::from_weights(&weights(&[("rsi_static", 1), ("bollinger", 3)])).unwrap();
    let series = series_from_closes(&declining(30));

    let result = engine.collect_votes(&series);
    assert_eq!(result.votes.len(), 1);
    assert_eq!(result.votes[0].name, "rsi_static");
    assert_eq!(result.votes[0].decision, Signal::Buy);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].name, "bollinger");
    assert_eq!(
        result.skipped[0].reason,
        IndicatorError::InsufficientData {
            required: 51,
            available: 30
        }
    );
}

#[test]
fn applied_votes_carry_weights() {
    let engine = SignalEngine::from_weights(&weights(&[("rsi_static", 4)])).unwrap();
    let series = series_from_closes(&declining(30));

    let mut pool = SignalPool::new();
    engine.collect_votes(&series).apply(&mut pool);
    assert_eq!(pool.get("rsi_static").map(|v| v.weight), Some(4));
    assert_eq!(pool.get_combined_signal(), Signal::Buy);
}
