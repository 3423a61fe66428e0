//! Unit tests for the weighted vote pool

use quorum::models::Signal;
use quorum::signals::{SignalPool, Vote};

#[test]
fn empty_pool_holds() {
    assert_eq!(SignalPool::new().get_combined_signal(), Signal::Hold);
}

#[test]
fn equal_weights_tie_to_hold() {
    let mut pool = SignalPool::new();
    pool.add_signal("a", Signal::Buy, 1);
    pool.add_signal("b", Signal::Sell, 1);
    assert_eq!(pool.get_combined_signal(), Signal::Hold);
}

#[test]
fn hold_votes_do_not_count() {
    let mut pool = SignalPool::new();
    pool.add_signal("a", Signal::Buy, 3);
    pool.add_signal("b", Signal::Sell, 1);
    pool.add_signal("c", Signal::Hold, 5);
    assert_eq!(pool.get_combined_signal(), Signal::Buy);
}

#[test]
fn all_hold_is_hold() {
    let mut pool = SignalPool::new();
    pool.add_signal("a", Signal::Hold, 2);
    pool.add_signal("b", Signal::Hold, 7);
    assert_eq!(pool.get_combined_signal(), Signal::Hold);
}

#[test]
fn weighted_sell_beats_more_buyers() {
    let mut pool = SignalPool::new();
    pool.add_signal("bollinger", Signal::Buy, 1);
    pool.add_signal("macd", Signal::Buy, 1);
    pool.add_signal("ml", Signal::Sell, 3);
    assert_eq!(pool.get_combined_signal(), Signal::Sell);
}

#[test]
fn same_name_overwrites() {
    let mut pool = SignalPool::new();
    pool.add_signal("x", Signal::Buy, 1);
    pool.add_signal("x", Signal::Sell, 5);
    assert_eq!(pool.len(), 1);
    assert_eq!(
        pool.get("x"),
        Some(&Vote {
            decision: Signal::Sell,
            weight: 5
        })
    );
    assert_eq!(pool.get_combined_signal(), Signal::Sell);
}

#[test]
fn reset_empties_the_pool() {
    let mut pool = SignalPool::new();
    pool.add_signal("a", Signal::Buy, 4);
    pool.reset();
    assert!(pool.is_empty());
    assert_eq!(pool.get_combined_signal(), Signal::Hold);
    pool.reset();
    assert!(pool.is_empty());
}

#[test]
fn remove_ignores_unknown_names() {
    let mut pool = SignalPool::new();
    pool.add_signal("a", Signal::Sell, 1);
    assert_eq!(pool.remove_signal("missing"), None);
    assert_eq!(pool.len(), 1);
    assert!(pool.remove_signal("a").is_some());
    assert_eq!(pool.get_combined_signal(), Signal::Hold);
}

#[test]
fn votes_are_listed_by_name() {
    let mut pool = SignalPool::new();
    pool.add_signal("rsi", Signal::Buy, 1);
    pool.add_signal("atr", Signal::Hold, 1);
    let names: Vec<String> = pool.votes().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["atr".to_string(), "rsi".to_string()]);
}
