//! Weighted-majority vote pool.
//!
//! Strategies register one named vote per cycle. Reduction sums the weights of
//! Buy and Sell votes; Hold votes never count toward either side, and a tie
//! (including an empty pool) reduces to Hold. The pool does no I/O and holds no
//! locks; the owner resets it once a cycle is complete.

use crate::models::Signal;
use serde::Serialize;
use std::collections::HashMap;

/// One strategy's decision and its voting weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub decision: Signal,
    pub weight: u32,
}

/// Weight totals per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub buy_weight: u64,
    pub sell_weight: u64,
    pub hold_weight: u64,
}

impl Tally {
    pub fn decision(&self) -> Signal {
        if self.buy_weight > self.sell_weight {
            Signal::Buy
        } else if self.sell_weight > self.buy_weight {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalPool {
    signals: HashMap<String, Vote>,
}

impl SignalPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the vote stored under `name`. A zero weight is
    /// kept; it simply adds nothing to either side.
    pub fn add_signal(&mut self, name: impl Into<String>, decision: Signal, weight: u32) {
        self.signals.insert(name.into(), Vote { decision, weight });
    }

    /// Remove a vote by name. Absent names are ignored.
    pub fn remove_signal(&mut self, name: &str) -> Option<Vote> {
        self.signals.remove(name)
    }

    pub fn tally(&self) -> Tally {
        self.signals
            .values()
            .fold(Tally::default(), |mut tally, vote| {
                let weight = u64::from(vote.weight);
                match vote.decision {
                    Signal::Buy => tally.buy_weight += weight,
                    Signal::Sell => tally.sell_weight += weight,
                    Signal::Hold => tally.hold_weight += weight,
                }
                tally
            })
    }

    /// Reduce the current votes to one decision.
    pub fn get_combined_signal(&self) -> Signal {
        self.tally().decision()
    }

    /// Drop every vote. Safe to call on an empty pool.
    pub fn reset(&mut self) {
        self.signals.clear();
    }

    pub fn get(&self, name: &str) -> Option<&Vote> {
        self.signals.get(name)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Votes sorted by name.
    pub fn votes(&self) -> Vec<(String, Vote)> {
        let mut votes: Vec<(String, Vote)> = self
            .signals
            .iter()
            .map(|(name, vote)| (name.clone(), *vote))
            .collect();
        votes.sort_by(|a, b| a.0.cmp(&b.0));
        votes
    }
}
