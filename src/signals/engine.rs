//! Evaluates the enabled decision rules against one price series.

use crate::indicators::registry::{rule_by_name, SignalRule};
use crate::indicators::IndicatorError;
use crate::models::{PriceSeries, Signal};
use crate::signals::pool::SignalPool;
use thiserror::Error;
use tracing::debug;

/// Pool key of the learned signal; not an indicator rule.
pub const LEARNED_SIGNAL_NAME: &str = "ml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown signal rule '{0}'")]
    UnknownRule(String),
}

struct WeightedRule {
    rule: Box<dyn SignalRule>,
    weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleVote {
    pub name: String,
    pub decision: Signal,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRule {
    pub name: String,
    pub reason: IndicatorError,
}

/// Outcome of one evaluation pass: the votes to register and the rules that
/// had no opinion this cycle.
#[derive(Debug, Clone, Default)]
pub struct RuleVotes {
    pub votes: Vec<RuleVote>,
    pub skipped: Vec<SkippedRule>,
}

impl RuleVotes {
    /// Register every collected vote in the pool.
    pub fn apply(&self, pool: &mut SignalPool) {
        for vote in &self.votes {
            pool.add_signal(vote.name.clone(), vote.decision, vote.weight);
        }
    }
}

#[derive(Default)]
pub struct SignalEngine {
    rules: Vec<WeightedRule>,
}

impl SignalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: Box<dyn SignalRule>, weight: u32) -> Self {
        self.rules.push(WeightedRule { rule, weight });
        self
    }

    /// Build the rule set from `(name, weight)` pairs. The learned signal's
    /// entry is ignored here; the trader votes for it separately.
    pub fn from_weights(weights: &[(String, u32)]) -> Result<Self, EngineError> {
        let mut engine = Self::new();
        for (name, weight) in weights {
            if name == LEARNED_SIGNAL_NAME {
                continue;
            }
            let rule = rule_by_name(name).ok_or_else(|| EngineError::UnknownRule(name.clone()))?;
            engine = engine.with_rule(rule, *weight);
        }
        Ok(engine)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule.name()).collect()
    }

    /// Evaluate every rule. Rules without enough history are reported as
    /// skipped instead of voting Hold.
    pub fn collect_votes(&self, series: &PriceSeries) -> RuleVotes {
        let mut result = RuleVotes::default();
        for entry in &self.rules {
            let name = entry.rule.name();
            match entry.rule.evaluate(series) {
                Ok(decision) => {
                    debug!(
                        rule = name,
                        category = ?entry.rule.category(),
                        decision = %decision,
                        weight = entry.weight,
                        "SignalEngine: {} voted {}",
                        name,
                        decision
                    );
                    result.votes.push(RuleVote {
                        name: name.to_string(),
                        decision,
                        weight: entry.weight,
                    });
                }
                Err(reason) => {
                    debug!(
                        rule = name,
                        error = %reason,
                        "SignalEngine: skipping {} this cycle",
                        name
                    );
                    result.skipped.push(SkippedRule {
                        name: name.to_string(),
                        reason,
                    });
                }
            }
        }
        result
    }
}
