//! Learned signal: feature extraction, tree classifiers and the adapter that
//! turns a prediction into a vote.

pub mod decision_tree;
pub mod features;
pub mod model;
pub mod random_forest;

pub use features::{FeatureSet, SMA_FAST, SMA_SLOW};
pub use model::{LearnedSignal, ModelConfig, ModelKind, ModelReport};
