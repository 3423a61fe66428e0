//! Bagged decision trees with per-split feature sampling.

use crate::ml::decision_tree::{DecisionTree, TreeConfig};
use crate::ml::features::Dataset;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split (ceil(sqrt(n)) if None)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    pub fn fit(&mut self, dataset: &Dataset) {
        let n_features = dataset.n_features();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize);

        self.trees = (0..self.config.n_trees)
            .map(|i| {
                let seed = self.config.seed.wrapping_add(i as u64);
                let mut tree = DecisionTree::new(TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed,
                });
                tree.fit(&bootstrap(dataset, seed));
                tree
            })
            .collect();
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean class-1 probability across trees.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        total / self.trees.len() as f64
    }

    pub fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features) > 0.5)
    }
}

/// Sample `len` rows with replacement.
fn bootstrap(dataset: &Dataset, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = dataset.len();
    let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    dataset.subset(&indices)
}
