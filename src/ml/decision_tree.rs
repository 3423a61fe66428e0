//! Binary classification tree (Gini impurity, midpoint thresholds).

use crate::ml::features::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Share of class-1 samples that reached this leaf
        positive: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct Split {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<Node>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self { config, root: None }
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    pub fn fit(&mut self, dataset: &Dataset) {
        let indices: Vec<usize> = (0..dataset.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build(dataset, &indices, 0, &mut rng));
    }

    fn build(&self, dataset: &Dataset, indices: &[usize], depth: usize, rng: &mut ChaCha8Rng) -> Node {
        let positive = positive_share(dataset, indices);
        let impurity = gini(positive);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-10
        {
            return Node::Leaf { positive };
        }

        match self.best_split(dataset, indices, impurity, rng) {
            Some(split)
                if split.left.len() >= self.config.min_samples_leaf
                    && split.right.len() >= self.config.min_samples_leaf =>
            {
                let left = self.build(dataset, &split.left, depth + 1, rng);
                let right = self.build(dataset, &split.right, depth + 1, rng);
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            _ => Node::Leaf { positive },
        }
    }

    fn best_split(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<Split> {
        let n_features = dataset.n_features();
        let mut candidates: Vec<usize> = (0..n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(self.config.max_features.unwrap_or(n_features).max(1));

        let mut best_gain = 0.0;
        let mut best: Option<Split> = None;

        for &feature in &candidates {
            let mut values: Vec<f64> = indices.iter().map(|&i| dataset.features[i][feature]).collect();
            values.sort_by(f64::total_cmp);
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| dataset.features[i][feature] <= threshold);
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let n = indices.len() as f64;
                let weighted = (left.len() as f64 * gini(positive_share(dataset, &left))
                    + right.len() as f64 * gini(positive_share(dataset, &right)))
                    / n;
                let gain = parent_impurity - weighted;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some(Split {
                        feature,
                        threshold,
                        left,
                        right,
                    });
                }
            }
        }

        best
    }

    /// Probability of class 1. Unfitted trees answer 0.5.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(root) => root,
            None => return 0.5,
        };
        loop {
            match node {
                Node::Leaf { positive } => return *positive,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(f64::NAN);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features) > 0.5)
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map(walk).unwrap_or(0)
    }
}

fn positive_share(dataset: &Dataset, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let positives = indices.iter().filter(|&&i| dataset.labels[i] == 1).count();
    positives as f64 / indices.len() as f64
}

fn gini(positive: f64) -> f64 {
    1.0 - positive * positive - (1.0 - positive) * (1.0 - positive)
}
