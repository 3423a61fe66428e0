//! Learned signal adapter: trains once, then maps the latest bar to Buy/Sell.

use crate::indicators::IndicatorError;
use crate::ml::decision_tree::{DecisionTree, TreeConfig};
use crate::ml::features::{build_dataset, latest_features, Dataset, FeatureSet};
use crate::ml::random_forest::{ForestConfig, RandomForest};
use crate::models::{PriceSeries, Signal};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Rows needed after feature warmup before a model is fitted.
pub const MIN_TRAINING_SAMPLES: usize = 10;
pub const TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    DecisionTree,
}

impl ModelKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random_forest" => Some(ModelKind::RandomForest),
            "decision_tree" => Some(ModelKind::DecisionTree),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::DecisionTree => "decision_tree",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub features: FeatureSet,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::RandomForest,
            features: FeatureSet::Full,
            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Bars needed before `LearnedSignal::train` can succeed.
    pub fn min_bars(&self) -> usize {
        self.features.warmup() + MIN_TRAINING_SAMPLES + 1
    }
}

/// Holdout evaluation of a freshly trained model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelReport {
    pub train_samples: usize,
    pub test_samples: usize,
    pub accuracy: f64,
    pub f1: f64,
}

#[derive(Debug, Clone)]
enum Classifier {
    Tree(DecisionTree),
    Forest(RandomForest),
}

impl Classifier {
    fn fit(config: &ModelConfig, dataset: &Dataset) -> Self {
        match config.kind {
            ModelKind::DecisionTree => {
                let mut tree = DecisionTree::new(TreeConfig {
                    seed: config.seed,
                    ..Default::default()
                });
                tree.fit(dataset);
                Classifier::Tree(tree)
            }
            ModelKind::RandomForest => {
                let mut forest = RandomForest::new(ForestConfig {
                    seed: config.seed,
                    ..Default::default()
                });
                forest.fit(dataset);
                Classifier::Forest(forest)
            }
        }
    }

    fn predict(&self, features: &[f64]) -> u8 {
        match self {
            Classifier::Tree(tree) => tree.predict(features),
            Classifier::Forest(forest) => forest.predict(features),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LearnedSignal {
    config: ModelConfig,
    classifier: Classifier,
    report: ModelReport,
}

impl LearnedSignal {
    /// Fit a classifier on `series`. Fails when too few labelled rows remain
    /// after feature warmup.
    pub fn train(series: &PriceSeries, config: &ModelConfig) -> Result<Self, IndicatorError> {
        let dataset = build_dataset(series, config.features);
        if dataset.len() < MIN_TRAINING_SAMPLES {
            return Err(IndicatorError::InsufficientData {
                required: config.min_bars(),
                available: series.len(),
            });
        }

        let (train_idx, test_idx) = train_test_split(dataset.len(), TEST_FRACTION, config.seed);
        let train = dataset.subset(&train_idx);
        let test = dataset.subset(&test_idx);

        let classifier = Classifier::fit(config, &train);
        let predicted: Vec<u8> = test.features.iter().map(|row| classifier.predict(row)).collect();
        let report = ModelReport {
            train_samples: train.len(),
            test_samples: test.len(),
            accuracy: accuracy(&test.labels, &predicted),
            f1: f1_score(&test.labels, &predicted),
        };

        info!(
            model = config.kind.as_str(),
            features = ?config.features,
            train_samples = report.train_samples,
            test_samples = report.test_samples,
            accuracy = report.accuracy,
            f1 = report.f1,
            "Model trained: accuracy {:.2}, F1 {:.2}",
            report.accuracy,
            report.f1
        );

        Ok(Self {
            config: *config,
            classifier,
            report,
        })
    }

    /// Buy when the classifier expects the next close to rise, Sell otherwise.
    pub fn predict(&self, series: &PriceSeries) -> Result<Signal, IndicatorError> {
        let features = latest_features(series, self.config.features).ok_or(
            IndicatorError::InsufficientData {
                required: self.config.features.warmup() + 1,
                available: series.len(),
            },
        )?;
        Ok(match self.classifier.predict(&features) {
            1 => Signal::Buy,
            _ => Signal::Sell,
        })
    }

    pub fn report(&self) -> &ModelReport {
        &self.report
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

/// Shuffled holdout split. The test side holds ceil(n * fraction) rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let train = indices.split_off(n_test.min(n));
    (train, indices)
}

pub fn accuracy(truth: &[u8], predicted: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// F1 of the positive class; 0 when undefined.
pub fn f1_score(truth: &[u8], predicted: &[u8]) -> f64 {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in truth.iter().zip(predicted) {
        match (t, p) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (1, 0) => fn_ += 1,
            _ => {}
        }
    }
    let denominator = 2 * tp + fp + fn_;
    if denominator == 0 {
        return 0.0;
    }
    (2 * tp) as f64 / denominator as f64
}
