//! Isolation forest outlier ensemble.
//!
//! Each tree recursively partitions a random sub-sample of the batch on a
//! random non-constant feature at a uniform split value. Points that end up
//! isolated after few splits receive high anomaly scores. The decision
//! offset is placed so that roughly `contamination` of the fitted batch is
//! labelled as outlier.

use crate::config::DetectionConfig;
use crate::error::AnomalyError;
use crate::models::detector::AnomalyDetector;
use crate::types::scored::AnomalyLabel;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful binary-search-tree lookup over `n` points
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// A single isolation tree stored as a node arena, root at index 0
#[derive(Debug, Clone)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grow a tree over the given rows of `x`
    pub fn fit(x: &Array2<f64>, rows: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, rows, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        rows: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if depth >= height_limit || rows.len() <= 1 {
            return id;
        }

        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|feature| {
                let (min, max) = rows.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(min, max), &row| {
                        let value = x[[row, feature]];
                        (min.min(value), max.max(value))
                    },
                );
                (max > min).then_some((feature, min, max))
            })
            .collect();

        // every remaining point is identical
        if candidates.is_empty() {
            return id;
        }

        let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(min..max);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| x[[row, feature]] <= threshold);

        let left = self.grow(x, left_rows, depth + 1, height_limit, rng);
        let right = self.grow(x, right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth at which `sample` lands, adjusted for the unsplit leaf size
    pub fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if sample[feature] <= threshold { left } else { right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(size),
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Isolation forest with a seeded, reproducible fit
#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    random_seed: u64,
    trees: Vec<IsolationTree>,
    sub_sample_size: usize,
    n_features: usize,
    /// Negated-score cut-off learned during `fit`
    offset: Option<f64>,
}

impl IsolationForest {
    pub fn new(n_estimators: usize, max_samples: usize, contamination: f64, random_seed: u64) -> Self {
        Self {
            n_estimators,
            max_samples,
            contamination,
            random_seed,
            trees: Vec::new(),
            sub_sample_size: 0,
            n_features: 0,
            offset: None,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.n_estimators,
            config.max_samples,
            config.contamination,
            config.random_seed,
        )
    }

    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }

    fn check_params(&self, x: &Array2<f64>) -> Result<(), AnomalyError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnomalyError::InvalidContamination(self.contamination));
        }
        if self.n_estimators == 0 {
            return Err(AnomalyError::EmptyEnsemble);
        }
        if self.max_samples == 0 {
            return Err(AnomalyError::InvalidMaxSamples);
        }
        if x.nrows() < 2 {
            return Err(AnomalyError::InsufficientSamples(x.nrows()));
        }
        if x.ncols() == 0 {
            return Err(AnomalyError::EmptyFeatureMatrix);
        }
        Ok(())
    }

    fn check_fitted(&self, x: &Array2<f64>) -> Result<(), AnomalyError> {
        if self.trees.is_empty() {
            return Err(AnomalyError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(AnomalyError::DimensionMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        Ok(())
    }

    fn anomaly_score(&self, sample: ArrayView1<f64>) -> f64 {
        let mean_depth = self
            .trees
            .iter()
            .map(|tree| tree.path_length(sample))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_depth / average_path_length(self.sub_sample_size))
    }
}

impl AnomalyDetector for IsolationForest {
    fn fit(&mut self, x: &Array2<f64>) -> Result<(), AnomalyError> {
        self.check_params(x)?;

        let n_samples = x.nrows();
        let sub_sample_size = self.max_samples.min(n_samples);
        let height_limit = (sub_sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.random_seed);

        self.trees = (0..self.n_estimators)
            .map(|_| {
                let rows = index::sample(&mut rng, n_samples, sub_sample_size).into_vec();
                IsolationTree::fit(x, rows, height_limit, &mut rng)
            })
            .collect();
        self.sub_sample_size = sub_sample_size;
        self.n_features = x.ncols();

        let negated: Vec<f64> = self.score_samples(x)?.iter().map(|score| -score).collect();
        self.offset = Some(percentile(negated, self.contamination * 100.0));
        Ok(())
    }

    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>, AnomalyError> {
        self.check_fitted(x)?;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.anomaly_score(row))
            .collect())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<AnomalyLabel>, AnomalyError> {
        let threshold = self.threshold().ok_or(AnomalyError::NotFitted)?;
        Ok(self
            .score_samples(x)?
            .iter()
            .map(|&score| {
                if score > threshold {
                    AnomalyLabel::Outlier
                } else {
                    AnomalyLabel::Inlier
                }
            })
            .collect())
    }

    fn threshold(&self) -> Option<f64> {
        self.offset.map(|offset| -offset)
    }
}

/// Linear-interpolation percentile, `q` in [0, 100]
fn percentile(mut values: Vec<f64>, q: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = q / 100.0 * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    values[lower] + (values[upper] - values[lower]) * (rank - lower as f64)
}
