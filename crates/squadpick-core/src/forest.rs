// Random forest regression.
//
// An ensemble of CART regression trees: each tree is grown on a bootstrap
// resample of the training rows, choosing at every node the split that most
// reduces the sum of squared errors among a (possibly random) subset of the
// features. The forest prediction is the mean of the tree predictions.
//
// Randomness comes only from the seeded generators created in `fit`, so a
// fixed `ForestParams::seed` gives identical models for identical inputs
// (for a given `rand` release; `StdRng`'s algorithm is not pinned across
// major versions).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Parameters and errors
// ---------------------------------------------------------------------------

/// Shape of the forest and its random seed.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows each tree until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; `None` tries all of them.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ForestError {
    #[error("cannot fit a forest on an empty training set")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    RaggedFeatures {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("training data contains a non-finite value at row {row}")]
    NonFiniteInput { row: usize },

    #[error("invalid forest parameter: {0}")]
    InvalidParams(String),
}

impl ForestParams {
    fn validate(&self) -> Result<(), ForestError> {
        if self.n_trees == 0 {
            return Err(ForestError::InvalidParams("n_trees must be > 0".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ForestError::InvalidParams(
                "min_samples_split must be >= 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForestError::InvalidParams(
                "min_samples_leaf must be >= 1".into(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ForestError::InvalidParams(
                "max_features must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Regression tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART regression tree stored as a flat node arena (root at 0).
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Predict by walking from the root; `row[feature] <= threshold` goes left.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// A candidate split found while scanning one feature.
struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Number of sorted samples going left.
    left_len: usize,
    sse: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    params: &'a ForestParams,
    n_features: usize,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `samples` and return its node index.
    fn build(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let n = samples.len();
        let (sum, sum_sq) = samples.iter().fold((0.0, 0.0), |(s, q), &i| {
            (s + self.y[i], q + self.y[i] * self.y[i])
        });
        let mean = sum / n as f64;
        let node_sse = sum_sq - sum * sum / n as f64;

        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || n < self.params.min_samples_split || node_sse <= 1e-12 {
            return idx;
        }

        // No split exists when every sample shares the same feature values.
        let Some(best) = self.best_split(samples) else {
            return idx;
        };

        let feature = best.feature;
        let x = self.x;
        samples.sort_by(|&a, &b| {
            x[a][feature]
                .partial_cmp(&x[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let (left_samples, right_samples) = samples.split_at_mut(best.left_len);
        let left = self.build(left_samples, depth + 1);
        let right = self.build(right_samples, depth + 1);

        self.nodes[idx] = Node::Split {
            feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        match self.params.max_features {
            Some(k) if k < self.n_features => {
                rand::seq::index::sample(&mut self.rng, self.n_features, k).into_vec()
            }
            _ => (0..self.n_features).collect(),
        }
    }

    fn best_split(&mut self, samples: &[usize]) -> Option<BestSplit> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf;
        let features = self.candidate_features();
        let mut order: Vec<usize> = samples.to_vec();
        let mut best: Option<BestSplit> = None;

        let total_sum: f64 = samples.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = samples.iter().map(|&i| self.y[i] * self.y[i]).sum();

        for feature in features {
            let x = self.x;
            order.sort_by(|&a, &b| {
                x[a][feature]
                    .partial_cmp(&x[b][feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..n {
                let yi = self.y[order[k - 1]];
                left_sum += yi;
                left_sq += yi * yi;

                if k < min_leaf || n - k < min_leaf {
                    continue;
                }
                let lo = x[order[k - 1]][feature];
                let hi = x[order[k]][feature];
                if lo >= hi {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / k as f64)
                    + (right_sq - right_sum * right_sum / (n - k) as f64);

                if best.as_ref().map_or(true, |b| sse < b.sse) {
                    let mut threshold = (lo + hi) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        left_len: k,
                        sse,
                    });
                }
            }
        }
        best
    }
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// Bagged ensemble of regression trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit on feature rows `x` and targets `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Result<Self, ForestError> {
        params.validate()?;
        if x.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ForestError::LengthMismatch {
                rows: x.len(),
                targets: y.len(),
            });
        }
        let n_features = x[0].len();
        if n_features == 0 {
            return Err(ForestError::InvalidParams("rows have no features".into()));
        }
        for (row, (features, target)) in x.iter().zip(y).enumerate() {
            if features.len() != n_features {
                return Err(ForestError::RaggedFeatures {
                    row,
                    expected: n_features,
                    found: features.len(),
                });
            }
            if !target.is_finite() || features.iter().any(|v| !v.is_finite()) {
                return Err(ForestError::NonFiniteInput { row });
            }
        }

        let n = x.len();
        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let mut samples: Vec<usize> = if params.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };

            let mut builder = TreeBuilder {
                x,
                y,
                params,
                n_features,
                rng,
                nodes: Vec::new(),
            };
            builder.build(&mut samples, 0);
            trees.push(RegressionTree {
                nodes: builder.nodes,
            });
        }

        debug!(
            trees = trees.len(),
            rows = n,
            features = n_features,
            seed = params.seed,
            "fitted random forest"
        );

        Ok(RandomForest { trees, n_features })
    }

    /// Mean prediction over all trees.
    pub fn predict(&self, row: &[f64]) -> Result<f64, ForestError> {
        if row.len() != self.n_features {
            return Err(ForestError::RaggedFeatures {
                row: 0,
                expected: self.n_features,
                found: row.len(),
            });
        }
        let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        Ok(total / self.trees.len() as f64)
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
