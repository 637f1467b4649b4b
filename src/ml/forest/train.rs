use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use thiserror::Error;

use super::model::{DecisionTree, ForestModel, Node};

/// Training hyperparameters for the random forest.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestOptions {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may split.
    pub min_samples_split: usize,
    /// Features tried per split; `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree.
    pub bootstrap: bool,
    /// Master seed; per-tree seeds are drawn from it.
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// In-memory dataset used for training and evaluation.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Ordered feature names; every row has this many values.
    pub feature_names: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Binary labels (`0` or `1`) aligned with `x`.
    pub y: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForestError {
    #[error("empty training set")]
    Empty,
    #[error("mismatched training inputs/labels ({x} rows, {y} labels)")]
    Mismatched { x: usize, y: usize },
    #[error("row {row} has {got} features (expected {expected})")]
    RowWidth {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("row {row} has non-binary label {label}")]
    InvalidLabel { row: usize, label: u8 },
    #[error("forest needs at least one tree")]
    NoTrees,
}

/// Grow a seeded random forest of Gini-impurity classification trees.
pub fn train_forest(
    dataset: &TrainDataset,
    options: &ForestOptions,
) -> Result<ForestModel, ForestError> {
    validate_dataset(dataset)?;
    if options.n_trees == 0 {
        return Err(ForestError::NoTrees);
    }
    let n = dataset.x.len();
    let d = dataset.feature_names.len();
    let max_features = options
        .max_features
        .unwrap_or_else(|| (d as f64).sqrt().floor() as usize)
        .clamp(1, d);

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.n_trees);
    for tree_idx in 0..options.n_trees {
        let tree_seed: u64 = rng.random();
        let mut tree_rng = StdRng::seed_from_u64(tree_seed);
        let mut sample: Vec<usize> = if options.bootstrap {
            (0..n).map(|_| tree_rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        let mut builder = TreeBuilder {
            x: &dataset.x,
            y: &dataset.y,
            n_features: d,
            max_features,
            max_depth: options.max_depth,
            min_samples_split: options.min_samples_split.max(2),
            rng: tree_rng,
            nodes: Vec::new(),
        };
        builder.grow(&mut sample, 0);
        let tree = DecisionTree {
            nodes: builder.nodes,
        };
        tracing::trace!(tree = tree_idx, nodes = tree.nodes.len(), depth = tree.depth(), "Grew tree");
        trees.push(tree);
    }

    Ok(ForestModel {
        model_version: 1,
        feature_names: dataset.feature_names.clone(),
        seed: options.seed,
        trees,
    })
}

fn validate_dataset(dataset: &TrainDataset) -> Result<(), ForestError> {
    if dataset.x.len() != dataset.y.len() {
        return Err(ForestError::Mismatched {
            x: dataset.x.len(),
            y: dataset.y.len(),
        });
    }
    if dataset.x.is_empty() || dataset.feature_names.is_empty() {
        return Err(ForestError::Empty);
    }
    let expected = dataset.feature_names.len();
    for (row, values) in dataset.x.iter().enumerate() {
        if values.len() != expected {
            return Err(ForestError::RowWidth {
                row,
                expected,
                got: values.len(),
            });
        }
    }
    if let Some((row, &label)) = dataset.y.iter().enumerate().find(|(_, label)| **label > 1) {
        return Err(ForestError::InvalidLabel { row, label });
    }
    Ok(())
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f32>],
    y: &'a [u8],
    n_features: usize,
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    rng: StdRng,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    score: f64,
    feature: usize,
    threshold: f32,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `indices` and return its node index.
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> u32 {
        let node_idx = self.nodes.len() as u32;
        let total = indices.len();
        let positives = indices.iter().filter(|&&i| self.y[i] == 1).count();
        let leaf = Node::Leaf {
            positive: if total == 0 {
                0.0
            } else {
                positives as f32 / total as f32
            },
            samples: total as u32,
        };
        self.nodes.push(leaf);

        let pure = positives == 0 || positives == total;
        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || total < self.min_samples_split {
            return node_idx;
        }
        let Some(split) = self.best_split(indices, positives) else {
            return node_idx;
        };

        let x = self.x;
        let mid = partition(indices, |i| x[i][split.feature] <= split.threshold);
        if mid == 0 || mid == total {
            return node_idx;
        }
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);
        self.nodes[node_idx as usize] = Node::Split {
            feature: split.feature as u16,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }

    /// Search a random subset of features for the split with the lowest weighted Gini impurity.
    ///
    /// Features that are constant inside the node do not count towards `max_features`.
    fn best_split(&mut self, indices: &[usize], positives: usize) -> Option<BestSplit> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(&mut self.rng);

        let n = indices.len();
        let mut order = indices.to_vec();
        let mut best: Option<BestSplit> = None;
        let mut visited = 0usize;
        for feature in features {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            order.copy_from_slice(indices);
            order.sort_unstable_by(|&a, &b| cmp_nan_last(self.x[a][feature], self.x[b][feature]));
            let first = self.x[order[0]][feature];
            let last = self.x[order[n - 1]][feature];
            if first == last || (first.is_nan() && last.is_nan()) {
                continue;
            }
            visited += 1;

            let mut left_pos = 0usize;
            for i in 0..n - 1 {
                if self.y[order[i]] == 1 {
                    left_pos += 1;
                }
                let value = self.x[order[i]][feature];
                let next = self.x[order[i + 1]][feature];
                if value.is_nan() {
                    break;
                }
                if next == value {
                    continue;
                }
                let left_n = i + 1;
                let score = weighted_gini(left_pos, left_n)
                    + weighted_gini(positives - left_pos, n - left_n);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(BestSplit {
                        score,
                        feature,
                        threshold: threshold_between(value, next),
                    });
                }
            }
        }
        best
    }
}

/// `n * gini` for a node with `positives` out of `n` samples.
fn weighted_gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n_f = n as f64;
    let p = positives as f64 / n_f;
    n_f * (1.0 - p * p - (1.0 - p) * (1.0 - p))
}

fn threshold_between(value: f32, next: f32) -> f32 {
    if next.is_nan() {
        return value;
    }
    let mid = value + (next - value) / 2.0;
    if mid >= next { value } else { mid }
}

fn cmp_nan_last(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// Move every index satisfying `goes_left` to the front; returns how many moved.
fn partition(indices: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0usize;
    for i in 0..indices.len() {
        if goes_left(indices[i]) {
            indices.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_like_dataset() -> TrainDataset {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..80 {
            let a = (i % 2) as f32;
            let b = ((i / 2) % 2) as f32;
            let noise = (i % 7) as f32;
            x.push(vec![a, b, noise]);
            y.push(if a != b { 1 } else { 0 });
        }
        TrainDataset {
            feature_names: vec!["a".into(), "b".into(), "noise".into()],
            x,
            y,
        }
    }

    #[test]
    fn single_tree_without_bootstrap_fits_training_data() {
        let dataset = xor_like_dataset();
        let options = ForestOptions {
            n_trees: 1,
            bootstrap: false,
            max_features: Some(3),
            ..ForestOptions::default()
        };
        let model = train_forest(&dataset, &options).unwrap();
        model.validate().unwrap();
        for (row, &label) in dataset.x.iter().zip(&dataset.y) {
            assert_eq!(model.predict_label(row), label);
        }
    }

    #[test]
    fn same_seed_grows_identical_forest() {
        let dataset = xor_like_dataset();
        let options = ForestOptions {
            n_trees: 10,
            ..ForestOptions::default()
        };
        let a = train_forest(&dataset, &options).unwrap();
        let b = train_forest(&dataset, &options).unwrap();
        assert_eq!(a, b);
        let c = train_forest(
            &dataset,
            &ForestOptions {
                seed: 7,
                ..options
            },
        )
        .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn max_depth_limits_trees() {
        let dataset = xor_like_dataset();
        let options = ForestOptions {
            n_trees: 5,
            max_depth: Some(1),
            ..ForestOptions::default()
        };
        let model = train_forest(&dataset, &options).unwrap();
        assert!(model.trees.iter().all(|tree| tree.depth() <= 1));
    }

    #[test]
    fn nan_values_route_right() {
        let dataset = TrainDataset {
            feature_names: vec!["day".into()],
            x: vec![vec![1.0], vec![2.0], vec![f32::NAN], vec![f32::NAN]],
            y: vec![0, 0, 1, 1],
        };
        let options = ForestOptions {
            n_trees: 1,
            bootstrap: false,
            ..ForestOptions::default()
        };
        let model = train_forest(&dataset, &options).unwrap();
        assert_eq!(model.predict_label(&[f32::NAN]), 1);
        assert_eq!(model.predict_label(&[1.5]), 0);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let mut dataset = xor_like_dataset();
        dataset.y[3] = 2;
        assert_eq!(
            train_forest(&dataset, &ForestOptions::default()).unwrap_err(),
            ForestError::InvalidLabel { row: 3, label: 2 }
        );
        let empty = TrainDataset {
            feature_names: vec!["a".into()],
            x: Vec::new(),
            y: Vec::new(),
        };
        assert_eq!(
            train_forest(&empty, &ForestOptions::default()).unwrap_err(),
            ForestError::Empty
        );
    }

    #[test]
    fn threshold_sits_between_values() {
        assert_eq!(threshold_between(1.0, 2.0), 1.5);
        assert_eq!(threshold_between(3.0, f32::NAN), 3.0);
    }
}
