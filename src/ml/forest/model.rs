use serde::{Deserialize, Serialize};

/// Node of a binary decision tree stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Internal split; `feature <= threshold` goes left, everything else (including `NaN`) right.
    Split {
        feature: u16,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// Terminal node holding the fraction of positive training samples that reached it.
    Leaf { positive: f32, samples: u32 },
}

/// Classification tree; node `0` is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    /// Positive-class fraction of the leaf `features` falls into.
    pub fn predict(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature as usize)
                        .copied()
                        .unwrap_or(f32::NAN);
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                Some(Node::Leaf { positive, .. }) => return *positive,
                None => return 0.0,
            }
        }
    }

    /// Depth of the deepest leaf (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match self.nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    stack.push((*left as usize, depth + 1));
                    stack.push((*right as usize, depth + 1));
                }
                Some(Node::Leaf { .. }) => max_depth = max_depth.max(depth),
                None => {}
            }
        }
        max_depth
    }

    fn validate(&self, feature_len: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature as usize >= feature_len {
                        return Err(format!("node {idx} splits on feature {feature}"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    // Children are always appended after their parent, which also rules out cycles.
                    for child in [*left as usize, *right as usize] {
                        if child <= idx || child >= n {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { positive, .. } => {
                    if !(0.0..=1.0).contains(positive) {
                        return Err(format!("leaf {idx} probability {positive} out of range"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Bagged ensemble of classification trees for a binary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Ordered feature names the trees index into.
    pub feature_names: Vec<String>,
    /// Seed the forest was grown from.
    pub seed: u64,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    /// Number of features each input row must provide.
    pub fn feature_len(&self) -> usize {
        self.feature_names.len()
    }

    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.feature_names.is_empty() {
            return Err("forest has no features".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_len())
                .map_err(|err| format!("tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Mean positive-class probability across trees.
    pub fn predict_proba(&self, features: &[f32]) -> f32 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict(features) as f64)
            .sum();
        (sum / self.trees.len() as f64) as f32
    }

    /// Binary decision at the 0.5 boundary; a tie resolves to the negative class.
    pub fn predict_label(&self, features: &[f32]) -> u8 {
        label_for_probability(self.predict_proba(features))
    }
}

/// Label for a positive-class probability, as arg-max over `[1 - p, p]` picks it.
pub fn label_for_probability(probability: f32) -> u8 {
    if probability > 0.5 { 1 } else { 0 }
}
