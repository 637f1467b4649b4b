//! Deterministic random-forest classifier for the binary booking outcome.
//!
//! Trees are grown CART-style on bootstrap samples with Gini impurity and a random feature
//! subset per split. All randomness comes from one seed, so a fixed seed reproduces the model
//! exactly. Models export to and load from JSON.

mod model;
mod train;

pub use model::{DecisionTree, ForestModel, Node, label_for_probability};
pub use train::{ForestError, ForestOptions, TrainDataset, train_forest};
