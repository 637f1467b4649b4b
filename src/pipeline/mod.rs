//! Training and inference pipelines built on the shared feature layout.
//!
//! Training writes a matched artifact set; inference loads it once into a [`Predictor`] and
//! replays the same encode → assemble → scale → predict sequence for single records.

pub mod artifacts;
pub mod features;
pub mod predict;
pub mod train;

pub use artifacts::{ArtifactError, ArtifactSet, load_artifacts, save_artifacts};
pub use predict::{InferenceError, Prediction, Predictor};
pub use train::{TrainingError, TrainingReport, run_training};
