//! Optional TOML configuration for the training and inference binaries.
//!
//! Config keys (TOML): `dataset_path`, `artifact_dir`, `[split]`, `[forest]`.
//! Every key has a default, and a missing file means "all defaults", which reproduces the fixed
//! file names the pipelines have always used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::forest::ForestOptions;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "booking-forecast.toml";
/// Dataset read by the training pipeline.
pub const DEFAULT_DATASET_PATH: &str = "customer_booking.csv";
/// Seed shared by the evaluation split and the forest.
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Settings for a training run and for locating its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    /// Directory holding the three artifact files.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default)]
    pub forest: ForestSettings,
}

/// Evaluation split settings.
///
/// Config keys: `test_fraction`, `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSettings {
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Random forest hyperparameters.
///
/// Config keys: `n_trees`, `max_depth`, `min_samples_split`, `max_features`, `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSettings {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default)]
    pub max_features: Option<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            artifact_dir: default_artifact_dir(),
            split: SplitSettings::default(),
            forest: ForestSettings::default(),
        }
    }
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_seed(),
        }
    }
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            max_features: None,
            seed: default_seed(),
        }
    }
}

impl ForestSettings {
    pub fn to_options(&self) -> ForestOptions {
        ForestOptions {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
            bootstrap: true,
            seed: self.seed,
        }
    }
}

impl TrainingConfig {
    /// Load `booking-forecast.toml` from the working directory, or defaults if it is absent.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    /// Load settings from `path`, returning defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let fraction = self.split.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(format!("split.test_fraction must be in (0, 1), got {fraction}"));
        }
        if self.forest.n_trees == 0 {
            return Err("forest.n_trees must be > 0".to_string());
        }
        if self.forest.max_features == Some(0) {
            return Err("forest.max_features must be > 0".to_string());
        }
        Ok(())
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_PATH)
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_test_fraction() -> f64 {
    DEFAULT_TEST_FRACTION
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_n_trees() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = TrainingConfig::load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.dataset_path, PathBuf::from("customer_booking.csv"));
        assert_eq!(config.forest.to_options(), ForestOptions::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "artifact_dir = \"models\"\n\n[forest]\nn_trees = 25\nmax_depth = 12\n")
            .unwrap();
        let config = TrainingConfig::load_from(&path).unwrap();
        assert_eq!(config.artifact_dir, PathBuf::from("models"));
        assert_eq!(config.forest.n_trees, 25);
        assert_eq!(config.forest.max_depth, Some(12));
        assert_eq!(config.split, SplitSettings::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[split]\ntest_fraction = 1.5\n").unwrap();
        assert!(matches!(
            TrainingConfig::load_from(&path).unwrap_err(),
            ConfigError::Invalid { .. }
        ));
        std::fs::write(&path, "[forest]\nn_trees = \"many\"\n").unwrap();
        assert!(matches!(
            TrainingConfig::load_from(&path).unwrap_err(),
            ConfigError::ParseToml { .. }
        ));
    }
}
