//! Persisted training artifacts: model, scaler, and encoder bundle.
//!
//! The three files are written together by one training run and stamped with the same run id.
//! Loading refuses any set whose files disagree on run id or format version.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

use crate::ml::encoder::EncoderBundle;
use crate::ml::forest::ForestModel;
use crate::ml::scaler::StandardScaler;
use crate::pipeline::features::{continuous_names, feature_names};

/// Artifact layout version written by this build.
pub const ARTIFACT_FORMAT_VERSION: i64 = 1;
pub const MODEL_FILE_NAME: &str = "airline_model.json";
pub const SCALER_FILE_NAME: &str = "scaler.json";
pub const ENCODERS_FILE_NAME: &str = "encoders.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact {path} is missing or unreadable: {source}")]
    Missing {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("artifact {path} is invalid: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("artifacts do not form a matched set: {0}")]
    Mismatch(String),
    #[error("refusing to use invalid {artifact}: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },
    #[error("failed to serialize artifact {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Provenance shared by all three files of one training run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub run_id: Uuid,
    /// RFC 3339 timestamp of the training run.
    pub trained_at: String,
    /// blake3 digest of the dataset file the run was trained on.
    pub dataset_blake3: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope<T> {
    format_version: i64,
    #[serde(flatten)]
    metadata: ArtifactMetadata,
    payload: T,
}

/// File locations of an artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub encoders: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILE_NAME),
            scaler: dir.join(SCALER_FILE_NAME),
            encoders: dir.join(ENCODERS_FILE_NAME),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.model, &self.scaler, &self.encoders]
            .into_iter()
            .map(PathBuf::as_path)
    }
}

/// A fitted model with the preprocessing it was trained behind.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub metadata: ArtifactMetadata,
    pub model: ForestModel,
    pub scaler: StandardScaler,
    pub encoders: EncoderBundle,
}

impl ArtifactSet {
    /// Check each payload and that model and scaler match the booking feature layout.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let invalid = |artifact: &'static str| {
            move |reason: String| ArtifactError::Invalid { artifact, reason }
        };
        self.model.validate().map_err(invalid("model"))?;
        self.scaler.validate().map_err(invalid("scaler"))?;
        self.encoders.validate().map_err(invalid("encoders"))?;
        check_layout(&self.model, &self.scaler)
    }
}

fn check_layout(model: &ForestModel, scaler: &StandardScaler) -> Result<(), ArtifactError> {
    if model.feature_names != feature_names() {
        return Err(ArtifactError::Mismatch(format!(
            "model feature order {:?} does not match the booking feature layout",
            model.feature_names
        )));
    }
    let expected_continuous = continuous_names();
    if scaler.columns != expected_continuous {
        return Err(ArtifactError::Mismatch(format!(
            "scaler columns {:?} (expected {:?})",
            scaler.columns, expected_continuous
        )));
    }
    Ok(())
}

/// Write all three artifacts into `dir`.
///
/// The set is validated and serialized before anything touches disk. All three files are then
/// staged as temp files in `dir` and only renamed into place once every one was written, so a
/// failed write leaves the previous set intact.
pub fn save_artifacts(dir: &Path, set: &ArtifactSet) -> Result<ArtifactPaths, ArtifactError> {
    set.validate()?;
    let paths = ArtifactPaths::in_dir(dir);
    let model = encode(&paths.model, &set.metadata, &set.model)?;
    let scaler = encode(&paths.scaler, &set.metadata, &set.scaler)?;
    let encoders = encode(&paths.encoders, &set.metadata, &set.encoders)?;

    std::fs::create_dir_all(dir).map_err(|source| ArtifactError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let staged = [
        (&paths.model, stage(dir, &paths.model, &model)?),
        (&paths.scaler, stage(dir, &paths.scaler, &scaler)?),
        (&paths.encoders, stage(dir, &paths.encoders, &encoders)?),
    ];
    for (path, tmp) in staged {
        tmp.persist(path).map_err(|err| ArtifactError::Write {
            path: path.clone(),
            source: err.error,
        })?;
        tracing::debug!(path = %path.display(), "Wrote artifact");
    }
    Ok(paths)
}

/// Load and cross-check the artifact set in `dir`.
pub fn load_artifacts(dir: &Path) -> Result<ArtifactSet, ArtifactError> {
    let paths = ArtifactPaths::in_dir(dir);
    let model: ArtifactEnvelope<ForestModel> = decode(&paths.model)?;
    let scaler: ArtifactEnvelope<StandardScaler> = decode(&paths.scaler)?;
    let encoders: ArtifactEnvelope<EncoderBundle> = decode(&paths.encoders)?;

    model
        .payload
        .validate()
        .map_err(|reason| corrupt(&paths.model, reason))?;
    scaler
        .payload
        .validate()
        .map_err(|reason| corrupt(&paths.scaler, reason))?;
    encoders
        .payload
        .validate()
        .map_err(|reason| corrupt(&paths.encoders, reason))?;

    if scaler.metadata.run_id != model.metadata.run_id
        || encoders.metadata.run_id != model.metadata.run_id
    {
        return Err(ArtifactError::Mismatch(format!(
            "run ids differ (model {}, scaler {}, encoders {})",
            model.metadata.run_id, scaler.metadata.run_id, encoders.metadata.run_id
        )));
    }
    check_layout(&model.payload, &scaler.payload)?;

    Ok(ArtifactSet {
        metadata: model.metadata,
        model: model.payload,
        scaler: scaler.payload,
        encoders: encoders.payload,
    })
}

fn encode<T: Serialize>(
    path: &Path,
    metadata: &ArtifactMetadata,
    payload: &T,
) -> Result<Vec<u8>, ArtifactError> {
    let envelope = ArtifactEnvelope {
        format_version: ARTIFACT_FORMAT_VERSION,
        metadata: metadata.clone(),
        payload,
    };
    serde_json::to_vec_pretty(&envelope).map_err(|source| ArtifactError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

fn decode<T: DeserializeOwned>(path: &Path) -> Result<ArtifactEnvelope<T>, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Missing {
        path: path.to_path_buf(),
        source,
    })?;
    let header: EnvelopeHeader =
        serde_json::from_slice(&bytes).map_err(|err| corrupt(path, err.to_string()))?;
    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(ArtifactError::Mismatch(format!(
            "{} has format version {} (expected {})",
            path.display(),
            header.format_version,
            ARTIFACT_FORMAT_VERSION
        )));
    }
    serde_json::from_slice(&bytes).map_err(|err| corrupt(path, err.to_string()))
}

/// Version probe read before the payload so old layouts report a mismatch, not a parse error.
#[derive(Deserialize)]
struct EnvelopeHeader {
    format_version: i64,
}

/// Write `bytes` to a synced temp file in `dir`; it is deleted on drop unless persisted.
fn stage(dir: &Path, path: &Path, bytes: &[u8]) -> Result<NamedTempFile, ArtifactError> {
    let write_err = |source: std::io::Error| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    Ok(tmp)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> ArtifactError {
    ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{BookingRecord, CategoricalColumn};
    use crate::ml::forest::{DecisionTree, Node};
    use tempfile::tempdir;

    fn record(channel: &str, route: &str) -> BookingRecord {
        BookingRecord {
            num_passengers: 1,
            sales_channel: channel.to_string(),
            trip_type: "RoundTrip".to_string(),
            purchase_lead: 10,
            length_of_stay: 3,
            flight_hour: 8,
            flight_day: "Mon".to_string(),
            route: route.to_string(),
            booking_origin: "Malaysia".to_string(),
            wants_extra_baggage: false,
            wants_preferred_seat: false,
            wants_in_flight_meals: false,
            flight_duration: 8.8,
        }
    }

    fn sample_set() -> ArtifactSet {
        let records = [record("Internet", "AKLKUL"), record("Mobile", "PENTPE")];
        ArtifactSet {
            metadata: ArtifactMetadata {
                run_id: Uuid::new_v4(),
                trained_at: "2024-01-01T00:00:00Z".to_string(),
                dataset_blake3: "00".repeat(32),
            },
            model: ForestModel {
                model_version: 1,
                feature_names: feature_names(),
                seed: 42,
                trees: vec![DecisionTree {
                    nodes: vec![Node::Leaf {
                        positive: 0.25,
                        samples: 4,
                    }],
                }],
            },
            scaler: StandardScaler {
                columns: continuous_names().iter().map(|s| s.to_string()).collect(),
                mean: vec![80.0, 23.0, 7.2],
                scale: vec![90.0, 33.0, 1.5],
                n_samples: 2,
            },
            encoders: EncoderBundle::fit(records.iter()),
        }
    }

    #[test]
    fn saved_set_loads_back() {
        let dir = tempdir().unwrap();
        let set = sample_set();
        let paths = save_artifacts(dir.path(), &set).unwrap();
        assert!(paths.iter().all(Path::is_file));

        let loaded = load_artifacts(dir.path()).unwrap();
        assert_eq!(loaded.metadata, set.metadata);
        assert_eq!(loaded.model, set.model);
        assert_eq!(loaded.scaler, set.scaler);
        assert_eq!(
            loaded.encoders.vocabulary(CategoricalColumn::SalesChannel),
            &["Internet", "Mobile"]
        );
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempdir().unwrap();
        save_artifacts(dir.path(), &sample_set()).unwrap();
        std::fs::remove_file(dir.path().join(SCALER_FILE_NAME)).unwrap();
        assert!(matches!(
            load_artifacts(dir.path()).unwrap_err(),
            ArtifactError::Missing { .. }
        ));
    }

    #[test]
    fn mixed_runs_are_rejected() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        save_artifacts(first.path(), &sample_set()).unwrap();
        save_artifacts(second.path(), &sample_set()).unwrap();
        std::fs::copy(
            second.path().join(ENCODERS_FILE_NAME),
            first.path().join(ENCODERS_FILE_NAME),
        )
        .unwrap();
        assert!(matches!(
            load_artifacts(first.path()).unwrap_err(),
            ArtifactError::Mismatch(_)
        ));
    }

    #[test]
    fn other_format_versions_are_rejected() {
        let dir = tempdir().unwrap();
        save_artifacts(dir.path(), &sample_set()).unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replacen("\"format_version\": 1", "\"format_version\": 2", 1))
            .unwrap();
        assert!(matches!(
            load_artifacts(dir.path()).unwrap_err(),
            ArtifactError::Mismatch(_)
        ));
    }

    #[test]
    fn invalid_set_is_not_written() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let mut set = sample_set();
        set.scaler.mean[2] = f64::NAN;
        assert!(matches!(
            save_artifacts(&out, &set).unwrap_err(),
            ArtifactError::Invalid {
                artifact: "scaler",
                ..
            }
        ));
        assert!(!out.exists());
    }

    #[test]
    fn failed_save_keeps_previous_set() {
        let dir = tempdir().unwrap();
        let previous = sample_set();
        save_artifacts(dir.path(), &previous).unwrap();

        let mut broken = sample_set();
        broken.model.feature_names.reverse();
        assert!(save_artifacts(dir.path(), &broken).is_err());

        let loaded = load_artifacts(dir.path()).unwrap();
        assert_eq!(loaded.metadata, previous.metadata);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 3);
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempdir().unwrap();
        save_artifacts(dir.path(), &sample_set()).unwrap();
        std::fs::write(dir.path().join(MODEL_FILE_NAME), b"not json").unwrap();
        assert!(matches!(
            load_artifacts(dir.path()).unwrap_err(),
            ArtifactError::Corrupt { .. }
        ));
    }
}
