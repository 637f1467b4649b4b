//! Inference pipeline over a loaded artifact set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::{BookingRecord, CategoricalColumn, FlightDay};
use crate::ml::encoder::UnknownCategory;
use crate::ml::forest::label_for_probability;
use crate::pipeline::artifacts::{ArtifactError, ArtifactMetadata, ArtifactSet, load_artifacts};
use crate::pipeline::features::{EncodedBooking, FeatureVector};

#[derive(Debug, Error)]
pub enum InferenceError {
    /// The artifact set could not be loaded; training has to run first.
    #[error("Model artifacts in {dir} are unavailable: {source}")]
    ArtifactMissing {
        dir: PathBuf,
        #[source]
        source: ArtifactError,
    },
    /// A categorical value outside the trained vocabulary.
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
}

impl InferenceError {
    /// Plain-language message for whoever is operating the form.
    pub fn operator_message(&self) -> String {
        match self {
            InferenceError::ArtifactMissing {
                source: ArtifactError::Missing { .. },
                ..
            } => "Model files not found. Run `booking-train` to produce airline_model.json, \
                  scaler.json and encoders.json first."
                .to_string(),
            InferenceError::ArtifactMissing { .. } => "Model files are unreadable or come from \
                 different training runs. Run `booking-train` again to rebuild all three."
                .to_string(),
            InferenceError::UnknownCategory(err) => format!(
                "The model does not recognize {} \"{}\"; pick a value seen during training.",
                err.column, err.value
            ),
        }
    }
}

/// Model output for one booking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// `1` when the booking is predicted to complete.
    pub label: u8,
    /// Positive-class probability in `[0, 1]`.
    pub probability: f32,
}

impl Prediction {
    pub fn booking_complete(&self) -> bool {
        self.label == 1
    }
}

/// Loaded, immutable inference handle.
///
/// Built once with [`Predictor::load`] and then shared by reference; nothing in it changes after
/// loading, so concurrent `predict` calls need no locking.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifacts: ArtifactSet,
}

impl Predictor {
    /// Load the artifact set from `dir`.
    pub fn load(dir: &Path) -> Result<Self, InferenceError> {
        let artifacts = load_artifacts(dir).map_err(|source| InferenceError::ArtifactMissing {
            dir: dir.to_path_buf(),
            source,
        })?;
        tracing::info!(
            run_id = %artifacts.metadata.run_id,
            trees = artifacts.model.trees.len(),
            "Loaded model artifacts from {}",
            dir.display()
        );
        Ok(Self { artifacts })
    }

    /// Wrap an artifact set that is already in memory, after the same checks `load` runs.
    pub fn from_artifacts(artifacts: ArtifactSet) -> Result<Self, ArtifactError> {
        artifacts.validate()?;
        Ok(Self { artifacts })
    }

    /// Predict the outcome of one booking.
    ///
    /// Steps run strictly in order: day mapping and flag conversion, categorical encoding,
    /// assembly in canonical column order, scaling with the stored statistics, classification.
    pub fn predict(&self, record: &BookingRecord) -> Result<Prediction, InferenceError> {
        if FlightDay::parse(&record.flight_day).is_none() {
            return Err(UnknownCategory {
                column: "flight_day".to_string(),
                value: record.flight_day.clone(),
            }
            .into());
        }
        let encoded = EncodedBooking::encode(record, &self.artifacts.encoders)?;
        let mut features = FeatureVector::assemble(&encoded);
        features.scale_continuous(encoded.continuous(), &self.artifacts.scaler);

        let probability = self.artifacts.model.predict_proba(features.as_slice());
        let prediction = Prediction {
            label: label_for_probability(probability),
            probability,
        };
        tracing::debug!(
            label = prediction.label,
            probability = prediction.probability,
            "Predicted booking outcome"
        );
        Ok(prediction)
    }

    /// Trained vocabulary for a categorical column, for populating selection widgets.
    pub fn vocabulary(&self, column: CategoricalColumn) -> &[String] {
        self.artifacts.encoders.vocabulary(column)
    }

    /// Accepted day names in code order.
    pub fn day_names(&self) -> [&'static str; 7] {
        FlightDay::ALL.map(FlightDay::name)
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.artifacts.metadata
    }
}
