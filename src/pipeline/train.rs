//! Training pipeline: dataset → encoders + scaler → random forest → artifacts.

use std::path::PathBuf;

use ndarray::Array2;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use uuid::Uuid;

use crate::booking::LabeledBooking;
use crate::config::TrainingConfig;
use crate::dataset::{DatasetError, load_bookings, train_test_split};
use crate::ml::encoder::{EncoderBundle, UnknownCategory};
use crate::ml::forest::{ForestError, ForestModel, TrainDataset, train_forest};
use crate::ml::metrics::{ClassStats, ConfusionMatrix};
use crate::ml::scaler::StandardScaler;
use crate::pipeline::artifacts::{
    ArtifactError, ArtifactMetadata, ArtifactPaths, ArtifactSet, save_artifacts,
};
use crate::pipeline::features::{EncodedBooking, FeatureVector, continuous_names, feature_names};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Dataset not found at {path}; no artifacts were written")]
    DatasetMissing { path: PathBuf },
    #[error(transparent)]
    Dataset(DatasetError),
    #[error("Dataset {path} has no rows")]
    EmptyDataset { path: PathBuf },
    #[error("Failed to encode training row: {0}")]
    Encode(#[from] UnknownCategory),
    #[error("Failed to fit scaler: {0}")]
    Scaler(String),
    #[error("Failed to fit classifier: {0}")]
    Fit(#[from] ForestError),
    #[error("Failed to format training timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl From<DatasetError> for TrainingError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::Missing { path } => TrainingError::DatasetMissing { path },
            other => TrainingError::Dataset(other),
        }
    }
}

/// Outcome of a successful training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Accuracy on the held-out split; informational only.
    pub accuracy: f32,
    pub per_class: Vec<ClassStats>,
    pub confusion: ConfusionMatrix,
    pub metadata: ArtifactMetadata,
    pub paths: ArtifactPaths,
}

/// Fitted preprocessing plus the fully transformed feature matrix.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub encoders: EncoderBundle,
    pub scaler: StandardScaler,
    /// One canonical-order feature row per input row.
    pub x: Vec<Vec<f32>>,
    pub y: Vec<u8>,
}

/// Run the full training pipeline and persist its artifacts.
///
/// Artifacts are only written after the classifier has been fit; any earlier failure leaves the
/// artifact directory untouched.
pub fn run_training(config: &TrainingConfig) -> Result<TrainingReport, TrainingError> {
    info!("Loading data from {}", config.dataset_path.display());
    let dataset = load_bookings(&config.dataset_path)?;
    if dataset.rows.is_empty() {
        return Err(TrainingError::EmptyDataset {
            path: dataset.path,
        });
    }
    let rows = dataset.rows.len();
    info!(rows, "Encoding categorical data and scaling numerical data");
    let prepared = preprocess(&dataset.rows)?;

    let split = train_test_split(rows, config.split.test_fraction, config.split.seed);
    let train = subset(&prepared, &split.train);
    let test = subset(&prepared, &split.test);
    let options = config.forest.to_options();
    info!(
        train_rows = train.x.len(),
        test_rows = test.x.len(),
        n_trees = options.n_trees,
        seed = options.seed,
        "Training random forest model"
    );
    let model = train_forest(&train, &options)?;

    let confusion = evaluate(&model, &test);
    let acc = confusion.accuracy();
    info!("Model accuracy: {acc:.4}");

    let metadata = ArtifactMetadata {
        run_id: Uuid::new_v4(),
        trained_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
        dataset_blake3: dataset.digest,
    };
    info!(run_id = %metadata.run_id, "Saving model and preprocessing artifacts");
    let set = ArtifactSet {
        metadata: metadata.clone(),
        model,
        scaler: prepared.scaler,
        encoders: prepared.encoders,
    };
    let paths = save_artifacts(&config.artifact_dir, &set)?;
    info!("Artifacts written to {}", config.artifact_dir.display());

    Ok(TrainingReport {
        rows,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        accuracy: acc,
        per_class: confusion.class_report(),
        confusion,
        metadata,
        paths,
    })
}

/// Fit encoders on the observed vocabulary and the scaler on the continuous columns, then
/// transform every row into a canonical-order feature vector.
pub fn preprocess(rows: &[LabeledBooking]) -> Result<Preprocessed, TrainingError> {
    let encoders = EncoderBundle::fit(rows.iter().map(|row| &row.record));
    let encoded = rows
        .iter()
        .map(|row| EncodedBooking::encode(&row.record, &encoders))
        .collect::<Result<Vec<_>, _>>()?;

    let continuous: Vec<f64> = encoded.iter().flat_map(|e| e.continuous()).collect();
    let mut continuous = Array2::from_shape_vec((encoded.len(), 3), continuous)
        .map_err(|err| TrainingError::Scaler(err.to_string()))?;
    let scaler =
        StandardScaler::fit(&continuous_names(), &continuous).map_err(TrainingError::Scaler)?;
    scaler.transform(&mut continuous);

    let x = encoded
        .iter()
        .zip(continuous.rows())
        .map(|(row, scaled)| {
            let mut vector = FeatureVector::assemble(row);
            vector.set_continuous([scaled[0], scaled[1], scaled[2]]);
            vector.to_vec()
        })
        .collect();
    let y = rows.iter().map(|row| u8::from(row.booking_complete)).collect();

    Ok(Preprocessed {
        encoders,
        scaler,
        x,
        y,
    })
}

fn subset(prepared: &Preprocessed, indices: &[usize]) -> TrainDataset {
    TrainDataset {
        feature_names: feature_names(),
        x: indices.iter().map(|&i| prepared.x[i].clone()).collect(),
        y: indices.iter().map(|&i| prepared.y[i]).collect(),
    }
}

fn evaluate(model: &ForestModel, dataset: &TrainDataset) -> ConfusionMatrix {
    ConfusionMatrix::from_pairs(
        dataset
            .x
            .iter()
            .zip(&dataset.y)
            .map(|(row, &truth)| (truth, model.predict_label(row))),
    )
}
