//! CSV loader for the historical booking export.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::booking::{BookingRow, LabeledBooking};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset not found at {path}")]
    Missing { path: PathBuf },
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid dataset row: {0}")]
    Csv(#[from] csv::Error),
}

/// Loaded booking history plus a fingerprint of the source file.
#[derive(Debug, Clone)]
pub struct BookingDataset {
    /// File the rows were read from.
    pub path: PathBuf,
    /// Hex blake3 digest of the raw file bytes.
    pub digest: String,
    pub rows: Vec<LabeledBooking>,
}

/// Load every row of a booking CSV export.
///
/// The export is usually latin-1 encoded; bytes that are not valid UTF-8 are decoded as latin-1.
/// Malformed rows are not skipped, the first one aborts the load.
pub fn load_bookings(path: &Path) -> Result<BookingDataset, DatasetError> {
    if !path.is_file() {
        return Err(DatasetError::Missing {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = blake3::hash(&bytes).to_hex().to_string();
    let text = decode_text(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize::<BookingRow>() {
        rows.push(LabeledBooking::from(row?));
    }
    tracing::debug!(rows = rows.len(), path = %path.display(), "Loaded booking dataset");

    Ok(BookingDataset {
        path: path.to_path_buf(),
        digest,
        rows,
    })
}

fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}
