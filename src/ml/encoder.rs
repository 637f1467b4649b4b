//! Categorical label encoders learned from the training vocabulary.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::{BookingRecord, CategoricalColumn};

/// A categorical value that was never observed during training.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {column} value {value:?}")]
pub struct UnknownCategory {
    /// Column name (`sales_channel`, `route`, ...).
    pub column: String,
    pub value: String,
}

/// Bijection between a column's observed values and zero-based codes.
///
/// Codes follow the sorted order of the vocabulary, so `classes()[code]` decodes a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the vocabulary from a sequence of observed values.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: distinct.into_iter().map(str::to_string).collect(),
        }
    }

    /// Sorted vocabulary.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code for `value`, or `None` if it is outside the vocabulary.
    pub fn encode(&self, value: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
            .map(|idx| idx as u32)
    }

    /// Original value for `code`.
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    /// Check that the vocabulary is non-empty, strictly sorted, and duplicate-free.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("encoder vocabulary is empty".to_string());
        }
        if let Some(pair) = self.classes.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(format!(
                "encoder vocabulary is not strictly sorted at {:?} / {:?}",
                pair[0], pair[1]
            ));
        }
        Ok(())
    }
}

/// The four per-column encoders persisted as one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderBundle {
    encoders: BTreeMap<CategoricalColumn, LabelEncoder>,
}

impl EncoderBundle {
    /// Fit one encoder per categorical column over the training records.
    pub fn fit<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a BookingRecord> + Clone,
    {
        let encoders = CategoricalColumn::ALL
            .into_iter()
            .map(|column| {
                let values = records.clone().into_iter().map(|r| column.value_of(r));
                (column, LabelEncoder::fit(values))
            })
            .collect();
        Self { encoders }
    }

    /// Encoder for `column`.
    pub fn encoder(&self, column: CategoricalColumn) -> Option<&LabelEncoder> {
        self.encoders.get(&column)
    }

    /// Encode `value` for `column`, refusing anything outside the trained vocabulary.
    pub fn encode(&self, column: CategoricalColumn, value: &str) -> Result<u32, UnknownCategory> {
        self.encoder(column)
            .and_then(|encoder| encoder.encode(value))
            .ok_or_else(|| UnknownCategory {
                column: column.name().to_string(),
                value: value.to_string(),
            })
    }

    /// Trained vocabulary for `column`; empty if the bundle has no encoder for it.
    pub fn vocabulary(&self, column: CategoricalColumn) -> &[String] {
        self.encoder(column)
            .map(LabelEncoder::classes)
            .unwrap_or(&[])
    }

    pub fn validate(&self) -> Result<(), String> {
        for column in CategoricalColumn::ALL {
            let encoder = self
                .encoder(column)
                .ok_or_else(|| format!("missing encoder for {column}"))?;
            encoder
                .validate()
                .map_err(|err| format!("{column}: {err}"))?;
        }
        if self.encoders.len() != CategoricalColumn::ALL.len() {
            return Err("unexpected extra encoders".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_order() {
        let encoder = LabelEncoder::fit(["RoundTrip", "OneWay", "CircleTrip", "OneWay"]);
        assert_eq!(encoder.classes(), &["CircleTrip", "OneWay", "RoundTrip"]);
        assert_eq!(encoder.encode("CircleTrip"), Some(0));
        assert_eq!(encoder.encode("RoundTrip"), Some(2));
        assert_eq!(encoder.encode("roundtrip"), None);
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let encoder = LabelEncoder::fit(["AKLDEL", "AKLHGH", "DELSYD", "PENTPE"]);
        for class in encoder.classes() {
            let code = encoder.encode(class).unwrap();
            assert_eq!(encoder.decode(code), Some(class.as_str()));
        }
        assert_eq!(encoder.decode(4), None);
    }

    #[test]
    fn validate_rejects_unsorted_vocabulary() {
        let encoder: LabelEncoder =
            serde_json::from_str(r#"{"classes":["Mobile","Internet"]}"#).unwrap();
        assert!(encoder.validate().is_err());
        let empty: LabelEncoder = serde_json::from_str(r#"{"classes":[]}"#).unwrap();
        assert!(empty.validate().is_err());
    }
}
