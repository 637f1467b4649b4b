//! Mean/variance normalization fitted once on training data.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Per-column standardization: `(x - mean) / scale`.
///
/// `scale` is the population standard deviation; constant columns get a scale of `1.0` so
/// they transform to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column names in the order the statistics are stored.
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Rows the statistics were computed from.
    pub n_samples: usize,
}

impl StandardScaler {
    /// Fit statistics over the columns of `data` (rows = samples).
    ///
    /// Non-finite values are left out of a column's statistics, so a `NaN` in the data neither
    /// poisons the mean nor fails the fit; it stays `NaN` after `transform`.
    pub fn fit(columns: &[&str], data: &Array2<f64>) -> Result<Self, String> {
        if data.ncols() != columns.len() {
            return Err(format!(
                "scaler expects {} columns, got {}",
                columns.len(),
                data.ncols()
            ));
        }
        if data.nrows() == 0 {
            return Err("cannot fit scaler on zero rows".to_string());
        }
        let mut mean = Vec::with_capacity(columns.len());
        let mut scale = Vec::with_capacity(columns.len());
        for (name, column) in columns.iter().zip(data.columns()) {
            let observed = Array1::from_iter(column.iter().copied().filter(|v| v.is_finite()));
            let column_mean = observed
                .mean()
                .ok_or_else(|| format!("column {name} has no finite values"))?;
            let std = observed.var(0.0).sqrt();
            mean.push(column_mean);
            scale.push(if std == 0.0 || !std.is_finite() { 1.0 } else { std });
        }
        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            mean,
            scale,
            n_samples: data.nrows(),
        })
    }

    /// Number of columns the scaler was fit on.
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one row in place with the stored statistics.
    pub fn transform_row(&self, row: &mut [f64]) {
        for ((value, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            *value = (*value - mean) / scale;
        }
    }

    /// Standardize every row of `data` in place.
    pub fn transform(&self, data: &mut Array2<f64>) {
        for mut row in data.rows_mut() {
            if let Some(slice) = row.as_slice_mut() {
                self.transform_row(slice);
            } else {
                for (idx, value) in row.iter_mut().enumerate() {
                    *value = (*value - self.mean[idx]) / self.scale[idx];
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no columns".to_string());
        }
        if self.mean.len() != self.scale.len() || self.mean.len() != self.columns.len() {
            return Err("scaler mean/scale/columns length mismatch".to_string());
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("scaler mean must be finite".to_string());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("scaler scale must be finite and > 0".to_string());
        }
        Ok(())
    }
}
