//! Held-out evaluation for the binary booking classifier.

use serde::{Deserialize, Serialize};

/// Outcome classes, indexed by label (`0` = not completed, `1` = completed).
pub const CLASS_NAMES: [&str; 2] = ["not_completed", "completed"];

/// 2x2 counts indexed `[truth][predicted]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[u32; 2]; 2],
}

impl ConfusionMatrix {
    /// Tally `(truth, predicted)` label pairs; labels other than 0/1 are skipped.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u8)>) -> Self {
        let mut cm = Self::default();
        for (truth, predicted) in pairs {
            cm.record(truth, predicted);
        }
        cm
    }

    pub fn record(&mut self, truth: u8, predicted: u8) {
        if let Some(cell) = self
            .counts
            .get_mut(truth as usize)
            .and_then(|row| row.get_mut(predicted as usize))
        {
            *cell = cell.saturating_add(1);
        }
    }

    pub fn get(&self, truth: u8, predicted: u8) -> u32 {
        self.counts[truth as usize][predicted as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().map(|&c| u64::from(c)).sum()
    }

    /// Rows where the prediction matched the observed label.
    pub fn correct(&self) -> u64 {
        u64::from(self.counts[0][0]) + u64::from(self.counts[1][1])
    }

    /// Fraction of correct predictions; `0.0` for an empty matrix.
    pub fn accuracy(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f32 / total as f32,
        }
    }

    /// Classification report, one entry per class in label order.
    pub fn class_report(&self) -> Vec<ClassStats> {
        [0u8, 1u8]
            .into_iter()
            .map(|class| {
                let other = 1 - class;
                let tp = self.get(class, class);
                let fp = self.get(other, class);
                let fn_ = self.get(class, other);
                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                ClassStats {
                    class: CLASS_NAMES[class as usize].to_string(),
                    precision,
                    recall,
                    f1: f1_score(precision, recall),
                    support: tp + fn_,
                }
            })
            .collect()
    }
}

/// Precision, recall and F1 for one outcome class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub class: String,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    /// Held-out rows whose observed label is this class.
    pub support: u32,
}

pub fn f1_score(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn ratio(num: u32, den: u32) -> f32 {
    if den == 0 { 0.0 } else { num as f32 / den as f32 }
}
