// ============================================================
// Layer 3 - JetSet Domain Type
// ============================================================
// A set of jets as the pipeline sees them: one fixed-width
// feature vector per jet plus a label in {-1, +1}
// (+1 = b-jet / signal, -1 = background).
//
// Features are stored row-major in one flat Vec so a batch can be
// handed to the tensor layer without re-packing:
//   [j1_f1, j1_f2, ..., j1_fW, j2_f1, ..., jN_fW]
//
// The constructor enforces the row-alignment invariant, so every
// JetSet that exists has exactly one label per feature row.

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetSet {
    /// Number of features per jet
    width: usize,

    /// Row-major feature matrix, len = rows * width
    features: Vec<f32>,

    /// One label per row, each -1.0 or +1.0
    labels: Vec<f32>,
}

impl JetSet {
    /// Build a JetSet from a flat row-major feature buffer.
    ///
    /// Fails with `RowMismatch` if the buffer does not hold exactly
    /// `labels.len()` rows of `width` features, and with
    /// `InvalidLabel` if any label is outside {-1, +1}.
    pub fn new(width: usize, features: Vec<f32>, labels: Vec<f32>) -> Result<Self, PipelineError> {
        let feature_rows = if width == 0 { 0 } else { features.len() / width };
        if width == 0 || features.len() % width != 0 || feature_rows != labels.len() {
            return Err(PipelineError::RowMismatch {
                features: feature_rows,
                labels:   labels.len(),
            });
        }

        if let Some((row, &value)) = labels
            .iter()
            .enumerate()
            .find(|(_, &l)| l != 1.0 && l != -1.0)
        {
            return Err(PipelineError::InvalidLabel { row, value });
        }

        Ok(Self { width, features, labels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of jets (rows)
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Feature vector of one jet
    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.width;
        &self.features[start..start + self.width]
    }

    pub fn features(&self) -> &[f32] {
        &self.features
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    /// Gather the given rows (in the given order) into a new JetSet.
    /// Feature rows and labels move together, so alignment is kept.
    ///
    /// # Panics
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> JetSet {
        let mut features = Vec::with_capacity(indices.len() * self.width);
        let mut labels   = Vec::with_capacity(indices.len());
        for &i in indices {
            features.extend_from_slice(self.row(i));
            labels.push(self.labels[i]);
        }
        JetSet { width: self.width, features, labels }
    }

    /// Apply `f(column, value)` to every feature, keeping labels.
    pub fn map_features<F: Fn(usize, f32) -> f32>(&self, f: F) -> JetSet {
        let features = self
            .features
            .iter()
            .enumerate()
            .map(|(k, &v)| f(k % self.width, v))
            .collect();
        JetSet { width: self.width, features, labels: self.labels.clone() }
    }

    /// Count of (positive, negative) labels
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l > 0.0).count();
        (positives, self.labels.len() - positives)
    }
}

/// Map a stored class value onto the {-1, +1} encoding.
/// Tables store b-jets as 1 and background as 0; values that are
/// already signed pass through.
pub fn signed_label(value: f32) -> f32 {
    if value > 0.0 { 1.0 } else { -1.0 }
}

/// The train/test pair handed over by a dataset source.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: JetSet,
    pub test:  JetSet,
}
