// ============================================================
// Layer 6 - Metrics Tables
// ============================================================
// Writes the tabular artifacts of a run as CSV.
//
// Per-step training table (one row per optimizer step):
//   Step,Epoch,Loss,Accuracy
//   0,1,0.994100,0.495000
//   ...
//
// Per-epoch training table (one row per epoch):
//   Epoch,Train Loss,Train Accuracy,Test Loss,Test Accuracy
//   1,0.981200,0.512000,0.790100,0.701000
//   2,0.902300,0.588500,0.790100,0.701000
//   ...
// Train values are means over the epoch's steps. The test set is
// only evaluated once, after training, so its values repeat on
// every row.
//
// ROC table (one row per curve point):
//   FPR,TPR,Threshold,Area,Curve
//   0.0,0.0,inf,0.8712,model
//   ...
// Area is the curve's AUC repeated on each of its rows. Baseline
// rows, when present, follow the model rows.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::ml::{
    evaluator::Evaluation,
    roc::RocCurve,
    trainer::{EpochSummary, StepRecord},
};

/// One row of the per-step training table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepMetrics {
    #[serde(rename = "Step")]
    pub step: usize,

    #[serde(rename = "Epoch")]
    pub epoch: usize,

    #[serde(rename = "Loss")]
    pub loss: f64,

    #[serde(rename = "Accuracy")]
    pub accuracy: f64,
}

impl StepMetrics {
    pub fn rows(records: &[StepRecord]) -> Vec<Self> {
        records
            .iter()
            .map(|r| Self { step: r.step, epoch: r.epoch, loss: r.loss, accuracy: r.accuracy })
            .collect()
    }
}

/// One row of the per-epoch training table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochMetrics {
    #[serde(rename = "Epoch")]
    pub epoch: usize,

    #[serde(rename = "Train Loss")]
    pub train_loss: f64,

    #[serde(rename = "Train Accuracy")]
    pub train_accuracy: f64,

    #[serde(rename = "Test Loss")]
    pub test_loss: f64,

    #[serde(rename = "Test Accuracy")]
    pub test_accuracy: f64,
}

impl EpochMetrics {
    /// Combine per-epoch train means with the single test evaluation.
    pub fn rows(epochs: &[EpochSummary], test: &Evaluation) -> Vec<Self> {
        epochs
            .iter()
            .map(|e| Self {
                epoch:          e.epoch,
                train_loss:     e.loss,
                train_accuracy: e.accuracy,
                test_loss:      test.loss,
                test_accuracy:  test.accuracy,
            })
            .collect()
    }
}

/// One point of a ROC curve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocPoint<'a> {
    #[serde(rename = "FPR")]
    pub fpr: f64,

    #[serde(rename = "TPR")]
    pub tpr: f64,

    #[serde(rename = "Threshold")]
    pub threshold: f64,

    #[serde(rename = "Area")]
    pub area: f64,

    #[serde(rename = "Curve")]
    pub curve: &'a str,
}

impl<'a> RocPoint<'a> {
    pub fn rows(curve: &RocCurve, name: &'a str) -> Vec<Self> {
        (0..curve.fpr.len())
            .map(|i| Self {
                fpr:       curve.fpr[i],
                tpr:       curve.tpr[i],
                threshold: curve.thresholds[i],
                area:      curve.auc,
                curve:     name,
            })
            .collect()
    }
}

/// Serialize `rows` to `path`, header first.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    for row in rows {
        w.serialize(row)?;
    }
    w.flush()?;
    tracing::debug!("Wrote {} rows to '{}'", rows.len(), path.display());
    Ok(())
}
