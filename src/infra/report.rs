// ============================================================
// Layer 6 - Run Artifacts
// ============================================================
// Writes the plots and tables of a run into the output directory.
// File names carry the training and test set sizes so runs of
// different sizes never overwrite each other:
//
//   loss_accuracy_training{T}_testing{S}.svg
//   loss_accuracy_training{T}_testing{S}.csv
//   loss_accuracy_steps_training{T}_testing{S}.csv
//   roc_training{T}_testing{S}.svg
//   roc_training{T}_testing{S}.csv

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::infra::{
    metrics::{write_rows, EpochMetrics, RocPoint, StepMetrics},
    plot::{LineChart, Series},
};
use crate::ml::{evaluator::Evaluation, roc::RocCurve, trainer::TrainingHistory};

/// Name of the model curve in tables and legends
pub const MODEL_CURVE: &str = "model";
/// Name of the baseline curve in tables and legends
pub const BASELINE_CURVE: &str = "baseline";

pub struct ArtifactWriter {
    out_dir:    PathBuf,
    train_size: usize,
    test_size:  usize,
}

impl ArtifactWriter {
    pub fn new(out_dir: impl Into<PathBuf>, train_size: usize, test_size: usize) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Cannot create output directory '{}'", out_dir.display()))?;
        Ok(Self { out_dir, train_size, test_size })
    }

    fn path(&self, stem: &str, ext: &str) -> PathBuf {
        self.out_dir.join(format!(
            "{stem}_training{}_testing{}.{ext}",
            self.train_size, self.test_size
        ))
    }

    /// Loss/accuracy-vs-epoch chart, the per-epoch table and the per-step table.
    pub fn write_training(&self, history: &TrainingHistory, test: &Evaluation) -> Result<Vec<PathBuf>> {
        let epochs = history.epoch_means();
        let loss: Vec<(f64, f64)> = epochs.iter().map(|e| (e.epoch as f64, e.loss)).collect();
        let acc:  Vec<(f64, f64)> = epochs.iter().map(|e| (e.epoch as f64, e.accuracy)).collect();

        let chart = LineChart::new("Matrix Product State Loss and Accuracy")
            .with_axes("# of Epochs", "Loss")
            .with_secondary_axis("Accuracy")
            .add_series(Series::new("Loss", "black", loss))
            .add_series(Series::new("Accuracy", "green", acc).on_right_axis());

        let svg = self.path("loss_accuracy", "svg");
        write_text(&svg, &chart.render_svg())?;

        let csv = self.path("loss_accuracy", "csv");
        write_rows(&csv, &EpochMetrics::rows(&epochs, test))?;

        let steps = self.path("loss_accuracy_steps", "csv");
        write_rows(&steps, &StepMetrics::rows(history.records()))?;

        tracing::info!("Training artifacts written to '{}'", self.out_dir.display());
        Ok(vec![svg, csv, steps])
    }

    /// ROC chart and table for the model, plus the baseline if given.
    pub fn write_roc(&self, model: &RocCurve, baseline: Option<&RocCurve>) -> Result<Vec<PathBuf>> {
        let mut chart = LineChart::new("Receiver Operating Characteristic")
            .with_axes("False Positive Rate", "True Positive Rate")
            .with_fixed_range((0.0, 1.0), (0.0, 1.0))
            .add_series(Series::new("", "navy", vec![(0.0, 0.0), (1.0, 1.0)]).dashed())
            .add_series(Series::new(
                format!("ROC QML, MPS (area = {:.2})", model.auc),
                "darkorange",
                curve_points(model),
            ));

        let mut rows = RocPoint::rows(model, MODEL_CURVE);
        if let Some(b) = baseline {
            chart = chart.add_series(Series::new(
                format!("ROC baseline (area = {:.2})", b.auc),
                "steelblue",
                curve_points(b),
            ));
            rows.extend(RocPoint::rows(b, BASELINE_CURVE));
        }

        let svg = self.path("roc", "svg");
        write_text(&svg, &chart.render_svg())?;

        let csv = self.path("roc", "csv");
        write_rows(&csv, &rows)?;

        tracing::info!("ROC artifacts written to '{}'", self.out_dir.display());
        Ok(vec![svg, csv])
    }
}

fn curve_points(curve: &RocCurve) -> Vec<(f64, f64)> {
    curve.fpr.iter().copied().zip(curve.tpr.iter().copied()).collect()
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Cannot write '{}'", path.display()))
}
