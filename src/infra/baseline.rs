// ============================================================
// Layer 6 - Baseline Scores
// ============================================================
// Reads the precomputed scores of the comparison classifier for
// the test population. Only two columns are used:
//
//   XGB_PRED  - the baseline's raw score
//   Jet_LABEL - true class, 1 = b-jet, 0 = background
//
// Labels go through the same {-1, +1} mapping as the jet table.
// A missing file is a hard error; no curve is made up.

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::{error::PipelineError, jet::signed_label};

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineScores {
    pub scores: Vec<f32>,
    pub labels: Vec<f32>,
}

/// Load the score and label columns from a CSV file.
pub fn read_baseline(
    path:         &Path,
    score_column: &str,
    label_column: &str,
) -> Result<BaselineScores> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open baseline scores '{}'", path.display()))?;

    let headers = reader.headers()?.clone();
    let column  = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    };
    let score_idx = column(score_column)?;
    let label_idx = column(label_column)?;

    let mut scores = Vec::new();
    let mut labels = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Malformed row {} in '{}'", line + 2, path.display()))?;
        let field = |idx: usize, name: &str| -> Result<f32> {
            record
                .get(idx)
                .unwrap_or("")
                .trim()
                .parse()
                .with_context(|| format!("Row {}: column '{}' is not numeric", line + 2, name))
        };
        scores.push(field(score_idx, score_column)?);
        labels.push(signed_label(field(label_idx, label_column)?));
    }

    tracing::info!("Read {} baseline scores from '{}'", scores.len(), path.display());
    Ok(BaselineScores { scores, labels })
}
