// ============================================================
// Layer 4 - Jet Loaders
// ============================================================
// Two DatasetSource implementations:
//
//   CsvJetLoader  - reads a preprocessed jet table. Every numeric
//                   column except the label column is a feature.
//                   Rows are shuffled with the run seed, then the
//                   first train_size rows train and the next
//                   test_size rows test.
//
//   SyntheticJets - draws two overlapping populations of jets
//                   whose features are already rotation angles.
//                   Used when no table is configured and in tests.
//
// Expected table layout (header row required):
//   f0,f1,...,f15,Jet_LABEL
//   0.13,2.71,...,1.05,1
//   ...

use anyhow::{Context, Result};
use rand::Rng;
use std::{f32::consts::PI, path::PathBuf};

use crate::data::{preprocessor::AngleScaler, seeded_rng, splitter::split_train_test, RngStream};
use crate::domain::{
    error::PipelineError,
    jet::{signed_label, DatasetSplit, JetSet},
    traits::DatasetSource,
};

// ─── CsvJetLoader ─────────────────────────────────────────────────────────────
pub struct CsvJetLoader {
    path:           PathBuf,
    label_column:   String,
    scale_features: bool,
}

impl CsvJetLoader {
    pub fn new(path: impl Into<PathBuf>, label_column: impl Into<String>) -> Self {
        Self {
            path:           path.into(),
            label_column:   label_column.into(),
            scale_features: false,
        }
    }

    /// Rescale features to [0, π] using ranges fitted on the training rows
    pub fn with_scaling(mut self, scale_features: bool) -> Self {
        self.scale_features = scale_features;
        self
    }

    /// Read every row as (features, signed label).
    fn read_rows(&self) -> Result<(usize, Vec<(Vec<f32>, f32)>)> {
        let mut reader = csv::Reader::from_path(&self.path).with_context(|| {
            format!("Cannot open jet table '{}'", self.path.display())
        })?;

        let headers   = reader.headers()?.clone();
        let label_idx = headers
            .iter()
            .position(|h| h.trim() == self.label_column)
            .ok_or_else(|| PipelineError::MissingColumn(self.label_column.clone()))?;
        let width = headers.len() - 1;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("Malformed row {} in '{}'", line + 2, self.path.display())
            })?;

            let mut features = Vec::with_capacity(width);
            let mut label    = -1.0;
            for (j, field) in record.iter().enumerate() {
                let value: f32 = field.trim().parse().with_context(|| {
                    format!("Row {}: column '{}' is not numeric", line + 2, &headers[j])
                })?;
                if j == label_idx {
                    label = signed_label(value);
                } else {
                    features.push(value);
                }
            }

            if features.len() != width {
                return Err(PipelineError::FeatureWidth { expected: width, actual: features.len() }.into());
            }
            rows.push((features, label));
        }

        Ok((width, rows))
    }
}

impl DatasetSource for CsvJetLoader {
    fn load(&self, train_size: usize, test_size: usize, seed: u64) -> Result<DatasetSplit> {
        let (width, rows) = self.read_rows()?;
        tracing::info!("Read {} jets with {} features from '{}'", rows.len(), width, self.path.display());

        let mut rng = seeded_rng(seed, RngStream::DatasetSplit);
        let (train_rows, test_rows) = split_train_test(rows, train_size, test_size, &mut rng)?;

        let mut train = rows_to_set(width, train_rows)?;
        let mut test  = rows_to_set(width, test_rows)?;

        if self.scale_features {
            let scaler = AngleScaler::fit(&train);
            train = scaler.transform(&train);
            test  = scaler.transform(&test);
        }

        Ok(DatasetSplit { train, test })
    }

    fn describe(&self) -> String {
        format!("jet table '{}'", self.path.display())
    }
}

fn rows_to_set(width: usize, rows: Vec<(Vec<f32>, f32)>) -> Result<JetSet, PipelineError> {
    let (features, labels): (Vec<Vec<f32>>, Vec<f32>) = rows.into_iter().unzip();
    JetSet::new(width, features.into_iter().flatten().collect(), labels)
}

// ─── SyntheticJets ────────────────────────────────────────────────────────────
/// Seeded generator of two jet populations.
///
/// Every feature of a b-jet is centred `separation` below π/2 and
/// every feature of a background jet `separation` above it, with
/// uniform noise of half-width `spread`. Values are clamped to
/// [0, π] so they are valid embedding angles.
pub struct SyntheticJets {
    width:      usize,
    separation: f32,
    spread:     f32,
}

impl SyntheticJets {
    pub fn new(width: usize) -> Self {
        Self { width, separation: 0.4, spread: 0.9 }
    }

    /// Draw `n` jets from `rng`.
    pub fn generate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<JetSet, PipelineError> {
        let mut features = Vec::with_capacity(n * self.width);
        let mut labels   = Vec::with_capacity(n);

        for _ in 0..n {
            let label: f32 = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let centre     = PI / 2.0 - label * self.separation;
            for _ in 0..self.width {
                let noise = rng.gen_range(-self.spread..=self.spread);
                features.push((centre + noise).clamp(0.0, PI));
            }
            labels.push(label);
        }

        JetSet::new(self.width, features, labels)
    }
}

impl DatasetSource for SyntheticJets {
    fn load(&self, train_size: usize, test_size: usize, seed: u64) -> Result<DatasetSplit> {
        let mut rng = seeded_rng(seed, RngStream::SyntheticJets);
        let train   = self.generate(train_size, &mut rng)?;
        let test    = self.generate(test_size, &mut rng)?;
        Ok(DatasetSplit { train, test })
    }

    fn describe(&self) -> String {
        format!("synthetic jets ({} features)", self.width)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_table(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_csv_loader_reads_features_and_maps_labels() {
        let file = write_table("a,b,Jet_LABEL\n0.1,0.2,1\n0.3,0.4,0\n0.5,0.6,1\n0.7,0.8,0\n");
        let split = CsvJetLoader::new(file.path(), "Jet_LABEL").load(3, 1, 0).unwrap();

        assert_eq!(split.train.len(), 3);
        assert_eq!(split.test.len(), 1);
        assert_eq!(split.train.width(), 2);
        let (pos, neg) = split.train.class_counts();
        let (tpos, tneg) = split.test.class_counts();
        assert_eq!(pos + tpos, 2);
        assert_eq!(neg + tneg, 2);
    }

    #[test]
    fn test_csv_loader_is_deterministic() {
        let file = write_table("a,Jet_LABEL\n1,1\n2,0\n3,1\n4,0\n5,1\n6,0\n");
        let loader = CsvJetLoader::new(file.path(), "Jet_LABEL");
        let a = loader.load(4, 2, 11).unwrap();
        let b = loader.load(4, 2, 11).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_csv_loader_missing_label_column() {
        let file = write_table("a,b\n1,2\n");
        let err  = CsvJetLoader::new(file.path(), "Jet_LABEL").load(1, 0, 0).unwrap_err();
        assert!(err.to_string().contains("Jet_LABEL"));
    }

    #[test]
    fn test_csv_loader_missing_file() {
        let result = CsvJetLoader::new("/nonexistent/jets.csv", "Jet_LABEL").load(1, 1, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_loader_scaling_fits_training_rows() {
        let file = write_table("a,Jet_LABEL\n10,1\n20,0\n30,1\n40,0\n");
        let split = CsvJetLoader::new(file.path(), "Jet_LABEL")
            .with_scaling(true)
            .load(4, 0, 3)
            .unwrap();
        let max = split.train.features().iter().cloned().fold(f32::MIN, f32::max);
        let min = split.train.features().iter().cloned().fold(f32::MAX, f32::min);
        assert!((max - PI).abs() < 1e-6);
        assert_eq!(min, 0.0);
    }

    #[test]
    fn test_synthetic_jets_shape_and_range() {
        let split = SyntheticJets::new(16).load(40, 10, 0).unwrap();
        assert_eq!(split.train.len(), 40);
        assert_eq!(split.test.len(), 10);
        assert_eq!(split.train.width(), 16);
        assert!(split.train.features().iter().all(|&v| (0.0..=PI).contains(&v)));
    }

    #[test]
    fn test_synthetic_jets_seeded() {
        let a = SyntheticJets::new(4).load(20, 5, 42).unwrap();
        let b = SyntheticJets::new(4).load(20, 5, 42).unwrap();
        let c = SyntheticJets::new(4).load(20, 5, 43).unwrap();
        assert_eq!(a.train, b.train);
        assert_ne!(a.train, c.train);
    }
}
