// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores circuit weights using Burn's file recorder.
//
// What gets written into the checkpoint directory:
//   1. Weight snapshots (.mpk.gz) - full-precision parameter tensor
//   2. latest_epoch.json          - epoch of the newest periodic snapshot
//   3. run_config.json            - the RunConfig the weights were trained with
//
// File naming convention (prefix defaults to "mps_weights"):
//   mps_w/
//     mps_weights_epoch_100.mpk.gz   ← weights after epoch 100
//     mps_weights_epoch_200.mpk.gz
//     ...
//     final_mps_weights.mpk.gz       ← weights when training finished
//     latest_epoch.json
//     run_config.json
//
// Full precision is used so a reloaded snapshot reproduces the
// exact scores of the weights that were saved.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::run_use_case::RunConfig;
use crate::domain::error::PipelineError;
use crate::ml::predictor::{CircuitWeights, CircuitWeightsRecord};

/// Extension the recorder appends to every snapshot
pub const CHECKPOINT_EXTENSION: &str = ".mpk.gz";

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir:    PathBuf,
    prefix: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir, prefix: prefix.into() })
    }

    /// `{dir}/{prefix}_epoch_{epoch}.mpk.gz`
    pub fn epoch_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{}_epoch_{epoch}{CHECKPOINT_EXTENSION}", self.prefix))
    }

    /// `{dir}/final_{prefix}.mpk.gz`
    pub fn final_path(&self) -> PathBuf {
        self.dir.join(format!("final_{}{CHECKPOINT_EXTENSION}", self.prefix))
    }

    /// Save the weights reached at the end of `epoch` and move the
    /// latest-epoch pointer.
    pub fn save_epoch<B: Backend>(&self, params: &Tensor<B, 2>, epoch: usize) -> Result<PathBuf> {
        let path = self.epoch_path(epoch);
        write_weights(params, &path)?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(path)
    }

    /// Save the weights at the end of training.
    pub fn save_final<B: Backend>(&self, params: &Tensor<B, 2>) -> Result<PathBuf> {
        let path = self.final_path();
        write_weights(params, &path)?;
        Ok(path)
    }

    /// Load a snapshot and check it has `expected` shape.
    ///
    /// A bare file name that does not exist relative to the working
    /// directory is looked up inside the checkpoint directory.
    pub fn load<B: Backend>(
        &self,
        file:     impl AsRef<Path>,
        expected: [usize; 2],
        device:   &B::Device,
    ) -> Result<Tensor<B, 2>> {
        let path = self.resolve(file.as_ref());
        if !path.exists() {
            anyhow::bail!("Checkpoint '{}' does not exist", path.display());
        }

        let record: CircuitWeightsRecord<B> = WeightsRecorder::new()
            .load(strip_extension(&path), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        let params = record.weights.val();

        let actual = params.dims();
        if actual != expected {
            return Err(PipelineError::ParamShape { expected, actual }.into());
        }

        tracing::info!("Loaded checkpoint '{}'", path.display());
        Ok(params)
    }

    /// Epoch of the newest periodic snapshot.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s    = fs::read_to_string(&path).with_context(|| {
            format!("Cannot find '{}'. Has a run reached its first checkpoint?", path.display())
        })?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    /// Every snapshot file in the directory, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read checkpoint directory '{}'", self.dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_snapshot = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(CHECKPOINT_EXTENSION));
            if is_snapshot {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn save_config(&self, cfg: &RunConfig) -> Result<()> {
        let path = self.dir.join("run_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.exists() || file.is_absolute() {
            return file.to_path_buf();
        }
        let inside = self.dir.join(file);
        if inside.exists() { inside } else { file.to_path_buf() }
    }
}

fn write_weights<B: Backend>(params: &Tensor<B, 2>, path: &Path) -> Result<()> {
    let record = CircuitWeights::new(params.clone()).into_record();
    WeightsRecorder::new()
        .record(record, strip_extension(path))
        .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))
}

/// The recorder appends its own extension, so hand it the stem.
fn strip_extension(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_suffix(CHECKPOINT_EXTENSION) {
        Some(stem) => PathBuf::from(stem),
        None       => path.to_path_buf(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    fn weights(values: Vec<f32>, shape: [usize; 2]) -> Tensor<TestBackend, 2> {
        Tensor::from_floats(TensorData::new(values, shape), &Default::default())
    }

    fn manager() -> (tempfile::TempDir, CheckpointManager) {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("mps_w"), "mps_weights").unwrap();
        (tmp, mgr)
    }

    #[test]
    fn test_file_names() {
        let (_tmp, mgr) = manager();
        assert!(mgr.epoch_path(100).ends_with("mps_weights_epoch_100.mpk.gz"));
        assert!(mgr.final_path().ends_with("final_mps_weights.mpk.gz"));
    }

    #[test]
    fn test_round_trip_is_exact() {
        let (_tmp, mgr) = manager();
        let values      = vec![0.123_456_79, 2.718_281_8, -1.0e-7, 3.141_592_7, 0.5, 1.25];
        let path        = mgr.save_epoch(&weights(values.clone(), [2, 3]), 7).unwrap();
        assert!(path.exists());

        let loaded = mgr.load::<TestBackend>(&path, [2, 3], &Default::default()).unwrap();
        assert_eq!(loaded.into_data().to_vec::<f32>().unwrap(), values);
        assert_eq!(mgr.latest_epoch().unwrap(), 7);
    }

    #[test]
    fn test_load_by_bare_file_name() {
        let (_tmp, mgr) = manager();
        mgr.save_final(&weights(vec![1.0, 2.0, 3.0], [1, 3])).unwrap();
        let loaded = mgr
            .load::<TestBackend>("final_mps_weights.mpk.gz", [1, 3], &Default::default())
            .unwrap();
        assert_eq!(loaded.dims(), [1, 3]);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let (_tmp, mgr) = manager();
        let path = mgr.save_final(&weights(vec![0.0; 6], [2, 3])).unwrap();
        let err  = mgr.load::<TestBackend>(&path, [3, 3], &Default::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::ParamShape { expected: [3, 3], actual: [2, 3] })
        );
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let (_tmp, mgr) = manager();
        assert!(mgr.load::<TestBackend>("nope.mpk.gz", [1, 3], &Default::default()).is_err());
    }

    #[test]
    fn test_list_returns_snapshots_only() {
        let (_tmp, mgr) = manager();
        mgr.save_epoch(&weights(vec![0.0; 3], [1, 3]), 200).unwrap();
        mgr.save_epoch(&weights(vec![0.0; 3], [1, 3]), 100).unwrap();
        mgr.save_final(&weights(vec![0.0; 3], [1, 3])).unwrap();

        let names: Vec<String> = mgr
            .list()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["final_mps_weights.mpk.gz", "mps_weights_epoch_100.mpk.gz", "mps_weights_epoch_200.mpk.gz"]
        );
    }

    #[test]
    fn test_config_is_saved_as_json() {
        let (tmp, mgr) = manager();
        let cfg = RunConfig { epochs: 12, batch_size: 8, ..RunConfig::default() };
        mgr.save_config(&cfg).unwrap();

        let json  = std::fs::read_to_string(tmp.path().join("mps_w").join("run_config.json")).unwrap();
        let saved: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(saved, cfg);
    }
}
