// ============================================================
// Layer 2 - RunUseCase
// ============================================================
// Orchestrates one run of the jet classifier, in order:
//
//   Step 1: Load the train/test split      (Layer 4 - data)
//   Step 2: Check shapes against the model (Layer 5 - ml)
//           and the baseline against the test set
//   Step 3: Train, or load a checkpoint    (Layer 5 / Layer 6)
//   Step 4: Evaluate on the test set       (Layer 5 - ml)
//   Step 5: Write training artifacts       (Layer 6 - infra, Train only)
//   Step 6: ROC of model and baseline      (Layer 5 / Layer 6)
//
// A baseline is required with a jet table, so the ROC comparison
// is never silently dropped on real data.
//
// Which of Train / EvaluateFromCheckpoint happens is decided by
// the caller through RunMode; nothing here prompts the user.

use anyhow::{bail, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    loader::{CsvJetLoader, SyntheticJets},
    seeded_rng,
    RngStream,
};
use crate::domain::traits::DatasetSource;
use crate::infra::{
    baseline::read_baseline,
    checkpoint::CheckpointManager,
    report::ArtifactWriter,
};
use crate::ml::{
    evaluator::{evaluate, Evaluation},
    optimizer::AdamSettings,
    predictor::{MpsCircuit, Predictor},
    roc::{baseline_roc, predictor_roc},
    trainer::{train, TrainSettings},
    InnerBackend, TrainBackend,
};

// ─── Run Configuration ───────────────────────────────────────────────────────
// Every knob of a run. Saved next to the checkpoints so a later
// evaluation can see what the weights were trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub seed:              u64,
    pub train_size:        usize,
    pub test_size:         usize,
    /// Circuit wires, also the number of features per jet
    pub n_qubits:          usize,
    pub batch_size:        usize,
    pub learning_rate:     f64,
    pub epochs:            usize,
    /// 0 disables periodic checkpoints; the final one is always written
    pub checkpoint_every:  usize,
    pub checkpoint_dir:    PathBuf,
    pub checkpoint_prefix: String,
    pub out_dir:           PathBuf,

    /// Jet table; synthetic jets are generated when absent
    pub dataset:           Option<PathBuf>,
    pub label_column:      String,
    pub scale_features:    bool,

    /// Baseline classifier scores for the ROC comparison
    pub baseline:              Option<PathBuf>,
    pub baseline_score_column: String,
    pub baseline_label_column: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed:              0,
            train_size:        10_000,
            test_size:         5_000,
            n_qubits:          16,
            batch_size:        200,
            learning_rate:     1e-2,
            epochs:            3_000,
            checkpoint_every:  100,
            checkpoint_dir:    PathBuf::from("mps_w"),
            checkpoint_prefix: "mps_weights".to_string(),
            out_dir:           PathBuf::from("."),
            dataset:           None,
            label_column:      "Jet_LABEL".to_string(),
            scale_features:    false,
            baseline:              None,
            baseline_score_column: "XGB_PRED".to_string(),
            baseline_label_column: "Jet_LABEL".to_string(),
        }
    }
}

impl RunConfig {
    /// Reject settings no run can work with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be greater than zero");
        }
        if self.n_qubits == 0 {
            bail!("n_qubits must be greater than zero");
        }
        if !(self.learning_rate > 0.0) {
            bail!("learning_rate must be positive, got {}", self.learning_rate);
        }
        if let (Some(dataset), None) = (&self.dataset, &self.baseline) {
            bail!("a baseline score table is required with dataset '{}'", dataset.display());
        }
        Ok(())
    }

    pub fn train_settings(&self) -> TrainSettings {
        TrainSettings {
            epochs:           self.epochs,
            batch_size:       self.batch_size,
            checkpoint_every: self.checkpoint_every,
            adam:             AdamSettings::new(self.learning_rate),
        }
    }

    fn dataset_source(&self) -> Box<dyn DatasetSource> {
        match &self.dataset {
            Some(path) => Box::new(
                CsvJetLoader::new(path, self.label_column.as_str()).with_scaling(self.scale_features),
            ),
            None => Box::new(SyntheticJets::new(self.n_qubits)),
        }
    }
}

/// Train fresh weights, or evaluate a saved snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Train,
    EvaluateFromCheckpoint(PathBuf),
}

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Optimizer steps taken (0 when evaluating a checkpoint)
    pub steps:        usize,
    pub test:         Evaluation,
    pub auc:          f64,
    pub baseline_auc: Option<f64>,
    /// Snapshot the evaluated weights came from or were saved to
    pub weights:      PathBuf,
    pub artifacts:    Vec<PathBuf>,
}

// ─── RunUseCase ───────────────────────────────────────────────────────────────
pub struct RunUseCase {
    config: RunConfig,
}

impl RunUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the full pipeline in the given mode.
    pub fn execute(&self, mode: RunMode) -> Result<RunSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        let device  = <InnerBackend as Backend>::Device::default();
        let circuit = MpsCircuit::new(cfg.n_qubits);

        // ── Step 1: Load the jets ─────────────────────────────────────────────
        let source = cfg.dataset_source();
        tracing::info!("Loading {} ({} train / {} test)", source.describe(), cfg.train_size, cfg.test_size);
        let split = source.load(cfg.train_size, cfg.test_size, cfg.seed)?;
        let (pos, neg) = split.train.class_counts();
        tracing::info!("Training set: {} b-jets, {} background", pos, neg);

        // ── Step 2: Shapes must agree before any loop starts ──────────────────
        Predictor::<InnerBackend>::check_width(&circuit, split.train.width())?;
        Predictor::<InnerBackend>::check_width(&circuit, split.test.width())?;

        let baseline_curve = match &cfg.baseline {
            Some(path) => {
                let scores = read_baseline(path, &cfg.baseline_score_column, &cfg.baseline_label_column)?;
                Some(baseline_roc(&scores.scores, &scores.labels, &split.test)?)
            }
            None => {
                tracing::warn!("No baseline configured; the ROC chart shows the model only");
                None
            }
        };

        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir, cfg.checkpoint_prefix.as_str())?;
        let artifacts   = ArtifactWriter::new(&cfg.out_dir, cfg.train_size, cfg.test_size)?;

        // ── Step 3: Weights ───────────────────────────────────────────────────
        let (params, history, weights) = match mode {
            RunMode::Train => {
                checkpoints.save_config(cfg)?;
                let mut rng = seeded_rng(cfg.seed, RngStream::WeightInit);
                let initial = circuit.init_params::<InnerBackend, _>(&mut rng, &device);
                let outcome = train::<TrainBackend, _>(
                    &circuit,
                    initial,
                    &split.train,
                    &cfg.train_settings(),
                    cfg.seed,
                    &checkpoints,
                    &device,
                )?;
                (outcome.params, Some(outcome.history), checkpoints.final_path())
            }
            RunMode::EvaluateFromCheckpoint(path) => {
                let params = checkpoints.load::<InnerBackend>(&path, circuit.shape(), &device)?;
                (params, None, path)
            }
        };

        // ── Step 4: Test-set metrics ──────────────────────────────────────────
        let mut rng = seeded_rng(cfg.seed, RngStream::EvalShuffle);
        let test    = evaluate(&circuit, &params, &split.test, cfg.batch_size, &mut rng, &device)?;
        tracing::info!("Test loss {:.4}, accuracy {:.2}% over {} batches", test.loss, test.accuracy * 100.0, test.batches);

        // ── Step 5: Loss/accuracy artifacts ───────────────────────────────────
        let mut files = Vec::new();
        if let Some(history) = &history {
            files.extend(artifacts.write_training(history, &test)?);
        }

        // ── Step 6: ROC ───────────────────────────────────────────────────────
        let model_roc = predictor_roc(&circuit, &params, &split.test, cfg.batch_size, &device)?;
        files.extend(artifacts.write_roc(&model_roc, baseline_curve.as_ref())?);

        Ok(RunSummary {
            steps:        history.as_ref().map_or(0, |h| h.step_count()),
            test,
            auc:          model_roc.auc,
            baseline_auc: baseline_curve.map(|r| r.auc),
            weights,
            artifacts:    files,
        })
    }

    /// Snapshot files available for `RunMode::EvaluateFromCheckpoint`.
    pub fn list_checkpoints(&self) -> Result<Vec<PathBuf>> {
        let checkpoints =
            CheckpointManager::new(&self.config.checkpoint_dir, self.config.checkpoint_prefix.as_str())?;
        checkpoints.list()
    }

    /// Epoch of the newest periodic snapshot, if a run has written one.
    pub fn latest_epoch(&self) -> Option<usize> {
        CheckpointManager::new(&self.config.checkpoint_dir, self.config.checkpoint_prefix.as_str())
            .and_then(|c| c.latest_epoch())
            .ok()
    }
}
