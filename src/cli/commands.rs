// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Three subcommands:
//   train        - train fresh weights, then evaluate and report
//   evaluate     - load a saved snapshot, then evaluate and report
//   checkpoints  - list the snapshots in the checkpoint directory
//
// Defaults reproduce the reference run: 10000 training jets, 5000
// test jets, 16 features, batches of 200, 3000 epochs at lr 0.01.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::run_use_case::RunConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the circuit, then evaluate it and write the reports
    Train(TrainArgs),

    /// Evaluate a saved checkpoint and write the ROC report
    Evaluate(EvaluateArgs),

    /// List saved checkpoints
    Checkpoints(CheckpointsArgs),
}

/// Options shared by `train` and `evaluate`.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Seed for dataset split, weight init and shuffling
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Number of training jets
    #[arg(long, default_value_t = 10_000)]
    pub train_size: usize,

    /// Number of test jets
    #[arg(long, default_value_t = 5_000)]
    pub test_size: usize,

    /// Circuit wires; must equal the number of features per jet
    #[arg(long, default_value_t = 16)]
    pub n_qubits: usize,

    /// Jets per gradient step (and per evaluation batch)
    #[arg(long, default_value_t = 200)]
    pub batch_size: usize,

    /// Adam step size
    #[arg(long, default_value_t = 1e-2)]
    pub lr: f64,

    #[arg(long, default_value_t = 3_000)]
    pub epochs: usize,

    /// Save a checkpoint and print progress every N epochs (0 = never)
    #[arg(long, default_value_t = 100)]
    pub checkpoint_every: usize,

    #[arg(long, default_value = "mps_w")]
    pub checkpoint_dir: PathBuf,

    /// Checkpoint file name prefix
    #[arg(long, default_value = "mps_weights")]
    pub checkpoint_prefix: String,

    /// Directory for plots and tables
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Preprocessed jet table (CSV); synthetic jets are used if omitted
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Label column of the jet table
    #[arg(long, default_value = "Jet_LABEL")]
    pub label_column: String,

    /// Min-max scale raw features into [0, π]
    #[arg(long)]
    pub scale_features: bool,

    /// Baseline classifier scores (CSV) for the ROC comparison
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    #[arg(long, default_value = "XGB_PRED")]
    pub baseline_score_column: String,

    #[arg(long, default_value = "Jet_LABEL")]
    pub baseline_label_column: String,
}

/// Convert CLI RunArgs into the application-layer RunConfig.
/// The application layer never sees clap types.
impl From<RunArgs> for RunConfig {
    fn from(a: RunArgs) -> Self {
        RunConfig {
            seed:                  a.seed,
            train_size:            a.train_size,
            test_size:             a.test_size,
            n_qubits:              a.n_qubits,
            batch_size:            a.batch_size,
            learning_rate:         a.lr,
            epochs:                a.epochs,
            checkpoint_every:      a.checkpoint_every,
            checkpoint_dir:        a.checkpoint_dir,
            checkpoint_prefix:     a.checkpoint_prefix,
            out_dir:               a.out_dir,
            dataset:               a.dataset,
            label_column:          a.label_column,
            scale_features:        a.scale_features,
            baseline:              a.baseline,
            baseline_score_column: a.baseline_score_column,
            baseline_label_column: a.baseline_label_column,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Snapshot to evaluate: a path, or a file name inside --checkpoint-dir
    #[arg(long)]
    pub checkpoint: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct CheckpointsArgs {
    #[arg(long, default_value = "mps_w")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, default_value = "mps_weights")]
    pub checkpoint_prefix: String,
}
