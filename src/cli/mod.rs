// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands a RunConfig and RunMode to Layer 2, and prints the
// results. Choosing between training and evaluating a snapshot
// is a subcommand, never an interactive prompt.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{CheckpointsArgs, Commands, EvaluateArgs, TrainArgs};

use crate::application::run_use_case::{RunConfig, RunMode, RunSummary, RunUseCase};

#[derive(Parser, Debug)]
#[command(
    name = "qml-btag",
    version,
    about = "Train a matrix-product-state circuit to tag b-jets and compare it against a baseline by ROC."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case; this layer only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)       => run_train(args),
            Commands::Evaluate(args)    => run_evaluate(args),
            Commands::Checkpoints(args) => run_checkpoints(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let use_case = RunUseCase::new(args.run.into());
    let summary  = use_case.execute(RunMode::Train)?;
    print_summary(&summary);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let use_case = RunUseCase::new(args.run.into());
    let summary  = use_case.execute(RunMode::EvaluateFromCheckpoint(args.checkpoint))?;
    print_summary(&summary);
    Ok(())
}

fn run_checkpoints(args: CheckpointsArgs) -> Result<()> {
    let use_case = RunUseCase::new(RunConfig {
        checkpoint_dir:    args.checkpoint_dir,
        checkpoint_prefix: args.checkpoint_prefix,
        ..RunConfig::default()
    });

    let files = use_case.list_checkpoints()?;
    if files.is_empty() {
        println!("No checkpoints in '{}'", use_case.config().checkpoint_dir.display());
    }
    for file in files {
        if let Some(name) = file.file_name() {
            println!("{}", name.to_string_lossy());
        }
    }
    if let Some(epoch) = use_case.latest_epoch() {
        println!("Latest periodic snapshot: epoch {}", epoch);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Testing...");
    println!("\tLoss\tAccuracy");
    println!("\t{:.3}\t{:.2}%", summary.test.loss, summary.test.accuracy * 100.0);
    println!();
    println!("ROC AUC (model):    {:.4}", summary.auc);
    if let Some(auc) = summary.baseline_auc {
        println!("ROC AUC (baseline): {:.4}", auc);
    }
    println!("Weights: {}", summary.weights.display());
    for path in &summary.artifacts {
        println!("Wrote {}", path.display());
    }
}
