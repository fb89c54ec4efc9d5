// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Epochs of shuffled mini-batch Adam updates on the circuit
// weights.
//
// Key points:
//   - The weights live on the autodiff backend inside AdamState;
//     each step gets loss, accuracy and gradient from one forward
//     pass over them, then Burn's Adam steps the module
//   - The shuffle RNG is created once per run and carried across
//     epochs, so each epoch draws a new batch partition while the
//     whole run stays reproducible from the seed
//   - The global step index is handed to Adam with every update;
//     the optimizer rejects any index that does not match its state
//
// Per epoch e (1-based), when e is a multiple of checkpoint_every:
//   print "e  loss  accuracy" of the LAST step of epoch e
//   save {prefix}_epoch_{e}
// After the last epoch the final weights are always saved.

use anyhow::Result;
use burn::{prelude::*, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::{batch_and_shuffle, JetBatcher}, seeded_rng, RngStream};
use crate::domain::{error::PipelineError, jet::JetSet};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    metrics::evaluate_step,
    optimizer::{Adam, AdamSettings},
    predictor::Predictor,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainSettings {
    pub epochs:           usize,
    pub batch_size:       usize,
    /// Save and report every this many epochs; 0 turns it off
    pub checkpoint_every: usize,
    pub adam:             AdamSettings,
}

/// Metrics of one optimizer step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepRecord {
    /// Global step index, 0-based
    pub step:     usize,
    /// Epoch the step belongs to, 1-based
    pub epoch:    usize,
    pub loss:     f64,
    pub accuracy: f64,
}

/// Averages over the steps of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochSummary {
    pub epoch:    usize,
    pub loss:     f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    records: Vec<StepRecord>,
}

impl TrainingHistory {
    pub(crate) fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    /// Per-step loss and accuracy, in step order
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn step_count(&self) -> usize {
        self.records.len()
    }

    /// Most recent record
    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    /// One summary per epoch that produced at least one step.
    pub fn epoch_means(&self) -> Vec<EpochSummary> {
        self.records
            .chunk_by(|a, b| a.epoch == b.epoch)
            .map(|steps| {
                let n = steps.len() as f64;
                EpochSummary {
                    epoch:    steps[0].epoch,
                    loss:     steps.iter().map(|r| r.loss).sum::<f64>() / n,
                    accuracy: steps.iter().map(|r| r.accuracy).sum::<f64>() / n,
                }
            })
            .collect()
    }
}

/// What a finished run hands back.
#[derive(Debug)]
pub struct TrainOutcome<B: Backend> {
    /// Final weights, also written as the final checkpoint
    pub params:  Tensor<B, 2>,
    /// Optimizer steps applied
    pub steps:   usize,
    pub history: TrainingHistory,
}

/// One row of the progress table: the epoch and the metrics of
/// the last step it completed.
pub fn format_progress(epoch: usize, last: &StepRecord) -> String {
    format!("{}\t{:.3}\t{:.2}%", epoch, last.loss, last.accuracy * 100.0)
}

/// Train `initial` on `train_set` for `settings.epochs` epochs.
pub fn train<B, P>(
    predictor:   &P,
    initial:     Tensor<B::InnerBackend, 2>,
    train_set:   &JetSet,
    settings:    &TrainSettings,
    seed:        u64,
    checkpoints: &CheckpointManager,
    device:      &B::Device,
) -> Result<TrainOutcome<B::InnerBackend>>
where
    B: AutodiffBackend,
    P: Predictor<B>,
{
    // ── Fail fast on shape problems ───────────────────────────────────────────
    predictor.check_width(train_set.width())?;
    let expected = predictor.param_shape();
    let actual   = initial.dims();
    if actual != expected {
        return Err(PipelineError::ParamShape { expected, actual }.into());
    }
    if settings.batch_size == 0 {
        return Err(PipelineError::ZeroBatchSize.into());
    }

    let chunks = train_set.len() / settings.batch_size;
    tracing::info!(
        "Training {} epochs × {} batches of {} jets (lr={})",
        settings.epochs, chunks, settings.batch_size, settings.adam.learning_rate,
    );
    if chunks == 0 {
        tracing::warn!(
            "Batch size {} exceeds the {} training jets; no updates will be made",
            settings.batch_size, train_set.len(),
        );
    }

    let adam      = Adam::new(settings.adam);
    let batcher   = JetBatcher::<B>::new(device.clone());
    let mut rng   = seeded_rng(seed, RngStream::TrainShuffle);
    let mut state = adam.init::<B>(initial);
    let mut history     = TrainingHistory::default();
    let mut warned_nan  = false;

    println!("Training...");
    println!("Epoch\tLoss\tAccuracy");

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=settings.epochs {
        for batch in batch_and_shuffle(train_set, settings.batch_size, &mut rng)? {
            let step   = state.step_count();
            let result = evaluate_step(predictor, state.weights(), batcher.batch_set(&batch))?;

            if !result.loss.is_finite() && !warned_nan {
                tracing::warn!("Non-finite loss {} at step {}; continuing", result.loss, step);
                warned_nan = true;
            }
            tracing::debug!("step {}: loss={:.6} acc={:.4}", step, result.loss, result.accuracy);

            state = adam.update(step, result.gradients, state)?;
            history.push(StepRecord { step, epoch, loss: result.loss, accuracy: result.accuracy });
        }

        if settings.checkpoint_every > 0 && epoch % settings.checkpoint_every == 0 {
            if let Some(last) = history.last() {
                println!("{}", format_progress(epoch, last));
            }
            let path = checkpoints.save_epoch(&state.params(), epoch)?;
            tracing::info!("Checkpoint saved: '{}'", path.display());
        }
    }

    let params = state.params();
    let path   = checkpoints.save_final(&params)?;
    tracing::info!("Training complete after {} steps; final weights in '{}'", state.step_count(), path.display());

    Ok(TrainOutcome { params, steps: state.step_count(), history })
}
