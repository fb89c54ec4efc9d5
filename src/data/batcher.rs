// ============================================================
// Layer 4 - Batching & Shuffling
// ============================================================
// Splits a JetSet into fixed-size mini-batches for one epoch and
// turns a batch into Burn tensors.
//
// How one call works (N rows, batch size B):
//   1. Draw a fresh permutation of 0..N from the caller's RNG
//   2. Cut the permutation into floor(N / B) chunks of B indices
//   3. Drop the N mod B leftover indices for this call
//   4. Gather each chunk's feature rows and labels together
//
// Features and labels are gathered with the same indices, so a
// batch is always row-aligned. Because the permutation comes
// from the RNG that the caller keeps across epochs, every epoch
// sees a different batch composition while the run as a whole
// stays reproducible from the seed.
//
// If B > N there is nothing to cut: zero batches come back. B == 0
// is rejected outright.
//
// JetBatcher implements Burn's Batcher trait over Jet items, so a
// batch of jets becomes one [N, W] feature tensor and one [N]
// label tensor.

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
    tensor::TensorData,
};
use rand::{seq::SliceRandom, Rng};

use crate::data::dataset::Jet;
use crate::domain::{error::PipelineError, jet::JetSet};

/// Randomly partition row indices `0..rows` into full batches.
///
/// Returns `rows / batch_size` index lists of exactly
/// `batch_size` entries; no index appears twice.
pub fn partition<R: Rng + ?Sized>(
    rows:       usize,
    batch_size: usize,
    rng:        &mut R,
) -> Result<Vec<Vec<usize>>, PipelineError> {
    if batch_size == 0 {
        return Err(PipelineError::ZeroBatchSize);
    }

    let chunks = rows / batch_size;
    if chunks == 0 {
        tracing::debug!(
            "Batch size {} exceeds the {} available rows; no batches produced",
            batch_size,
            rows
        );
        return Ok(Vec::new());
    }

    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(rng);

    let dropped = rows - chunks * batch_size;
    if dropped > 0 {
        tracing::debug!("Dropping {} leftover rows this pass", dropped);
    }

    Ok(order
        .chunks_exact(batch_size)
        .map(<[usize]>::to_vec)
        .collect())
}

/// Shuffle `set` and split it into row-aligned batches.
pub fn batch_and_shuffle<R: Rng + ?Sized>(
    set:        &JetSet,
    batch_size: usize,
    rng:        &mut R,
) -> Result<Vec<JetSet>, PipelineError> {
    Ok(partition(set.len(), batch_size, rng)?
        .iter()
        .map(|rows| set.select(rows))
        .collect())
}

// ─── JetBatch ─────────────────────────────────────────────────────────────────
/// One batch ready for the predictor.
#[derive(Debug, Clone)]
pub struct JetBatch<B: Backend> {
    /// Shape: [batch_size, feature_width]
    pub features: Tensor<B, 2>,

    /// Shape: [batch_size], values -1.0 / +1.0
    pub labels: Tensor<B, 1>,
}

// ─── JetBatcher ───────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created where the
/// predictor runs.
#[derive(Clone, Debug)]
pub struct JetBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> JetBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Every jet of `set`, in row order, as one batch on this batcher's device.
    pub fn batch_set(&self, set: &JetSet) -> JetBatch<B> {
        let jets: Vec<Jet> = set.iter().collect();
        self.batch(jets, &self.device)
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<B, Jet, JetBatch<B>> for JetBatcher<B> {
    /// Stack N jets of width W into features [N, W] and labels [N].
    fn batch(&self, items: Vec<Jet>, device: &B::Device) -> JetBatch<B> {
        let rows  = items.len();
        let width = items.first().map_or(0, |jet| jet.features.len());

        let features: Vec<f32> = items.iter().flat_map(|jet| jet.features.iter().copied()).collect();
        let labels:   Vec<f32> = items.iter().map(|jet| jet.label).collect();

        JetBatch {
            features: Tensor::<B, 2>::from_floats(TensorData::new(features, [rows, width]), device),
            labels:   Tensor::<B, 1>::from_floats(TensorData::new(labels, [rows]), device),
        }
    }
}
