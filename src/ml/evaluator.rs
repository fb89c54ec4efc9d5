// ============================================================
// Layer 5 - Evaluation Loop
// ============================================================
// Runs frozen weights over a held-out JetSet. Nothing here builds
// an autodiff graph or touches optimizer state: the parameter
// tensor is only read.
//
//   evaluate    - one shuffled partition, loss/accuracy per batch,
//                 plain average over batches
//   predict_all - raw scores for EVERY row in input order,
//                 computed in fixed-size chunks (the last chunk may
//                 be short); used by the ROC reporter

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
};
use rand::Rng;
use serde::Serialize;

use crate::data::{
    batcher::{batch_and_shuffle, JetBatcher},
    dataset::Jet,
};
use crate::domain::{error::PipelineError, jet::JetSet};
use crate::ml::{metrics::loss_and_accuracy, predictor::Predictor};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
    /// Number of full batches that were averaged
    pub batches:  usize,
}

fn check_inputs<B: Backend, P: Predictor<B>>(
    predictor: &P,
    params:    &Tensor<B, 2>,
    set:       &JetSet,
) -> Result<(), PipelineError> {
    predictor.check_width(set.width())?;
    predictor.check_params(params)
}

/// Mean loss and accuracy of `params` over one batch partition of `set`.
///
/// When `set` holds fewer rows than one batch the result is NaN.
pub fn evaluate<B, P, R>(
    predictor:  &P,
    params:     &Tensor<B, 2>,
    set:        &JetSet,
    batch_size: usize,
    rng:        &mut R,
    device:     &B::Device,
) -> Result<Evaluation, PipelineError>
where
    B: Backend,
    P: Predictor<B>,
    R: Rng + ?Sized,
{
    check_inputs(predictor, params, set)?;

    let batcher = JetBatcher::<B>::new(device.clone());
    let batches = batch_and_shuffle(set, batch_size, rng)?;

    if batches.is_empty() {
        tracing::warn!("No full batch of {} in {} test jets; metrics are undefined", batch_size, set.len());
        return Ok(Evaluation { loss: f64::NAN, accuracy: f64::NAN, batches: 0 });
    }

    let (mut loss_sum, mut acc_sum) = (0.0f64, 0.0f64);
    for batch in &batches {
        let (loss, accuracy) = loss_and_accuracy(predictor, params.clone(), &batcher.batch_set(batch));
        loss_sum += loss;
        acc_sum  += accuracy;
    }

    let n = batches.len() as f64;
    Ok(Evaluation { loss: loss_sum / n, accuracy: acc_sum / n, batches: batches.len() })
}

/// Raw predictor output for every row of `set`, in row order.
pub fn predict_all<B: Backend, P: Predictor<B>>(
    predictor: &P,
    params:    &Tensor<B, 2>,
    set:       &JetSet,
    chunk:     usize,
    device:    &B::Device,
) -> Result<Vec<f32>, PipelineError> {
    check_inputs(predictor, params, set)?;
    if chunk == 0 {
        return Err(PipelineError::ZeroBatchSize);
    }

    if set.is_empty() {
        return Ok(Vec::new());
    }

    let batcher    = JetBatcher::<B>::new(device.clone());
    let mut scores = Vec::with_capacity(set.len());

    let mut start = 0;
    while start < set.len() {
        let end   = (start + chunk).min(set.len());
        let jets: Vec<Jet> = (start..end).filter_map(|i| set.get(i)).collect();
        let batch = batcher.batch(jets, device);
        let out   = predictor.forward(batch.features, params.clone());
        scores.extend(out.into_data().iter::<f32>());
        start = end;
    }

    Ok(scores)
}
