// ============================================================
// Layer 5 - ML Layer (Burn)
// ============================================================
// All tensor and autodiff code lives here.
//
//   predictor.rs - the Predictor capability and the MPS circuit
//                  that implements it
//   metrics.rs   - MSE loss, sign accuracy, and the joint
//                  loss + accuracy + gradient evaluation of a step
//   optimizer.rs - explicit Adam state threaded through the loop
//   trainer.rs   - epochs of shuffled mini-batch updates with
//                  periodic checkpoints
//   evaluator.rs - frozen-parameter evaluation and raw scores
//   roc.rs       - ROC curve / AUC and the baseline comparison
//
// Training runs on `TrainBackend` (autodiff); evaluation and
// checkpoints use the plain inner backend, so no graph is built
// when gradients are not needed.

use burn::backend::Autodiff;

pub mod predictor;
pub mod metrics;
pub mod optimizer;
pub mod trainer;
pub mod evaluator;
pub mod roc;

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

pub type TrainBackend = Autodiff<InnerBackend>;
