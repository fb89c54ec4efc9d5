// ============================================================
// Layer 5 - Adam State Machine
// ============================================================
// Thin step-checked wrapper around Burn's Adam.
//
// The circuit weights, Burn's optimizer (which holds the moment
// estimates) and the step counter travel together in one
// AdamState value. Every update consumes the previous state and
// returns the next one:
//
//   init(params0)             → state { t = 0 }
//   update(t, grads, state)   → state { t + 1 }
//   state.params()            → current parameters (no mutation)
//
// Burn's Adam applies, for step t (1-based inside Burn):
//   m = β1*m + (1-β1)*g        (mean)
//   v = β2*v + (1-β2)*g²       (variance)
//   θ = θ - lr * m̂ / (√v̂ + ε)  (update, bias-corrected)
//
// The caller passes the step index it believes it is on. It must
// equal the state's counter, so a gradient computed for one step
// can never be applied to the state of another.
//
// Reference: Kingma & Ba (2015) Adam

use burn::{
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::PipelineError;
use crate::ml::predictor::CircuitWeights;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamSettings {
    pub learning_rate: f64,
    pub beta1:         f32,
    pub beta2:         f32,
    pub epsilon:       f32,
}

impl AdamSettings {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate, beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

impl Default for AdamSettings {
    fn default() -> Self {
        Self::new(1e-2)
    }
}

/// Snapshot of the optimizer between two steps.
pub struct AdamState<B: AutodiffBackend, O> {
    weights: CircuitWeights<B>,
    optim:   O,
    step:    usize,
}

impl<B: AutodiffBackend, O> AdamState<B, O> {
    /// Weights on the autodiff backend, ready for a forward pass
    pub fn weights(&self) -> &CircuitWeights<B> {
        &self.weights
    }

    /// Current parameters
    pub fn params(&self) -> Tensor<B::InnerBackend, 2> {
        self.weights.params().inner()
    }

    /// Number of updates applied so far, also the next expected step index
    pub fn step_count(&self) -> usize {
        self.step
    }
}

impl<B: AutodiffBackend, O> fmt::Debug for AdamState<B, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdamState")
            .field("shape", &self.weights.params().dims())
            .field("step", &self.step)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Adam {
    settings: AdamSettings,
}

impl Adam {
    pub fn new(settings: AdamSettings) -> Self {
        Self { settings }
    }

    /// Fresh Burn optimizer, step counter 0.
    pub fn init<B: AutodiffBackend>(
        &self,
        params: Tensor<B::InnerBackend, 2>,
    ) -> AdamState<B, impl Optimizer<CircuitWeights<B>, B>> {
        let optim = AdamConfig::new()
            .with_beta_1(self.settings.beta1)
            .with_beta_2(self.settings.beta2)
            .with_epsilon(self.settings.epsilon)
            .init::<B, CircuitWeights<B>>();

        AdamState {
            weights: CircuitWeights::new(Tensor::from_inner(params)),
            optim,
            step: 0,
        }
    }

    /// Apply one update. `gradients` must have been computed at
    /// `state.weights()`, and `step_index` must equal `state.step_count()`.
    pub fn update<B, O>(
        &self,
        step_index: usize,
        gradients:  GradientsParams,
        state:      AdamState<B, O>,
    ) -> Result<AdamState<B, O>, PipelineError>
    where
        B: AutodiffBackend,
        O: Optimizer<CircuitWeights<B>, B>,
    {
        if step_index != state.step {
            return Err(PipelineError::StepOutOfOrder { expected: state.step, actual: step_index });
        }

        let gradient = gradients
            .get::<B::InnerBackend, 2>(state.weights.weights.id)
            .ok_or(PipelineError::MissingGradient)?;
        let expected = state.weights.params().dims();
        let actual   = gradient.dims();
        if actual != expected {
            return Err(PipelineError::ParamShape { expected, actual });
        }

        let AdamState { weights, mut optim, step } = state;
        let weights = optim.step(self.settings.learning_rate, weights, gradients);

        Ok(AdamState { weights, optim, step: step + 1 })
    }
}
