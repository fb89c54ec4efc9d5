// ============================================================
// Layer 5 - Predictor and MPS Circuit
// ============================================================
// A Predictor maps a batch of feature vectors and one parameter
// tensor to one score per jet. Gradients are not part of the
// trait: running `forward` on an autodiff backend records the
// graph, and `metrics::evaluate_step` differentiates it.
//
// MpsCircuit is a staircase matrix-product-state circuit:
//
//   wire 0  ─RX(x0)─ RZ RY ─●─────────────────────
//   wire 1  ─RX(x1)─ RY ────X─ RZ RY ─●───────────
//   wire 2  ─RX(x2)─ RY ──────────────X─ RZ RY ─●─ ...
//   ...                                          X─ ... ⟨Z⟩ on the last wire
//
// Block k acts on wires (k, k+1) with three weights
//   w[k][0] = RZ on wire k, w[k][1] = RY on wire k,
//   w[k][2] = RY on wire k+1, then CNOT(k → k+1).
//
// Wire k is never touched again after it controls block k, so it
// can be traced out right there. Tracing out the control of a
// CNOT leaves the target's Bloch vector as (sx, z·sy, z·sz), with
// z the control's ⟨Z⟩. The whole circuit therefore reduces to
// carrying one Bloch vector down the chain, which is exact and
// costs O(wires) tensor ops per batch.
//
// CircuitWeights wraps the parameter tensor in a Burn Module so the
// optimizer can step it and the recorder can save it.

use burn::{module::Param, prelude::*, tensor::TensorData};
use rand::Rng;
use std::f32::consts::PI;

use crate::domain::error::PipelineError;

/// Weights per two-wire block
pub const PARAMS_PER_BLOCK: usize = 3;

// ─── Predictor ────────────────────────────────────────────────────────────────
pub trait Predictor<B: Backend> {
    /// Number of features each jet must provide
    fn feature_width(&self) -> usize;

    /// Shape of the parameter tensor this predictor consumes
    fn param_shape(&self) -> [usize; 2];

    /// features: [batch, feature_width], params: param_shape → scores: [batch]
    fn forward(&self, features: Tensor<B, 2>, params: Tensor<B, 2>) -> Tensor<B, 1>;

    fn check_width(&self, width: usize) -> Result<(), PipelineError> {
        let expected = self.feature_width();
        if width != expected {
            return Err(PipelineError::FeatureWidth { expected, actual: width });
        }
        Ok(())
    }

    fn check_params(&self, params: &Tensor<B, 2>) -> Result<(), PipelineError> {
        let expected = self.param_shape();
        let actual   = params.dims();
        if actual != expected {
            return Err(PipelineError::ParamShape { expected, actual });
        }
        Ok(())
    }
}

// ─── CircuitWeights ───────────────────────────────────────────────────────────
/// Trainable weights of the circuit, shape [blocks, PARAMS_PER_BLOCK].
#[derive(Module, Debug)]
pub struct CircuitWeights<B: Backend> {
    pub weights: Param<Tensor<B, 2>>,
}

impl<B: Backend> CircuitWeights<B> {
    pub fn new(weights: Tensor<B, 2>) -> Self {
        Self { weights: Param::from_tensor(weights) }
    }

    pub fn params(&self) -> Tensor<B, 2> {
        self.weights.val()
    }
}

// ─── MpsCircuit ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpsCircuit {
    n_qubits: usize,
}

impl MpsCircuit {
    pub fn new(n_qubits: usize) -> Self {
        Self { n_qubits }
    }

    /// [blocks, weights per block]
    pub fn shape(&self) -> [usize; 2] {
        [self.n_qubits.saturating_sub(1), PARAMS_PER_BLOCK]
    }

    /// Weights drawn uniformly from [0, π).
    pub fn init_params<B: Backend, R: Rng + ?Sized>(
        &self,
        rng:    &mut R,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        let [rows, cols] = self.shape();
        let values: Vec<f32> = (0..rows * cols).map(|_| rng.gen::<f32>() * PI).collect();
        Tensor::<B, 2>::from_floats(TensorData::new(values, [rows, cols]), device)
    }
}

impl<B: Backend> Predictor<B> for MpsCircuit {
    fn feature_width(&self) -> usize {
        self.n_qubits
    }

    fn param_shape(&self) -> [usize; 2] {
        self.shape()
    }

    fn forward(&self, features: Tensor<B, 2>, params: Tensor<B, 2>) -> Tensor<B, 1> {
        let [batch, _] = features.dims();
        let angle  = |j: usize| features.clone().slice([0..batch, j..j + 1]);
        let weight = |k: usize, i: usize| {
            params.clone().slice([k..k + 1, i..i + 1]).expand([batch, 1])
        };

        // RX(x)|0> has Bloch vector (0, -sin x, cos x)
        let x0     = angle(0);
        let mut bx = x0.zeros_like();
        let mut by = x0.clone().sin().neg();
        let mut bz = x0.cos();

        for k in 0..self.n_qubits.saturating_sub(1) {
            let (rz, ry_control, ry_target) = (weight(k, 0), weight(k, 1), weight(k, 2));

            // Carried wire: RZ then RY; only its z component reaches the CNOT
            let x_rotated = bx * rz.clone().cos() - by * rz.sin();
            let control   = bz * ry_control.clone().cos() - x_rotated * ry_control.sin();

            // Incoming wire: RX(x)|0> then RY
            let x        = angle(k + 1);
            let target_x = x.clone().cos() * ry_target.clone().sin();
            let target_y = x.clone().sin().neg();
            let target_z = x.cos() * ry_target.cos();

            bx = target_x;
            by = control.clone() * target_y;
            bz = control * target_z;
        }

        bz.reshape([batch])
    }
}

// ─── Test Support ─────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Outputs `value` for every jet regardless of the parameters.
    /// The parameters still enter the graph (with weight zero) so
    /// autodiff produces a gradient tensor of the right shape.
    pub struct ConstantPredictor {
        pub value: f32,
        pub width: usize,
        pub shape: [usize; 2],
    }

    impl<B: Backend> Predictor<B> for ConstantPredictor {
        fn feature_width(&self) -> usize {
            self.width
        }

        fn param_shape(&self) -> [usize; 2] {
            self.shape
        }

        fn forward(&self, features: Tensor<B, 2>, params: Tensor<B, 2>) -> Tensor<B, 1> {
            let [batch, _] = features.dims();
            let anchor     = params.sum().mul_scalar(0.0).expand([batch]);
            Tensor::<B, 1>::ones([batch], &features.device()).mul_scalar(self.value) + anchor
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{seeded_rng, RngStream};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray;

    fn tensor2(values: Vec<f32>, shape: [usize; 2]) -> Tensor<TestBackend, 2> {
        Tensor::from_floats(TensorData::new(values, shape), &Default::default())
    }

    fn scores(t: Tensor<TestBackend, 1>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_param_shape() {
        let circuit = MpsCircuit::new(16);
        assert_eq!(<MpsCircuit as Predictor<TestBackend>>::param_shape(&circuit), [15, 3]);
        assert_eq!(<MpsCircuit as Predictor<TestBackend>>::feature_width(&circuit), 16);
    }

    #[test]
    fn test_zero_weights_give_product_of_cosines() {
        // With every rotation at zero each CNOT just copies ⟨Z⟩ along
        let circuit  = MpsCircuit::new(3);
        let features = tensor2(vec![0.3, 0.7, 1.1], [1, 3]);
        let params   = tensor2(vec![0.0; 6], [2, 3]);
        let out      = scores(circuit.forward(features, params));
        let expected = 0.3f32.cos() * 0.7f32.cos() * 1.1f32.cos();
        assert!((out[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_two_qubit_closed_form() {
        let (x0, x1)     = (0.4f32, 1.2f32);
        let (a, b, c)    = (0.5f32, 0.9f32, 0.2f32);
        let circuit      = MpsCircuit::new(2);
        let out          = scores(circuit.forward(tensor2(vec![x0, x1], [1, 2]), tensor2(vec![a, b, c], [1, 3])));
        let control      = x0.cos() * b.cos() - x0.sin() * a.sin() * b.sin();
        let expected     = control * x1.cos() * c.cos();
        assert!((out[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_scores_are_expectation_values() {
        let circuit  = MpsCircuit::new(16);
        let device   = Default::default();
        let mut rng  = seeded_rng(0, RngStream::WeightInit);
        let params   = circuit.init_params::<TestBackend, _>(&mut rng, &device);
        let values: Vec<f32> = (0..8 * 16).map(|i| (i as f32 * 0.37) % PI).collect();
        let out = scores(circuit.forward(tensor2(values, [8, 16]), params));
        assert_eq!(out.len(), 8);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_init_params_range_and_seed() {
        let circuit = MpsCircuit::new(16);
        let device  = Default::default();
        let a = circuit.init_params::<TestBackend, _>(&mut seeded_rng(0, RngStream::WeightInit), &device);
        let b = circuit.init_params::<TestBackend, _>(&mut seeded_rng(0, RngStream::WeightInit), &device);
        let a = a.into_data().to_vec::<f32>().unwrap();
        assert_eq!(a, b.into_data().to_vec::<f32>().unwrap());
        assert!(a.iter().all(|w| (0.0..PI).contains(w)));
    }

    #[test]
    fn test_gradient_reaches_every_block() {
        type AD = Autodiff<NdArray>;
        let device  = Default::default();
        let circuit = MpsCircuit::new(4);
        let params  = Tensor::<AD, 2>::from_floats(
            TensorData::new(vec![0.3, 0.6, 0.9, 1.2, 0.2, 0.5, 0.8, 1.1, 0.4], [3, 3]),
            &device,
        )
        .require_grad();
        let features = Tensor::<AD, 2>::from_floats(
            TensorData::new(vec![0.5, 1.0, 1.5, 2.0, 2.5, 0.1, 0.7, 1.9], [2, 4]),
            &device,
        );

        let loss  = circuit.forward(features, params.clone()).sum();
        let grads = loss.backward();
        let grad  = params.grad(&grads).unwrap().into_data().to_vec::<f32>().unwrap();

        assert_eq!(grad.len(), 9);
        // The readout-side RY weight of every block influences ⟨Z⟩
        for k in 0..3 {
            assert!(grad[k * 3 + 2].abs() > 0.0, "block {k} has no gradient");
        }
    }

    #[test]
    fn test_check_width_and_params() {
        let circuit = MpsCircuit::new(4);
        assert_eq!(
            Predictor::<TestBackend>::check_width(&circuit, 5),
            Err(PipelineError::FeatureWidth { expected: 4, actual: 5 })
        );
        let params = tensor2(vec![0.0; 4], [2, 2]);
        assert_eq!(
            circuit.check_params(&params),
            Err(PipelineError::ParamShape { expected: [3, 3], actual: [2, 2] })
        );
    }
}
