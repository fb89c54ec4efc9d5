// ============================================================
// Layer 5 - Metric Functions
// ============================================================
// Loss     = mean((score - label)²)                 (differentiable)
// Accuracy = mean(sign(score) == label)             (in [0, 1])
//
// Labels and scores share the {-1, +1} convention, so a score of
// exactly 0 never counts as correct.
//
// A training step evaluates the predictor ONCE and derives loss,
// accuracy and the gradient from that single forward pass. The
// reported accuracy of a step is therefore always measured on the
// same parameter snapshot as its loss and gradient.
//
// NaN scores propagate into loss and gradient unchanged.

use burn::{optim::GradientsParams, prelude::*, tensor::backend::AutodiffBackend};

use crate::data::batcher::JetBatch;
use crate::domain::error::PipelineError;
use crate::ml::predictor::{CircuitWeights, Predictor};

/// Mean squared error, as a one-element tensor so it can be
/// differentiated.
pub fn mse<B: Backend>(scores: Tensor<B, 1>, labels: Tensor<B, 1>) -> Tensor<B, 1> {
    let diff = scores - labels;
    (diff.clone() * diff).mean()
}

/// Fraction of jets whose score sign matches the label.
pub fn sign_accuracy<B: Backend>(scores: Tensor<B, 1>, labels: Tensor<B, 1>) -> f64 {
    let n = labels.dims()[0];
    if n == 0 {
        return 0.0;
    }
    let hits: i64 = scores
        .sign()
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    hits as f64 / n as f64
}

/// (loss, accuracy) of frozen parameters from one forward pass.
pub fn loss_and_accuracy<B: Backend, P: Predictor<B>>(
    predictor: &P,
    params:    Tensor<B, 2>,
    batch:     &JetBatch<B>,
) -> (f64, f64) {
    let scores   = predictor.forward(batch.features.clone(), params);
    let accuracy = sign_accuracy(scores.clone(), batch.labels.clone());
    let loss     = mse(scores, batch.labels.clone()).into_scalar().elem::<f64>();
    (loss, accuracy)
}

// ─── Training step evaluation ─────────────────────────────────────────────────
/// Everything one optimizer step needs, all measured at one snapshot.
pub struct StepEvaluation {
    pub loss:      f64,
    pub accuracy:  f64,
    /// d(loss)/d(weights), keyed by the weights' parameter id
    pub gradients: GradientsParams,
}

/// Loss, accuracy and gradient of `weights` on `batch`.
///
/// Fails with `MissingGradient` when the predictor output is not
/// connected to the weights.
pub fn evaluate_step<B: AutodiffBackend, P: Predictor<B>>(
    predictor: &P,
    weights:   &CircuitWeights<B>,
    batch:     JetBatch<B>,
) -> Result<StepEvaluation, PipelineError> {
    let scores = predictor.forward(batch.features, weights.params());

    let accuracy   = sign_accuracy(scores.clone().inner(), batch.labels.clone().inner());
    let loss       = mse(scores, batch.labels);
    let loss_value = loss.clone().into_scalar().elem::<f64>();

    let gradients = GradientsParams::from_grads(loss.backward(), weights);
    if gradients.get::<B::InnerBackend, 2>(weights.weights.id).is_none() {
        return Err(PipelineError::MissingGradient);
    }

    Ok(StepEvaluation { loss: loss_value, accuracy, gradients })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::JetBatcher;
    use crate::domain::jet::JetSet;
    use crate::ml::predictor::{test_support::ConstantPredictor, MpsCircuit};
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::TensorData;

    type TestBackend = NdArray;
    type TestAutodiff = Autodiff<NdArray>;

    fn vec1(values: Vec<f32>) -> Tensor<TestBackend, 1> {
        let n = values.len();
        Tensor::from_floats(TensorData::new(values, [n]), &Default::default())
    }

    fn params(values: Vec<f32>, shape: [usize; 2]) -> Tensor<TestBackend, 2> {
        Tensor::from_floats(TensorData::new(values, shape), &Default::default())
    }

    fn tracked(values: Vec<f32>, shape: [usize; 2]) -> CircuitWeights<TestAutodiff> {
        CircuitWeights::new(Tensor::from_inner(params(values, shape)))
    }

    fn gradient(step: &StepEvaluation, weights: &CircuitWeights<TestAutodiff>) -> Vec<f32> {
        step.gradients
            .get::<TestBackend, 2>(weights.weights.id)
            .unwrap()
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }

    fn jets(labels: Vec<f32>, width: usize) -> JetSet {
        let features = (0..labels.len() * width).map(|i| 0.1 * i as f32).collect();
        JetSet::new(width, features, labels).unwrap()
    }

    fn frozen_loss(circuit: &MpsCircuit, values: Vec<f32>, shape: [usize; 2], set: &JetSet) -> f64 {
        let batch = JetBatcher::<TestBackend>::new(Default::default()).batch_set(set);
        loss_and_accuracy(circuit, params(values, shape), &batch).0
    }

    /// Scores every jet 0.5 without looking at the weights.
    struct DetachedPredictor;

    impl<B: Backend> Predictor<B> for DetachedPredictor {
        fn feature_width(&self) -> usize {
            2
        }

        fn param_shape(&self) -> [usize; 2] {
            [1, 3]
        }

        fn forward(&self, features: Tensor<B, 2>, _params: Tensor<B, 2>) -> Tensor<B, 1> {
            let [batch, _] = features.dims();
            Tensor::<B, 1>::ones([batch], &features.device()).mul_scalar(0.5)
        }
    }

    #[test]
    fn test_mse_value() {
        let loss = mse(vec1(vec![0.5, -1.0]), vec1(vec![1.0, 1.0]));
        // ((−0.5)² + (−2)²) / 2 = 2.125
        assert!((loss.into_scalar().elem::<f64>() - 2.125).abs() < 1e-6);
    }

    #[test]
    fn test_sign_accuracy_counts_matching_signs() {
        let acc = sign_accuracy(vec1(vec![0.3, -0.2, 0.9, -0.7]), vec1(vec![1.0, 1.0, 1.0, -1.0]));
        assert!((acc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_score_is_never_correct() {
        let acc = sign_accuracy(vec1(vec![0.0, 0.0]), vec1(vec![1.0, -1.0]));
        assert_eq!(acc, 0.0);
    }

    #[test]
    fn test_accuracy_stays_in_unit_interval() {
        let circuit = MpsCircuit::new(3);
        let batcher = JetBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch_set(&jets(vec![1.0, -1.0, 1.0, -1.0, -1.0], 3));
        for shift in [0.0f32, 0.7, 1.9, 3.0] {
            let (_, acc) = loss_and_accuracy(&circuit, params(vec![shift; 6], [2, 3]), &batch);
            assert!((0.0..=1.0).contains(&acc));
        }
    }

    #[test]
    fn test_constant_plus_one_on_positive_labels() {
        let predictor = ConstantPredictor { value: 1.0, width: 2, shape: [1, 3] };
        let batcher   = JetBatcher::<TestBackend>::new(Default::default());
        let batch     = batcher.batch_set(&jets(vec![1.0; 4], 2));
        for values in [vec![0.0; 3], vec![5.0, -3.0, 1e3]] {
            let (loss, acc) = loss_and_accuracy(&predictor, params(values, [1, 3]), &batch);
            assert_eq!(loss, 0.0);
            assert_eq!(acc, 1.0);
        }
    }

    #[test]
    fn test_step_metrics_match_frozen_metrics() {
        let circuit = MpsCircuit::new(3);
        let set     = jets(vec![1.0, -1.0, -1.0, 1.0], 3);
        let values  = vec![0.2, 0.4, 0.6, 0.8, 1.0, 1.2];

        let frozen = JetBatcher::<TestBackend>::new(Default::default()).batch_set(&set);
        let (l, a) = loss_and_accuracy(&circuit, params(values.clone(), [2, 3]), &frozen);

        let weights = tracked(values, [2, 3]);
        let batch   = JetBatcher::<TestAutodiff>::new(Default::default()).batch_set(&set);
        let step    = evaluate_step(&circuit, &weights, batch).unwrap();

        assert!((step.loss - l).abs() < 1e-6);
        assert_eq!(step.accuracy, a);
        assert_eq!(gradient(&step, &weights).len(), 6);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let circuit = MpsCircuit::new(2);
        let set     = jets(vec![1.0, -1.0], 2);
        let base    = vec![0.3f32, 0.5, 0.7];

        let weights = tracked(base.clone(), [1, 3]);
        let batch   = JetBatcher::<TestAutodiff>::new(Default::default()).batch_set(&set);
        let step    = evaluate_step(&circuit, &weights, batch).unwrap();
        let grad    = gradient(&step, &weights);

        let h = 1e-3f32;
        for i in 0..3 {
            let mut up   = base.clone();
            let mut down = base.clone();
            up[i]   += h;
            down[i] -= h;
            let numeric = (frozen_loss(&circuit, up, [1, 3], &set) - frozen_loss(&circuit, down, [1, 3], &set))
                / (2.0 * h as f64);
            assert!((grad[i] as f64 - numeric).abs() < 1e-2, "param {i}: {} vs {}", grad[i], numeric);
        }
    }

    #[test]
    fn test_constant_predictor_has_zero_gradient() {
        let predictor = ConstantPredictor { value: 1.0, width: 2, shape: [1, 3] };
        let weights   = tracked(vec![1.0, 2.0, 3.0], [1, 3]);
        let batch     = JetBatcher::<TestAutodiff>::new(Default::default()).batch_set(&jets(vec![1.0, 1.0], 2));
        let step      = evaluate_step(&predictor, &weights, batch).unwrap();
        assert_eq!(step.loss, 0.0);
        assert_eq!(step.accuracy, 1.0);
        assert!(gradient(&step, &weights).iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_disconnected_predictor_is_an_error() {
        let weights = tracked(vec![1.0, 2.0, 3.0], [1, 3]);
        let batch   = JetBatcher::<TestAutodiff>::new(Default::default()).batch_set(&jets(vec![1.0, -1.0], 2));
        let result  = evaluate_step(&DetachedPredictor, &weights, batch);
        assert_eq!(result.err(), Some(PipelineError::MissingGradient));
    }
}
