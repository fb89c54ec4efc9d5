// ============================================================
// Layer 5 - ROC Curve and AUC
// ============================================================
// Receiver-operating-characteristic curve of raw scores against
// {-1, +1} labels (anything > 0 counts as positive).
//
// Construction:
//   1. Sort jets by score, highest first
//   2. Walk down the list; after the last jet of each distinct
//      score emit (false positives, true positives, score)
//   3. Drop points that lie on the straight line between their
//      neighbours; they do not change the curve
//   4. Prepend (0, 0) with threshold +∞
//   5. Normalise by the total negatives / positives
//
// AUC is the trapezoidal area under (FPR, TPR). Tied scores form a
// single diagonal segment, so ties count half.

use burn::prelude::*;
use serde::Serialize;

use crate::domain::{error::PipelineError, jet::JetSet};
use crate::ml::{evaluator::predict_all, predictor::Predictor};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr:        Vec<f64>,
    pub tpr:        Vec<f64>,
    /// Score threshold of each point; the first is +∞
    pub thresholds: Vec<f64>,
    pub auc:        f64,
}

/// ROC curve of `scores` against `labels`.
pub fn roc_curve(scores: &[f32], labels: &[f32]) -> Result<RocCurve, PipelineError> {
    if scores.len() != labels.len() {
        return Err(PipelineError::RowMismatch { features: scores.len(), labels: labels.len() });
    }

    let positives = labels.iter().filter(|&&l| l > 0.0).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(PipelineError::DegenerateRoc { positives, negatives });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // ── Cumulative counts at each distinct threshold ──────────────────────────
    let mut tps        = Vec::new();
    let mut fps        = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0i64, 0i64);

    for (k, &i) in order.iter().enumerate() {
        if labels[i] > 0.0 { tp += 1 } else { fp += 1 }
        let group_ends = order.get(k + 1).map_or(true, |&next| scores[next] != scores[i]);
        if group_ends {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(scores[i] as f64);
        }
    }

    // ── Drop collinear intermediate points ────────────────────────────────────
    let last = tps.len() - 1;
    let keep: Vec<usize> = (0..tps.len())
        .filter(|&j| {
            j == 0
                || j == last
                || fps[j - 1] + fps[j + 1] != 2 * fps[j]
                || tps[j - 1] + tps[j + 1] != 2 * tps[j]
        })
        .collect();

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thr = vec![f64::INFINITY];
    for j in keep {
        fpr.push(fps[j] as f64 / negatives as f64);
        tpr.push(tps[j] as f64 / positives as f64);
        thr.push(thresholds[j]);
    }

    let auc = trapezoid(&fpr, &tpr);
    Ok(RocCurve { fpr, tpr, thresholds: thr, auc })
}

/// Trapezoidal area under y(x) for x sorted ascending.
fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}

/// Scores of the whole test set under frozen `params`, and their ROC.
pub fn predictor_roc<B: Backend, P: Predictor<B>>(
    predictor: &P,
    params:    &Tensor<B, 2>,
    set:       &JetSet,
    chunk:     usize,
    device:    &B::Device,
) -> Result<RocCurve, PipelineError> {
    let scores = predict_all(predictor, params, set, chunk, device)?;
    roc_curve(&scores, set.labels())
}

/// ROC of externally computed scores for the jets of `test`.
/// The baseline must score exactly as many jets as the test set holds.
pub fn baseline_roc(scores: &[f32], labels: &[f32], test: &JetSet) -> Result<RocCurve, PipelineError> {
    if scores.len() != test.len() {
        return Err(PipelineError::BaselinePopulation { baseline: scores.len(), test: test.len() });
    }
    roc_curve(scores, labels)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::predictor::MpsCircuit;
    use burn::backend::NdArray;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_perfect_separation_has_unit_area() {
        let roc = roc_curve(&[0.9, 0.8, 0.3, -0.4, -0.5], &[1.0, 1.0, 1.0, -1.0, -1.0]).unwrap();
        assert_eq!(roc.auc, 1.0);
        assert_eq!(roc.fpr.first(), Some(&0.0));
        assert_eq!(roc.tpr.last(), Some(&1.0));
        assert_eq!(roc.fpr.last(), Some(&1.0));
    }

    #[test]
    fn test_reversed_scores_have_zero_area() {
        let roc = roc_curve(&[-0.9, -0.1, 0.2, 0.7], &[1.0, 1.0, -1.0, -1.0]).unwrap();
        assert_eq!(roc.auc, 0.0);
    }

    #[test]
    fn test_reference_points() {
        // Two positives at 0.8 and 0.35, two negatives at 0.4 and 0.1
        let roc = roc_curve(&[0.1, 0.4, 0.35, 0.8], &[-1.0, -1.0, 1.0, 1.0]).unwrap();
        assert!(close(&roc.fpr, &[0.0, 0.0, 0.5, 0.5, 1.0]));
        assert!(close(&roc.tpr, &[0.0, 0.5, 0.5, 1.0, 1.0]));
        assert_eq!(roc.thresholds[0], f64::INFINITY);
        assert!(close(&roc.thresholds[1..], &[0.8f32 as f64, 0.4f32 as f64, 0.35f32 as f64, 0.1f32 as f64]));
        assert!((roc.auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_ties_form_one_point() {
        let roc = roc_curve(&[0.5, 0.5, 0.5, 0.5], &[1.0, -1.0, 1.0, -1.0]).unwrap();
        assert!(close(&roc.fpr, &[0.0, 1.0]));
        assert!(close(&roc.tpr, &[0.0, 1.0]));
        assert!((roc.auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_points_are_dropped() {
        let roc = roc_curve(&[0.9, 0.8, 0.7, 0.1], &[1.0, 1.0, 1.0, -1.0]).unwrap();
        assert_eq!(roc.fpr.len(), 4);
        assert!(close(&roc.tpr, &[0.0, 1.0 / 3.0, 1.0, 1.0]));
        assert!(close(&roc.thresholds[1..], &[0.9f32 as f64, 0.7f32 as f64, 0.1f32 as f64]));
        assert_eq!(roc.auc, 1.0);
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let err = roc_curve(&[0.1, 0.2], &[1.0, 1.0]).unwrap_err();
        assert_eq!(err, PipelineError::DegenerateRoc { positives: 2, negatives: 0 });
        let err = roc_curve(&[], &[]).unwrap_err();
        assert_eq!(err, PipelineError::DegenerateRoc { positives: 0, negatives: 0 });
    }

    #[test]
    fn test_length_mismatch() {
        let err = roc_curve(&[0.1, 0.2, 0.3], &[1.0, -1.0]).unwrap_err();
        assert_eq!(err, PipelineError::RowMismatch { features: 3, labels: 2 });
    }

    #[test]
    fn test_predictor_roc_uses_every_row() {
        let circuit  = MpsCircuit::new(2);
        let features = vec![0.1, 0.2, 2.9, 3.0, 0.3, 0.1, 2.8, 2.7];
        let set      = JetSet::new(2, features, vec![1.0, -1.0, 1.0, -1.0]).unwrap();
        let params   = Tensor::<NdArray, 2>::zeros([1, 3], &Default::default());

        let roc = predictor_roc(&circuit, &params, &set, 3, &Default::default()).unwrap();
        assert!((0.0..=1.0).contains(&roc.auc));
        assert_eq!(roc.fpr.last(), Some(&1.0));
    }

    #[test]
    fn test_baseline_must_cover_the_test_set() {
        let set = JetSet::new(1, vec![0.1, 0.2, 0.3], vec![1.0, -1.0, 1.0]).unwrap();

        let err = baseline_roc(&[0.9, 0.1], &[1.0, -1.0], &set).unwrap_err();
        assert_eq!(err, PipelineError::BaselinePopulation { baseline: 2, test: 3 });

        let roc = baseline_roc(&[0.9, 0.1, 0.8], &[1.0, -1.0, 1.0], &set).unwrap();
        assert_eq!(roc.auc, 1.0);
    }
}
