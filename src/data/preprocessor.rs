// ============================================================
// Layer 4 - Feature Preprocessor
// ============================================================
// Rescales raw jet features so each one can be used directly as a
// rotation angle in the circuit's angle embedding.
//
// Each column is mapped linearly so that its training minimum
// becomes 0 and its training maximum becomes π:
//
//   x' = (x - min) / (max - min) * π
//
// The ranges are fitted on the training rows only and then applied
// unchanged to the test rows, so test values may land slightly
// outside [0, π]. A column that is constant in the training data
// maps to 0.

use std::f32::consts::PI;

use crate::domain::jet::JetSet;

#[derive(Debug, Clone, PartialEq)]
pub struct AngleScaler {
    min: Vec<f32>,
    max: Vec<f32>,
}

impl AngleScaler {
    /// Learn per-column ranges from `set`.
    pub fn fit(set: &JetSet) -> Self {
        let width   = set.width();
        let mut min = vec![f32::INFINITY; width];
        let mut max = vec![f32::NEG_INFINITY; width];

        for i in 0..set.len() {
            for (j, &v) in set.row(i).iter().enumerate() {
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }

        Self { min, max }
    }

    /// Apply the fitted ranges, returning a rescaled copy.
    pub fn transform(&self, set: &JetSet) -> JetSet {
        set.map_features(|j, v| {
            let span = self.max[j] - self.min[j];
            if span > 0.0 { (v - self.min[j]) / span * PI } else { 0.0 }
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn set(rows: Vec<Vec<f32>>) -> JetSet {
        let width  = rows[0].len();
        let labels = vec![1.0; rows.len()];
        JetSet::new(width, rows.into_iter().flatten().collect(), labels).unwrap()
    }

    #[test]
    fn test_training_range_maps_to_zero_pi() {
        let train  = set(vec![vec![10.0, -1.0], vec![20.0, 1.0], vec![15.0, 0.0]]);
        let scaled = AngleScaler::fit(&train).transform(&train);
        assert_eq!(scaled.row(0), &[0.0, 0.0]);
        assert!((scaled.row(1)[0] - PI).abs() < 1e-6);
        assert!((scaled.row(2)[1] - PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let train  = set(vec![vec![3.0], vec![3.0]]);
        let scaled = AngleScaler::fit(&train).transform(&train);
        assert_eq!(scaled.features(), &[0.0, 0.0]);
    }

    #[test]
    fn test_test_rows_use_training_ranges() {
        let train  = set(vec![vec![0.0], vec![1.0]]);
        let test   = set(vec![vec![2.0]]);
        let scaled = AngleScaler::fit(&train).transform(&test);
        assert!((scaled.row(0)[0] - 2.0 * PI).abs() < 1e-5);
    }
}
