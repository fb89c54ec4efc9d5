// ============================================================
// Layer 4 - Jet Dataset
// ============================================================
// Exposes a JetSet through Burn's Dataset trait, one Jet item per
// row, so the batcher consumes it the way any Burn dataset is
// consumed.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::jet::JetSet;

/// One jet: its feature vector and its {-1, +1} label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    pub features: Vec<f32>,
    pub label:    f32,
}

impl Dataset<Jet> for JetSet {
    fn get(&self, index: usize) -> Option<Jet> {
        (index < JetSet::len(self)).then(|| Jet {
            features: self.row(index).to_vec(),
            label:    self.labels()[index],
        })
    }

    fn len(&self) -> usize {
        JetSet::len(self)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_follow_rows() {
        let set = JetSet::new(2, vec![0.0, 1.0, 2.0, 3.0], vec![1.0, -1.0]).unwrap();
        assert_eq!(Dataset::len(&set), 2);
        assert_eq!(set.get(1), Some(Jet { features: vec![2.0, 3.0], label: -1.0 }));
        assert_eq!(set.get(2), None);
    }

    #[test]
    fn test_iter_visits_every_jet_in_order() {
        let set    = JetSet::new(1, vec![0.5, 1.5, 2.5], vec![1.0, 1.0, -1.0]).unwrap();
        let labels: Vec<f32> = set.iter().map(|jet| jet.label).collect();
        assert_eq!(labels, vec![1.0, 1.0, -1.0]);
    }
}
