// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer only talks to datasets through this
// trait, so a CSV file and the synthetic generator are
// interchangeable.

use anyhow::Result;

use crate::domain::jet::DatasetSplit;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can hand over a train/test split of jets.
///
/// Implementations:
///   - CsvJetLoader  → reads a preprocessed jet table from disk
///   - SyntheticJets → generates two overlapping jet populations
pub trait DatasetSource {
    /// Load `train_size` training jets and `test_size` test jets.
    /// Must return the same split for the same `seed`.
    fn load(&self, train_size: usize, test_size: usize, seed: u64) -> Result<DatasetSplit>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}
