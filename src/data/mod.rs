// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from a jet table on disk to tensor batches:
//
//   CSV table / synthetic generator
//       │
//       ▼
//   CsvJetLoader / SyntheticJets  → JetSet train/test split
//       │
//       ▼
//   AngleScaler                   → features rescaled to [0, π]
//       │
//       ▼
//   batch_and_shuffle             → fresh random partition per epoch
//       │
//       ▼
//   Dataset<Jet> / JetBatcher     → feature / label tensors
//
// All randomness is drawn from ChaCha8 generators derived from the
// run seed, one stream per purpose, so a run is reproducible and
// reshuffling the training set never perturbs weight initialisation.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Reads a jet table or generates synthetic jets
pub mod loader;

/// Min-max scaling of raw features into rotation angles
pub mod preprocessor;

/// Burn Dataset view of a JetSet
pub mod dataset;

/// Per-epoch shuffling, fixed-size partitioning and tensor batching
pub mod batcher;

/// Seeded shuffle and train/test split
pub mod splitter;

/// Independent random streams derived from one run seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngStream {
    WeightInit    = 0,
    TrainShuffle  = 1,
    EvalShuffle   = 2,
    DatasetSplit  = 3,
    SyntheticJets = 4,
}

/// Build the generator for one stream of a seeded run.
pub fn seeded_rng(seed: u64, stream: RngStream) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream as u64);
    rng
}
