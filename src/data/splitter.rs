// ============================================================
// Layer 4 - Train/Test Splitter
// ============================================================
// Shuffles samples with a seeded RNG and takes a fixed number of
// training rows followed by a fixed number of test rows.
//
// The jet tables are usually ordered (all signal jets, then all
// background), so shuffling before the cut is what keeps both
// sides representative. Rows beyond train + test are discarded.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{seq::SliceRandom, Rng};

use crate::domain::error::PipelineError;

/// Shuffle `samples` and split off exactly `train` and `test` items.
///
/// # Returns
/// A tuple (train_samples, test_samples)
///
/// # Errors
/// `InsufficientRows` if `train + test` exceeds `samples.len()`.
pub fn split_train_test<T, R: Rng + ?Sized>(
    mut samples: Vec<T>,
    train:       usize,
    test:        usize,
    rng:         &mut R,
) -> Result<(Vec<T>, Vec<T>), PipelineError> {
    let total = samples.len();
    if train + test > total {
        return Err(PipelineError::InsufficientRows {
            requested: train + test,
            available: total,
        });
    }

    samples.shuffle(rng);
    samples.truncate(train + test);

    // split_off(n) removes elements [n..] and returns them
    let test_samples = samples.split_off(train);

    tracing::debug!(
        "Dataset split: {} training, {} test ({} unused)",
        samples.len(),
        test_samples.len(),
        total - train - test,
    );

    Ok((samples, test_samples))
}
