// ============================================================
// Layer 3 - Pipeline Errors
// ============================================================
// Failures the core can detect before or during a run. Shape
// problems are caught before any loop iteration starts; file
// problems are reported by the infra layer through anyhow.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Feature rows and label rows disagree in count
    #[error("feature rows ({features}) do not match label rows ({labels})")]
    RowMismatch { features: usize, labels: usize },

    /// Feature width differs from what the predictor consumes
    #[error("feature width {actual} does not match the predictor input width {expected}")]
    FeatureWidth { expected: usize, actual: usize },

    /// Parameter (or gradient) tensor has the wrong shape
    #[error("parameter shape {actual:?} does not match the expected shape {expected:?}")]
    ParamShape { expected: [usize; 2], actual: [usize; 2] },

    #[error("label {value} at row {row} is not in {{-1, +1}}")]
    InvalidLabel { row: usize, value: f32 },

    /// The optimizer was handed gradients for a different logical step
    #[error("optimizer is at step {expected} but was asked to apply step {actual}")]
    StepOutOfOrder { expected: usize, actual: usize },

    #[error("batch size must be greater than zero")]
    ZeroBatchSize,

    #[error("tabular source has no column named '{0}'")]
    MissingColumn(String),

    /// ROC needs at least one positive and one negative sample
    #[error("ROC curve is undefined: {positives} positive and {negatives} negative samples")]
    DegenerateRoc { positives: usize, negatives: usize },

    #[error("requested {requested} rows but the source only holds {available}")]
    InsufficientRows { requested: usize, available: usize },

    /// Backward pass produced nothing for the circuit weights
    #[error("predictor output does not depend on the circuit weights; no gradient to apply")]
    MissingGradient,

    /// Baseline scores were computed on a different population
    #[error("baseline holds {baseline} scores but the test set holds {test} jets")]
    BaselinePopulation { baseline: usize, test: usize },
}
