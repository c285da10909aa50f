// ============================================================
// Layer 5 — Model Errors
// ============================================================
// Every failure inside the model core is a local precondition
// violation: a bad hyperparameter at construction time, or a
// tensor whose shape does not fit the configured model.
// None of them are retryable, so each variant carries the
// offending values and the caller decides how to report it.

use thiserror::Error;

/// Result alias used throughout the model core.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Attention heads must split the hidden size evenly.
    #[error("hidden size {hidden_size} is not divisible by {num_heads} attention heads")]
    HeadsNotDivisible { hidden_size: usize, num_heads: usize },

    /// Any other out-of-range hyperparameter.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported loss type '{0}': this model only implements CE")]
    UnsupportedLossType(String),

    #[error("unsupported activation '{0}': expected one of gelu, relu")]
    UnsupportedActivation(String),

    #[error("sequence length {len} exceeds the configured maximum of {max}")]
    SequenceTooLong { len: usize, max: usize },

    /// The spectral filter holds one weight per frequency of the configured length.
    #[error("filter blocks need sequences of exactly {expected} positions, got {len}")]
    FilterLengthMismatch { len: usize, expected: usize },

    #[error("batch dimension mismatch for {argument}: expected {expected}, got {actual}")]
    BatchMismatch {
        argument: &'static str,
        expected: usize,
        actual:   usize,
    },

    #[error("shape mismatch for {argument}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        argument: &'static str,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    #[error("item id {item} is outside the catalog of {item_size} items")]
    ItemOutOfRange { item: i64, item_size: usize },
}
