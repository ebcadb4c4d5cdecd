use thiserror::Error;

pub type Result<T> = std::result::Result<T, SoftmaxError>;

/// Errors reported by the loss evaluators and the matrix constructors.
///
/// Everything except `NumericInstability` is detected before any arithmetic
/// runs, so a failed call never produces a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SoftmaxError {
    /// Dimensions of `W`, `X` and `y` do not line up.
    #[error("shape mismatch for {what}: got {got}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    /// `y[index]` is not a valid class id.
    #[error("label {label} at index {index} is out of range for {classes} classes")]
    InvalidLabel {
        index: usize,
        label: usize,
        classes: usize,
    },

    #[error("batch is empty")]
    EmptyBatch,

    #[error("regularization strength must be finite and non-negative, got {0}")]
    InvalidRegularization(f64),

    /// A score row held a non-finite value, so the softmax of that example is undefined.
    #[error("non-finite class scores for example {example}")]
    NumericInstability { example: usize },
}

/// Errors raised while loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
