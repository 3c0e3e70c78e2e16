use thiserror::Error;

/// Failure inside a loaded model artifact at inference time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("feature count mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("non-finite value produced during {stage}")]
    NonFinite { stage: &'static str },

    #[error("malformed model: {0}")]
    Malformed(String),
}
