use thiserror::Error;

/// Programmer errors: bad configuration or mismatched signatures.
///
/// Data conditions (empty content, empty titles, missing timestamps) are
/// never reported through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Signature length mismatch: expected {expected}, got {got}")]
    SignatureLengthMismatch { expected: usize, got: usize },
    #[error("Invalid shingle size: {0} (must be positive)")]
    InvalidShingleSize(usize),
    #[error("Invalid signature length: {0} (must be positive)")]
    InvalidSignatureLength(usize),
    #[error("Invalid {name}: {value} (must be within [0, 1])")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("Invalid canonical weights: {0}")]
    InvalidWeights(String),
    #[error("Cannot select a canonical item from an empty group")]
    EmptyGroup,
    #[error("Group member {index} is out of range for {len} items")]
    MemberOutOfRange { index: usize, len: usize },
}

#[derive(Error, Debug)]
pub enum CanonError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CanonError>;
