//! Error types for the correspondence store.

/// Errors from the correspondence store and its file format.
#[derive(Debug, thiserror::Error)]
pub enum CorrespondenceError {
    #[error("a correspondence needs at least one element on each side")]
    EmptySide,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid correspondence file magic bytes")]
    InvalidMagic,

    #[error("unsupported correspondence file version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailed { expected: String, actual: String },

    #[error("correspondence file too short: need at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
}
