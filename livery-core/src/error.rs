//! Error types for decal operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// User-supplied value rejected by validation.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the edited property.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Document or config serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
