//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while producing or decoding the texture.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed (malformed data URI, unreadable image).
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// The texture source could not be parsed or rasterized.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Unsupported texture source.
    #[error("Unsupported source: {0}")]
    Unsupported(String),

    /// The surface document could not be embedded.
    #[error("Document error: {0}")]
    Document(#[from] livery_core::CoreError),

    /// The blocking decode task was aborted.
    #[error("Decode task failed: {0}")]
    Task(String),
}
