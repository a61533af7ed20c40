//! Editor error types.
//!
//! These stay inside the crate: the public editing surface logs them and
//! degrades to a no-op.

use thiserror::Error;

/// Errors that can occur while reading or writing the saved slot.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The slot would exceed the storage quota.
    #[error("Quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Size of the rejected write.
        needed: usize,
        /// Remaining capacity.
        available: usize,
    },
}
