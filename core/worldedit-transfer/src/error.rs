//! Error types for transfer operations.

use thiserror::Error;
use worldedit_model::ModelError;
use worldedit_storage::StorageError;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors that stop a transfer operation as a whole.
///
/// Per-item problems inside a batch are reported through
/// [`worldedit_types::BatchReport`] instead.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Every id allocation tier was tried without finding a free id.
    #[error("id allocation exhausted: {0}")]
    AllocationExhausted(String),

    /// Clipboard payload or snapshot file of the wrong shape.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Collection directory or name that cannot be used.
    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    /// OS clipboard unavailable or rejected the request.
    #[error("clipboard error: {0}")]
    Clipboard(String),
}
