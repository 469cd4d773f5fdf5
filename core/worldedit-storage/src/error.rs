//! Error types for the storage layer.

use std::path::PathBuf;

use thiserror::Error;
use worldedit_model::ModelError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The sector file does not exist on disk.
    #[error("document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The document has no layer with any of the preferred labels.
    #[error("no layer labelled {preferred:?} in {}", path.display())]
    LayerNotFound { path: PathBuf, preferred: Vec<String> },

    /// Parse or serialization failure.
    #[error("document error in {}: {source}", path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The external converter failed or produced no output.
    #[error("conversion failed for {}: {reason}", path.display())]
    Conversion { path: PathBuf, reason: String },
}
