//! Error types for the document model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while parsing or serializing documents.
///
/// Field-level problems are never reported here; they are logged and read
/// back as zero or placeholder values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// XML syntax or writer error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Well-formed XML that is not a usable document (no root, several roots).
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}
