//! Core type definitions for worldedit.
//!
//! This crate defines the small, format-agnostic vocabulary shared by every
//! other crate in the workspace:
//! - Entity identifiers (64-bit, decimal on the wire)
//! - World-space positions
//! - Where an entity was loaded from
//! - Batch outcome reporting and cooperative cancellation
//!
//! Nothing here knows about XML or the binary field encoding.

mod batch;
mod ids;
mod position;
mod source;

pub use batch::{BatchReport, CancelFlag, ItemFailure};
pub use ids::EntityId;
pub use position::Position;
pub use source::SourceDescriptor;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid entity id: {0}")]
    InvalidId(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),
}
