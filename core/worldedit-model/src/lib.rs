//! Entity document model for worldedit.
//!
//! World documents are XML. This crate provides:
//! - [`XmlElement`]: an owned XML tree with index-path navigation
//! - [`field`]: dialect-aware field lookup that keeps BinHex mirrors in sync
//! - [`EntityDocument`]: typed id/name/position access on one entity
//! - [`Entity`]: the in-memory record paired with its payload

pub mod document;
pub mod entity;
pub mod error;
pub mod field;
pub mod xml;

pub use document::{EXPORT_ATTRIBUTES, EntityDocument, UNKNOWN_ID, UNNAMED};
pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use field::{Dialect, FieldLocator, keys};
pub use xml::{XmlElement, XmlNode};

/// Object name of entity containers.
pub const ENTITY_OBJECT: &str = "Entity";
/// Object name of layer containers.
pub const LAYER_OBJECT: &str = "MissionLayer";
