use std::path::PathBuf;

use worldedit_types::{EntityId, Position, SourceDescriptor};

use crate::document::{EntityDocument, UNNAMED};

/// A placed or in-memory entity.
///
/// The scalar fields mirror what is stored in `payload`; the setters below
/// update both so the two never drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub position: Position,
    pub source: SourceDescriptor,
    /// Owning document, or `None` while unpersisted.
    pub source_location: Option<PathBuf>,
    /// Map the entity belongs to, if known.
    pub map_name: Option<String>,
    pub payload: Option<EntityDocument>,
}

impl Entity {
    /// A payload-less entity.
    pub fn new(id: EntityId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            source: SourceDescriptor::Unknown,
            source_location: None,
            map_name: None,
            payload: None,
        }
    }

    /// Builds an entity whose scalar fields are read from `doc`.
    pub fn from_document(doc: EntityDocument) -> Self {
        Self {
            id: doc.id().unwrap_or_default(),
            name: doc.name().unwrap_or_else(|| UNNAMED.to_string()),
            position: doc.position(),
            source: SourceDescriptor::Unknown,
            source_location: None,
            map_name: None,
            payload: Some(doc),
        }
    }

    pub fn with_source(mut self, source: SourceDescriptor, location: Option<PathBuf>) -> Self {
        self.source = source;
        self.source_location = location;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.source_location.is_some()
    }

    pub fn set_id(&mut self, id: EntityId) {
        self.id = id;
        if let Some(doc) = self.payload.as_mut() {
            doc.set_id(id);
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        if let Some(doc) = self.payload.as_mut() {
            doc.set_name(name);
        }
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        if let Some(doc) = self.payload.as_mut() {
            doc.set_position(position);
        }
    }

    /// Re-reads the scalar fields from the payload after it was edited
    /// directly.
    pub fn refresh_from_payload(&mut self) {
        if let Some(doc) = &self.payload {
            if let Some(id) = doc.id() {
                self.id = id;
            }
            if let Some(name) = doc.name() {
                self.name = name;
            }
            if let Some(pos) = doc.try_position() {
                self.position = pos;
            }
        }
    }
}
