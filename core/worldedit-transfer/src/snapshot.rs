//! Portable entity snapshots.
//!
//! The same JSON document travels through the OS clipboard and through
//! `.json` files:
//!
//! ```json
//! {
//!   "type": "avatar_entities_fcb",
//!   "version": "2.0",
//!   "format": "FCBConverter",
//!   "count": 1,
//!   "copy_date": "2025-01-01T12:00:00+00:00",
//!   "entities": [
//!     { "id": "100", "name": "Foo", "x": 0.0, "y": 0.0, "z": 0.0,
//!       "xml": "<object name=\"Entity\">...</object>",
//!       "source_file": "worldsectors", "source_file_path": "...",
//!       "map_name": null, "entity_type": "Entity", "has_xml_element": true }
//!   ]
//! }
//! ```

use std::fmt;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use worldedit_model::{Entity, EntityDocument};
use worldedit_types::{EntityId, Position, SourceDescriptor};

use crate::error::{TransferError, TransferResult};

pub const SNAPSHOT_TYPE: &str = "avatar_entities_fcb";
/// Older clipboard payloads used this discriminator.
pub const LEGACY_SNAPSHOT_TYPE: &str = "avatar_entities";
pub const SNAPSHOT_VERSION: &str = "2.0";
pub const SNAPSHOT_FORMAT: &str = "FCBConverter";

fn default_entity_type() -> String {
    "Entity".to_string()
}

/// One entity inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub id: EntityId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Full payload as an XML string; `None` for payload-less entities.
    #[serde(default)]
    pub xml: Option<String>,
    #[serde(default)]
    pub source_file: SourceDescriptor,
    #[serde(default)]
    pub source_file_path: Option<String>,
    #[serde(default)]
    pub map_name: Option<String>,
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    #[serde(default)]
    pub has_xml_element: bool,
}

impl Capsule {
    /// Captures an entity. The payload is copied and cleaned of export-only
    /// attributes; the source entity is not touched.
    pub fn capture(entity: &Entity) -> TransferResult<Self> {
        let xml = match &entity.payload {
            Some(doc) => {
                let mut copy = doc.clone();
                copy.strip_export_attributes();
                Some(copy.to_xml_string()?)
            }
            None => None,
        };
        Ok(Self {
            id: entity.id,
            name: entity.name.clone(),
            x: entity.position.x,
            y: entity.position.y,
            z: entity.position.z,
            has_xml_element: xml.is_some(),
            xml,
            source_file: entity.source,
            source_file_path: entity
                .source_location
                .as_ref()
                .map(|p| p.display().to_string()),
            map_name: entity.map_name.clone(),
            entity_type: default_entity_type(),
        })
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }

    /// Parses the embedded payload, if any.
    pub fn document(&self) -> TransferResult<Option<EntityDocument>> {
        match &self.xml {
            Some(xml) => Ok(Some(EntityDocument::parse(xml)?)),
            None => Ok(None),
        }
    }

    /// Rebuilds an in-memory entity from the capsule. The result is not
    /// placed anywhere yet.
    pub fn to_entity(&self) -> TransferResult<Entity> {
        let mut entity = Entity::new(self.id, self.name.clone(), self.position());
        entity.source = self.source_file;
        entity.map_name = self.map_name.clone();
        entity.payload = self.document()?;
        Ok(entity)
    }
}

/// An ordered set of captured entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub copy_date: String,
    pub entities: Vec<Capsule>,
}

impl Default for ClipboardSnapshot {
    fn default() -> Self {
        Self::from_capsules(Vec::new())
    }
}

impl ClipboardSnapshot {
    pub fn from_capsules(entities: Vec<Capsule>) -> Self {
        Self {
            kind: SNAPSHOT_TYPE.to_string(),
            version: SNAPSHOT_VERSION.to_string(),
            format: SNAPSHOT_FORMAT.to_string(),
            count: entities.len(),
            copy_date: Utc::now().to_rfc3339(),
            entities,
        }
    }

    /// Captures entities in order. Entities that fail to serialize are
    /// skipped with a warning.
    pub fn capture(entities: &[Entity]) -> Self {
        let capsules = entities
            .iter()
            .filter_map(|e| match Capsule::capture(e) {
                Ok(c) => Some(c),
                Err(err) => {
                    warn!(name = %e.name, error = %err, "skipping entity that failed to serialize");
                    None
                }
            })
            .collect();
        Self::from_capsules(capsules)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn to_json(&self) -> TransferResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a snapshot document.
    pub fn from_json(text: &str) -> TransferResult<Self> {
        let snapshot: Self = serde_json::from_str(text)?;
        if snapshot.kind != SNAPSHOT_TYPE && snapshot.kind != LEGACY_SNAPSHOT_TYPE {
            return Err(TransferError::InvalidSnapshot(format!(
                "unexpected type {:?}",
                snapshot.kind
            )));
        }
        if snapshot.count != snapshot.entities.len() {
            warn!(
                declared = snapshot.count,
                actual = snapshot.entities.len(),
                "snapshot count does not match entity list"
            );
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> TransferResult<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), count = self.len(), "saved snapshot");
        Ok(())
    }

    pub fn load(path: &Path) -> TransferResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            count: self.len(),
            version: self.version.clone(),
            copy_date: self.copy_date.clone(),
            names: self.entities.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// Summary of a snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub count: usize,
    pub version: String,
    pub copy_date: String,
    pub names: Vec<String>,
}

impl fmt::Display for SnapshotInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 5;
        write!(f, "{} entities (v{}, copied {})", self.count, self.version, self.copy_date)?;
        if !self.names.is_empty() {
            let shown: Vec<&str> = self.names.iter().take(SHOWN).map(String::as_str).collect();
            write!(f, ": {}", shown.join(", "))?;
            if self.names.len() > SHOWN {
                write!(f, " and {} more", self.names.len() - SHOWN)?;
            }
        }
        Ok(())
    }
}
