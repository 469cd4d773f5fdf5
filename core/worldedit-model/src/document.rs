//! A single entity's structured payload.

use tracing::{debug, warn};
use worldedit_codec::{FieldType, FieldValue};
use worldedit_types::{EntityId, Position};

use crate::error::ModelResult;
use crate::field::{self, keys};
use crate::xml::XmlElement;

/// Shown when an entity has no readable name.
pub const UNNAMED: &str = "Unnamed Object";
/// Shown when an entity has no readable id.
pub const UNKNOWN_ID: &str = "Unknown";

/// Root attributes added by collection export that must not leak back into
/// world documents.
pub const EXPORT_ATTRIBUTES: [&str; 5] = [
    "type",
    "exported_name",
    "exported_id",
    "export_version",
    "exported_position",
];

/// Typed view over one `<object name="Entity">` subtree.
///
/// `Clone` copies the whole tree: the clone shares no nodes with the
/// original, so edits on one are never visible through the other.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDocument {
    root: XmlElement,
}

impl EntityDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    pub fn parse(xml: &str) -> ModelResult<Self> {
        XmlElement::parse(xml).map(Self::new)
    }

    /// Serializes the payload without an XML declaration.
    pub fn to_xml_string(&self) -> ModelResult<String> {
        self.root.to_xml_string(false)
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    pub fn into_root(self) -> XmlElement {
        self.root
    }

    // ── Position ─────────────────────────────────────────────────

    /// Position from `hidPos`, falling back to `hidPos_precise`.
    pub fn try_position(&self) -> Option<Position> {
        [keys::POSITION, keys::POSITION_PRECISE]
            .into_iter()
            .find_map(|key| field::read_typed(&self.root, key, FieldType::Vector3))
            .and_then(|v| v.as_vector())
            .map(Position::from)
    }

    /// Like [`try_position`](Self::try_position) but yields the origin, with
    /// a warning, when no position field exists.
    pub fn position(&self) -> Position {
        self.try_position().unwrap_or_else(|| {
            warn!(name = %self.display_name(), "entity has no position field, using origin");
            Position::ORIGIN
        })
    }

    /// Writes both position fields. Returns `false` if neither exists.
    pub fn set_position(&mut self, pos: Position) -> bool {
        let value = FieldValue::Vector3(pos.to_array());
        let primary = field::write_field(&mut self.root, keys::POSITION, &value);
        let precise = field::write_field(&mut self.root, keys::POSITION_PRECISE, &value);
        if !primary {
            warn!(name = %self.display_name(), "hidPos not found, position not fully updated");
        }
        debug!(position = %pos, precise, "position written");
        primary || precise
    }

    // ── Identity ─────────────────────────────────────────────────

    pub fn id(&self) -> Option<EntityId> {
        field::read_typed(&self.root, keys::ENTITY_ID, FieldType::Id64)
            .and_then(|v| v.as_u64())
            .map(EntityId::new)
    }

    pub fn set_id(&mut self, id: EntityId) -> bool {
        let written = field::write_field(&mut self.root, keys::ENTITY_ID, &FieldValue::Id64(id.get()));
        if !written {
            warn!(id = %id, "disEntityId not found, id not written");
        }
        written
    }

    pub fn name(&self) -> Option<String> {
        field::read_string(&self.root, keys::NAME)
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        let written =
            field::write_field(&mut self.root, keys::NAME, &FieldValue::String(name.to_string()));
        if !written {
            warn!(name = %name, "hidName not found, name not written");
        }
        written
    }

    /// Name for display, or [`UNNAMED`].
    pub fn display_name(&self) -> String {
        self.name()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNNAMED.to_string())
    }

    /// Id for display, or [`UNKNOWN_ID`].
    pub fn display_id(&self) -> String {
        self.id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| UNKNOWN_ID.to_string())
    }

    // ── Generic fields ───────────────────────────────────────────

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        field::read_field(&self.root, name)
    }

    pub fn set_field(&mut self, name: &str, value: &FieldValue) -> bool {
        field::write_field(&mut self.root, name, value)
    }

    /// Removes export-only root attributes, returning how many were present.
    pub fn strip_export_attributes(&mut self) -> usize {
        EXPORT_ATTRIBUTES
            .iter()
            .filter(|attr| self.root.remove_attr(attr).is_some())
            .count()
    }
}

impl From<XmlElement> for EntityDocument {
    fn from(root: XmlElement) -> Self {
        Self::new(root)
    }
}
