//! Provenance of an entity record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Which logical file category an entity was loaded from.
///
/// The string forms are the ones the editor has always written into
/// clipboard payloads, so they are kept for interchange compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceDescriptor {
    /// The map's main world file.
    MainWorldFile,
    /// A per-sector world file.
    SectorFile,
    /// An exported entity collection on disk.
    ImportedCollection,
    #[default]
    Unknown,
}

impl SourceDescriptor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainWorldFile => "mapsdata",
            Self::SectorFile => "worldsectors",
            Self::ImportedCollection => "imported",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a free-form label to a descriptor; unrecognised labels are
    /// `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "mapsdata" | "main" => Self::MainWorldFile,
            "worldsectors" | "sector" => Self::SectorFile,
            "imported" => Self::ImportedCollection,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map_or(Self::Unknown, Self::from_label))
    }
}
