//! Transfer configuration.
//!
//! Loaded from an optional TOML file. A missing or unreadable file never
//! fails; the defaults are used instead.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use worldedit_types::Position;

/// Retry bounds for the uniqueness allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationLimits {
    /// Attempts made with a caller-supplied id hint.
    pub id_hint_attempts: usize,
    /// Time-seeded probes before falling back to `max + 1`.
    pub id_probe_attempts: usize,
    /// Numbered `_Copy_N` suffixes tried before the timestamp fallback.
    pub name_attempts: usize,
}

impl Default for AllocationLimits {
    fn default() -> Self {
        Self {
            id_hint_attempts: 100,
            id_probe_attempts: 1000,
            name_attempts: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Layer labels tried in order when inserting.
    pub preferred_layers: Vec<String>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            preferred_layers: worldedit_storage::DEFAULT_PREFERRED_LAYERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Offset applied when pasting without a target position.
    pub offset: [f32; 3],
    /// Persist touched sector documents at the end of a paste or import.
    pub auto_persist: bool,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            offset: [20.0, 20.0, 0.0],
            auto_persist: true,
        }
    }
}

impl PasteConfig {
    pub fn offset(&self) -> Position {
        Position::from(self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write each entity's current position into its exported payload.
    pub preserve_positions: bool,
    /// Record provenance in the collection manifest.
    pub include_metadata: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            preserve_positions: true,
            include_metadata: true,
        }
    }
}

/// Configuration for [`crate::ClipboardTransferSystem`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub allocation: AllocationLimits,
    pub placement: PlacementConfig,
    pub paste: PasteConfig,
    pub export: ExportConfig,
}

impl TransferConfig {
    /// Loads configuration from a TOML file, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<TransferConfig>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded transfer config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config file, using defaults");
                Self::default()
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
