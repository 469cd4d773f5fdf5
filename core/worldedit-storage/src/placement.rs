//! Choosing the destination document for a new entity.

use std::path::PathBuf;

use tracing::debug;
use worldedit_model::Entity;

use crate::store::SectorStore;

/// Picks the sector document a newly materialized entity is written to.
///
/// `None` means "keep the entity in memory only".
pub trait SectorPlacementResolver {
    fn resolve(&self, entity: &Entity, store: &SectorStore) -> Option<PathBuf>;
}

/// Places every entity in the first tracked document, whatever its
/// position. Spatial grid placement can replace this without changing
/// callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstTrackedSector;

impl SectorPlacementResolver for FirstTrackedSector {
    fn resolve(&self, entity: &Entity, store: &SectorStore) -> Option<PathBuf> {
        let path = store.paths().next().map(|p| p.to_path_buf());
        debug!(name = %entity.name, target = ?path, "placement resolved to first tracked sector");
        path
    }
}

/// Places every entity in one fixed document.
#[derive(Debug, Clone)]
pub struct FixedSector(pub PathBuf);

impl SectorPlacementResolver for FixedSector {
    fn resolve(&self, _entity: &Entity, _store: &SectorStore) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}
