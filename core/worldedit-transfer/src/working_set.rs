//! The editor's view of the world: loaded sectors plus in-memory entities.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};
use worldedit_model::Entity;
use worldedit_storage::SectorStore;
use worldedit_types::EntityId;

use crate::error::TransferResult;

/// Loaded sector documents and the entities shown to the user.
///
/// Entities with a `source_location` are mirrored by a record inside that
/// document; entities without one exist only here.
#[derive(Debug, Default)]
pub struct WorkingSet {
    pub store: SectorStore,
    pub entities: Vec<Entity>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: SectorStore) -> Self {
        Self {
            store,
            entities: Vec::new(),
        }
    }

    /// Loads a sector and adds its entities to the in-memory list.
    /// Returns how many entities were added.
    pub fn open_sector(&mut self, path: &Path) -> TransferResult<usize> {
        if self.store.is_tracked(path) {
            return Ok(0);
        }
        let entities = self.store.entities(path)?;
        let added = entities.len();
        self.entities.extend(entities);
        info!(path = %path.display(), entities = added, "opened sector");
        Ok(added)
    }

    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Entities matching the given names, in the order of `names`.
    pub fn select(&self, names: &[impl AsRef<str>]) -> Vec<Entity> {
        names
            .iter()
            .filter_map(|n| self.find(n.as_ref()).cloned())
            .collect()
    }

    /// Ids used anywhere in the working set.
    pub fn known_ids(&self) -> HashSet<EntityId> {
        let mut ids = self.store.known_ids();
        ids.extend(self.entities.iter().map(|e| e.id));
        ids
    }

    /// Names used anywhere in the working set.
    pub fn known_names(&self) -> HashSet<String> {
        let mut names = self.store.known_names();
        names.extend(self.entities.iter().map(|e| e.name.clone()));
        names
    }

    /// Deletes the first entity named `name` and its document-side record.
    ///
    /// `Ok(false)` if no such entity is in memory. A missing document record
    /// is logged and otherwise ignored.
    pub fn delete(&mut self, name: &str) -> TransferResult<bool> {
        let Some(idx) = self.entities.iter().position(|e| e.name == name) else {
            debug!(name = %name, "nothing to delete");
            return Ok(false);
        };
        let entity = self.entities.remove(idx);
        if let Some(path) = &entity.source_location {
            if self.store.is_tracked(path) {
                if !self.store.remove(path, name)? {
                    debug!(name = %name, path = %path.display(), "no document record to remove");
                }
            } else {
                debug!(name = %name, path = %path.display(), "owning document not tracked");
            }
        }
        info!(name = %name, "deleted entity");
        Ok(true)
    }
}
