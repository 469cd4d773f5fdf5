//! The set of loaded sector documents.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use worldedit_codec::FieldType;
use worldedit_model::field::{self, keys};
use worldedit_model::{ENTITY_OBJECT, Entity, EntityDocument, XmlElement};
use worldedit_types::{EntityId, SourceDescriptor};

use crate::converter::FormatConverter;
use crate::error::{StorageError, StorageResult};
use crate::sector::{FoundEntity, LayerInfo, SectorDocument, layer_info};

/// Layer labels tried, in order, when inserting.
pub const DEFAULT_PREFERRED_LAYERS: [&str; 2] = ["outside_entity", "main"];

/// Owns every tracked sector document, in the order they were first loaded.
///
/// Mutations are applied to the in-memory tree immediately and are visible
/// to the next lookup; nothing reaches disk until [`persist`](Self::persist).
#[derive(Debug, Default)]
pub struct SectorStore {
    documents: Vec<SectorDocument>,
}

impl SectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.position_of(path).is_some()
    }

    /// Tracked paths, in load order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.documents.iter().map(SectorDocument::path)
    }

    pub fn document(&self, path: &Path) -> Option<&SectorDocument> {
        self.position_of(path).map(|i| &self.documents[i])
    }

    fn position_of(&self, path: &Path) -> Option<usize> {
        self.documents.iter().position(|d| d.path() == path)
    }

    /// Returns the tracked document, reading it from disk on first access.
    pub fn load(&mut self, path: &Path) -> StorageResult<&SectorDocument> {
        let idx = self.ensure_loaded(path)?;
        Ok(&self.documents[idx])
    }

    fn ensure_loaded(&mut self, path: &Path) -> StorageResult<usize> {
        if let Some(idx) = self.position_of(path) {
            return Ok(idx);
        }
        if !path.exists() {
            warn!(path = %path.display(), "sector document not found");
            return Err(StorageError::DocumentNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let root = XmlElement::parse(&text).map_err(|source| StorageError::Model {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded sector document");
        self.documents.push(SectorDocument::new(path, root));
        Ok(self.documents.len() - 1)
    }

    fn doc_mut(&mut self, path: &Path) -> StorageResult<&mut SectorDocument> {
        let idx = self.ensure_loaded(path)?;
        Ok(&mut self.documents[idx])
    }

    /// Adopts an in-memory tree as the document for `path`, replacing any
    /// tracked version. The adopted document starts clean.
    pub fn track(&mut self, path: impl Into<PathBuf>, root: XmlElement) -> &SectorDocument {
        let doc = SectorDocument::new(path, root);
        let idx = match self.position_of(doc.path()) {
            Some(i) => {
                self.documents[i] = doc;
                i
            }
            None => {
                self.documents.push(doc);
                self.documents.len() - 1
            }
        };
        debug!(path = %self.documents[idx].path().display(), "tracking sector document");
        &self.documents[idx]
    }

    /// Stops tracking `path`, discarding unsaved changes.
    pub fn evict(&mut self, path: &Path) -> Option<SectorDocument> {
        let idx = self.position_of(path)?;
        let doc = self.documents.remove(idx);
        if doc.is_dirty() {
            warn!(path = %path.display(), "evicting document with unsaved changes");
        }
        Some(doc)
    }

    pub fn layers(&mut self, path: &Path) -> StorageResult<Vec<LayerInfo>> {
        Ok(self.load(path)?.layers())
    }

    pub fn find_entity_by_name(&mut self, path: &Path, name: &str) -> StorageResult<Option<FoundEntity>> {
        Ok(self.load(path)?.find_entity_by_name(name))
    }

    /// Appends `entity` to the first layer matching `preferred`, in
    /// priority order. The new element goes right after the layer's last
    /// direct entity child.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        path: &Path,
        entity: &EntityDocument,
        preferred: &[S],
    ) -> StorageResult<LayerInfo> {
        let doc = self.doc_mut(path)?;
        let layers = doc.layers();
        let layer_paths = doc.layer_paths();

        let target = preferred.iter().find_map(|label| {
            layers
                .iter()
                .find(|l| l.label.as_deref() == Some(label.as_ref()))
        });
        let Some(target) = target else {
            let preferred: Vec<String> = preferred.iter().map(|s| s.as_ref().to_string()).collect();
            warn!(path = %path.display(), ?preferred, "no preferred layer present, insert refused");
            return Err(StorageError::LayerNotFound {
                path: path.to_path_buf(),
                preferred,
            });
        };

        let index = target.index;
        let layer = doc
            .root_mut()
            .at_path_mut(&layer_paths[index])
            .ok_or_else(|| StorageError::LayerNotFound {
                path: path.to_path_buf(),
                preferred: Vec::new(),
            })?;
        let at = layer
            .children
            .iter()
            .rposition(|n| matches!(n, worldedit_model::XmlNode::Element(e) if e.is_object(ENTITY_OBJECT)))
            .map_or(layer.children.len(), |i| i + 1);
        layer.insert_child(at, entity.root().clone());
        let info = layer_info(index, layer);

        info!(
            path = %path.display(),
            name = %entity.display_name(),
            layer = info.label.as_deref().unwrap_or("?"),
            "inserted entity"
        );
        Ok(info)
    }

    /// Removes the first entity named `name`. `Ok(false)` if there is none.
    pub fn remove(&mut self, path: &Path, name: &str) -> StorageResult<bool> {
        let doc = self.doc_mut(path)?;
        let Some(found) = doc.find_entity_by_name(name) else {
            debug!(path = %path.display(), name = %name, "nothing to remove");
            return Ok(false);
        };
        let Some((last, parent)) = found.path.split_last() else {
            return Ok(false);
        };
        let removed = doc
            .root_mut()
            .at_path_mut(parent)
            .and_then(|p| p.remove_child(*last))
            .is_some();
        if removed {
            info!(path = %path.display(), name = %name, layer = found.layer.index, "removed entity");
        }
        Ok(removed)
    }

    /// Replaces the document-side copy of `entity` with its payload.
    ///
    /// The copy is matched by id first, then by name. Returns `Ok(false)`
    /// when the entity has no payload, is unpersisted, or has no copy.
    pub fn sync_entity(&mut self, entity: &Entity) -> StorageResult<bool> {
        let (Some(location), Some(payload)) = (&entity.source_location, &entity.payload) else {
            return Ok(false);
        };
        let doc = self.doc_mut(location)?;
        let entity_paths = doc.root().descendant_paths(|e| e.is_object(ENTITY_OBJECT));
        let by_id = entity_paths.iter().find(|p| {
            doc.root()
                .at_path(p)
                .and_then(|e| field::read_typed(e, keys::ENTITY_ID, FieldType::Id64))
                .and_then(|v| v.as_u64())
                == Some(entity.id.get())
        });
        let path = match by_id {
            Some(p) => p.clone(),
            None => match doc.find_entity_by_name(&entity.name) {
                Some(found) => found.path,
                None => {
                    warn!(name = %entity.name, path = %location.display(), "no document copy to sync");
                    return Ok(false);
                }
            },
        };
        if let Some(slot) = doc.root_mut().at_path_mut(&path) {
            *slot = payload.root().clone();
            debug!(name = %entity.name, "synced entity into document");
            return Ok(true);
        }
        Ok(false)
    }

    /// Materializes every entity in a document.
    pub fn entities(&mut self, path: &Path) -> StorageResult<Vec<Entity>> {
        let doc = self.load(path)?;
        Ok(doc
            .entity_elements()
            .into_iter()
            .map(|e| {
                Entity::from_document(EntityDocument::new(e.clone()))
                    .with_source(SourceDescriptor::SectorFile, Some(path.to_path_buf()))
            })
            .collect())
    }

    /// Ids of every entity in every tracked document, in either dialect.
    pub fn known_ids(&self) -> HashSet<EntityId> {
        self.scan(|e| {
            field::read_typed(e, keys::ENTITY_ID, FieldType::Id64)
                .and_then(|v| v.as_u64())
                .map(EntityId::new)
        })
    }

    /// Names of every entity in every tracked document, in either dialect.
    pub fn known_names(&self) -> HashSet<String> {
        self.scan(|e| field::read_string(e, keys::NAME))
    }

    fn scan<T: std::hash::Hash + Eq>(&self, read: impl Fn(&XmlElement) -> Option<T>) -> HashSet<T> {
        self.documents
            .iter()
            .flat_map(|d| d.entity_elements())
            .filter_map(read)
            .collect()
    }

    /// Writes a document with an XML declaration and two-space indent.
    pub fn persist(&mut self, path: &Path) -> StorageResult<()> {
        let idx = self
            .position_of(path)
            .ok_or_else(|| StorageError::DocumentNotFound(path.to_path_buf()))?;
        let doc = &mut self.documents[idx];
        let text = doc
            .root()
            .to_xml_string(true)
            .map_err(|source| StorageError::Model {
                path: path.to_path_buf(),
                source,
            })?;
        fs::write(path, text)?;
        doc.mark_clean();
        info!(path = %path.display(), "persisted sector document");
        Ok(())
    }

    /// Persists every dirty document, returning the paths written.
    pub fn persist_dirty(&mut self) -> StorageResult<Vec<PathBuf>> {
        let dirty: Vec<PathBuf> = self
            .documents
            .iter()
            .filter(|d| d.is_dirty())
            .map(|d| d.path().to_path_buf())
            .collect();
        for p in &dirty {
            self.persist(p)?;
        }
        Ok(dirty)
    }

    /// Persists `path`, converts it to the binary format and stops tracking
    /// it. Returns the binary file produced.
    pub fn convert_to_binary(
        &mut self,
        path: &Path,
        converter: &dyn FormatConverter,
    ) -> StorageResult<PathBuf> {
        self.persist(path)?;
        let out = converter
            .to_binary(path)
            .ok_or_else(|| StorageError::Conversion {
                path: path.to_path_buf(),
                reason: "converter reported failure".into(),
            })?;
        self.evict(path);
        info!(path = %path.display(), output = %out.display(), "converted sector to binary");
        Ok(out)
    }
}
