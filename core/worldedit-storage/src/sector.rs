//! One parsed sector file and its layer containers.

use std::path::{Path, PathBuf};

use worldedit_codec::FieldType;
use worldedit_model::field::{self, keys};
use worldedit_model::{Dialect, ENTITY_OBJECT, EntityDocument, LAYER_OBJECT, XmlElement};

/// Summary of one `MissionLayer` container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    /// Position among the document's layers, in document order.
    pub index: usize,
    /// `PathId` of the layer, if it has one.
    pub label: Option<String>,
    /// Entities directly inside the layer.
    pub entity_count: usize,
}

/// An entity located by name.
#[derive(Debug, Clone)]
pub struct FoundEntity {
    pub layer: LayerInfo,
    /// Path of the entity element from the document root.
    pub path: Vec<usize>,
    /// Independent copy of the entity payload.
    pub document: EntityDocument,
}

/// A parsed sector document.
#[derive(Debug, Clone)]
pub struct SectorDocument {
    path: PathBuf,
    root: XmlElement,
    dirty: bool,
}

impl SectorDocument {
    pub fn new(path: impl Into<PathBuf>, root: XmlElement) -> Self {
        Self {
            path: path.into(),
            root,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Mutable access to the tree. Marks the document dirty.
    pub fn root_mut(&mut self) -> &mut XmlElement {
        self.dirty = true;
        &mut self.root
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Paths of every `MissionLayer` in document order.
    pub fn layer_paths(&self) -> Vec<Vec<usize>> {
        self.root.descendant_paths(|e| e.is_object(LAYER_OBJECT))
    }

    pub fn layers(&self) -> Vec<LayerInfo> {
        self.layer_paths()
            .iter()
            .enumerate()
            .filter_map(|(index, p)| self.root.at_path(p).map(|l| layer_info(index, l)))
            .collect()
    }

    /// Finds the first entity named `name`.
    ///
    /// Layers are searched in order. Within a layer every entity is checked
    /// for a dialect-A name, then every entity for a dialect-B name, before
    /// moving on to the next layer.
    pub fn find_entity_by_name(&self, name: &str) -> Option<FoundEntity> {
        for (index, layer_path) in self.layer_paths().into_iter().enumerate() {
            let Some(layer) = self.root.at_path(&layer_path) else {
                continue;
            };
            let candidates = layer.descendant_paths(|e| e.is_object(ENTITY_OBJECT));
            for dialect in [Dialect::A, Dialect::B] {
                for rel in &candidates {
                    let Some(entity) = layer.at_path(rel) else {
                        continue;
                    };
                    if direct_name(entity, dialect).as_deref() == Some(name) {
                        let mut path = layer_path.clone();
                        path.extend_from_slice(rel);
                        return Some(FoundEntity {
                            layer: layer_info(index, layer),
                            path,
                            document: EntityDocument::new(entity.clone()),
                        });
                    }
                }
            }
        }
        None
    }

    /// Every entity element anywhere in the document, in document order.
    pub fn entity_elements(&self) -> Vec<&XmlElement> {
        self.root.descendants(|e| e.is_object(ENTITY_OBJECT))
    }
}

fn direct_name(entity: &XmlElement, dialect: Dialect) -> Option<String> {
    field::read_direct(entity, keys::NAME, FieldType::String, dialect)
        .and_then(|v| v.as_str().map(str::to_string))
}

pub(crate) fn layer_info(index: usize, layer: &XmlElement) -> LayerInfo {
    LayerInfo {
        index,
        label: [Dialect::A, Dialect::B].into_iter().find_map(|d| {
            field::read_direct(layer, keys::LAYER_PATH_ID, FieldType::String, d)
                .and_then(|v| v.as_str().map(str::to_string))
        }),
        entity_count: layer.elements().filter(|e| e.is_object(ENTITY_OBJECT)).count(),
    }
}
