//! Entity collections: one XML file per entity plus a JSON manifest.
//!
//! ```text
//! <collection>/
//!   collection_info.json
//!   README.txt
//!   Foo_001.xml
//!   Bar_002.xml
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use worldedit_model::{ENTITY_OBJECT, Entity, EntityDocument};
use worldedit_types::{BatchReport, EntityId, ItemFailure, Position, SourceDescriptor};

use crate::config::ExportConfig;
use crate::error::{TransferError, TransferResult};
use crate::snapshot::{Capsule, ClipboardSnapshot};

pub const COLLECTION_TYPE: &str = "avatar_entity_collection";
pub const MANIFEST_FILE: &str = "collection_info.json";
pub const README_FILE: &str = "README.txt";

/// Characters not allowed in file and collection names.
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn collection_type() -> String {
    COLLECTION_TYPE.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginalPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Position> for OriginalPosition {
    fn from(p: Position) -> Self {
        Self { x: p.x, y: p.y, z: p.z }
    }
}

impl From<OriginalPosition> for Position {
    fn from(p: OriginalPosition) -> Self {
        Position::new(p.x, p.y, p.z)
    }
}

/// Manifest record for one exported entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub id: EntityId,
    pub filename: String,
    pub original_position: OriginalPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<SourceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_name: Option<String>,
}

/// `collection_info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionManifest {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    pub collection_name: String,
    pub export_date: String,
    pub entity_count: usize,
    #[serde(default)]
    pub preserve_positions: bool,
    #[serde(default)]
    pub include_metadata: bool,
    #[serde(default)]
    pub entities: Vec<ManifestEntry>,
}

impl CollectionManifest {
    pub fn entry(&self, filename: &str) -> Option<&ManifestEntry> {
        self.entities.iter().find(|e| e.filename == filename)
    }
}

/// Result of exporting a collection.
#[derive(Debug, Clone)]
pub struct CollectionExport {
    pub dir: PathBuf,
    pub manifest: CollectionManifest,
    /// Written entity files, plus one failure per entity not exported.
    pub report: BatchReport<PathBuf>,
}

/// File-system safe form of an entity name.
pub fn safe_file_name(name: &str) -> String {
    let mut safe: String = name
        .chars()
        .map(|c| if INVALID_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    while safe.contains("__") {
        safe = safe.replace("__", "_");
    }
    let safe = safe.trim_matches('_');
    if safe.is_empty() {
        "entity".to_string()
    } else {
        safe.to_string()
    }
}

/// Rejects empty collection names and names with reserved characters.
pub fn validate_collection_name(name: &str) -> TransferResult<()> {
    if name.trim().is_empty() {
        return Err(TransferError::InvalidCollection("collection name is empty".into()));
    }
    if name.contains(INVALID_NAME_CHARS) {
        return Err(TransferError::InvalidCollection(format!(
            "collection name {name:?} contains one of <>:\"/\\|?*"
        )));
    }
    Ok(())
}

/// Exports entities into `parent/collection_name/`.
///
/// Entities without a payload are reported as failures; the rest are still
/// written.
pub fn export_collection(
    entities: &[Entity],
    parent: &Path,
    collection_name: &str,
    options: &ExportConfig,
) -> TransferResult<CollectionExport> {
    validate_collection_name(collection_name)?;
    let dir = parent.join(collection_name);
    fs::create_dir_all(&dir)?;

    let mut report = BatchReport::new();
    let mut records = Vec::new();

    for (i, entity) in entities.iter().enumerate() {
        let filename = format!("{}_{:03}.xml", safe_file_name(&entity.name), i + 1);
        match write_entity(entity, &dir.join(&filename), options) {
            Ok(path) => {
                report.push_success(path);
                records.push(manifest_entry(entity, filename, options.include_metadata));
            }
            Err(e) => {
                warn!(name = %entity.name, error = %e, "entity not exported");
                report.push_failure(ItemFailure::new(i, entity.name.clone(), e.to_string()));
            }
        }
    }

    let manifest = CollectionManifest {
        kind: collection_type(),
        collection_name: collection_name.to_string(),
        export_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        entity_count: records.len(),
        preserve_positions: options.preserve_positions,
        include_metadata: options.include_metadata,
        entities: records,
    };
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;
    fs::write(dir.join(README_FILE), readme(&manifest))?;

    info!(
        dir = %dir.display(),
        exported = report.succeeded.len(),
        failed = report.failures.len(),
        "exported collection"
    );
    Ok(CollectionExport {
        dir,
        manifest,
        report,
    })
}

fn write_entity(entity: &Entity, path: &Path, options: &ExportConfig) -> TransferResult<PathBuf> {
    let Some(payload) = &entity.payload else {
        return Err(TransferError::InvalidCollection(format!(
            "{} has no XML payload",
            entity.name
        )));
    };
    let mut copy = payload.clone();
    copy.strip_export_attributes();
    if options.preserve_positions {
        copy.set_position(entity.position);
    }
    let xml = copy.to_xml_string()?;
    fs::write(path, xml.trim_end())?;
    Ok(path.to_path_buf())
}

fn manifest_entry(entity: &Entity, filename: String, include_metadata: bool) -> ManifestEntry {
    let (source_file, source_file_path, map_name) = if include_metadata {
        (
            Some(entity.source),
            entity
                .source_location
                .as_ref()
                .map(|p| p.display().to_string()),
            entity.map_name.clone(),
        )
    } else {
        (None, None, None)
    };
    ManifestEntry {
        name: entity.name.clone(),
        id: entity.id,
        filename,
        original_position: entity.position.into(),
        source_file,
        source_file_path,
        map_name,
    }
}

fn readme(manifest: &CollectionManifest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Entity Collection: {}", manifest.collection_name);
    let _ = writeln!(out, "Exported: {}", manifest.export_date);
    let _ = writeln!(out, "Entity Count: {}\n", manifest.entity_count);
    let _ = writeln!(out, "Exported Entities:");
    for e in &manifest.entities {
        let _ = writeln!(out, "- {} ({})", e.name, e.filename);
    }
    let _ = write!(
        out,
        "\nTo import these entities, use the import command of the level editor."
    );
    out
}

/// Reads only the manifest of a collection.
pub fn preview_collection(dir: &Path) -> TransferResult<CollectionManifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Err(TransferError::InvalidCollection(format!(
            "{} has no {MANIFEST_FILE}",
            dir.display()
        )));
    }
    let manifest: CollectionManifest = serde_json::from_str(&fs::read_to_string(&path)?)?;
    if manifest.kind != COLLECTION_TYPE {
        warn!(kind = %manifest.kind, "unexpected collection type");
    }
    Ok(manifest)
}

/// What [`read_collection`] found in a collection directory.
#[derive(Debug, Clone)]
pub struct CollectionContents {
    pub snapshot: ClipboardSnapshot,
    /// Unreadable or rejected files, indexed by position in the file list.
    pub failures: Vec<ItemFailure>,
    /// File-list position of each capsule in `snapshot`.
    pub file_indices: Vec<usize>,
    /// Number of files considered.
    pub file_count: usize,
}

impl CollectionContents {
    /// Maps a capsule index to the position of the file it came from.
    ///
    /// Indices past the last capsule (batch-level failures such as
    /// `persist`) map to `file_count`.
    pub fn file_index(&self, capsule_index: usize) -> usize {
        self.file_indices
            .get(capsule_index)
            .copied()
            .unwrap_or(self.file_count)
    }
}

/// True when `filename` is a single plain path component, so joining it to
/// the collection directory cannot leave that directory.
pub fn is_plain_file_name(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Reads a collection into a snapshot.
///
/// Files listed in the manifest come first, in manifest order, followed by
/// any other `*.xml` files sorted by name. Files whose root is not an
/// entity object are skipped, as are manifest file names that are not a
/// plain file name.
pub fn read_collection(dir: &Path) -> TransferResult<CollectionContents> {
    if !dir.is_dir() {
        return Err(TransferError::InvalidCollection(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let manifest = preview_collection(dir).ok();

    let mut files: Vec<String> = manifest
        .as_ref()
        .map(|m| m.entities.iter().map(|e| e.filename.clone()).collect())
        .unwrap_or_default();
    let mut others: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".xml") && !files.contains(name))
        .collect();
    others.sort();
    files.extend(others);

    let mut capsules = Vec::new();
    let mut file_indices = Vec::new();
    let mut failures = Vec::new();
    for (index, filename) in files.iter().enumerate() {
        if !is_plain_file_name(filename) {
            warn!(file = %filename, "manifest file name leaves the collection, skipping");
            failures.push(ItemFailure::new(
                index,
                filename.clone(),
                "not a plain file name inside the collection",
            ));
            continue;
        }
        match read_entity_file(&dir.join(filename)) {
            Ok(doc) => {
                let entry = manifest.as_ref().and_then(|m| m.entry(filename));
                capsules.push(capsule_from_file(doc, entry)?);
                file_indices.push(index);
            }
            Err(e) => {
                warn!(file = %filename, error = %e, "skipping collection file");
                failures.push(ItemFailure::new(index, filename.clone(), e.to_string()));
            }
        }
    }
    Ok(CollectionContents {
        snapshot: ClipboardSnapshot::from_capsules(capsules),
        failures,
        file_indices,
        file_count: files.len(),
    })
}

fn read_entity_file(path: &Path) -> TransferResult<EntityDocument> {
    let doc = EntityDocument::parse(&fs::read_to_string(path)?)?;
    if !doc.root().is_object(ENTITY_OBJECT) {
        return Err(TransferError::InvalidCollection(format!(
            "{} is not an entity",
            path.display()
        )));
    }
    Ok(doc)
}

fn capsule_from_file(doc: EntityDocument, entry: Option<&ManifestEntry>) -> TransferResult<Capsule> {
    let mut entity = Entity::from_document(doc);
    entity.source = SourceDescriptor::ImportedCollection;
    let mut capsule = Capsule::capture(&entity)?;
    if let Some(entry) = entry {
        capsule.source_file_path = entry.source_file_path.clone();
        capsule.map_name = entry.map_name.clone();
    }
    Ok(capsule)
}
