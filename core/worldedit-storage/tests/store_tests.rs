use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use worldedit_model::{Entity, EntityDocument, XmlElement};
use worldedit_storage::{
    DEFAULT_PREFERRED_LAYERS, FirstTrackedSector, FormatConverter, SectorPlacementResolver,
    SectorStore, StorageError,
};
use worldedit_types::{EntityId, Position};

const TWO_LAYERS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<object name="WorldSector">
  <object name="MissionLayer">
    <field name="PathId" value-String="main">6D61696E00</field>
    <object name="Entity">
      <field name="disEntityId" value-Id64="100">6400000000000000</field>
      <field name="hidName" value-String="Foo">466F6F00</field>
    </object>
    <object name="Entity">
      <field name="disEntityId" value-Id64="200">C800000000000000</field>
      <field name="hidName" value-String="Bar">42617200</field>
    </object>
  </object>
  <object name="MissionLayer">
    <field name="PathId" value-String="outside_entity">6F7574736964655F656E7469747900</field>
    <object name="Entity">
      <value name="disEntityId">300</value>
      <value name="hidName">Baz</value>
    </object>
    <object name="Trailer"/>
  </object>
</object>
"#;

fn sector(dir: &TempDir, xml: &str) -> PathBuf {
    let path = dir.path().join("worldsector_0.data.fcb.converted.xml");
    fs::write(&path, xml).unwrap();
    path
}

fn entity(id: u64, name: &str) -> EntityDocument {
    EntityDocument::parse(&format!(
        r#"<object name="Entity"><field name="disEntityId" value-Id64="{id}"/><field name="hidName" value-String="{name}"/></object>"#
    ))
    .unwrap()
}

fn names_in_layer(store: &SectorStore, path: &Path, layer: usize) -> Vec<String> {
    let doc = store.document(path).unwrap();
    let layer = doc.root().at_path(&doc.layer_paths()[layer]).unwrap();
    layer
        .elements()
        .filter(|e| e.is_object("Entity"))
        .map(|e| EntityDocument::new(e.clone()).display_name())
        .collect()
}

// ── Load ─────────────────────────────────────────────────────────

#[test]
fn load_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    store.load(&path).unwrap();
    store.remove(&path, "Foo").unwrap();
    // second load must not re-read the file and lose the removal
    store.load(&path).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.find_entity_by_name(&path, "Foo").unwrap().is_none());
}

#[test]
fn load_missing_file_is_document_not_found() {
    let dir = TempDir::new().unwrap();
    let mut store = SectorStore::new();
    let err = store.load(&dir.path().join("nope.xml")).unwrap_err();
    assert!(matches!(err, StorageError::DocumentNotFound(_)));
    assert!(store.is_empty());
}

#[test]
fn layers_report_labels_and_counts() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    let layers = store.layers(&path).unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].label.as_deref(), Some("main"));
    assert_eq!(layers[0].entity_count, 2);
    assert_eq!(layers[1].label.as_deref(), Some("outside_entity"));
    assert_eq!(layers[1].entity_count, 1);
}

// ── Find / remove ────────────────────────────────────────────────

#[test]
fn find_searches_every_layer_and_dialect() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    let found = store.find_entity_by_name(&path, "Baz").unwrap().unwrap();
    assert_eq!(found.layer.index, 1);
    assert_eq!(found.document.id(), Some(EntityId::new(300)));
}

#[test]
fn remove_from_second_layer_leaves_first_untouched() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    assert!(store.remove(&path, "Baz").unwrap());
    let layers = store.layers(&path).unwrap();
    assert_eq!(layers[0].entity_count, 2);
    assert_eq!(layers[1].entity_count, 0);
    assert!(store.document(&path).unwrap().is_dirty());
}

#[test]
fn remove_absent_is_false() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    assert!(!store.remove(&path, "Nobody").unwrap());
    assert!(!store.document(&path).unwrap().is_dirty());
}

// ── Insert ───────────────────────────────────────────────────────

#[test]
fn insert_prefers_outside_entity_and_appends_after_last_entity() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    let info = store
        .insert(&path, &entity(400, "New"), &DEFAULT_PREFERRED_LAYERS)
        .unwrap();
    assert_eq!(info.label.as_deref(), Some("outside_entity"));
    assert_eq!(names_in_layer(&store, &path, 1), vec!["Baz", "New"]);

    // the trailing non-entity child stays last
    let doc = store.document(&path).unwrap();
    let layer = doc.root().at_path(&doc.layer_paths()[1]).unwrap();
    assert!(layer.elements().last().unwrap().is_object("Trailer"));
}

#[test]
fn insert_keeps_existing_order() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    store.insert(&path, &entity(1, "C"), &["main"]).unwrap();
    store.insert(&path, &entity(2, "E"), &["main"]).unwrap();
    assert_eq!(names_in_layer(&store, &path, 0), vec!["Foo", "Bar", "C", "E"]);
    assert!(store.find_entity_by_name(&path, "E").unwrap().is_some());
}

#[test]
fn insert_without_preferred_layer_fails() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    let err = store.insert(&path, &entity(1, "X"), &["props"]).unwrap_err();
    assert!(matches!(err, StorageError::LayerNotFound { .. }));
}

// ── Uniqueness scans and entities ────────────────────────────────

#[test]
fn known_ids_and_names_cover_both_dialects() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    store.load(&path).unwrap();
    let ids = store.known_ids();
    assert!(ids.contains(&EntityId::new(100)));
    assert!(ids.contains(&EntityId::new(300)));
    let names = store.known_names();
    assert_eq!(names.len(), 3);
    assert!(names.contains("Baz"));
}

#[test]
fn entities_carry_their_location() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    let entities = store.entities(&path).unwrap();
    assert_eq!(entities.len(), 3);
    assert!(entities.iter().all(|e| e.source_location.as_deref() == Some(path.as_path())));
}

#[test]
fn sync_entity_rewrites_document_copy() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    let mut foo: Entity = store
        .entities(&path)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Foo")
        .unwrap();
    foo.set_name("Foo_Renamed");
    assert!(store.sync_entity(&foo).unwrap());
    assert!(store.find_entity_by_name(&path, "Foo_Renamed").unwrap().is_some());
    assert!(store.find_entity_by_name(&path, "Foo").unwrap().is_none());
}

// ── Persist ──────────────────────────────────────────────────────

#[test]
fn persist_writes_declaration_and_indent_and_clears_dirty() {
    let dir = TempDir::new().unwrap();
    let path = sector(
        &dir,
        r#"<object name="S"><object name="MissionLayer"><field name="PathId" value-String="main">6D61696E00</field></object></object>"#,
    );
    let mut store = SectorStore::new();
    store.insert(&path, &entity(7, "Seven"), &["main"]).unwrap();
    assert_eq!(store.persist_dirty().unwrap(), vec![path.clone()]);
    assert!(!store.document(&path).unwrap().is_dirty());

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<object name=\"S\">"));
    assert!(text.contains("\n  <object name=\"MissionLayer\">"));

    let mut fresh = SectorStore::new();
    assert!(fresh.find_entity_by_name(&path, "Seven").unwrap().is_some());
}

#[test]
fn dialect_b_text_with_trailing_space_survives_load_and_persist() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<object name="WorldSector">
  <object name="MissionLayer">
    <field name="PathId" value-String="main">6D61696E00</field>
    <object name="Entity">
      <value name="disEntityId">300</value>
      <value name="hidName">Lamp </value>
    </object>
  </object>
</object>
"#;
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, xml);
    let mut store = SectorStore::new();

    let found = store.find_entity_by_name(&path, "Lamp ").unwrap().unwrap();
    assert_eq!(found.document.display_name(), "Lamp ");
    assert!(store.find_entity_by_name(&path, "Lamp").unwrap().is_none());

    store.persist(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), xml);
}

#[test]
fn persist_untracked_is_error() {
    let mut store = SectorStore::new();
    assert!(store.persist(Path::new("never_loaded.xml")).is_err());
}

// ── Placement ────────────────────────────────────────────────────

#[test]
fn first_tracked_sector_is_chosen_regardless_of_position() {
    let mut store = SectorStore::new();
    let e = Entity::new(EntityId::new(1), "Far", Position::new(9000.0, -9000.0, 0.0));
    assert_eq!(FirstTrackedSector.resolve(&e, &store), None);

    store.track("a.xml", XmlElement::new("object"));
    store.track("b.xml", XmlElement::new("object"));
    assert_eq!(FirstTrackedSector.resolve(&e, &store), Some(PathBuf::from("a.xml")));
}

// ── Conversion ───────────────────────────────────────────────────

struct FakeConverter {
    succeed: bool,
}

impl FormatConverter for FakeConverter {
    fn to_xml(&self, binary: &Path) -> Option<PathBuf> {
        self.succeed.then(|| binary.with_extension("xml"))
    }

    fn to_binary(&self, xml: &Path) -> Option<PathBuf> {
        self.succeed.then(|| xml.with_extension("fcb"))
    }
}

#[test]
fn convert_to_binary_persists_and_evicts() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    store.remove(&path, "Foo").unwrap();
    store
        .convert_to_binary(&path, &FakeConverter { succeed: true })
        .unwrap();
    assert!(!store.is_tracked(&path));
    assert!(!fs::read_to_string(&path).unwrap().contains("\"Foo\""));
}

#[test]
fn failed_conversion_keeps_document_tracked() {
    let dir = TempDir::new().unwrap();
    let path = sector(&dir, TWO_LAYERS);
    let mut store = SectorStore::new();
    store.load(&path).unwrap();
    let err = store
        .convert_to_binary(&path, &FakeConverter { succeed: false })
        .unwrap_err();
    assert!(matches!(err, StorageError::Conversion { .. }));
    assert!(store.is_tracked(&path));
}
