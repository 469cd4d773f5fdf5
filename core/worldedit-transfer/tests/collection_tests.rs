mod common;

use std::fs;

use common::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use worldedit_model::{Entity, EntityDocument};
use worldedit_transfer::{
    export_collection, is_plain_file_name, preview_collection, read_collection, safe_file_name,
    ExportConfig, PasteOptions, TransferConfig, TransferError, TransferPhase, MANIFEST_FILE,
    README_FILE,
};
use worldedit_types::{EntityId, Position, SourceDescriptor};

fn entity(id: u64, name: &str, pos: [f32; 3]) -> Entity {
    let doc = EntityDocument::parse(&entity_xml(id, name, pos)).unwrap();
    Entity::from_document(doc)
}

// ── Names ────────────────────────────────────────────────────────

#[test]
fn unsafe_characters_are_replaced() {
    assert_eq!(safe_file_name("a/b:c"), "a_b_c");
    assert_eq!(safe_file_name("<<x>>"), "x");
    assert_eq!(safe_file_name("???"), "entity");
    assert_eq!(safe_file_name("Tree 01"), "Tree 01");
}

#[test]
fn invalid_collection_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig::default();
    for bad in ["", "  ", "a/b", "what?"] {
        let err = export_collection(&[], dir.path(), bad, &config).unwrap_err();
        assert!(matches!(err, TransferError::InvalidCollection(_)), "{bad:?}");
    }
}

// ── Export ───────────────────────────────────────────────────────

#[test]
fn export_writes_files_manifest_and_readme() {
    let dir = TempDir::new().unwrap();
    let mut foo = entity(100, "Foo", [0.0, 0.0, 0.0]);
    foo.position = Position::new(5.0, 6.0, 7.0);
    let bar = entity(200, "Bar/1", [10.0, 0.0, 0.0]);

    let export = export_collection(&[foo, bar], dir.path(), "Props", &ExportConfig::default())
        .unwrap();

    assert_eq!(export.dir, dir.path().join("Props"));
    assert!(export.report.is_complete());
    assert!(export.dir.join("Foo_001.xml").exists());
    assert!(export.dir.join("Bar_1_002.xml").exists());

    // preserve_positions writes the current position into the payload
    let written = EntityDocument::parse(
        &fs::read_to_string(export.dir.join("Foo_001.xml")).unwrap(),
    )
    .unwrap();
    assert_eq!(written.position(), Position::new(5.0, 6.0, 7.0));

    let manifest = preview_collection(&export.dir).unwrap();
    assert_eq!(manifest, export.manifest);
    assert_eq!(manifest.entity_count, 2);
    assert_eq!(manifest.entities[0].id, EntityId::new(100));
    assert_eq!(manifest.entities[1].filename, "Bar_1_002.xml");

    let readme = fs::read_to_string(export.dir.join(README_FILE)).unwrap();
    assert!(readme.starts_with("Entity Collection: Props\n"));
    assert!(readme.contains("- Foo (Foo_001.xml)"));
}

#[test]
fn export_skips_entities_without_payload() {
    let dir = TempDir::new().unwrap();
    let loose = Entity::new(EntityId::new(1), "Loose", Position::ORIGIN);
    let foo = entity(100, "Foo", [0.0, 0.0, 0.0]);
    let export = export_collection(&[loose, foo], dir.path(), "Mixed", &ExportConfig::default())
        .unwrap();
    assert!(export.report.is_partial());
    assert_eq!(export.report.failures[0].label, "Loose");
    assert_eq!(export.manifest.entity_count, 1);
    assert_eq!(export.manifest.entities[0].filename, "Foo_002.xml");
}

#[test]
fn metadata_can_be_left_out() {
    let dir = TempDir::new().unwrap();
    let foo = entity(100, "Foo", [0.0, 0.0, 0.0])
        .with_source(SourceDescriptor::SectorFile, Some("w.xml".into()));
    let config = ExportConfig {
        include_metadata: false,
        ..ExportConfig::default()
    };
    export_collection(&[foo], dir.path(), "Bare", &config).unwrap();
    let raw = fs::read_to_string(dir.path().join("Bare").join(MANIFEST_FILE)).unwrap();
    assert!(!raw.contains("source_file"));
}

// ── Import ───────────────────────────────────────────────────────

#[test]
fn read_orders_manifest_files_first() {
    let dir = TempDir::new().unwrap();
    let export = export_collection(
        &[entity(1, "Zed", [0.0; 3]), entity(2, "Amy", [0.0; 3])],
        dir.path(),
        "C",
        &ExportConfig::default(),
    )
    .unwrap();
    fs::write(export.dir.join("extra.xml"), entity_xml(3, "Extra", [0.0; 3])).unwrap();
    fs::write(export.dir.join("layer.xml"), "<object name=\"MissionLayer\"/>").unwrap();

    let contents = read_collection(&export.dir).unwrap();
    let names: Vec<&str> = contents.snapshot.entities.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Zed", "Amy", "Extra"]);
    assert!(
        contents
            .snapshot
            .entities
            .iter()
            .all(|c| c.source_file == SourceDescriptor::ImportedCollection)
    );
    assert_eq!(contents.file_indices, vec![0, 1, 2]);
    assert_eq!(contents.file_count, 4);
    assert_eq!(contents.failures.len(), 1);
    assert_eq!(contents.failures[0].label, "layer.xml");
    assert_eq!(contents.failures[0].index, 3);
}

#[test]
fn plain_file_names_only() {
    assert!(is_plain_file_name("Crate_001.xml"));
    assert!(!is_plain_file_name("../outside.xml"));
    assert!(!is_plain_file_name("sub/inner.xml"));
    assert!(!is_plain_file_name("/tmp/outside.xml"));
    assert!(!is_plain_file_name(".."));
    assert!(!is_plain_file_name(""));
}

#[test]
fn manifest_paths_outside_the_collection_are_not_read() {
    let dir = TempDir::new().unwrap();
    let export = export_collection(
        &[entity(7, "Crate", [0.0; 3])],
        dir.path(),
        "Escape",
        &ExportConfig::default(),
    )
    .unwrap();
    let outside = dir.path().join("outside.xml");
    fs::write(&outside, entity_xml(8, "Intruder", [0.0; 3])).unwrap();

    let mut manifest = preview_collection(&export.dir).unwrap();
    for filename in ["../outside.xml".to_string(), outside.display().to_string()] {
        let mut entry = manifest.entities[0].clone();
        entry.filename = filename;
        manifest.entities.push(entry);
    }
    fs::write(
        export.dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();

    let contents = read_collection(&export.dir).unwrap();
    let names: Vec<&str> = contents.snapshot.entities.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Crate"]);
    let rejected: Vec<usize> = contents.failures.iter().map(|f| f.index).collect();
    assert_eq!(rejected, vec![1, 2]);
}

#[test]
fn preview_requires_manifest() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        preview_collection(dir.path()),
        Err(TransferError::InvalidCollection(_))
    ));
}

#[test]
fn import_keeps_positions_and_free_names() {
    let dir = TempDir::new().unwrap();
    let (mut ws, path) = open(&dir);
    let export = export_collection(
        &[entity(100, "Foo", [1.0, 2.0, 3.0]), entity(300, "Rock", [4.0, 5.0, 6.0])],
        dir.path(),
        "Import",
        &ExportConfig::default(),
    )
    .unwrap();

    let mut sys = system(TransferConfig::default());
    let outcome = sys.import(&mut ws, &export.dir, PasteOptions::default()).unwrap();

    assert_eq!(outcome.phase, TransferPhase::Done);
    let placed = outcome.placed();
    assert_eq!(placed[0].name, "Foo_Copy");
    assert_eq!(placed[0].position, Position::new(1.0, 2.0, 3.0));
    assert_eq!(placed[1].name, "Rock");
    assert_eq!(placed[1].position, Position::new(4.0, 5.0, 6.0));
    assert_ne!(placed[1].id, EntityId::new(300));
    assert!(ws.store.find_entity_by_name(&path, "Rock").unwrap().is_some());
}

#[test]
fn import_into_explicit_sector() {
    let dir = TempDir::new().unwrap();
    let (mut ws, _) = open(&dir);
    let other = write_sector(
        &dir,
        "other.xml",
        r#"<object name="WorldSector">
  <object name="MissionLayer">
    <field name="PathId" value-String="main">6D61696E00</field>
  </object>
</object>
"#,
    );
    ws.open_sector(&other).unwrap();
    let export = export_collection(
        &[entity(7, "Crate", [0.0; 3])],
        dir.path(),
        "One",
        &ExportConfig::default(),
    )
    .unwrap();

    let mut sys = system(TransferConfig::default());
    let outcome = sys
        .import(
            &mut ws,
            &export.dir,
            PasteOptions::at(Position::new(9.0, 9.0, 9.0)).into_sector(&other),
        )
        .unwrap();

    let placed = &outcome.placed()[0];
    assert_eq!(placed.source_location.as_deref(), Some(other.as_path()));
    assert_eq!(placed.position, Position::new(9.0, 9.0, 9.0));
}

#[test]
fn import_failures_are_numbered_by_file_position() {
    let dir = TempDir::new().unwrap();
    let export = export_collection(
        &[entity(7, "B", [0.0; 3])],
        dir.path(),
        "Mixed",
        &ExportConfig::default(),
    )
    .unwrap();
    fs::write(export.dir.join("a_bad.xml"), "<object name=\"MissionLayer\"/>").unwrap();
    fs::write(export.dir.join("c_extra.xml"), entity_xml(9, "C", [0.0; 3])).unwrap();
    let missing = dir.path().join("missing.xml");

    let mut ws = worldedit_transfer::WorkingSet::new();
    let mut sys = system(TransferConfig::default());
    let outcome = sys
        .import(&mut ws, &export.dir, PasteOptions::default().into_sector(&missing))
        .unwrap();

    assert_eq!(outcome.phase, TransferPhase::Idle);
    let failures: Vec<(usize, &str)> = outcome
        .batch
        .failures
        .iter()
        .map(|f| (f.index, f.label.as_str()))
        .collect();
    assert_eq!(failures, vec![(0, "B"), (1, "a_bad.xml"), (2, "C")]);
}

#[test]
fn import_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let (mut ws, _) = open(&dir);
    let mut sys = system(TransferConfig::default());
    let snapshot = sys.copy(&ws.select(&["Bar"]));
    let file = dir.path().join("bar.json");
    snapshot.save(&file).unwrap();

    let outcome = sys.import(&mut ws, &file, PasteOptions::default()).unwrap();
    assert_eq!(outcome.placed()[0].name, "Bar_Copy");
    assert_eq!(outcome.placed()[0].position, Position::new(10.0, 0.0, 0.0));
}
