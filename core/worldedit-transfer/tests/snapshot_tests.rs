mod common;

use common::entity_xml;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use worldedit_model::{Entity, EntityDocument};
use worldedit_transfer::{
    read_first, write_all, ClipboardSnapshot, ClipboardSource, InProcessLastSnapshot,
    TransferError, LEGACY_SNAPSHOT_TYPE, SNAPSHOT_TYPE,
};
use worldedit_types::{EntityId, Position, SourceDescriptor};

fn foo() -> Entity {
    let doc = EntityDocument::parse(&entity_xml(100, "Foo", [1.0, 2.0, 3.0])).unwrap();
    Entity::from_document(doc).with_source(SourceDescriptor::SectorFile, Some("s.xml".into()))
}

// ── JSON shape ───────────────────────────────────────────────────

#[test]
fn snapshot_json_has_expected_keys() {
    let snapshot = ClipboardSnapshot::capture(&[foo()]);
    let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

    assert_eq!(json["type"], SNAPSHOT_TYPE);
    assert_eq!(json["version"], "2.0");
    assert_eq!(json["format"], "FCBConverter");
    assert_eq!(json["count"], 1);
    let capsule = &json["entities"][0];
    assert_eq!(capsule["id"], "100");
    assert_eq!(capsule["name"], "Foo");
    assert_eq!(capsule["x"], 1.0);
    assert_eq!(capsule["z"], 3.0);
    assert_eq!(capsule["source_file"], "worldsectors");
    assert_eq!(capsule["source_file_path"], "s.xml");
    assert_eq!(capsule["has_xml_element"], true);
    assert!(capsule["xml"].as_str().unwrap().starts_with("<object name=\"Entity\">"));
}

#[test]
fn capture_leaves_source_untouched() {
    let mut entity = foo();
    entity
        .payload
        .as_mut()
        .unwrap()
        .root_mut()
        .set_attr("exported_name", "Foo");
    let before = entity.clone();
    let snapshot = ClipboardSnapshot::capture(&[entity.clone()]);
    assert_eq!(entity, before);
    assert!(!snapshot.entities[0].xml.as_ref().unwrap().contains("exported_name"));
}

#[test]
fn payload_less_entity_is_captured_without_xml() {
    let entity = Entity::new(EntityId::new(9), "Marker", Position::ORIGIN);
    let snapshot = ClipboardSnapshot::capture(&[entity]);
    assert_eq!(snapshot.entities[0].xml, None);
    assert!(!snapshot.entities[0].has_xml_element);
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn legacy_snapshot_with_numeric_ids_is_accepted() {
    let json = format!(
        r#"{{"type":"{LEGACY_SNAPSHOT_TYPE}","entities":[{{"id":42,"name":"Old","x":1,"y":2,"z":3}}]}}"#
    );
    let snapshot = ClipboardSnapshot::from_json(&json).unwrap();
    let capsule = &snapshot.entities[0];
    assert_eq!(capsule.id, EntityId::new(42));
    assert_eq!(capsule.entity_type, "Entity");
    assert_eq!(capsule.source_file, SourceDescriptor::Unknown);
    assert_eq!(capsule.position(), Position::new(1.0, 2.0, 3.0));
}

#[test]
fn foreign_json_is_rejected() {
    let err = ClipboardSnapshot::from_json(r#"{"type":"something_else","entities":[]}"#)
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidSnapshot(_)));
    assert!(ClipboardSnapshot::from_json("plain text").is_err());
}

#[test]
fn save_and_load_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.json");
    let snapshot = ClipboardSnapshot::capture(&[foo()]);
    snapshot.save(&path).unwrap();
    assert_eq!(ClipboardSnapshot::load(&path).unwrap(), snapshot);
}

#[test]
fn capsule_rebuilds_entity() {
    let snapshot = ClipboardSnapshot::capture(&[foo()]);
    let entity = snapshot.entities[0].to_entity().unwrap();
    assert_eq!(entity.name, "Foo");
    assert_eq!(entity.source, SourceDescriptor::SectorFile);
    assert_eq!(entity.payload.unwrap().position(), Position::new(1.0, 2.0, 3.0));
}

// ── Info ─────────────────────────────────────────────────────────

#[test]
fn info_lists_first_names() {
    let entities: Vec<Entity> = (0..7)
        .map(|i| Entity::new(EntityId::new(i + 1), format!("E{i}"), Position::ORIGIN))
        .collect();
    let info = ClipboardSnapshot::capture(&entities).info();
    assert_eq!(info.count, 7);
    let text = info.to_string();
    assert!(text.starts_with("7 entities (v2.0"));
    assert!(text.contains("E0, E1, E2, E3, E4 and 2 more"));
}

// ── Sources ──────────────────────────────────────────────────────

#[test]
fn read_first_skips_empty_sources() {
    let mut empty = InProcessLastSnapshot::new();
    let mut full = InProcessLastSnapshot::new();
    full.write(&ClipboardSnapshot::capture(&[foo()])).unwrap();

    let found = read_first(&mut [&mut empty, &mut full]).unwrap();
    assert_eq!(found.entities[0].name, "Foo");
}

#[test]
fn empty_snapshot_reads_as_nothing() {
    let mut last = InProcessLastSnapshot::new();
    last.write(&ClipboardSnapshot::default()).unwrap();
    assert!(last.read().is_none());
    assert!(last.peek().is_some());
    last.clear();
    assert!(last.peek().is_none());
}

#[test]
fn set_replaces_remembered_snapshot() {
    let mut last = InProcessLastSnapshot::new();
    last.set(ClipboardSnapshot::capture(&[foo()]));
    last.set(ClipboardSnapshot::default());
    assert_eq!(last.peek(), Some(&ClipboardSnapshot::default()));
    assert!(last.read().is_none());
}

#[test]
fn write_all_counts_sources() {
    let mut a = InProcessLastSnapshot::new();
    let mut b = InProcessLastSnapshot::new();
    let snapshot = ClipboardSnapshot::capture(&[foo()]);
    assert_eq!(write_all(&mut [&mut a, &mut b], &snapshot), 2);
    assert_eq!(b.peek(), Some(&snapshot));
}
