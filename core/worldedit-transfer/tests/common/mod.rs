#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use worldedit_model::{Entity, EntityDocument};
use worldedit_transfer::{
    AllocationLimits, ClipboardTransferSystem, TransferConfig, UniquenessAllocator, WorkingSet,
};
use worldedit_types::{EntityId, Position};

pub fn entity_xml(id: u64, name: &str, pos: [f32; 3]) -> String {
    let doc = EntityDocument::parse(&format!(
        r#"<object name="Entity">
  <field name="disEntityId" value-Id64="0">0000000000000000</field>
  <field name="hidName" value-String="">00</field>
  <field name="hidPos" value-Vector3="0,0,0">000000000000000000000000</field>
  <field name="hidPos_precise" value-Vector3="0,0,0">000000000000000000000000</field>
</object>"#
    ))
    .unwrap();
    let mut e = Entity::from_document(doc);
    e.set_id(EntityId::new(id));
    e.set_name(name);
    e.set_position(Position::from(pos));
    e.payload.unwrap().to_xml_string().unwrap()
}

/// One `main` layer holding Foo (id 100, origin) and Bar (id 200, x = 10).
pub fn foo_bar_sector() -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<object name="WorldSector">
  <object name="MissionLayer">
    <field name="PathId" value-String="main">6D61696E00</field>
{}
{}
  </object>
</object>
"#,
        entity_xml(100, "Foo", [0.0, 0.0, 0.0]),
        entity_xml(200, "Bar", [10.0, 0.0, 0.0])
    )
}

pub fn write_sector(dir: &TempDir, name: &str, xml: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, xml).unwrap();
    path
}

pub fn system(config: TransferConfig) -> ClipboardTransferSystem {
    let allocator = UniquenessAllocator::seeded(42, AllocationLimits::default());
    ClipboardTransferSystem::with_parts(
        config,
        allocator,
        Box::new(worldedit_storage::FirstTrackedSector),
    )
}

pub fn open(dir: &TempDir) -> (WorkingSet, PathBuf) {
    let path = write_sector(dir, "worldsector_0.data.fcb.converted.xml", &foo_bar_sector());
    let mut ws = WorkingSet::new();
    ws.open_sector(&path).unwrap();
    (ws, path)
}

pub fn entity_names_in_main(ws: &WorkingSet, path: &std::path::Path) -> Vec<String> {
    let doc = ws.store.document(path).unwrap();
    let layer = doc.root().at_path(&doc.layer_paths()[0]).unwrap();
    layer
        .elements()
        .filter(|e| e.is_object("Entity"))
        .map(|e| EntityDocument::new(e.clone()).display_name())
        .collect()
}
