//! Entity transfer for worldedit.
//!
//! Copy/paste, duplicate, and collection export/import all share one
//! pipeline: capture entities into a [`ClipboardSnapshot`], then replay the
//! snapshot into a [`WorkingSet`] through the [`UniquenessAllocator`] and
//! the sector store, so every materialized entity gets a fresh id and name.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use worldedit_transfer::{ClipboardTransferSystem, PasteOptions, TransferConfig, WorkingSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ws = WorkingSet::new();
//! ws.open_sector(Path::new("worldsector_12.data.fcb.converted.xml"))?;
//!
//! let mut system = ClipboardTransferSystem::new(TransferConfig::default());
//! let selected = ws.select(&["Foo", "Bar"]);
//! let snapshot = system.copy(&selected);
//! let outcome = system.paste(&mut ws, &snapshot, PasteOptions::default());
//! println!("{}", outcome.batch.summary());
//! # Ok(())
//! # }
//! ```

mod allocator;
mod clipboard;
mod collection;
mod config;
mod error;
mod snapshot;
mod system;
mod working_set;

pub use allocator::{COPY_SUFFIX, Clock, IdHint, NameHint, UniquenessAllocator, base_name};
#[cfg(feature = "clipboard")]
pub use clipboard::OsClipboard;
pub use clipboard::{ClipboardSource, InProcessLastSnapshot, SNAPSHOT_MIME_TYPE, read_first, write_all};
pub use collection::{
    COLLECTION_TYPE, CollectionContents, CollectionExport, CollectionManifest, MANIFEST_FILE,
    ManifestEntry, OriginalPosition, README_FILE, export_collection, is_plain_file_name,
    preview_collection, read_collection, safe_file_name, validate_collection_name,
};
pub use config::{AllocationLimits, ExportConfig, PasteConfig, PlacementConfig, TransferConfig};
pub use error::{TransferError, TransferResult};
pub use snapshot::{
    Capsule, ClipboardSnapshot, LEGACY_SNAPSHOT_TYPE, SNAPSHOT_FORMAT, SNAPSHOT_TYPE,
    SNAPSHOT_VERSION, SnapshotInfo,
};
pub use system::{ClipboardTransferSystem, PasteOptions, TransferOutcome, TransferPhase};
pub use working_set::WorkingSet;
