//! Sector document storage for worldedit.
//!
//! A world is split into sector files, each holding one or more
//! `MissionLayer` containers of entities. This crate owns the loaded
//! documents and provides:
//!
//! - Layer-aware find, insert and remove ([`SectorStore`])
//! - Uniqueness scans over every tracked document
//! - Destination choice for new entities ([`SectorPlacementResolver`])
//! - The external binary/XML converter interface ([`FormatConverter`])

mod converter;
mod error;
mod placement;
mod sector;
mod store;

pub use converter::{
    CONVERTED_XML_SUFFIX, Direction, FormatConverter, ToolConverter, binary_output_path,
    convert_batch, xml_output_path,
};
pub use error::{StorageError, StorageResult};
pub use placement::{FirstTrackedSector, FixedSector, SectorPlacementResolver};
pub use sector::{FoundEntity, LayerInfo, SectorDocument};
pub use store::{DEFAULT_PREFERRED_LAYERS, SectorStore};
