//! Command-line front end for worldedit.
//!
//! Every subcommand opens the sector documents it needs, applies one
//! operation through [`ClipboardTransferSystem`] or the sector store, and
//! writes the touched documents back.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use worldedit_model::Entity;
use worldedit_storage::{CONVERTED_XML_SUFFIX, Direction, ToolConverter, convert_batch};
use worldedit_transfer::{
    ClipboardSnapshot, ClipboardTransferSystem, PasteOptions, TransferConfig, TransferOutcome,
    WorkingSet,
};
use worldedit_types::{BatchReport, CancelFlag, Position};

#[derive(Parser, Debug)]
#[command(name = "worldedit")]
#[command(about = "Inspect and edit world sector documents")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, default_value = "worldedit.toml")]
    pub config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the layers and entities of a sector document
    Info { sector: PathBuf },

    /// Delete an entity by name
    Remove { sector: PathBuf, name: String },

    /// Copy entities and paste them next to the originals
    Duplicate {
        sector: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Capture entities into a snapshot
    Copy {
        sector: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
        /// Write the snapshot to this file instead of the clipboard
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Paste a snapshot into a sector document
    Paste {
        sector: PathBuf,
        /// Read the snapshot from this file instead of the clipboard
        #[arg(long)]
        from: Option<PathBuf>,
        /// Where the first entity lands, as x,y,z
        #[arg(long, allow_hyphen_values = true)]
        at: Option<Position>,
    },

    /// Export entities into a collection directory
    Export {
        sector: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
        /// Collection directory to create
        #[arg(long)]
        dir: PathBuf,
    },

    /// Import a collection directory or snapshot file into a sector
    Import {
        source: PathBuf,
        #[arg(long)]
        sector: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        at: Option<Position>,
    },

    /// Convert sector files with the external conversion tool
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        tool: PathBuf,
    },
}

/// Runs one command, writing user-facing output to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = TransferConfig::load_from(&cli.config);
    let mut system = ClipboardTransferSystem::new(config);
    debug!(command = ?cli.command, "running command");

    match cli.command {
        Command::Info { sector } => show_info(&sector, out),
        Command::Remove { sector, name } => {
            let mut ws = open(&sector)?;
            if !ws.delete(&name)? {
                bail!("No entity named {name:?} in {}", sector.display());
            }
            ws.store
                .persist(&sector)
                .with_context(|| format!("Failed to write {}", sector.display()))?;
            writeln!(out, "removed {name}")?;
            Ok(())
        }
        Command::Duplicate { sector, names } => {
            let mut ws = open(&sector)?;
            let entities = select(&ws, &names)?;
            let outcome = system.duplicate(&mut ws, &entities);
            finish(&mut ws, &outcome, out)
        }
        Command::Copy { sector, names, out: file } => {
            let ws = open(&sector)?;
            let entities = select(&ws, &names)?;
            let snapshot = system.copy(&entities);
            match &file {
                Some(path) => snapshot
                    .save(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => clipboard::write(&snapshot)?,
            }
            writeln!(out, "copied {}", snapshot.info())?;
            Ok(())
        }
        Command::Paste { sector, from, at } => {
            let mut ws = open(&sector)?;
            let snapshot = match &from {
                Some(path) => ClipboardSnapshot::load(path)
                    .with_context(|| format!("Failed to read snapshot {}", path.display()))?,
                None => clipboard::read()?,
            };
            let outcome = system.paste(&mut ws, &snapshot, paste_options(at));
            finish(&mut ws, &outcome, out)
        }
        Command::Export { sector, names, dir } => {
            let ws = open(&sector)?;
            let entities = select(&ws, &names)?;
            let (parent, name) = split_collection_dir(&dir)?;
            let export = system.export(&entities, parent, &name)?;
            for path in &export.report.succeeded {
                writeln!(out, "wrote {}", path.display())?;
            }
            print_failures(&export.report, out)?;
            writeln!(out, "{}", export.report.summary())?;
            if !export.report.is_complete() {
                bail!("Export incomplete");
            }
            Ok(())
        }
        Command::Import { source, sector, at } => {
            let mut ws = open(&sector)?;
            let options = paste_options(at).into_sector(&sector);
            let outcome = system
                .import(&mut ws, &source, options)
                .with_context(|| format!("Failed to import {}", source.display()))?;
            finish(&mut ws, &outcome, out)
        }
        Command::Convert { files, tool } => convert(&files, &tool, out),
    }
}

fn open(sector: &Path) -> Result<WorkingSet> {
    let mut ws = WorkingSet::new();
    ws.open_sector(sector)
        .with_context(|| format!("Failed to open sector {}", sector.display()))?;
    Ok(ws)
}

/// Looks up every named entity; all must exist.
fn select(ws: &WorkingSet, names: &[String]) -> Result<Vec<Entity>> {
    let missing: Vec<&str> = names
        .iter()
        .filter(|n| ws.find(n).is_none())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        bail!("Entity not found: {}", missing.join(", "));
    }
    Ok(ws.select(names))
}

fn paste_options<'a>(at: Option<Position>) -> PasteOptions<'a> {
    match at {
        Some(position) => PasteOptions::at(position),
        None => PasteOptions::default(),
    }
}

/// `parent/name` -> (`parent`, `name`)
fn split_collection_dir(dir: &Path) -> Result<(&Path, String)> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} does not name a directory", dir.display()))?;
    let parent = dir.parent().unwrap_or(Path::new("."));
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    Ok((parent, name))
}

fn show_info(sector: &Path, out: &mut dyn Write) -> Result<()> {
    let mut ws = open(sector)?;
    writeln!(out, "{}", sector.display())?;
    for layer in ws.store.layers(sector)? {
        let label = layer.label.as_deref().unwrap_or("<unnamed>");
        writeln!(out, "  layer {} {label}: {} entities", layer.index, layer.entity_count)?;
    }
    for entity in &ws.entities {
        writeln!(out, "  {} [{}] at {}", entity.name, entity.id, entity.position)?;
    }
    Ok(())
}

/// Reports a paste or import and writes anything still unsaved.
fn finish(ws: &mut WorkingSet, outcome: &TransferOutcome, out: &mut dyn Write) -> Result<()> {
    for entity in outcome.placed() {
        writeln!(out, "placed {} [{}] at {}", entity.name, entity.id, entity.position)?;
    }
    print_failures(&outcome.batch, out)?;
    let written = ws.store.persist_dirty().context("Failed to write sector documents")?;
    info!(documents = written.len() + outcome.persisted.len(), "saved");
    writeln!(out, "{} ({})", outcome.batch.summary(), outcome.phase)?;
    if !outcome.is_success() {
        bail!("Transfer incomplete");
    }
    Ok(())
}

fn print_failures<T>(report: &BatchReport<T>, out: &mut dyn Write) -> Result<()> {
    for failure in &report.failures {
        writeln!(out, "failed {}: {}", failure.label, failure.reason)?;
    }
    Ok(())
}

fn convert(files: &[PathBuf], tool: &Path, out: &mut dyn Write) -> Result<()> {
    let converter = ToolConverter::new(tool);
    let cancel = CancelFlag::new();
    let (to_binary, to_xml): (Vec<PathBuf>, Vec<PathBuf>) = files
        .iter()
        .cloned()
        .partition(|p| p.to_string_lossy().ends_with(CONVERTED_XML_SUFFIX));

    let mut complete = true;
    for (batch, direction) in [(to_xml, Direction::ToXml), (to_binary, Direction::ToBinary)] {
        if batch.is_empty() {
            continue;
        }
        let report = convert_batch(&converter, &batch, direction, &cancel);
        for path in &report.succeeded {
            writeln!(out, "wrote {}", path.display())?;
        }
        print_failures(&report, out)?;
        complete &= report.is_complete();
    }
    if !complete {
        bail!("Some files were not converted");
    }
    Ok(())
}

#[cfg(feature = "clipboard")]
mod clipboard {
    use anyhow::{Context, Result};
    use worldedit_transfer::{ClipboardSnapshot, ClipboardSource, OsClipboard, read_first};

    pub fn write(snapshot: &ClipboardSnapshot) -> Result<()> {
        let mut os = OsClipboard::new()?;
        os.write(snapshot)?;
        Ok(())
    }

    pub fn read() -> Result<ClipboardSnapshot> {
        let mut os = OsClipboard::new()?;
        read_first(&mut [&mut os]).context("Clipboard holds no entity snapshot")
    }
}

#[cfg(not(feature = "clipboard"))]
mod clipboard {
    use anyhow::{Result, bail};
    use worldedit_transfer::ClipboardSnapshot;

    pub fn write(_snapshot: &ClipboardSnapshot) -> Result<()> {
        bail!("Built without clipboard support, pass --out <file>")
    }

    pub fn read() -> Result<ClipboardSnapshot> {
        bail!("Built without clipboard support, pass --from <file>")
    }
}
