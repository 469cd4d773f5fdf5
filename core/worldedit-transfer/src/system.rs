//! Copy, paste, duplicate, export and import.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use worldedit_model::Entity;
use worldedit_storage::{FirstTrackedSector, FixedSector, SectorPlacementResolver};
use worldedit_types::{BatchReport, CancelFlag, EntityId, ItemFailure, Position, SourceDescriptor};

use crate::allocator::{IdHint, NameHint, UniquenessAllocator};
use crate::clipboard::InProcessLastSnapshot;
use crate::collection::{self, CollectionExport, CollectionManifest};
use crate::config::TransferConfig;
use crate::error::TransferResult;
use crate::snapshot::{Capsule, ClipboardSnapshot};
use crate::working_set::WorkingSet;

/// Progress of one paste or import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferPhase {
    Idle,
    SnapshotLoaded,
    PositionsResolved,
    IdentitiesAllocated,
    Placed,
    Done,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferPhase::Idle => "idle",
            TransferPhase::SnapshotLoaded => "snapshot loaded",
            TransferPhase::PositionsResolved => "positions resolved",
            TransferPhase::IdentitiesAllocated => "identities allocated",
            TransferPhase::Placed => "placed",
            TransferPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Outcome of a paste or import.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// `Done` on full success, `Idle` after a failure exit.
    pub phase: TransferPhase,
    /// Furthest phase reached before finishing.
    pub reached: TransferPhase,
    /// Materialized entities, and per-capsule failures.
    pub batch: BatchReport<Entity>,
    /// Sector files written at the end of the batch.
    pub persisted: Vec<PathBuf>,
}

impl TransferOutcome {
    fn empty() -> Self {
        Self {
            phase: TransferPhase::Idle,
            reached: TransferPhase::Idle,
            batch: BatchReport::new(),
            persisted: Vec::new(),
        }
    }

    pub fn placed(&self) -> &[Entity] {
        &self.batch.succeeded
    }

    pub fn is_success(&self) -> bool {
        self.phase == TransferPhase::Done
    }
}

/// Optional inputs to a paste or import.
#[derive(Default)]
pub struct PasteOptions<'a> {
    /// Where the first capsule lands; the rest keep their relative layout.
    pub target_position: Option<Position>,
    /// Overrides the placement resolver for every capsule.
    pub target_sector: Option<PathBuf>,
    pub id_hint: Option<&'a mut IdHint<'a>>,
    pub name_hint: Option<&'a mut NameHint<'a>>,
    pub cancel: Option<&'a CancelFlag>,
}

impl<'a> PasteOptions<'a> {
    pub fn at(position: Position) -> Self {
        Self {
            target_position: Some(position),
            ..Self::default()
        }
    }

    pub fn into_sector(mut self, path: impl Into<PathBuf>) -> Self {
        self.target_sector = Some(path.into());
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// How names are chosen for materialized entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamePolicy {
    /// Always derive a `_Copy` name.
    Copy,
    /// Keep the capsule's name if free.
    KeepIfFree,
}

/// Orchestrates transfers between a [`WorkingSet`] and snapshots.
pub struct ClipboardTransferSystem {
    config: TransferConfig,
    allocator: UniquenessAllocator,
    resolver: Box<dyn SectorPlacementResolver>,
    last: InProcessLastSnapshot,
}

impl ClipboardTransferSystem {
    pub fn new(config: TransferConfig) -> Self {
        let allocator = UniquenessAllocator::new(config.allocation.clone());
        Self::with_parts(config, allocator, Box::new(FirstTrackedSector))
    }

    pub fn with_parts(
        config: TransferConfig,
        allocator: UniquenessAllocator,
        resolver: Box<dyn SectorPlacementResolver>,
    ) -> Self {
        Self {
            config,
            allocator,
            resolver,
            last: InProcessLastSnapshot::new(),
        }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// The in-process fallback clipboard.
    pub fn last_snapshot(&mut self) -> &mut InProcessLastSnapshot {
        &mut self.last
    }

    /// Captures entities into a snapshot and remembers it in process.
    pub fn copy(&mut self, entities: &[Entity]) -> ClipboardSnapshot {
        let snapshot = ClipboardSnapshot::capture(entities);
        if snapshot.len() < entities.len() {
            warn!(
                requested = entities.len(),
                captured = snapshot.len(),
                "some entities were not captured"
            );
        }
        self.last.set(snapshot.clone());
        info!(count = snapshot.len(), "copied entities");
        snapshot
    }

    /// Materializes a snapshot into the working set.
    ///
    /// Without a target position every entity is shifted by the configured
    /// offset (default +20 X, +20 Y). Ids and names are always reallocated.
    pub fn paste(
        &mut self,
        ws: &mut WorkingSet,
        snapshot: &ClipboardSnapshot,
        options: PasteOptions<'_>,
    ) -> TransferOutcome {
        let default_offset = self.config.paste.offset();
        self.materialize(ws, snapshot, options, default_offset, NamePolicy::Copy)
    }

    /// Copies then pastes with the default offset.
    pub fn duplicate(&mut self, ws: &mut WorkingSet, entities: &[Entity]) -> TransferOutcome {
        let snapshot = self.copy(entities);
        self.paste(ws, &snapshot, PasteOptions::default())
    }

    /// Exports entities into a collection under `parent`.
    pub fn export(
        &self,
        entities: &[Entity],
        parent: &Path,
        collection_name: &str,
    ) -> TransferResult<CollectionExport> {
        collection::export_collection(entities, parent, collection_name, &self.config.export)
    }

    pub fn preview(&self, dir: &Path) -> TransferResult<CollectionManifest> {
        collection::preview_collection(dir)
    }

    /// Imports a collection directory or a snapshot `.json` file.
    ///
    /// Entities keep their stored positions unless a target position is
    /// given. Ids are always reallocated; names are kept when free.
    pub fn import(
        &mut self,
        ws: &mut WorkingSet,
        source: &Path,
        options: PasteOptions<'_>,
    ) -> TransferResult<TransferOutcome> {
        if !source.is_dir() {
            let snapshot = ClipboardSnapshot::load(source)?;
            return Ok(self.materialize(ws, &snapshot, options, Position::ORIGIN, NamePolicy::KeepIfFree));
        }

        let contents = collection::read_collection(source)?;
        let mut outcome = self.materialize(
            ws,
            &contents.snapshot,
            options,
            Position::ORIGIN,
            NamePolicy::KeepIfFree,
        );
        // report every failure against the collection's file list
        for failure in &mut outcome.batch.failures {
            failure.index = contents.file_index(failure.index);
        }
        if !contents.failures.is_empty() {
            outcome.batch.failures.extend(contents.failures);
            outcome.batch.failures.sort_by_key(|f| f.index);
            outcome.phase = TransferPhase::Idle;
        }
        Ok(outcome)
    }

    fn materialize(
        &mut self,
        ws: &mut WorkingSet,
        snapshot: &ClipboardSnapshot,
        mut options: PasteOptions<'_>,
        default_offset: Position,
        policy: NamePolicy,
    ) -> TransferOutcome {
        let mut outcome = TransferOutcome::empty();
        let Some(first) = snapshot.entities.first() else {
            debug!("empty snapshot, nothing to materialize");
            return outcome;
        };
        advance(&mut outcome, TransferPhase::SnapshotLoaded);

        let offset = match options.target_position {
            Some(target) => target - first.position(),
            None => default_offset,
        };
        advance(&mut outcome, TransferPhase::PositionsResolved);

        let mut ids = ws.known_ids();
        let mut names = ws.known_names();
        let fixed = options.target_sector.clone().map(FixedSector);
        let resolver: &dyn SectorPlacementResolver = match &fixed {
            Some(f) => f,
            None => self.resolver.as_ref(),
        };

        for (index, capsule) in snapshot.entities.iter().enumerate() {
            if options.cancel.is_some_and(CancelFlag::is_cancelled) {
                info!(done = index, total = snapshot.len(), "transfer cancelled");
                outcome.batch.cancelled = true;
                break;
            }

            let id = match self.allocator.allocate_id(&ids, options.id_hint.as_deref_mut()) {
                Ok(id) => id,
                Err(e) => {
                    outcome.batch.push_failure(ItemFailure::new(index, capsule.name.clone(), e.to_string()));
                    continue;
                }
            };
            let name = match policy {
                NamePolicy::KeepIfFree if !names.contains(&capsule.name) => capsule.name.clone(),
                _ => self
                    .allocator
                    .allocate_name(&capsule.name, &names, options.name_hint.as_deref_mut()),
            };
            ids.insert(id);
            names.insert(name.clone());
            advance(&mut outcome, TransferPhase::IdentitiesAllocated);

            match place(
                ws,
                capsule,
                id,
                &name,
                capsule.position() + offset,
                resolver,
                &self.config.placement.preferred_layers,
            ) {
                Ok(entity) => outcome.batch.push_success(entity),
                Err(e) => {
                    warn!(name = %name, error = %e, "placement failed");
                    outcome.batch.push_failure(ItemFailure::new(index, capsule.name.clone(), e.to_string()));
                }
            }
        }

        if !outcome.batch.succeeded.is_empty() {
            advance(&mut outcome, TransferPhase::Placed);
        }

        if self.config.paste.auto_persist {
            match ws.store.persist_dirty() {
                Ok(paths) => outcome.persisted = paths,
                Err(e) => {
                    warn!(error = %e, "persisting pasted entities failed");
                    outcome.batch.push_failure(ItemFailure::new(
                        snapshot.len(),
                        "persist",
                        e.to_string(),
                    ));
                }
            }
        }

        if outcome.batch.is_complete() {
            advance(&mut outcome, TransferPhase::Done);
        } else {
            debug!(from = %outcome.reached, "transfer finished with failures, back to idle");
            outcome.phase = TransferPhase::Idle;
        }
        info!(
            placed = outcome.batch.succeeded.len(),
            failed = outcome.batch.failures.len(),
            phase = %outcome.phase,
            "transfer finished"
        );
        outcome
    }
}

fn advance(outcome: &mut TransferOutcome, phase: TransferPhase) {
    if phase > outcome.reached {
        debug!(from = %outcome.reached, to = %phase, "transfer phase");
        outcome.reached = phase;
        outcome.phase = phase;
    }
}

/// Builds the entity for one capsule and writes it to its sector.
fn place(
    ws: &mut WorkingSet,
    capsule: &Capsule,
    id: EntityId,
    name: &str,
    position: Position,
    resolver: &dyn SectorPlacementResolver,
    preferred: &[String],
) -> TransferResult<Entity> {
    let mut entity = capsule.to_entity()?;
    entity.set_id(id);
    entity.set_name(name);
    entity.set_position(position);

    match (resolver.resolve(&entity, &ws.store), &entity.payload) {
        (Some(path), Some(payload)) => {
            ws.store.insert(&path, payload, preferred)?;
            entity.source = SourceDescriptor::SectorFile;
            entity.source_location = Some(path);
        }
        (Some(_), None) => {
            debug!(name = %name, "entity has no payload, kept in memory only");
            entity.source_location = None;
        }
        (None, _) => {
            debug!(name = %name, "no sector tracked, kept in memory only");
            entity.source_location = None;
        }
    }

    ws.entities.push(entity.clone());
    Ok(entity)
}

impl Default for ClipboardTransferSystem {
    fn default() -> Self {
        Self::new(TransferConfig::default())
    }
}

impl fmt::Debug for ClipboardTransferSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipboardTransferSystem")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
