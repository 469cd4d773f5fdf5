//! Where snapshots are read from and written to.

use tracing::{debug, info, warn};

use crate::error::TransferResult;
use crate::snapshot::ClipboardSnapshot;

/// Custom MIME type advertised for snapshot payloads.
pub const SNAPSHOT_MIME_TYPE: &str = "application/x-avatar-entities-fcb";

/// A place snapshots can be exchanged through.
pub trait ClipboardSource {
    /// Short label for logs.
    fn label(&self) -> &'static str;

    /// The current snapshot, or `None` if the source holds nothing usable.
    fn read(&mut self) -> Option<ClipboardSnapshot>;

    fn write(&mut self, snapshot: &ClipboardSnapshot) -> TransferResult<()>;
}

/// Keeps the most recent snapshot in process memory.
#[derive(Debug, Clone, Default)]
pub struct InProcessLastSnapshot {
    last: Option<ClipboardSnapshot>,
}

impl InProcessLastSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> Option<&ClipboardSnapshot> {
        self.last.as_ref()
    }

    /// Replaces the remembered snapshot.
    pub fn set(&mut self, snapshot: ClipboardSnapshot) {
        self.last = Some(snapshot);
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

impl ClipboardSource for InProcessLastSnapshot {
    fn label(&self) -> &'static str {
        "in-process"
    }

    fn read(&mut self) -> Option<ClipboardSnapshot> {
        self.last.clone().filter(|s| !s.is_empty())
    }

    fn write(&mut self, snapshot: &ClipboardSnapshot) -> TransferResult<()> {
        self.set(snapshot.clone());
        Ok(())
    }
}

/// The operating system clipboard, carrying the snapshot as JSON text.
#[cfg(feature = "clipboard")]
pub struct OsClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl OsClipboard {
    pub fn new() -> TransferResult<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| crate::error::TransferError::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardSource for OsClipboard {
    fn label(&self) -> &'static str {
        "os"
    }

    fn read(&mut self) -> Option<ClipboardSnapshot> {
        let text = match self.inner.get_text() {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, "OS clipboard holds no text");
                return None;
            }
        };
        match ClipboardSnapshot::from_json(&text) {
            Ok(s) if !s.is_empty() => Some(s),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "OS clipboard text is not a snapshot");
                None
            }
        }
    }

    fn write(&mut self, snapshot: &ClipboardSnapshot) -> TransferResult<()> {
        self.inner
            .set_text(snapshot.to_json()?)
            .map_err(|e| crate::error::TransferError::Clipboard(e.to_string()))
    }
}

/// Returns the first snapshot found, trying sources in order.
pub fn read_first(sources: &mut [&mut dyn ClipboardSource]) -> Option<ClipboardSnapshot> {
    for source in sources.iter_mut() {
        if let Some(snapshot) = source.read() {
            info!(source = source.label(), count = snapshot.len(), "snapshot read");
            return Some(snapshot);
        }
        debug!(source = source.label(), "no snapshot");
    }
    None
}

/// Writes a snapshot to every source, returning how many accepted it.
pub fn write_all(sources: &mut [&mut dyn ClipboardSource], snapshot: &ClipboardSnapshot) -> usize {
    let mut written = 0;
    for source in sources.iter_mut() {
        match source.write(snapshot) {
            Ok(()) => written += 1,
            Err(e) => warn!(source = source.label(), error = %e, "could not write snapshot"),
        }
    }
    written
}
