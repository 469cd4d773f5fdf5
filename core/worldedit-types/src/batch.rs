//! Batch outcome reporting and cooperative cancellation.
//!
//! Bulk operations (paste, import, export, format conversion) never fail as
//! a whole: they report which items succeeded and why the others did not.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One item of a batch that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Position of the item in the batch input.
    pub index: usize,
    /// Display label of the item (entity name, file name).
    pub label: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(index: usize, label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
            reason: reason.into(),
        }
    }
}

/// Result of a batch operation.
#[derive(Debug, Clone)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failures: Vec<ItemFailure>,
    /// True if the batch stopped early because its `CancelFlag` was raised.
    pub cancelled: bool,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }
}

impl<T> BatchReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_success(&mut self, item: T) {
        self.succeeded.push(item);
    }

    pub fn push_failure(&mut self, failure: ItemFailure) {
        self.failures.push(failure);
    }

    /// True if nothing failed and the batch ran to completion.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// True if some items succeeded and some failed.
    pub fn is_partial(&self) -> bool {
        !self.succeeded.is_empty() && !self.failures.is_empty()
    }

    /// One-line summary for status bars, e.g. `12 succeeded, 2 failed`.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failures.len()
        );
        if self.cancelled {
            out.push_str(" (cancelled)");
        }
        out
    }
}

/// Cooperative stop flag checked between batch items.
///
/// Cloning shares the flag, so a UI thread can hold one clone and cancel a
/// batch running elsewhere. An item already in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
