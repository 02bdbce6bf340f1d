//! Default collaborators for the drain: an in-memory pending list and a
//! tracing-backed advisory.

use parking_lot::Mutex;
use tnt_domain::constants::{OFFLINE_FAILURE_MESSAGE, OFFLINE_FAILURE_TITLE};
use tnt_domain::{FailedBatch, ScanRecord};
use tracing::warn;

use super::ports::{DrainNotifier, FailureSink};

/// Pending scans held in application state (the UI's "not yet sent" list).
///
/// Lives only in memory; whatever is here is lost if the process exits.
#[derive(Debug, Default)]
pub struct PendingScans {
    items: Mutex<Vec<ScanRecord>>,
}

impl PendingScans {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending list with `f(previous)`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(Vec<ScanRecord>) -> Vec<ScanRecord>,
    {
        let mut items = self.items.lock();
        let previous = std::mem::take(&mut *items);
        *items = f(previous);
    }

    pub fn snapshot(&self) -> Vec<ScanRecord> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Take every pending scan, leaving the list empty.
    pub fn take(&self) -> Vec<ScanRecord> {
        std::mem::take(&mut *self.items.lock())
    }
}

impl FailureSink for PendingScans {
    fn extend_pending(&self, failed: FailedBatch) {
        self.update(|mut previous| {
            previous.extend(failed);
            previous
        });
    }
}

/// Emits the offline advisory as a warning event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl DrainNotifier for LogNotifier {
    fn notify_failures(&self, failed: usize) {
        warn!(failed, title = OFFLINE_FAILURE_TITLE, "{OFFLINE_FAILURE_MESSAGE}");
    }
}
