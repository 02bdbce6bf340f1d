//! Offline queue service: append path and the drain state machine.
//!
//! `OfflineQueue` is the single owner of the serialized queue value. Every
//! read-modify-write of the queue key happens under `write_lock`, and drain
//! passes are serialized by `pass_lock`, so a scan appended while a pass is
//! running is never overwritten by the pass's post-attempt persist.
//!
//! `write_lock` also guards a clear epoch. A pass records the epoch it
//! snapshotted under and stops trimming once `clear` has bumped it, so scans
//! appended after a clear are not eaten by an older pass.
//!
//! A pass takes a snapshot of the queue, attempts each record exactly once in
//! FIFO order, and removes it from the persisted queue whether or not the
//! send succeeded. Records that failed are handed to the caller's
//! [`FailureSink`] once the snapshot is exhausted.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tnt_domain::constants::{FAILED_SCANS_KEY, OFFLINE_QUEUE_KEY};
use tnt_domain::{FailedBatch, ScanRecord};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use super::pending::LogNotifier;
use super::ports::{DrainNotifier, FailureSink, ScanIngest};
use super::state::{DrainReport, DrainState};
use crate::queue::{decode, encode, KeyValueStore};

/// Storage layout and failure handling for an [`OfflineQueue`].
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Key holding the serialized queue
    pub queue_key: String,
    /// Key holding failed scans when `persist_failed` is on
    pub failed_key: String,
    /// Mirror each pass's failed batch into `failed_key`
    pub persist_failed: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            queue_key: OFFLINE_QUEUE_KEY.to_string(),
            failed_key: FAILED_SCANS_KEY.to_string(),
            persist_failed: false,
        }
    }
}

/// How a pass writes the queue back after each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistMode {
    /// Remove the attempted records from the head of the stored queue,
    /// keeping anything appended since the snapshot. Carries the clear epoch
    /// the snapshot was read under.
    TrimHead(u64),
    /// Overwrite the stored queue with the remaining caller snapshot.
    Replace,
}

/// Persisted offline scan queue with its sync engine.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    ingest: Arc<dyn ScanIngest>,
    notifier: Arc<dyn DrainNotifier>,
    options: QueueOptions,
    /// Held for every read-modify-write; counts `clear` calls
    write_lock: Mutex<u64>,
    pass_lock: Mutex<()>,
    state: watch::Sender<DrainState>,
}

impl OfflineQueue {
    /// Queue under the default key, logging failures as its advisory.
    pub fn new(store: Arc<dyn KeyValueStore>, ingest: Arc<dyn ScanIngest>) -> Self {
        let (state, _) = watch::channel(DrainState::Idle);
        Self {
            store,
            ingest,
            notifier: Arc::new(LogNotifier),
            options: QueueOptions::default(),
            write_lock: Mutex::new(0),
            pass_lock: Mutex::new(()),
            state,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: QueueOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn DrainNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn options(&self) -> &QueueOptions {
        &self.options
    }

    /// Current drain state.
    pub fn state(&self) -> DrainState {
        *self.state.borrow()
    }

    /// Watch drain state transitions.
    pub fn subscribe(&self) -> watch::Receiver<DrainState> {
        self.state.subscribe()
    }

    /// Persisted queue contents. Read failures yield an empty queue.
    pub async fn load(&self) -> Vec<ScanRecord> {
        self.read_records(&self.options.queue_key).await.unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Append scans to the tail of the persisted queue.
    ///
    /// Returns the new queue length, or `None` when the queue could not be
    /// read or written (logged, nothing changed).
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn append(&self, records: Vec<ScanRecord>) -> Option<usize> {
        let _guard = self.write_lock.lock().await;
        let key = &self.options.queue_key;

        let mut queue = match self.read_records(key).await {
            Some(queue) => queue,
            None => {
                warn!("offline queue not appended: stored queue unreadable");
                return None;
            }
        };
        queue.extend(records);

        if self.write_records(key, &queue).await {
            debug!(len = queue.len(), "offline queue appended");
            Some(queue.len())
        } else {
            None
        }
    }

    /// Remove the queue key entirely.
    ///
    /// A pass already in flight keeps sending its snapshot but no longer
    /// trims the stored queue, so anything appended after the clear stays.
    pub async fn clear(&self) -> bool {
        let mut epoch = self.write_lock.lock().await;
        *epoch += 1;
        self.remove_key(&self.options.queue_key).await
    }

    /// Scans parked in the failed slot.
    pub async fn failed(&self) -> Vec<ScanRecord> {
        self.read_records(&self.options.failed_key).await.unwrap_or_default()
    }

    pub async fn failed_len(&self) -> usize {
        self.failed().await.len()
    }

    /// Move every parked failed scan back to the tail of the queue.
    ///
    /// Returns how many were moved, or `None` if the store refused. The
    /// failed slot is only cleared once the queue write has landed.
    #[instrument(skip(self))]
    pub async fn requeue_failed(&self) -> Option<usize> {
        let _guard = self.write_lock.lock().await;
        let failed = self.read_records(&self.options.failed_key).await?;
        if failed.is_empty() {
            return Some(0);
        }

        let mut queue = self.read_records(&self.options.queue_key).await?;
        let moved = failed.len();
        queue.extend(failed);

        if !self.write_records(&self.options.queue_key, &queue).await {
            return None;
        }
        if !self.remove_key(&self.options.failed_key).await {
            warn!(moved, "failed slot not cleared after requeue; scans may be sent twice");
        }

        info!(moved, len = queue.len(), "failed scans requeued");
        Some(moved)
    }

    /// Drain the persisted queue against the ingest endpoint.
    ///
    /// Concurrent calls run one after another. Records appended while the
    /// pass runs stay queued for the next pass.
    pub async fn drain(&self, sink: &dyn FailureSink) -> DrainReport {
        let _pass = self.pass_lock.lock().await;
        let (snapshot, epoch) = {
            let epoch = self.write_lock.lock().await;
            (self.load().await, *epoch)
        };
        self.run_pass(snapshot, sink, PersistMode::TrimHead(epoch)).await
    }

    /// Drain a caller-held snapshot, writing the remaining snapshot back to
    /// the store after every attempt.
    pub async fn drain_snapshot(
        &self,
        snapshot: Vec<ScanRecord>,
        sink: &dyn FailureSink,
    ) -> DrainReport {
        let _pass = self.pass_lock.lock().await;
        self.run_pass(snapshot, sink, PersistMode::Replace).await
    }

    #[instrument(skip_all, fields(queued = snapshot.len(), mode = ?mode))]
    async fn run_pass(
        &self,
        snapshot: Vec<ScanRecord>,
        sink: &dyn FailureSink,
        mode: PersistMode,
    ) -> DrainReport {
        let started = Instant::now();
        let mut report = DrainReport::default();

        if snapshot.is_empty() {
            debug!("offline queue empty; nothing to drain");
            self.state.send_replace(DrainState::Idle);
            return report;
        }

        self.state.send_replace(DrainState::Draining);

        let mut queue: VecDeque<ScanRecord> = snapshot.into();
        let mut failed = FailedBatch::new();
        // attempted records not yet removed from the stored queue
        let mut unpersisted = 0_usize;

        while let Some(scan) = queue.pop_front() {
            report.attempted += 1;

            match self.ingest.send_scan(&scan).await {
                Ok(()) => {
                    report.sent += 1;
                    debug!(scan = scan.label(), "offline scan sent");
                }
                Err(err) => {
                    warn!(
                        scan = scan.label(),
                        category = %err.category(),
                        error = %err,
                        "error sending offline scan"
                    );
                    failed.push(scan);
                }
            }
            unpersisted += 1;

            let persisted = match mode {
                PersistMode::TrimHead(epoch) => self.trim_head(unpersisted, epoch).await,
                PersistMode::Replace => {
                    let _guard = self.write_lock.lock().await;
                    self.write_records(&self.options.queue_key, queue.make_contiguous()).await
                }
            };

            if persisted {
                unpersisted = 0;
            } else {
                report.persist_failures += 1;
                warn!(lagging = unpersisted, "stored offline queue lags the drain");
            }
        }

        report.failed = failed.len();
        if !failed.is_empty() {
            self.state.send_replace(DrainState::Reconciling);
            self.reconcile(failed, sink).await;
        }

        self.state.send_replace(DrainState::Idle);
        report.elapsed = started.elapsed();

        info!(
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            persist_failures = report.persist_failures,
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "offline drain pass complete"
        );
        report
    }

    async fn reconcile(&self, failed: FailedBatch, sink: &dyn FailureSink) {
        if self.options.persist_failed {
            let _guard = self.write_lock.lock().await;
            let key = &self.options.failed_key;
            match self.read_records(key).await {
                Some(mut parked) => {
                    parked.extend(failed.iter().cloned());
                    self.write_records(key, &parked).await;
                }
                None => warn!(count = failed.len(), "failed scans not parked: slot unreadable"),
            }
        }

        self.notifier.notify_failures(failed.len());
        sink.extend_pending(failed);
    }

    /// Drop the first `count` records of the stored queue, unless the queue
    /// was cleared since the snapshot taken at `epoch`.
    async fn trim_head(&self, count: usize, epoch: u64) -> bool {
        let current = self.write_lock.lock().await;
        if *current != epoch {
            debug!(count, "offline queue cleared during drain; head not trimmed");
            return true;
        }
        let key = &self.options.queue_key;

        let Some(mut stored) = self.read_records(key).await else {
            return false;
        };
        stored.drain(..count.min(stored.len()));
        self.write_records(key, &stored).await
    }

    async fn read_records(&self, key: &str) -> Option<Vec<ScanRecord>> {
        match self.store.get(key).await {
            Ok(raw) => Some(decode(raw.as_deref())),
            Err(err) => {
                warn!(key, error = %err, "error retrieving offline data");
                None
            }
        }
    }

    async fn write_records(&self, key: &str, records: &[ScanRecord]) -> bool {
        let encoded = match encode(records) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key, error = %err, "offline data not serializable");
                return false;
            }
        };

        match self.store.set(key, &encoded).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "error storing offline data");
                false
            }
        }
    }

    async fn remove_key(&self, key: &str) -> bool {
        match self.store.remove(key).await {
            Ok(()) => {
                debug!(key, "offline key removed");
                true
            }
            Err(err) => {
                warn!(key, error = %err, "error removing offline data");
                false
            }
        }
    }
}
