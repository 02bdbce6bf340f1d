//! Test doubles for the core ports.
//!
//! In-memory store with write/read failure injection, a scripted ingest
//! endpoint, and recorders for the sink and notifier.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tnt_core::{DrainNotifier, IngestError, KeyValueStore, ScanIngest, StoreError};
use tnt_domain::ScanRecord;
use tokio::sync::Notify;

/// In-memory `KeyValueStore`.
#[derive(Default)]
pub struct MockStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicUsize,
    fail_reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store seeded with `records` under `key`.
    pub fn seeded(key: &str, records: &[ScanRecord]) -> Arc<Self> {
        let store = Self::new();
        store.put_raw(key, &serde_json::to_string(records).unwrap());
        store
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Decoded ids under `key`, `None` when the key is absent.
    pub fn ids(&self, key: &str) -> Option<Vec<String>> {
        self.raw(key).map(|raw| {
            serde_json::from_str::<Vec<ScanRecord>>(&raw)
                .unwrap()
                .iter()
                .map(|scan| scan.label().to_string())
                .collect()
        })
    }

    /// Fail the next `n` `set` calls.
    pub fn fail_next_writes(&self, n: usize) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` `get` calls.
    pub fn fail_next_reads(&self, n: usize) {
        self.fail_reads.store(n, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl KeyValueStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if Self::take_failure(&self.fail_reads) {
            return Err(StoreError::read(key, "injected read failure"));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if Self::take_failure(&self.fail_writes) {
            return Err(StoreError::write(key, "injected write failure"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.put_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Ingest endpoint failing for a fixed set of scan labels.
#[derive(Default)]
pub struct ScriptedIngest {
    failing: HashSet<String>,
    fail_all: bool,
    calls: Mutex<Vec<String>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedIngest {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_all() -> Arc<Self> {
        Arc::new(Self { fail_all: true, ..Self::default() })
    }

    pub fn failing_for(labels: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: labels.iter().map(|label| (*label).to_string()).collect(),
            ..Self::default()
        })
    }

    /// Every call signals `entered`, then waits for a `release` permit.
    pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self { gate: Some((entered, release)), ..Self::default() })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ScanIngest for ScriptedIngest {
    async fn send_scan(&self, scan: &ScanRecord) -> Result<(), IngestError> {
        let label = scan.label().to_string();
        self.calls.lock().push(label.clone());

        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }

        if self.fail_all || self.failing.contains(&label) {
            Err(IngestError::Network(format!("unreachable while sending {label}")))
        } else {
            Ok(())
        }
    }
}

/// Records each batch handed to the failure sink.
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }
}

impl tnt_core::FailureSink for RecordingSink {
    fn extend_pending(&self, failed: Vec<ScanRecord>) {
        self.batches.lock().push(failed.iter().map(|s| s.label().to_string()).collect());
    }
}

/// Counts advisories.
#[derive(Default)]
pub struct CountingNotifier {
    pub calls: Mutex<Vec<usize>>,
}

impl DrainNotifier for CountingNotifier {
    fn notify_failures(&self, failed: usize) {
        self.calls.lock().push(failed);
    }
}

pub fn scans(ids: &[&str]) -> Vec<ScanRecord> {
    ids.iter().map(|id| ScanRecord::with_id(*id)).collect()
}
