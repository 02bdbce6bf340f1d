//! Sync worker for periodic offline-queue drains.
//!
//! Every `interval` the worker checks the persisted queue; when it holds
//! scans and the scan API answers its health probe, one drain pass runs.
//! Failed scans go to the worker's failure sink, same as a manual drain.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tnt_core::{OfflineQueue, PendingScans};
//! use tnt_infra::observability::SyncMetrics;
//! use tnt_infra::sync::{SyncWorker, SyncWorkerConfig};
//! use tnt_infra::{InMemoryKeyValueStore, ScanApiClient, ScanApiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(ScanApiClient::new(ScanApiConfig::default())?);
//! let queue = Arc::new(OfflineQueue::new(Arc::new(InMemoryKeyValueStore::new()), api.clone()));
//! let mut worker = SyncWorker::new(
//!     queue,
//!     api,
//!     Arc::new(PendingScans::new()),
//!     SyncWorkerConfig::default(),
//!     Arc::new(SyncMetrics::new()),
//! );
//!
//! worker.start()?;
//! // ... application runs ...
//! worker.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tnt_core::{DrainReport, FailureSink, OfflineQueue};
use tnt_domain::SyncConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::ScanApiClient;
use crate::observability::{MetricsResult, SyncMetrics};
use crate::sync::errors::SyncError;

/// Configuration for the sync worker.
#[derive(Debug, Clone)]
pub struct SyncWorkerConfig {
    /// Delay between ticks
    pub interval: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for SyncWorkerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(30), join_timeout: Duration::from_secs(5) }
    }
}

impl From<&SyncConfig> for SyncWorkerConfig {
    fn from(sync: &SyncConfig) -> Self {
        Self {
            interval: Duration::from_secs(sync.interval_seconds.max(1)),
            ..Self::default()
        }
    }
}

/// Connectivity check run before each drain.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// `Ok` when the scan API can take scans right now.
    async fn probe(&self) -> Result<(), SyncError>;
}

#[async_trait]
impl ConnectivityProbe for ScanApiClient {
    async fn probe(&self) -> Result<(), SyncError> {
        if self.health_check().await? {
            Ok(())
        } else {
            Err(SyncError::Unhealthy)
        }
    }
}

/// Sync worker with explicit lifecycle management.
pub struct SyncWorker {
    queue: Arc<OfflineQueue>,
    probe: Arc<dyn ConnectivityProbe>,
    sink: Arc<dyn FailureSink>,
    config: SyncWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
    metrics: Arc<SyncMetrics>,
}

impl SyncWorker {
    pub fn new(
        queue: Arc<OfflineQueue>,
        probe: Arc<dyn ConnectivityProbe>,
        sink: Arc<dyn FailureSink>,
        config: SyncWorkerConfig,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            queue,
            probe,
            sink,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// Start the worker, spawning the background task.
    #[instrument(skip(self), fields(interval_secs = self.config.interval.as_secs()))]
    pub fn start(&mut self) -> Result<(), SyncError> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let queue = Arc::clone(&self.queue);
        let probe = Arc::clone(&self.probe);
        let sink = Arc::clone(&self.sink);
        let metrics = Arc::clone(&self.metrics);
        let interval = self.config.interval;
        let cancel = self.cancellation.clone();

        self.task_handle = Some(tokio::spawn(async move {
            Self::process_loop(queue, probe, sink, metrics, interval, cancel).await;
        }));

        info!("Sync worker started");
        Ok(())
    }

    /// Stop the worker and wait for the background task to finish.
    ///
    /// A pass that is already running completes first; if that takes longer
    /// than the join timeout, `JoinTimeout` is returned and the pass keeps
    /// running detached.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), SyncError> {
        let Some(handle) = self.task_handle.take() else {
            return Err(SyncError::NotRunning);
        };

        info!("Stopping sync worker");
        self.cancellation.cancel();

        let join_timeout = self.config.join_timeout;
        match tokio::time::timeout(join_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "Sync worker task panicked");
                return Err(SyncError::Panicked(e.to_string()));
            }
            Err(_) => {
                warn!(?join_timeout, "Sync worker task did not complete within timeout");
                return Err(SyncError::JoinTimeout(join_timeout));
            }
        }

        info!("Sync worker stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Run one tick now, outside the schedule.
    pub async fn run_once(&self) -> Result<Option<DrainReport>, SyncError> {
        Self::tick(&self.queue, self.probe.as_ref(), self.sink.as_ref(), &self.metrics).await
    }

    async fn process_loop(
        queue: Arc<OfflineQueue>,
        probe: Arc<dyn ConnectivityProbe>,
        sink: Arc<dyn FailureSink>,
        metrics: Arc<SyncMetrics>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Sync worker loop cancelled");
                    break;
                }
                () = tokio::time::sleep(interval) => {
                    match Self::tick(&queue, probe.as_ref(), sink.as_ref(), &metrics).await {
                        Ok(_) => {}
                        Err(err) if err.should_retry() => {
                            debug!(error = %err, "Scan API not reachable; retrying next tick");
                        }
                        Err(err) => warn!(error = %err, "Sync tick failed"),
                    }
                }
            }
        }
    }

    /// Drain once if there is anything queued and the API is reachable.
    ///
    /// Returns `Ok(None)` when the queue was empty.
    async fn tick(
        queue: &OfflineQueue,
        probe: &dyn ConnectivityProbe,
        sink: &dyn FailureSink,
        metrics: &SyncMetrics,
    ) -> Result<Option<DrainReport>, SyncError> {
        if queue.is_empty().await {
            debug!("offline queue empty; skipping tick");
            return Ok(None);
        }

        if let Err(err) = probe.probe().await {
            log_metric(metrics.record_offline_tick(), "sync_worker.offline_tick");
            return Err(err);
        }

        let report = queue.drain(sink).await;
        log_metric(metrics.record_pass(&report), "sync_worker.pass");
        Ok(Some(report))
    }
}

fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        warn!(metric, error = ?err, "Failed to record worker metric");
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncWorker dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use tnt_core::{IngestError, KeyValueStore, PendingScans, ScanIngest};
    use tnt_domain::constants::OFFLINE_QUEUE_KEY;
    use tnt_domain::ScanRecord;

    use super::*;
    use crate::database::InMemoryKeyValueStore;

    struct MockProbe {
        responses: Mutex<Vec<Result<(), SyncError>>>,
        calls: AtomicUsize,
    }

    impl MockProbe {
        fn new(responses: Vec<Result<(), SyncError>>) -> Arc<Self> {
            Arc::new(Self { responses: Mutex::new(responses), calls: AtomicUsize::new(0) })
        }

        fn reachable() -> Arc<Self> {
            Self::new(Vec::new())
        }
    }

    #[async_trait]
    impl ConnectivityProbe for MockProbe {
        async fn probe(&self) -> Result<(), SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                Ok(())
            } else {
                responses.remove(0)
            }
        }
    }

    #[derive(Default)]
    struct MockIngest {
        fail_ids: Vec<String>,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ScanIngest for MockIngest {
        async fn send_scan(&self, scan: &ScanRecord) -> Result<(), IngestError> {
            let label = scan.label().to_string();
            if self.fail_ids.contains(&label) {
                return Err(IngestError::Server("boom".into()));
            }
            self.sent.lock().push(label);
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<InMemoryKeyValueStore>,
        ingest: Arc<MockIngest>,
        pending: Arc<PendingScans>,
        metrics: Arc<SyncMetrics>,
    }

    impl Fixture {
        fn new(ingest: MockIngest) -> Self {
            Self {
                store: Arc::new(InMemoryKeyValueStore::new()),
                ingest: Arc::new(ingest),
                pending: Arc::new(PendingScans::new()),
                metrics: Arc::new(SyncMetrics::new()),
            }
        }

        fn worker(&self, probe: Arc<MockProbe>, interval: Duration) -> SyncWorker {
            let queue = Arc::new(OfflineQueue::new(self.store.clone(), self.ingest.clone()));
            SyncWorker::new(
                queue,
                probe,
                self.pending.clone(),
                SyncWorkerConfig { interval, join_timeout: Duration::from_secs(1) },
                self.metrics.clone(),
            )
        }

        async fn seed(&self, ids: &[&str]) {
            let records: Vec<_> = ids.iter().map(|id| ScanRecord::with_id(*id)).collect();
            self.store
                .set(OFFLINE_QUEUE_KEY, &serde_json::to_string(&records).unwrap())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn tick_skips_probe_when_queue_empty() {
        let fixture = Fixture::new(MockIngest::default());
        let probe = MockProbe::reachable();
        let worker = fixture.worker(probe.clone(), Duration::from_secs(60));

        assert!(worker.run_once().await.unwrap().is_none());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tick_drains_when_reachable() {
        let fixture =
            Fixture::new(MockIngest { fail_ids: vec!["b".into()], ..MockIngest::default() });
        fixture.seed(&["a", "b"]).await;
        let worker = fixture.worker(MockProbe::reachable(), Duration::from_secs(60));

        let report = worker.run_once().await.unwrap().expect("pass ran");

        assert_eq!((report.sent, report.failed), (1, 1));
        assert_eq!(fixture.pending.len(), 1);
        assert_eq!(fixture.store.get(OFFLINE_QUEUE_KEY).await.unwrap().as_deref(), Some("[]"));
        assert_eq!(fixture.metrics.snapshot().passes, 1);
    }

    #[tokio::test]
    async fn tick_leaves_queue_when_unreachable() {
        let fixture = Fixture::new(MockIngest::default());
        fixture.seed(&["a"]).await;
        let probe = MockProbe::new(vec![Err(SyncError::Unreachable(IngestError::Network(
            "connection refused".into(),
        )))]);
        let worker = fixture.worker(probe, Duration::from_secs(60));

        let err = worker.run_once().await.unwrap_err();

        assert!(err.should_retry());
        assert!(fixture.ingest.sent.lock().is_empty());
        assert_eq!(fixture.metrics.snapshot().offline_ticks, 1);
    }

    #[tokio::test]
    async fn background_loop_drains_queue() {
        let fixture = Fixture::new(MockIngest::default());
        fixture.seed(&["a", "b", "c"]).await;
        let mut worker = fixture.worker(MockProbe::reachable(), Duration::from_millis(10));

        worker.start().unwrap();
        for _ in 0..100 {
            if fixture.ingest.sent.lock().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        worker.stop().await.unwrap();

        assert_eq!(*fixture.ingest.sent.lock(), ["a", "b", "c"]);
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn lifecycle_errors() {
        let fixture = Fixture::new(MockIngest::default());
        let mut worker = fixture.worker(MockProbe::reachable(), Duration::from_secs(60));

        assert!(matches!(worker.stop().await, Err(SyncError::NotRunning)));
        worker.start().unwrap();
        assert!(matches!(worker.start(), Err(SyncError::AlreadyRunning)));
        worker.stop().await.unwrap();

        worker.start().unwrap();
        assert!(worker.is_running());
        worker.stop().await.unwrap();
    }
}
