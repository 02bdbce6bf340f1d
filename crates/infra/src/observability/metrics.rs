//! Drain-pass metrics for the sync worker
//!
//! ## Design
//! - **VecDeque ring buffer** of pass durations, bounded at
//!   [`MAX_DURATION_SAMPLES`]
//! - **Poison-safe locking** with explicit match (no `.expect()`)
//! - **MetricsResult returns** so callers decide whether to log

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tnt_core::DrainReport;

use crate::observability::{MetricsError, MetricsResult};

/// Pass durations kept for percentile calculations
pub const MAX_DURATION_SAMPLES: usize = 1000;

/// Counters for drain passes run by the worker.
#[derive(Debug)]
pub struct SyncMetrics {
    passes: AtomicU64,
    attempted: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    persist_failures: AtomicU64,
    /// Ticks skipped because the API was unreachable
    offline_ticks: AtomicU64,
    pass_durations_ms: Mutex<VecDeque<u64>>,
}

/// Point-in-time copy of [`SyncMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncMetricsSnapshot {
    pub passes: u64,
    pub attempted: u64,
    pub sent: u64,
    pub failed: u64,
    pub persist_failures: u64,
    pub offline_ticks: u64,
    pub p50_pass_ms: Option<u64>,
    pub p95_pass_ms: Option<u64>,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            attempted: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            offline_ticks: AtomicU64::new(0),
            pass_durations_ms: Mutex::new(VecDeque::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    /// Record a completed drain pass. No-op passes count toward `passes`
    /// only.
    pub fn record_pass(&self, report: &DrainReport) -> MetricsResult<()> {
        self.passes.fetch_add(1, Ordering::Relaxed);
        if report.is_noop() {
            return Ok(());
        }

        self.attempted.fetch_add(as_u64(report.attempted), Ordering::Relaxed);
        self.sent.fetch_add(as_u64(report.sent), Ordering::Relaxed);
        self.failed.fetch_add(as_u64(report.failed), Ordering::Relaxed);
        self.persist_failures.fetch_add(as_u64(report.persist_failures), Ordering::Relaxed);
        self.record_pass_duration(report.elapsed)
    }

    pub fn record_offline_tick(&self) -> MetricsResult<()> {
        self.offline_ticks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn record_pass_duration(&self, elapsed: Duration) -> MetricsResult<()> {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let mut samples = self.samples();
        samples.push_back(ms);
        if samples.len() > MAX_DURATION_SAMPLES {
            samples.pop_front();
        }
        Ok(())
    }

    /// Median pass duration in milliseconds.
    pub fn p50_pass_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.50, "P50")
    }

    /// 95th percentile pass duration in milliseconds.
    pub fn p95_pass_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.95, "P95")
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        SyncMetricsSnapshot {
            passes: self.passes.load(Ordering::Relaxed),
            attempted: self.attempted.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            offline_ticks: self.offline_ticks.load(Ordering::Relaxed),
            p50_pass_ms: self.p50_pass_ms().ok(),
            p95_pass_ms: self.p95_pass_ms().ok(),
        }
    }

    fn percentile(&self, percentile: f64, metric: &'static str) -> MetricsResult<u64> {
        let mut sorted: Vec<u64> = self.samples().iter().copied().collect();
        if sorted.is_empty() {
            return Err(MetricsError::EmptyData { metric });
        }
        sorted.sort_unstable();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let index = ((sorted.len() as f64 * percentile) as usize).min(sorted.len() - 1);
        Ok(sorted[index])
    }

    fn samples(&self) -> MutexGuard<'_, VecDeque<u64>> {
        match self.pass_durations_ms.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(
                    metric = "SyncMetrics::pass_durations_ms",
                    "Mutex poisoned, recovering data"
                );
                poison_err.into_inner()
            }
        }
    }
}

fn as_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(attempted: usize, failed: usize, elapsed_ms: u64) -> DrainReport {
        DrainReport {
            attempted,
            sent: attempted - failed,
            failed,
            persist_failures: 0,
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    #[test]
    fn passes_accumulate_counts() {
        let metrics = SyncMetrics::new();
        metrics.record_pass(&report(3, 1, 40)).unwrap();
        metrics.record_pass(&report(2, 0, 20)).unwrap();
        metrics.record_pass(&DrainReport::default()).unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.passes, 3);
        assert_eq!(snapshot.attempted, 5);
        assert_eq!(snapshot.sent, 4);
        assert_eq!(snapshot.failed, 1);
    }

    #[test]
    fn percentiles_require_samples() {
        let metrics = SyncMetrics::new();
        assert!(matches!(metrics.p50_pass_ms(), Err(MetricsError::EmptyData { metric: "P50" })));
        assert_eq!(metrics.snapshot().p95_pass_ms, None);
    }

    #[test]
    fn percentiles_over_recorded_passes() {
        let metrics = SyncMetrics::new();
        for ms in 1..=100 {
            metrics.record_pass(&report(1, 0, ms)).unwrap();
        }

        assert_eq!(metrics.p50_pass_ms().unwrap(), 51);
        assert_eq!(metrics.p95_pass_ms().unwrap(), 96);
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let metrics = SyncMetrics::new();
        for _ in 0..MAX_DURATION_SAMPLES {
            metrics.record_pass(&report(1, 0, 1_000)).unwrap();
        }
        for _ in 0..MAX_DURATION_SAMPLES {
            metrics.record_pass(&report(1, 0, 5)).unwrap();
        }

        assert_eq!(metrics.samples().len(), MAX_DURATION_SAMPLES);
        assert_eq!(metrics.p95_pass_ms().unwrap(), 5);
    }

    #[test]
    fn offline_ticks_are_counted() {
        let metrics = SyncMetrics::new();
        metrics.record_offline_tick().unwrap();
        assert_eq!(metrics.snapshot().offline_ticks, 1);
    }
}
