//! Sync observability
//!
//! Counters and pass-duration percentiles for the background sync worker.
//! Locks recover from poisoning instead of panicking; every record method
//! returns `MetricsResult<()>` and callers log rather than propagate.

pub mod metrics;

pub use metrics::{SyncMetrics, SyncMetricsSnapshot};

/// Metrics error type
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "P95", "P50")
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
