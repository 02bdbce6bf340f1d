//! Port interfaces for the sync engine

use async_trait::async_trait;
use tnt_domain::{FailedBatch, ScanRecord};

use super::errors::IngestError;

/// Remote endpoint that durably stores one scan per call.
#[async_trait]
pub trait ScanIngest: Send + Sync {
    /// Send a single scan record.
    async fn send_scan(&self, scan: &ScanRecord) -> Result<(), IngestError>;
}

/// Receives the records that failed during a drain pass.
///
/// Called at most once per pass, only when something failed, with the
/// failures in queue order.
pub trait FailureSink: Send + Sync {
    fn extend_pending(&self, failed: FailedBatch);
}

impl<F> FailureSink for F
where
    F: Fn(FailedBatch) + Send + Sync,
{
    fn extend_pending(&self, failed: FailedBatch) {
        self(failed);
    }
}

/// User-facing advisory raised once per pass when records failed.
pub trait DrainNotifier: Send + Sync {
    fn notify_failures(&self, failed: usize);
}
