//! Drain and requeue commands

use anyhow::bail;
use serde::Serialize;
use tnt_core::DrainReport;
use tnt_domain::ScanRecord;

use crate::context::AppContext;

#[derive(Debug, Clone, Serialize)]
pub struct DrainOutcome {
    #[serde(flatten)]
    pub report: DrainReport,
    /// Scans the endpoint rejected during this pass, in queue order
    pub failed_scans: Vec<ScanRecord>,
    /// Still queued after the pass (scans appended while it ran)
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequeueOutcome {
    pub moved: usize,
    pub queued: usize,
}

/// Run one drain pass. Failed scans are taken out of the pending list and
/// returned so the caller decides what to do with them.
pub async fn drain_queue(ctx: &AppContext) -> anyhow::Result<DrainOutcome> {
    let report = ctx.queue.drain(ctx.pending.as_ref()).await;
    let failed_scans = ctx.pending.take();

    Ok(DrainOutcome { report, failed_scans, remaining: ctx.queue.len().await })
}

/// Move parked failed scans back onto the queue.
pub async fn requeue_failed(ctx: &AppContext) -> anyhow::Result<RequeueOutcome> {
    if !ctx.config.sync.persist_failed && ctx.queue.failed_len().await == 0 {
        tracing::info!("sync.persist_failed is off; nothing is parked");
    }

    let Some(moved) = ctx.queue.requeue_failed().await else {
        bail!("failed scans could not be requeued; see log for the store error");
    };
    Ok(RequeueOutcome { moved, queued: ctx.queue.len().await })
}
