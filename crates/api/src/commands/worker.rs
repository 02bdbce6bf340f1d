//! Foreground host for the background sync worker

use std::future::Future;

use serde::Serialize;
use tnt_infra::observability::SyncMetricsSnapshot;
use tracing::{info, warn};

use crate::context::AppContext;

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub metrics: SyncMetricsSnapshot,
    /// Scans that failed while the worker ran; dropped on exit
    pub pending: usize,
}

/// Run the sync worker until `shutdown` resolves, then stop it.
///
/// Returns immediately when `sync.enabled` is off.
pub async fn run_worker<F>(ctx: &AppContext, shutdown: F) -> anyhow::Result<RunOutcome>
where
    F: Future<Output = ()>,
{
    if !ctx.config.sync.enabled {
        warn!("sync.enabled is off; not starting the worker");
        return Ok(RunOutcome { metrics: ctx.metrics.snapshot(), pending: ctx.pending.len() });
    }

    let mut worker = ctx.sync_worker();
    worker.start()?;
    info!(interval_secs = ctx.config.sync.interval_seconds, "sync worker running; Ctrl-C to stop");

    shutdown.await;
    worker.stop().await?;

    let pending = ctx.pending.len();
    if pending > 0 {
        warn!(pending, "exiting with unsent scans in memory");
    }
    Ok(RunOutcome { metrics: worker.metrics().snapshot(), pending })
}
