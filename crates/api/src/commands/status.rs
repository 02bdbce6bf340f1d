//! Queue status command

use serde::Serialize;
use tnt_core::DrainState;

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub queued: usize,
    /// Scans parked in the failed slot (only with `sync.persist_failed`)
    pub parked_failed: usize,
    pub drain_state: DrainState,
    pub persist_failed: bool,
    pub health: HealthStatus,
}

pub async fn queue_status(ctx: &AppContext, probe_api: bool) -> anyhow::Result<QueueStatus> {
    Ok(QueueStatus {
        queued: ctx.queue.len().await,
        parked_failed: ctx.queue.failed_len().await,
        drain_state: ctx.queue.state(),
        persist_failed: ctx.queue.options().persist_failed,
        health: ctx.health_check(probe_api).await,
    })
}
