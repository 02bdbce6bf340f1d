//! Sync worker error types

use std::time::Duration;

use thiserror::Error;
use tnt_core::IngestError;

/// Background sync worker failures
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync worker already running")]
    AlreadyRunning,

    #[error("Sync worker not running")]
    NotRunning,

    #[error("Sync worker task panicked: {0}")]
    Panicked(String),

    #[error("Sync worker did not stop within {0:?}")]
    JoinTimeout(Duration),

    #[error("Scan API unreachable: {0}")]
    Unreachable(#[from] IngestError),

    #[error("Scan API unhealthy")]
    Unhealthy,
}

impl SyncError {
    /// Whether the next tick may succeed where this one failed.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Unreachable(err) => err.is_transient(),
            Self::Unhealthy => true,
            Self::AlreadyRunning | Self::NotRunning | Self::Panicked(_) | Self::JoinTimeout(_) => {
                false
            }
        }
    }
}
