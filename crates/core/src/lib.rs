//! # TnT Core
//!
//! Pure queue and sync logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (local key-value store, scan ingest, failure sink)
//! - The offline queue codec
//! - `OfflineQueue`: append path and drain state machine
//!
//! ## Architecture Principles
//! - Only depends on `tnt-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod queue;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use queue::{KeyValueStore, StoreError};
pub use sync::{
    DrainNotifier, DrainReport, DrainState, FailureSink, IngestError, IngestErrorCategory,
    LogNotifier, OfflineQueue, PendingScans, QueueOptions, ScanIngest,
};
