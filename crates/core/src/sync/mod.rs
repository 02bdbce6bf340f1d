//! Sync engine: drains the offline queue against the scan-ingest endpoint

pub mod engine;
pub mod errors;
pub mod pending;
pub mod ports;
pub mod state;

pub use engine::{OfflineQueue, QueueOptions};
pub use errors::{IngestError, IngestErrorCategory};
pub use pending::{LogNotifier, PendingScans};
pub use ports::{DrainNotifier, FailureSink, ScanIngest};
pub use state::{DrainReport, DrainState};
