//! Background synchronization
//!
//! `SyncWorker` drains the offline queue whenever the scan API is reachable.
//! Join handles are tracked, cancellation is explicit, and a pass in
//! progress always runs to completion.

mod errors;
pub mod worker;

pub use errors::SyncError;
pub use worker::{ConnectivityProbe, SyncWorker, SyncWorkerConfig};
