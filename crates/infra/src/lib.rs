//! # TnT Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Local persistent store (SQLite via an r2d2 pool, plus an in-memory store)
//! - HTTP client with retry, and the scan-ingest API adapter
//! - Background sync worker and its metrics
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `tnt-core`
//! - Contains all "impure" code (I/O, network)

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;
pub mod sync;

// Re-export commonly used items
pub use api::{ScanApiClient, ScanApiConfig};
pub use database::{DbManager, InMemoryKeyValueStore, SqliteKeyValueStore};
pub use errors::InfraError;
pub use http::HttpClient;
pub use observability::SyncMetrics;
pub use sync::{SyncError, SyncWorker, SyncWorkerConfig};
