//! Remote TnT API adapters

pub mod scan_client;

pub use scan_client::{ScanApiClient, ScanApiConfig};
