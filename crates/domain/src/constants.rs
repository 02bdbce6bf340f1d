//! Application constants
//!
//! Centralized location for domain-level constants shared by the mobile
//! queue, the sync engine, and the ingest client.

// Local store keys
pub const OFFLINE_QUEUE_KEY: &str = "offlineData";
pub const FAILED_SCANS_KEY: &str = "failedScans";

// Ingest endpoint
pub const SCAN_INGEST_PATH: &str = "/scan";
pub const HEALTH_PATH: &str = "/health";
pub const API_KEY_HEADER: &str = "X-API-Key";

// Advisory shown once per drain pass when any record could not be sent
pub const OFFLINE_FAILURE_TITLE: &str = "Error sending offline data";
pub const OFFLINE_FAILURE_MESSAGE: &str =
    "Offline data will be sent when connection is restored";

// Geofencing
pub const DEFAULT_GEOFENCE_RADIUS_METERS: f64 = 1_000.0;
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;
