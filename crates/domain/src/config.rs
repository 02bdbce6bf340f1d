//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GEOFENCE_RADIUS_METERS;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub geofence: GeofenceConfig,
    pub logging: LoggingConfig,
}

/// Local persistent store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Scan-ingest endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://tnt-malawi-api.vercel.app/api`
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    /// Total attempts per request (initial try + transport retries)
    pub max_attempts: usize,
}

/// Background sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_seconds: u64,
    pub enabled: bool,
    /// Mirror failed scans into a second durable slot instead of only
    /// handing them to the in-memory failure sink.
    pub persist_failed: bool,
}

/// Final-destination detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    pub radius_meters: f64,
}

/// Tracing subscriber settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "tnt.db".to_string(), pool_size: 4 }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            api_key: None,
            timeout_seconds: 30,
            max_attempts: 3,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { interval_seconds: 30, enabled: true, persist_failed: false }
    }
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self { radius_meters: DEFAULT_GEOFENCE_RADIUS_METERS }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "api": { "base_url": "https://example.org/api" } }"#)
                .unwrap();

        assert_eq!(config.api.base_url, "https://example.org/api");
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.database.path, "tnt.db");
        assert!(!config.sync.persist_failed);
        assert!((config.geofence.radius_meters - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn api_key_is_never_serialized() {
        let mut config = Config::default();
        config.api.api_key = Some("secret".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
