//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when the required ones are present
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise built-in defaults
//!
//! Optional environment variables are overlaid on the file or default
//! config, so `TNT_API_KEY` works next to a checked-in `config.toml`.
//!
//! ## Environment Variables
//! Required for the environment path:
//! - `TNT_DB_PATH`: Database file path
//! - `TNT_API_URL`: Scan API base URL
//!
//! Optional (defaults shown in [`tnt_domain::Config`]):
//! - `TNT_DB_POOL_SIZE`, `TNT_API_KEY`, `TNT_API_TIMEOUT_SECS`,
//!   `TNT_API_MAX_ATTEMPTS`
//! - `TNT_SYNC_INTERVAL`, `TNT_SYNC_ENABLED`, `TNT_SYNC_PERSIST_FAILED`
//! - `TNT_GEOFENCE_RADIUS_METERS`
//! - `TNT_LOG_LEVEL`, `TNT_LOG_JSON`
//!
//! ## File Locations
//! `config.{json,toml}` and `tnt.{json,toml}` in the working directory, its
//! parent, and next to the executable.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tnt_domain::{Config, Result, TntError};

/// Where a loaded [`Config`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Environment,
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str("environment"),
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Defaults => f.write_str("defaults"),
        }
    }
}

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `TntError::Config` if an environment value or a found config
/// file is invalid.
pub fn load() -> Result<Config> {
    load_with_source(None).map(|(config, _)| config)
}

/// Load configuration and report where it came from.
///
/// An explicit `path` skips the environment and probing steps. Optional
/// environment variables are applied on top of file and default configs.
///
/// # Errors
/// Returns `TntError::Config` if an environment value or the config file is
/// invalid.
pub fn load_with_source(path: Option<PathBuf>) -> Result<(Config, ConfigSource)> {
    if path.is_none() && has_required_env() {
        return Ok((load_from_env()?, ConfigSource::Environment));
    }

    let (mut config, source) = match path.or_else(probe_config_paths) {
        Some(path) => (load_from_file(Some(path.clone()))?, ConfigSource::File(path)),
        None => (Config::default(), ConfigSource::Defaults),
    };
    apply_env_overrides(&mut config)?;
    Ok((config, source))
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `TntError::Config` if `TNT_DB_PATH` or `TNT_API_URL` is missing,
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("TNT_DB_PATH")?;
    config.api.base_url = env_var("TNT_API_URL")?;
    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Overlay every set `TNT_*` variable on `config`. Unset variables leave
/// the existing value alone.
///
/// # Errors
/// Returns `TntError::Config` if a set variable has an invalid value.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(path) = env_nonempty("TNT_DB_PATH") {
        config.database.path = path;
    }
    if let Some(url) = env_nonempty("TNT_API_URL") {
        config.api.base_url = url;
    }

    if let Some(pool_size) = env_parse("TNT_DB_POOL_SIZE", "pool size")? {
        config.database.pool_size = pool_size;
    }
    if let Some(key) = env_nonempty("TNT_API_KEY") {
        config.api.api_key = Some(key);
    }
    if let Some(timeout) = env_parse("TNT_API_TIMEOUT_SECS", "API timeout")? {
        config.api.timeout_seconds = timeout;
    }
    if let Some(attempts) = env_parse("TNT_API_MAX_ATTEMPTS", "API max attempts")? {
        config.api.max_attempts = attempts;
    }

    if let Some(interval) = env_parse("TNT_SYNC_INTERVAL", "sync interval")? {
        config.sync.interval_seconds = interval;
    }
    config.sync.enabled = env_bool("TNT_SYNC_ENABLED", config.sync.enabled);
    config.sync.persist_failed = env_bool("TNT_SYNC_PERSIST_FAILED", config.sync.persist_failed);

    if let Some(radius) = env_parse("TNT_GEOFENCE_RADIUS_METERS", "geofence radius")? {
        config.geofence.radius_meters = radius;
    }

    if let Some(level) = env_nonempty("TNT_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("TNT_LOG_JSON", config.logging.json);

    Ok(())
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// supported, detected by file extension; missing sections take defaults.
///
/// # Errors
/// Returns `TntError::Config` if the file is missing, unreadable, or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TntError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TntError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TntError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TntError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TntError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(TntError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "tnt.json", "tnt.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

fn has_required_env() -> bool {
    env_nonempty("TNT_DB_PATH").is_some() && env_nonempty("TNT_API_URL").is_some()
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| TntError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional variable; unset yields `None`, garbage yields an error.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TntError::Config(format!("Invalid {what}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive). Unset yields `default`.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (key, value) in [("TNT_TEST_BOOL_A", "1"), ("TNT_TEST_BOOL_B", "YES"), ("TNT_TEST_BOOL_C", "on")] {
            std::env::set_var(key, value);
            assert!(env_bool(key, false), "{value} should be true");
            std::env::remove_var(key);
        }

        std::env::set_var("TNT_TEST_BOOL_OFF", "off");
        assert!(!env_bool("TNT_TEST_BOOL_OFF", true));
        std::env::remove_var("TNT_TEST_BOOL_OFF");

        assert!(env_bool("TNT_TEST_BOOL_MISSING", true));
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TNT_TEST_NUMBER", "twelve");
        let result = env_parse::<u64>("TNT_TEST_NUMBER", "number");
        std::env::remove_var("TNT_TEST_NUMBER");

        assert!(matches!(result, Err(TntError::Config(msg)) if msg.contains("Invalid number")));
        assert_eq!(env_parse::<u64>("TNT_TEST_NUMBER", "number").unwrap(), None);
    }

    #[test]
    fn test_parse_config_json_partial() {
        let json = r#"{ "api": { "base_url": "https://example.org/api" }, "sync": { "persist_failed": true } }"#;
        let config = parse_config(json, Path::new("tnt.json")).unwrap();

        assert_eq!(config.api.base_url, "https://example.org/api");
        assert!(config.sync.persist_failed);
        assert_eq!(config.sync.interval_seconds, 30);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml = r#"
[database]
path = "scans.db"

[geofence]
radius_meters = 250.0
"#;
        let config = parse_config(toml, Path::new("config.toml")).unwrap();

        assert_eq!(config.database.path, "scans.db");
        assert!((config.geofence.radius_meters - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("a: 1", Path::new("config.yaml"));
        assert!(matches!(result, Err(TntError::Config(_))));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/tnt.json")));
        assert!(matches!(result, Err(TntError::Config(_))));
    }
}
