#![allow(dead_code)]

use tempfile::TempDir;
use tnt_app::cli::CaptureArgs;
use tnt_app::AppContext;
use tnt_domain::{ApiConfig, Config, DatabaseConfig, SyncConfig};

/// App context over a temporary database, pointed at `api_url`.
pub struct TestContext {
    pub ctx: AppContext,
    _temp_dir: TempDir,
}

pub fn setup_test_context(api_url: &str, persist_failed: bool) -> TestContext {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let db_path = temp_dir.path().join("tnt.db");

    let config = Config {
        database: DatabaseConfig { path: db_path.to_string_lossy().to_string(), pool_size: 2 },
        api: ApiConfig {
            base_url: api_url.to_string(),
            api_key: Some("test-key".into()),
            timeout_seconds: 2,
            max_attempts: 1,
        },
        sync: SyncConfig { interval_seconds: 1, enabled: true, persist_failed },
        ..Config::default()
    };

    let ctx = AppContext::new(config).expect("failed to build app context");
    TestContext { ctx, _temp_dir: temp_dir }
}

pub fn capture_args(box_id: &str, lat: f64, lon: f64) -> CaptureArgs {
    CaptureArgs {
        box_id: box_id.to_string(),
        lat,
        lon,
        accuracy: None,
        operator: None,
        comment: None,
        school_lat: None,
        school_lon: None,
        received: false,
    }
}
