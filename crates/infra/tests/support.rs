//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use tempfile::TempDir;
use tnt_domain::ScanRecord;
use tnt_infra::{DbManager, ScanApiClient, ScanApiConfig, SqliteKeyValueStore};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness; `RUST_LOG` filters it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Temporary on-disk database that lives as long as the wrapper.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        let manager = Self::open_in(&dir);
        Self { manager, dir }
    }

    /// Open a second manager on the same file, as a restarted process would.
    pub fn reopen(&self) -> Arc<DbManager> {
        Self::open_in(&self.dir)
    }

    pub fn store(&self) -> Arc<SqliteKeyValueStore> {
        Arc::new(SqliteKeyValueStore::new(self.manager.clone()))
    }

    fn open_in(dir: &TempDir) -> Arc<DbManager> {
        let manager =
            DbManager::new(dir.path().join("tnt.db"), 2).expect("db manager should be created");
        Arc::new(manager)
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan API client pointed at `base_url` with fast retries.
pub fn api_client(base_url: &str, api_key: Option<&str>) -> Arc<ScanApiClient> {
    let config = ScanApiConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key: api_key.map(str::to_string),
        timeout: Duration::from_secs(2),
        max_attempts: 2,
        base_backoff: Duration::from_millis(5),
    };
    Arc::new(ScanApiClient::new(config).expect("scan api client"))
}

pub fn scans(ids: &[&str]) -> Vec<ScanRecord> {
    ids.iter().map(|id| ScanRecord::with_id(*id)).collect()
}

pub fn ids(records: &[ScanRecord]) -> Vec<String> {
    records.iter().map(|scan| scan.label().to_string()).collect()
}
