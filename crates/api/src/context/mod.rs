//! Application context - dependency injection container

use std::sync::Arc;

use tnt_core::{OfflineQueue, PendingScans, QueueOptions};
use tnt_domain::{Config, Result, TntError};
use tnt_infra::{
    DbManager, ScanApiClient, ScanApiConfig, SqliteKeyValueStore, SyncMetrics, SyncWorker,
    SyncWorkerConfig,
};
use tracing::{info, instrument};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub api: Arc<ScanApiClient>,
    pub queue: Arc<OfflineQueue>,
    /// Scans the last drain could not send; in memory only
    pub pending: Arc<PendingScans>,
    pub metrics: Arc<SyncMetrics>,
}

impl AppContext {
    /// Open the local store and build the queue over it.
    ///
    /// # Errors
    /// Returns `TntError::Database` if the store cannot be opened and
    /// `TntError::Config` if the API client settings are unusable.
    #[instrument(skip(config), fields(db_path = %config.database.path))]
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        let store = Arc::new(SqliteKeyValueStore::new(Arc::clone(&db)));

        let api = Arc::new(
            ScanApiClient::new(ScanApiConfig::from(&config.api))
                .map_err(|e| TntError::Config(e.to_string()))?,
        );

        let options =
            QueueOptions { persist_failed: config.sync.persist_failed, ..QueueOptions::default() };
        let queue = Arc::new(OfflineQueue::new(store, api.clone()).with_options(options));

        info!(api = %api.config().base_url, "application context ready");

        Ok(Self {
            config,
            db,
            api,
            queue,
            pending: Arc::new(PendingScans::new()),
            metrics: Arc::new(SyncMetrics::new()),
        })
    }

    /// Background worker draining this context's queue into its pending
    /// list.
    pub fn sync_worker(&self) -> SyncWorker {
        SyncWorker::new(
            Arc::clone(&self.queue),
            self.api.clone(),
            self.pending.clone(),
            SyncWorkerConfig::from(&self.config.sync),
            Arc::clone(&self.metrics),
        )
    }

    /// Check the local store and, if `probe_api` is set, the scan API.
    pub async fn health_check(&self, probe_api: bool) -> HealthStatus {
        let mut status = HealthStatus::new().add_component(self.check_database_health().await);

        if probe_api {
            let api = match self.api.health_check().await {
                Ok(true) => ComponentHealth::healthy("scan_api"),
                Ok(false) => ComponentHealth::unhealthy("scan_api", "health endpoint not ok"),
                Err(e) => ComponentHealth::unhealthy("scan_api", e.to_string()),
            };
            status = status.add_component(api);
        }

        status.calculate_score();
        status
    }

    async fn check_database_health(&self) -> ComponentHealth {
        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => ComponentHealth::unhealthy("database", e.to_string()),
            Err(e) => ComponentHealth::unhealthy("database", format!("health check panicked: {e}")),
        }
    }
}
