//! SQLite-backed implementation of the key-value store port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tnt_core::{KeyValueStore, StoreError};
use tnt_domain::{Result as DomainResult, TntError};
use tokio::task;
use tracing::info;

use super::manager::{map_sql_error, DbManager, SqliteConnection};
use crate::errors::InfraError;

const GET_SQL: &str = "SELECT value FROM kv_store WHERE key = ?1";
const UPSERT_SQL: &str = "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";
const DELETE_SQL: &str = "DELETE FROM kv_store WHERE key = ?1";

/// Durable key-value store in the `kv_store` table.
///
/// Each call runs on the blocking pool with its own pooled connection.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    db: Arc<DbManager>,
}

impl SqliteKeyValueStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> DomainResult<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT key FROM kv_store ORDER BY key").map_err(map_sql_error)?;
            let rows = stmt.query_map([], |row| row.get(0)).map_err(map_sql_error)?;
            rows.collect::<Result<Vec<String>, _>>().map_err(map_sql_error)
        })
        .await
    }

    async fn with_connection<T, F>(&self, f: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteConnection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            f(&conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let owned = key.to_string();
        self.with_connection(move |conn| {
            conn.query_row(GET_SQL, params![owned], |row| row.get(0))
                .optional()
                .map_err(map_sql_error)
        })
        .await
        .map_err(|err| StoreError::read(key, err))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let (owned, value) = (key.to_string(), value.to_string());
        self.with_connection(move |conn| {
            conn.execute(UPSERT_SQL, params![owned, value, Utc::now().timestamp_millis()])
                .map(|_| ())
                .map_err(map_sql_error)
        })
        .await
        .map_err(|err| StoreError::write(key, err))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let owned = key.to_string();
        self.with_connection(move |conn| {
            conn.execute(DELETE_SQL, params![owned]).map_err(map_sql_error)
        })
        .await
        .map_err(|err| StoreError::remove(key, err))?;

        info!("Removed {key}.");
        Ok(())
    }
}

fn map_join_error(err: task::JoinError) -> TntError {
    TntError::from(InfraError::from(err))
}
