//! Port interface for the device-local key-value store

use async_trait::async_trait;
use thiserror::Error;

/// Local store failures, keyed by the storage key involved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("failed to read '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("failed to remove '{key}': {reason}")]
    Remove { key: String, reason: String },
}

impl StoreError {
    pub fn read(key: &str, reason: impl ToString) -> Self {
        Self::Read { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn write(key: &str, reason: impl ToString) -> Self {
        Self::Write { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn remove(key: &str, reason: impl ToString) -> Self {
        Self::Remove { key: key.to_string(), reason: reason.to_string() }
    }
}

/// Durable string map. Implementations must survive process restarts.
///
/// Every call returns an explicit result; deciding whether a failure matters
/// is left to the caller.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
