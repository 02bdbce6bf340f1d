//! Local persistent store
//!
//! `DbManager` owns the SQLite pool; `SqliteKeyValueStore` implements the
//! core `KeyValueStore` port on top of it.

pub mod kv_store;
pub mod manager;
pub mod memory_store;

pub use kv_store::SqliteKeyValueStore;
pub use manager::{DbManager, SqliteConnection};
pub use memory_store::InMemoryKeyValueStore;
