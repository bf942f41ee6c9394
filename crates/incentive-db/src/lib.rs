//! # incentive-db
//!
//! Key-value persistence for the incentive engine.
//!
//! The engine only needs ordered key-value storage with prefix iteration
//! ([`KvStore`]). Every state transition runs against a [`CacheStore`]
//! that buffers writes and flushes them in one batch on commit, so a
//! failed transition leaves no trace.
//!
//! ## Backends
//!
//! - [`MemStore`] — ordered in-memory map (tests, replay verification)
//! - [`SqliteStore`] — single SQLite table, WAL mode, schema version in
//!   `PRAGMA user_version`

pub mod cache;
pub mod digest;
pub mod kv;
pub mod migrations;
pub mod schema;
pub mod sqlite;

use std::path::Path;

pub use cache::CacheStore;
pub use digest::state_digest;
pub use kv::{get_json, set_json, KvStore, MemStore, WriteBatch};
pub use sqlite::SqliteStore;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("height {0} does not fit the meta table")]
    HeightOutOfRange(u64),

    #[error("corrupt meta entry: {0}")]
    CorruptMeta(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the incentive database at the given path.
///
/// Configures WAL mode and runs any pending migrations.
pub fn open(path: &Path) -> Result<SqliteStore> {
    let conn = rusqlite::Connection::open(path)?;
    SqliteStore::from_connection(conn)
}

/// Open an in-memory SQLite database (for testing).
pub fn open_memory() -> Result<SqliteStore> {
    let conn = rusqlite::Connection::open_in_memory()?;
    SqliteStore::from_connection(conn)
}
