//! SQLite-backed [`KvStore`].

use rusqlite::{Connection, OptionalExtension};

use crate::kv::{prefix_end, KvStore, WriteBatch};
use crate::{migrations, DbError, Result};

/// Key-value store on a single `kv` table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Configure pragmas and migrate an already opened connection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Height of the last committed block, if any.
    pub fn last_height(&self) -> Result<Option<u64>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'last_height'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|h| {
                u64::try_from(h)
                    .map_err(|_| DbError::CorruptMeta(format!("negative last_height {h}")))
            })
            .transpose()
    }

    /// Record the height of the last committed block.
    pub fn set_last_height(&self, height: u64) -> Result<()> {
        let value = i64::try_from(height)
            .map_err(|_| DbError::HeightOutOfRange(height))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('last_height', ?1)",
            [value],
        )?;
        Ok(())
    }
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;",
    )?;
    Ok(())
}

impl KvStore for SqliteStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(DbError::Sqlite)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(Vec<u8>, Vec<u8>)> {
            Ok((row.get(0)?, row.get(1)?))
        };

        // BLOBs compare with memcmp, so key order matches byte order.
        let rows = match prefix_end(prefix) {
            Some(end) => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 ORDER BY key")?;
                let collected = stmt
                    .query_map(rusqlite::params![prefix, end], map_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                collected
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key")?;
                let collected = stmt
                    .query_map([prefix], map_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                collected
            }
        };
        Ok(rows)
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut upsert = tx.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            let mut remove = tx.prepare("DELETE FROM kv WHERE key = ?1")?;
            for (key, value) in &batch {
                match value {
                    Some(v) => {
                        upsert.execute(rusqlite::params![key, v])?;
                    }
                    None => {
                        remove.execute([key])?;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}
