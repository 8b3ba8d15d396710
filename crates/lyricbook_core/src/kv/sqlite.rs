//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections and apply the `kv_items`
//!   schema before first use.
//! - Map get/set/remove onto single-row statements.
//!
//! # Invariants
//! - A returned store always has migrations fully applied.
//! - `set_item` is a single upsert statement, so a value is either fully
//!   replaced or untouched.

use super::migrations::apply_migrations;
use super::{KeyValueStore, KvError, KvResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};

/// Key-value store persisted in one SQLite table.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Opens (or creates) a database file and applies pending migrations.
    ///
    /// # Side effects
    /// - Emits `kv_open` events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Self::bootstrap("file", || Connection::open(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> KvResult<Self> {
        Self::bootstrap("memory", Connection::open_in_memory)
    }

    fn bootstrap(
        mode: &'static str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> KvResult<Self> {
        let started_at = Instant::now();
        info!("event=kv_open module=kv status=start mode={mode}");

        let result = connect()
            .map_err(KvError::from)
            .and_then(|mut conn| -> KvResult<Connection> {
                conn.busy_timeout(Duration::from_secs(5))?;
                apply_migrations(&mut conn)?;
                Ok(conn)
            });

        match result {
            Ok(conn) => {
                info!(
                    "event=kv_open module=kv status=ok mode={} duration_ms={}",
                    mode,
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn })
            }
            Err(err) => {
                error!(
                    "event=kv_open module=kv status=error mode={} duration_ms={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get_item(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_items WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> KvResult<()> {
        self.conn.execute(
            "INSERT INTO kv_items (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_items WHERE key = ?1;", [key])?;
        Ok(())
    }
}
