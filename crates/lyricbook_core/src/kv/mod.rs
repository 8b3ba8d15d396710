//! Flat key-value storage substrate.
//!
//! # Responsibility
//! - Define the string-keyed get/set/remove contract the blob backend needs.
//! - Provide a SQLite-backed store for native hosts and an in-memory store.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings; the substrate never inspects them.
//! - `get_item` on an absent key is `Ok(None)`, never an error.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
pub mod migrations;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type KvResult<T> = Result<T, KvError>;

/// Key-value substrate failure.
#[derive(Debug)]
pub enum KvError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "key-value schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// String-keyed storage with whole-value reads and writes.
pub trait KeyValueStore {
    /// Reads the value stored under `key`.
    fn get_item(&self, key: &str) -> KvResult<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> KvResult<()>;
    /// Removes `key`; absent keys are ignored.
    fn remove_item(&self, key: &str) -> KvResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_item(&self, key: &str) -> KvResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> KvResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> KvResult<()> {
        (**self).remove_item(key)
    }
}
