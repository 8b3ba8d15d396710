//! Store configuration.
//!
//! # Responsibility
//! - Describe which backend a store runs on and where it writes.
//! - Build that description from a data root plus the capability probe, or
//!   from environment variables.
//!
//! # Invariants
//! - A config names exactly one backend; it is resolved once at store
//!   construction and never re-checked per operation.
//! - Every location is injected; nothing writes to a hard-coded global path.

use crate::probe::{parse_backend_kind, probe_backend, BackendKind, BackendParseError};
use crate::repo::blob_repo::DEFAULT_COLLECTION_KEY;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Directory under the data root holding record files.
pub const RECORDS_DIR_NAME: &str = "lyrics";
/// SQLite file under the data root backing the blob backend.
pub const KV_DB_FILE_NAME: &str = "lyricbook_kv.sqlite3";
/// Env var naming the data root.
pub const ENV_DATA_DIR: &str = "LYRICBOOK_DATA_DIR";
/// Env var forcing a backend (`blob` | `files`).
pub const ENV_BACKEND: &str = "LYRICBOOK_BACKEND";

/// Where and how records are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Whole collection under `collection_key` in a SQLite key-value file.
    Blob {
        database_path: PathBuf,
        collection_key: String,
    },
    /// One file per record inside `directory`.
    Files { directory: PathBuf },
}

impl StoreConfig {
    /// Blob backend at `database_path` using the default collection key.
    pub fn blob(database_path: impl Into<PathBuf>) -> Self {
        Self::Blob {
            database_path: database_path.into(),
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
        }
    }

    /// File backend storing records directly in `directory`.
    pub fn files(directory: impl Into<PathBuf>) -> Self {
        Self::Files {
            directory: directory.into(),
        }
    }

    /// Lays out `kind` under a data root.
    pub fn for_backend(kind: BackendKind, data_root: impl AsRef<Path>) -> Self {
        let root = data_root.as_ref();
        match kind {
            BackendKind::Blob => Self::blob(root.join(KV_DB_FILE_NAME)),
            BackendKind::Filesystem => Self::files(root.join(RECORDS_DIR_NAME)),
        }
    }

    /// Reads `LYRICBOOK_DATA_DIR` (default: `<tmp>/lyricbook`) and the
    /// optional `LYRICBOOK_BACKEND` override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = non_empty_env(ENV_DATA_DIR);
        let backend = non_empty_env(ENV_BACKEND);
        Self::from_values(data_dir.as_deref(), backend.as_deref())
    }

    /// Builds a config from raw env-style values.
    pub fn from_values(data_dir: Option<&str>, backend: Option<&str>) -> Result<Self, ConfigError> {
        let root = match data_dir.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => PathBuf::from(value),
            None => default_data_root(),
        };
        let kind = match backend {
            Some(value) => parse_backend_kind(value).map_err(ConfigError::Backend)?,
            None => probe_backend(),
        };
        Ok(Self::for_backend(kind, root))
    }

    pub fn backend_kind(&self) -> BackendKind {
        match self {
            Self::Blob { .. } => BackendKind::Blob,
            Self::Files { .. } => BackendKind::Filesystem,
        }
    }
}

/// Default data root when none is configured.
pub fn default_data_root() -> PathBuf {
    std::env::temp_dir().join("lyricbook")
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Backend(BackendParseError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "invalid {ENV_BACKEND}: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
        }
    }
}
