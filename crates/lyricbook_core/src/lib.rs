//! Core persistence for LyricBook song records.
//! This crate owns every storage invariant; UI and FFI layers only call the
//! `RecordStore` surface.

pub mod config;
pub mod kv;
pub mod logging;
pub mod model;
pub mod probe;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use kv::{KeyValueStore, KvError, KvResult, MemoryKvStore, SqliteKvStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{key_by_title, RecordMap, SongRecord};
pub use probe::{probe_backend, BackendKind};
pub use repo::blob_repo::{BlobRecordRepository, DEFAULT_COLLECTION_KEY};
pub use repo::file_repo::FileRecordRepository;
pub use repo::record_repo::{RecordRepository, RepoError, RepoResult};
pub use repo::StoreBackend;
pub use service::record_store::{open_record_store, RecordStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
