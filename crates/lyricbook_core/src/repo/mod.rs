//! Repository layer: the two storage backends behind one contract.
//!
//! # Responsibility
//! - Define `RecordRepository` and the shared `RepoError`.
//! - Implement the blob collection backend and the per-record file backend.
//! - Offer `StoreBackend`, the closed set of backends a store can run on.
//!
//! # Invariants
//! - Backends return typed errors; none retries or repairs stored content.

pub mod blob_repo;
pub mod file_repo;
pub mod record_repo;

use crate::kv::SqliteKvStore;
use crate::model::record::SongRecord;
use crate::probe::BackendKind;
use blob_repo::BlobRecordRepository;
use file_repo::FileRecordRepository;
use record_repo::{RecordRepository, RepoResult};

/// Backend chosen once from configuration.
pub enum StoreBackend {
    Blob(BlobRecordRepository<SqliteKvStore>),
    Files(FileRecordRepository),
}

impl StoreBackend {
    fn as_repo(&self) -> &dyn RecordRepository {
        match self {
            Self::Blob(repo) => repo as &dyn RecordRepository,
            Self::Files(repo) => repo,
        }
    }
}

impl RecordRepository for StoreBackend {
    fn backend_kind(&self) -> BackendKind {
        self.as_repo().backend_kind()
    }

    fn save_record(&self, record: &SongRecord) -> RepoResult<()> {
        self.as_repo().save_record(record)
    }

    fn load_records(&self) -> RepoResult<Vec<SongRecord>> {
        self.as_repo().load_records()
    }

    fn update_record(&self, previous_title: &str, record: &SongRecord) -> RepoResult<()> {
        self.as_repo().update_record(previous_title, record)
    }

    fn delete_record(&self, title: &str) -> RepoResult<()> {
        self.as_repo().delete_record(title)
    }
}
