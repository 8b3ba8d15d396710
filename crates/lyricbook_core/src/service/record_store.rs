//! Record store facade.
//!
//! # Responsibility
//! - Expose save/load/update/delete with one signature regardless of the
//!   backend chosen at construction.
//! - Key loaded records by title for callers.
//! - Keep a caller-visible snapshot of the last load.
//!
//! # Invariants
//! - The facade validates nothing; title rules belong to callers and, for
//!   file names, to the file backend.
//! - After a successful mutation the snapshot is reloaded from storage.
//! - Duplicate titles collapse last-wins in every projection.
//! - No locking or queueing: callers finish one call before the next.

use crate::config::StoreConfig;
use crate::kv::SqliteKvStore;
use crate::model::record::{key_by_title, RecordMap, SongRecord};
use crate::probe::BackendKind;
use crate::repo::blob_repo::BlobRecordRepository;
use crate::repo::file_repo::FileRecordRepository;
use crate::repo::record_repo::{RecordRepository, RepoError, RepoResult};
use crate::repo::StoreBackend;
use log::{error, info};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Age after which a leftover record temp file counts as abandoned.
pub const STALE_TEMP_FILE_AGE: Duration = Duration::from_secs(60 * 60);

/// Backend-agnostic record store.
pub struct RecordStore<R: RecordRepository> {
    repo: R,
    snapshot: RecordMap,
}

impl<R: RecordRepository> RecordStore<R> {
    /// Wraps a repository. The snapshot starts empty until the first load.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            snapshot: RecordMap::new(),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.repo.backend_kind()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Records as of the last successful `load` or mutation.
    pub fn snapshot(&self) -> &RecordMap {
        &self.snapshot
    }

    /// Persists `record` and refreshes the snapshot.
    ///
    /// Appends on the blob backend, overwrites by title on the file backend.
    /// An error from the refresh is returned even though the record itself
    /// was written.
    pub fn save(&mut self, record: &SongRecord) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.save_record(record);
        self.finish_mutation("record_save", started_at, result)
    }

    /// Re-reads storage and returns every record keyed by title.
    pub fn load(&mut self) -> RepoResult<RecordMap> {
        let started_at = Instant::now();
        let result = self.repo.load_records().map(key_by_title);
        log_outcome("record_load", self.backend_kind(), started_at, &result);
        let records = result?;
        self.snapshot = records.clone();
        Ok(records)
    }

    /// Replaces the record stored as `previous_title` with `record`.
    ///
    /// # Errors
    /// - `NotFound` when nothing is stored under `previous_title`.
    pub fn update(&mut self, previous_title: &str, record: &SongRecord) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.update_record(previous_title, record);
        self.finish_mutation("record_update", started_at, result)
    }

    /// Removes the record stored as `title`.
    ///
    /// # Errors
    /// - `UnsupportedOperation` on the blob backend.
    pub fn delete(&mut self, title: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete_record(title);
        self.finish_mutation("record_delete", started_at, result)
    }

    fn finish_mutation(
        &mut self,
        event: &'static str,
        started_at: Instant,
        result: RepoResult<()>,
    ) -> RepoResult<()> {
        log_outcome(event, self.backend_kind(), started_at, &result);
        result?;
        self.load().map(|_| ())
    }
}

/// Opens the store described by `config`.
///
/// The blob backend's database file is opened (and its parent directory
/// created) here. The file backend only sweeps temp files older than
/// `STALE_TEMP_FILE_AGE` from an existing directory; it creates nothing
/// until first use.
pub fn open_record_store(config: &StoreConfig) -> RepoResult<RecordStore<StoreBackend>> {
    let backend = match config {
        StoreConfig::Blob {
            database_path,
            collection_key,
        } => {
            ensure_parent_dir(database_path)?;
            let kv = SqliteKvStore::open(database_path)?;
            StoreBackend::Blob(BlobRecordRepository::new(kv, collection_key.as_str()))
        }
        StoreConfig::Files { directory } => {
            let repo = FileRecordRepository::new(directory.as_path());
            repo.sweep_stale_temp_files(STALE_TEMP_FILE_AGE)?;
            StoreBackend::Files(repo)
        }
    };
    info!(
        "event=store_open module=store status=ok backend={}",
        backend.backend_kind()
    );
    Ok(RecordStore::new(backend))
}

fn ensure_parent_dir(path: &Path) -> RepoResult<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|source| RepoError::DirectoryUnavailable {
        path: parent.to_path_buf(),
        source,
    })
}

fn log_outcome<T>(
    event: &'static str,
    backend: BackendKind,
    started_at: Instant,
    result: &RepoResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event={} module=store status=ok backend={} duration_ms={}",
            event, backend, duration_ms
        ),
        Err(err) => error!(
            "event={} module=store status=error backend={} duration_ms={} error_code={} error={}",
            event,
            backend,
            duration_ms,
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{open_record_store, RecordStore};
    use crate::config::StoreConfig;
    use crate::kv::MemoryKvStore;
    use crate::model::record::SongRecord;
    use crate::probe::BackendKind;
    use crate::repo::blob_repo::BlobRecordRepository;
    use crate::repo::record_repo::RepoError;

    #[test]
    fn snapshot_follows_mutations() {
        let mut store = RecordStore::new(BlobRecordRepository::with_default_key(
            MemoryKvStore::new(),
        ));
        assert!(store.snapshot().is_empty());

        store.save(&SongRecord::new("A", "x", "")).unwrap();
        assert_eq!(store.snapshot()["A"].lyrics, "x");

        store
            .update("A", &SongRecord::new("A", "y", ""))
            .unwrap();
        assert_eq!(store.snapshot()["A"].lyrics, "y");
    }

    #[test]
    fn failed_delete_keeps_snapshot() {
        let mut store = RecordStore::new(BlobRecordRepository::with_default_key(
            MemoryKvStore::new(),
        ));
        store.save(&SongRecord::new("A", "x", "")).unwrap();

        let err = store.delete("A").unwrap_err();
        assert!(matches!(
            err,
            RepoError::UnsupportedOperation {
                operation: "delete",
                backend: BackendKind::Blob
            }
        ));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn open_blob_store_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::blob(dir.path().join("nested").join("kv.sqlite3"));

        let mut store = open_record_store(&config).unwrap();
        assert_eq!(store.backend_kind(), BackendKind::Blob);
        assert!(store.load().unwrap().is_empty());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn open_file_store_keeps_fresh_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let in_flight = dir.path().join(".lyricbook.1.0.tmp");
        std::fs::write(&in_flight, b"partial").unwrap();

        let mut store = open_record_store(&StoreConfig::files(dir.path())).unwrap();
        assert!(in_flight.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn open_file_store_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let records_dir = dir.path().join("lyrics");
        let mut store = open_record_store(&StoreConfig::files(&records_dir)).unwrap();
        assert!(!records_dir.exists());

        assert!(store.load().unwrap().is_empty());
        assert!(records_dir.is_dir());
    }
}
