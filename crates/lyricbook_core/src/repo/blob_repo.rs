//! Blob collection backend.
//!
//! # Responsibility
//! - Keep the whole record collection as one JSON array under one key of a
//!   `KeyValueStore`.
//!
//! # Invariants
//! - An absent key reads as an empty collection.
//! - `save_record` appends without an identity check, so one title may be
//!   stored several times.
//! - Every write replaces the full array (read-modify-write). Two writers
//!   interleaving between read and write lose one update; nothing here
//!   serializes them.
//! - `delete_record` is unsupported.

use crate::kv::KeyValueStore;
use crate::model::record::SongRecord;
use crate::probe::BackendKind;
use crate::repo::record_repo::{RecordRepository, RepoError, RepoResult};
use log::{debug, error};

/// Storage key used when none is configured.
pub const DEFAULT_COLLECTION_KEY: &str = "lyrics";

/// Record repository over a flat key-value substrate.
pub struct BlobRecordRepository<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> BlobRecordRepository<S> {
    /// Creates a repository writing under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Creates a repository writing under `DEFAULT_COLLECTION_KEY`.
    pub fn with_default_key(store: S) -> Self {
        Self::new(store, DEFAULT_COLLECTION_KEY)
    }

    fn read_collection(&self) -> RepoResult<Vec<SongRecord>> {
        let Some(raw) = self.store.get_item(&self.key)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|source| {
            error!(
                "event=collection_read module=repo backend=blob status=error error_code=corrupt_collection bytes={}",
                raw.len()
            );
            RepoError::CorruptCollection {
                key: self.key.clone(),
                source,
            }
        })
    }

    fn write_collection(&self, records: &[SongRecord]) -> RepoResult<()> {
        let raw = serde_json::to_string(records).map_err(RepoError::Encode)?;
        self.store.set_item(&self.key, &raw)?;
        debug!(
            "event=collection_write module=repo backend=blob status=ok count={}",
            records.len()
        );
        Ok(())
    }
}

impl<S: KeyValueStore> RecordRepository for BlobRecordRepository<S> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Blob
    }

    fn save_record(&self, record: &SongRecord) -> RepoResult<()> {
        let mut records = self.read_collection()?;
        records.push(record.clone());
        self.write_collection(&records)
    }

    fn load_records(&self) -> RepoResult<Vec<SongRecord>> {
        let records = self.read_collection()?;
        debug!(
            "event=collection_read module=repo backend=blob status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    /// Collapses every entry stored under `previous_title` into `record`,
    /// placed where the first such entry was. Entries already stored under
    /// the new title are replaced too.
    fn update_record(&self, previous_title: &str, record: &SongRecord) -> RepoResult<()> {
        let records = self.read_collection()?;
        let Some(first) = records
            .iter()
            .position(|existing| existing.title == previous_title)
        else {
            return Err(RepoError::NotFound(previous_title.to_string()));
        };

        let mut updated = Vec::with_capacity(records.len());
        for (index, existing) in records.into_iter().enumerate() {
            if index == first {
                updated.push(record.clone());
            } else if existing.title != previous_title && existing.title != record.title {
                updated.push(existing);
            }
        }
        self.write_collection(&updated)
    }

    fn delete_record(&self, _title: &str) -> RepoResult<()> {
        Err(RepoError::UnsupportedOperation {
            operation: "delete",
            backend: BackendKind::Blob,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BlobRecordRepository, DEFAULT_COLLECTION_KEY};
    use crate::kv::{KeyValueStore, MemoryKvStore};
    use crate::model::record::SongRecord;
    use crate::repo::record_repo::{RecordRepository, RepoError};

    #[test]
    fn stored_value_is_a_json_array_in_insertion_order() {
        let store = MemoryKvStore::new();
        let repo = BlobRecordRepository::with_default_key(store.clone());
        repo.save_record(&SongRecord::new("B", "b", "")).unwrap();
        repo.save_record(&SongRecord::new("A", "a", "")).unwrap();

        let raw = store.get_item(DEFAULT_COLLECTION_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let titles: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn update_collapses_duplicates_in_place() {
        let repo = BlobRecordRepository::new(MemoryKvStore::new(), "songs");
        repo.save_record(&SongRecord::new("A", "x", "")).unwrap();
        repo.save_record(&SongRecord::new("B", "b", "")).unwrap();
        repo.save_record(&SongRecord::new("A", "y", "")).unwrap();

        repo.update_record("A", &SongRecord::new("C", "z", ""))
            .unwrap();

        let loaded = repo.load_records().unwrap();
        assert_eq!(
            loaded,
            vec![SongRecord::new("C", "z", ""), SongRecord::new("B", "b", "")]
        );
    }

    #[test]
    fn update_onto_existing_title_replaces_it() {
        let repo = BlobRecordRepository::with_default_key(MemoryKvStore::new());
        repo.save_record(&SongRecord::new("A", "a", "")).unwrap();
        repo.save_record(&SongRecord::new("B", "b", "")).unwrap();
        repo.save_record(&SongRecord::new("C", "c", "")).unwrap();

        repo.update_record("A", &SongRecord::new("B", "z", ""))
            .unwrap();

        let loaded = repo.load_records().unwrap();
        assert_eq!(
            loaded,
            vec![SongRecord::new("B", "z", ""), SongRecord::new("C", "c", "")]
        );
    }

    #[test]
    fn update_of_missing_title_is_not_found() {
        let repo = BlobRecordRepository::with_default_key(MemoryKvStore::new());
        let err = repo
            .update_record("ghost", &SongRecord::new("ghost", "", ""))
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(title) if title == "ghost"));
    }

    #[test]
    fn keys_isolate_collections() {
        let store = MemoryKvStore::new();
        let first = BlobRecordRepository::new(store.clone(), "one");
        let second = BlobRecordRepository::new(store, "two");
        first.save_record(&SongRecord::new("A", "", "")).unwrap();

        assert_eq!(first.load_records().unwrap().len(), 1);
        assert!(second.load_records().unwrap().is_empty());
    }
}
