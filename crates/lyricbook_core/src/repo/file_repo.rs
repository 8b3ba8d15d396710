//! Per-record file backend.
//!
//! # Responsibility
//! - Store each record as `<directory>/<title>.json`.
//! - Bootstrap the record directory lazily before every directory access.
//!
//! # Invariants
//! - One file per title: saving an existing title overwrites its file.
//! - `load_records` reads only non-directory entries whose name ends with
//!   `.json`; anything else in the directory is ignored.
//! - A record file that fails to parse fails the whole load.
//! - A record file removed between listing and reading is treated as
//!   deleted, not as an error.
//! - Deleting a missing record succeeds. A title that cannot name a record
//!   file is never stored, so deleting it succeeds too.
//! - Record files are replaced via temp file + rename, so readers see the
//!   old bytes or the new bytes, never a mix. Filesystems without atomic
//!   rename do not get this guarantee.
//! - Temp file names have a fixed length independent of the title.
//! - A crash between temp write and rename leaves a temp file behind;
//!   `sweep_stale_temp_files` removes those once they are old enough.
//! - A rename whose old and new names resolve to the same file (case
//!   folding filesystems) never removes the old name.

use crate::model::record::SongRecord;
use crate::probe::BackendKind;
use crate::repo::record_repo::{RecordRepository, RepoError, RepoResult};
use log::{debug, error, info};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Suffix every record file name carries.
pub const RECORD_FILE_EXTENSION: &str = ".json";

const TEMP_FILE_PREFIX: &str = ".lyricbook.";
const TEMP_FILE_SUFFIX: &str = ".tmp";

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Record repository over a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileRecordRepository {
    dir: PathBuf,
}

impl FileRecordRepository {
    /// Creates a repository rooted at `dir`. Nothing is touched on disk yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Creates the record directory (with parents) when it does not exist.
    ///
    /// # Errors
    /// - `DirectoryUnavailable` when creation fails or the path exists but
    ///   is not a directory.
    pub fn ensure_directory(&self) -> RepoResult<()> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(self.directory_unavailable(io::Error::other(
                "path exists but is not a directory",
            ))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir).map_err(|err| self.directory_unavailable(err))?;
                info!(
                    "event=record_dir_create module=repo backend=files status=ok dir={}",
                    self.dir.display()
                );
                Ok(())
            }
            Err(err) => Err(self.directory_unavailable(err)),
        }
    }

    /// Returns the file path a title maps to.
    pub fn record_path(&self, title: &str) -> RepoResult<PathBuf> {
        validate_title(title)?;
        Ok(self.dir.join(record_file_name(title)))
    }

    fn directory_unavailable(&self, source: io::Error) -> RepoError {
        error!(
            "event=record_dir_create module=repo backend=files status=error dir={} error={}",
            self.dir.display(),
            source
        );
        RepoError::DirectoryUnavailable {
            path: self.dir.clone(),
            source,
        }
    }

    fn write_record(&self, record: &SongRecord) -> RepoResult<()> {
        let path = self.record_path(&record.title)?;
        let bytes = serde_json::to_vec(record).map_err(RepoError::Encode)?;
        let temp_path = self.dir.join(temp_file_name());

        if let Err(err) = write_then_rename(&temp_path, &path, &bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }

    /// Removes temp files left by interrupted writes that are at least
    /// `max_age` old. Returns how many were removed.
    ///
    /// A missing directory has nothing to sweep and is not created.
    pub fn sweep_stale_temp_files(&self, max_age: Duration) -> RepoResult<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let is_temp = entry.file_name().to_str().is_some_and(|name| {
                name.starts_with(TEMP_FILE_PREFIX) && name.ends_with(TEMP_FILE_SUFFIX)
            });
            if !is_temp {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            if !meta.is_file() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < max_age {
                continue;
            }
            remove_if_present(&entry.path())?;
            removed += 1;
        }

        if removed > 0 {
            info!(
                "event=temp_sweep module=repo backend=files status=ok removed={} dir={}",
                removed,
                self.dir.display()
            );
        }
        Ok(removed)
    }
}

impl RecordRepository for FileRecordRepository {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Filesystem
    }

    fn save_record(&self, record: &SongRecord) -> RepoResult<()> {
        validate_title(&record.title)?;
        self.ensure_directory()?;
        self.write_record(record)?;
        debug!("event=record_save module=repo backend=files status=ok");
        Ok(())
    }

    fn load_records(&self) -> RepoResult<Vec<SongRecord>> {
        self.ensure_directory()?;

        let mut candidates = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            // Names that are not UTF-8 can never come from `save_record`.
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !name.ends_with(RECORD_FILE_EXTENSION) {
                continue;
            }
            // Follows symlinks so a linked directory is skipped too.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => continue,
                Ok(_) => candidates.push(name),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            }
        }
        candidates.sort();

        let mut records = Vec::with_capacity(candidates.len());
        for name in candidates {
            let bytes = match fs::read(self.dir.join(&name)) {
                Ok(bytes) => bytes,
                // Removed by another writer after listing.
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            let record = serde_json::from_slice::<SongRecord>(&bytes).map_err(|source| {
                error!(
                    "event=record_read module=repo backend=files status=error error_code=corrupt_record_file file={}",
                    name
                );
                RepoError::CorruptRecordFile {
                    file_name: name.clone(),
                    source,
                }
            })?;
            records.push(record);
        }

        debug!(
            "event=record_load module=repo backend=files status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    /// Writes `record`, then removes the previous file when the title
    /// changed and the two names are distinct files.
    fn update_record(&self, previous_title: &str, record: &SongRecord) -> RepoResult<()> {
        let previous_path = self.record_path(previous_title)?;
        let path = self.record_path(&record.title)?;
        self.ensure_directory()?;

        match fs::metadata(&previous_path) {
            Ok(meta) if !meta.is_dir() => {}
            Ok(_) => return Err(RepoError::NotFound(previous_title.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RepoError::NotFound(previous_title.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        // Case-folding filesystems map both titles onto one file.
        let renamed = record.title != previous_title && !same_file(&previous_path, &path)?;

        self.write_record(record)?;
        if renamed {
            remove_if_present(&previous_path)?;
        }
        debug!("event=record_update module=repo backend=files status=ok");
        Ok(())
    }

    fn delete_record(&self, title: &str) -> RepoResult<()> {
        if validate_title(title).is_err() {
            debug!(
                "event=record_delete module=repo backend=files status=ok reason=unstorable_title"
            );
            return Ok(());
        }
        let path = self.record_path(title)?;
        remove_if_present(&path)?;
        debug!("event=record_delete module=repo backend=files status=ok");
        Ok(())
    }
}

/// Rejects titles that would not stay a single file inside the directory.
pub fn validate_title(title: &str) -> RepoResult<()> {
    let invalid = title.is_empty()
        || title == "."
        || title == ".."
        || title.contains(['/', '\\', '\0']);
    if invalid {
        return Err(RepoError::InvalidTitle(title.to_string()));
    }
    Ok(())
}

fn record_file_name(title: &str) -> String {
    format!("{title}{RECORD_FILE_EXTENSION}")
}

fn temp_file_name() -> String {
    format!(
        "{TEMP_FILE_PREFIX}{}.{}{TEMP_FILE_SUFFIX}",
        std::process::id(),
        TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// Whether both paths exist and resolve to the same file.
#[cfg(unix)]
fn same_file(first: &Path, second: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let (Some(first), Some(second)) = (metadata_if_present(first)?, metadata_if_present(second)?)
    else {
        return Ok(false);
    };
    Ok(first.dev() == second.dev() && first.ino() == second.ino())
}

#[cfg(not(unix))]
fn same_file(first: &Path, second: &Path) -> io::Result<bool> {
    match (fs::canonicalize(first), fs::canonicalize(second)) {
        (Ok(first), Ok(second)) => Ok(first == second),
        (Err(err), _) | (_, Err(err)) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        (Err(err), _) | (_, Err(err)) => Err(err),
    }
}

#[cfg(unix)]
fn metadata_if_present(path: &Path) -> io::Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn write_then_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

fn remove_if_present(path: &Path) -> RepoResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_title, FileRecordRepository, RECORD_FILE_EXTENSION};
    use crate::model::record::SongRecord;
    use crate::repo::record_repo::{RecordRepository, RepoError};
    use std::fs;
    use std::time::Duration;

    #[test]
    fn titles_that_escape_the_directory_are_rejected() {
        for title in ["", ".", "..", "a/b", "..\\up", "nul\0"] {
            assert!(
                matches!(validate_title(title), Err(RepoError::InvalidTitle(_))),
                "{title:?}"
            );
        }
        validate_title("Song 1 (live)").unwrap();
        validate_title(".hidden").unwrap();
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRecordRepository::new(dir.path().join("lyrics"));
        repo.save_record(&SongRecord::new("A", "x", "")).unwrap();
        repo.save_record(&SongRecord::new("A", "y", "")).unwrap();

        let names: Vec<String> = fs::read_dir(repo.directory())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("A{RECORD_FILE_EXTENSION}")]);
    }

    #[test]
    fn ensure_directory_rejects_a_file_in_the_way() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("lyrics");
        fs::write(&blocked, b"not a dir").unwrap();

        let repo = FileRecordRepository::new(&blocked);
        let err = repo.load_records().unwrap_err();
        assert!(matches!(err, RepoError::DirectoryUnavailable { path, .. } if path == blocked));
    }

    #[test]
    fn update_with_new_title_renames_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRecordRepository::new(dir.path());
        repo.save_record(&SongRecord::new("Old", "x", "")).unwrap();

        repo.update_record("Old", &SongRecord::new("New", "y", ""))
            .unwrap();

        assert!(!dir.path().join("Old.json").exists());
        let loaded = repo.load_records().unwrap();
        assert_eq!(loaded, vec![SongRecord::new("New", "y", "")]);
    }

    #[test]
    fn update_of_missing_title_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRecordRepository::new(dir.path());
        let err = repo
            .update_record("ghost", &SongRecord::new("ghost", "", ""))
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(title) if title == "ghost"));
        assert!(repo.load_records().unwrap().is_empty());
    }

    #[test]
    fn long_title_fitting_the_name_limit_saves() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRecordRepository::new(dir.path());
        let title = "x".repeat(249);

        repo.save_record(&SongRecord::new(title.as_str(), "words", ""))
            .unwrap();

        let loaded = repo.load_records().unwrap();
        assert_eq!(loaded, vec![SongRecord::new(title.as_str(), "words", "")]);
    }

    #[test]
    fn delete_of_unstorable_title_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRecordRepository::new(dir.path().join("lyrics"));
        repo.save_record(&SongRecord::new("A", "x", "")).unwrap();

        for title in ["", ".", "..", "../A", "a\\b"] {
            repo.delete_record(title).unwrap();
        }
        assert_eq!(repo.load_records().unwrap().len(), 1);
    }

    #[test]
    fn sweep_removes_only_leftover_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRecordRepository::new(dir.path());
        repo.save_record(&SongRecord::new("A", "x", "")).unwrap();
        fs::write(dir.path().join(".lyricbook.4242.7.tmp"), b"{\"tit").unwrap();
        fs::write(dir.path().join(".keep.tmp"), b"user file").unwrap();

        assert_eq!(repo.sweep_stale_temp_files(Duration::from_secs(3600)).unwrap(), 0);
        assert!(dir.path().join(".lyricbook.4242.7.tmp").exists());

        assert_eq!(repo.sweep_stale_temp_files(Duration::ZERO).unwrap(), 1);
        assert!(!dir.path().join(".lyricbook.4242.7.tmp").exists());
        assert!(dir.path().join(".keep.tmp").exists());
        assert_eq!(repo.load_records().unwrap().len(), 1);
    }

    #[test]
    fn sweep_of_missing_directory_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let records_dir = dir.path().join("lyrics");
        let repo = FileRecordRepository::new(&records_dir);

        assert_eq!(repo.sweep_stale_temp_files(Duration::ZERO).unwrap(), 0);
        assert!(!records_dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn update_keeps_old_name_when_it_aliases_the_new_one() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRecordRepository::new(dir.path());
        repo.save_record(&SongRecord::new("song", "x", "")).unwrap();
        // Two names for one file, as a case-folding filesystem presents them.
        fs::hard_link(dir.path().join("song.json"), dir.path().join("Song.json")).unwrap();

        repo.update_record("song", &SongRecord::new("Song", "y", ""))
            .unwrap();

        assert!(dir.path().join("song.json").exists());
        let stored: SongRecord =
            serde_json::from_slice(&fs::read(dir.path().join("Song.json")).unwrap()).unwrap();
        assert_eq!(stored, SongRecord::new("Song", "y", ""));
    }
}
