//! Record repository contract and shared error type.
//!
//! # Responsibility
//! - Define the backend-neutral save/load/update/delete contract.
//! - Carry typed failures from every backend up to the caller unchanged.
//!
//! # Invariants
//! - Corrupt stored content is an error, never an empty or partial result.
//! - Operations a backend cannot honor fail with `UnsupportedOperation`
//!   instead of silently doing nothing.

use crate::kv::KvError;
use crate::model::record::SongRecord;
use crate::probe::BackendKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by both storage backends.
#[derive(Debug)]
pub enum RepoError {
    /// Record directory could not be created or is not a directory.
    DirectoryUnavailable { path: PathBuf, source: io::Error },
    /// Stored collection blob failed to deserialize.
    CorruptCollection {
        key: String,
        source: serde_json::Error,
    },
    /// One record file failed to deserialize.
    CorruptRecordFile {
        file_name: String,
        source: serde_json::Error,
    },
    UnsupportedOperation {
        operation: &'static str,
        backend: BackendKind,
    },
    /// Title cannot be used as a file stem.
    InvalidTitle(String),
    /// `update` addressed a title that is not stored.
    NotFound(String),
    Io(io::Error),
    KeyValue(KvError),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryUnavailable { path, source } => write!(
                f,
                "record directory `{}` is unavailable: {source}",
                path.display()
            ),
            Self::CorruptCollection { key, source } => {
                write!(f, "stored collection under key `{key}` is corrupt: {source}")
            }
            Self::CorruptRecordFile { file_name, source } => {
                write!(f, "record file `{file_name}` is corrupt: {source}")
            }
            Self::UnsupportedOperation { operation, backend } => {
                write!(f, "operation `{operation}` is not supported by the {backend} backend")
            }
            Self::InvalidTitle(title) => {
                write!(f, "title `{title}` cannot be used as a record file name")
            }
            Self::NotFound(title) => write!(f, "record not found: `{title}`"),
            Self::Io(err) => write!(f, "{err}"),
            Self::KeyValue(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode record: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DirectoryUnavailable { source, .. } => Some(source),
            Self::CorruptCollection { source, .. } => Some(source),
            Self::CorruptRecordFile { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            Self::KeyValue(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::UnsupportedOperation { .. } | Self::InvalidTitle(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<io::Error> for RepoError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<KvError> for RepoError {
    fn from(value: KvError) -> Self {
        Self::KeyValue(value)
    }
}

impl RepoError {
    /// Whether the error reports unreadable stored content.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::CorruptCollection { .. } | Self::CorruptRecordFile { .. }
        )
    }

    /// Stable short code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable { .. } => "directory_unavailable",
            Self::CorruptCollection { .. } => "corrupt_collection",
            Self::CorruptRecordFile { .. } => "corrupt_record_file",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::InvalidTitle(_) => "invalid_title",
            Self::NotFound(_) => "not_found",
            Self::Io(_) => "io",
            Self::KeyValue(_) => "key_value",
            Self::Encode(_) => "encode",
        }
    }
}

/// Storage backend for song records.
pub trait RecordRepository {
    /// Substrate family this repository writes to.
    fn backend_kind(&self) -> BackendKind;
    /// Persists one record (append or overwrite, per backend).
    fn save_record(&self, record: &SongRecord) -> RepoResult<()>;
    /// Reads every stored record from durable storage.
    fn load_records(&self) -> RepoResult<Vec<SongRecord>>;
    /// Replaces the record stored under `previous_title` with `record`.
    fn update_record(&self, previous_title: &str, record: &SongRecord) -> RepoResult<()>;
    /// Removes the record stored under `title`.
    fn delete_record(&self, title: &str) -> RepoResult<()>;
}
