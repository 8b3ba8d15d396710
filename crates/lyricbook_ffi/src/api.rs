//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the record store's save/load/update/delete to Dart via FRB.
//! - Flatten core errors into stable response envelopes.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Store operations are not `frb(sync)`: FRB runs them on its worker
//!   pool and Dart awaits a `Future`, so the UI isolate never blocks on I/O.
//! - Each call opens the configured store, runs one operation and drops it;
//!   nothing is cached between calls.

use lyricbook_core::{
    core_version as core_version_inner, default_log_level, init_logging as init_logging_inner,
    open_record_store, ping as ping_inner, RecordStore, RepoError, RepoResult, SongRecord,
    StoreBackend, StoreConfig,
};
use std::sync::OnceLock;

static STORE_CONFIG: OnceLock<Result<StoreConfig, String>> = OnceLock::new();

/// Resolved store config, or `(error_code, message)`.
type ConfigResult<'a> = Result<&'a StoreConfig, (&'static str, String)>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive); blank
///   selects `debug` in debug builds and `info` in release builds.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may create the log directory.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = match level.trim() {
        "" => default_log_level(),
        level => level,
    };
    match init_logging_inner(level, log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Reports the configured backend (`blob` | `files`).
///
/// Returns an empty string when the configuration is invalid.
#[flutter_rust_bridge::frb(sync)]
pub fn active_backend() -> String {
    match resolve_store_config() {
        Ok(config) => config.backend_kind().as_str().to_string(),
        Err(_) => String::new(),
    }
}

/// One song as seen by Dart.
#[derive(Debug, Clone, PartialEq)]
pub struct SongItem {
    pub title: String,
    pub lyrics: String,
    pub tabs: String,
    pub timestamp: Option<f64>,
}

/// Envelope for mutation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongActionResponse {
    pub ok: bool,
    /// Stable error code (`not_found`, `unsupported_operation`, ...) on failure.
    pub error_code: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl SongActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            message: message.into(),
        }
    }
}

/// Envelope for the full-load call.
#[derive(Debug, Clone, PartialEq)]
pub struct SongListResponse {
    /// Songs sorted by title, one per title.
    pub items: Vec<SongItem>,
    pub ok: bool,
    pub error_code: Option<String>,
    pub message: String,
}

/// Creates a song, or appends/overwrites per the active backend.
///
/// # FFI contract
/// - Async on the Dart side.
/// - Rejects a blank title before touching storage.
pub fn save_song(title: String, lyrics: String, tabs: String) -> SongActionResponse {
    save_song_with(resolve_store_config(), title, lyrics, tabs)
}

/// Loads every song, keyed and sorted by title.
pub fn load_songs() -> SongListResponse {
    load_songs_with(resolve_store_config())
}

/// Replaces the song stored as `previous_title`; renames when `title` differs.
///
/// The stored timestamp is carried over unchanged.
pub fn update_song(
    previous_title: String,
    title: String,
    lyrics: String,
    tabs: String,
) -> SongActionResponse {
    update_song_with(resolve_store_config(), previous_title, title, lyrics, tabs)
}

/// Deletes one song. Fails with `unsupported_operation` on the blob backend.
pub fn delete_song(title: String) -> SongActionResponse {
    delete_song_with(resolve_store_config(), title)
}

fn save_song_with(
    config: ConfigResult<'_>,
    title: String,
    lyrics: String,
    tabs: String,
) -> SongActionResponse {
    let title = title.trim().to_string();
    if title.is_empty() {
        return SongActionResponse::failure("invalid_title", "Please enter a song title.");
    }
    let record = SongRecord::new(title, lyrics, tabs);
    run_action(config, "save_song", "Song saved.", |store| store.save(&record))
}

fn load_songs_with(config: ConfigResult<'_>) -> SongListResponse {
    let loaded = config.and_then(|config| {
        open_record_store(config)
            .and_then(|mut store| store.load())
            .map_err(|err| describe("load_songs", &err))
    });

    match loaded {
        Ok(records) => {
            let items = records.into_values().map(to_song_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No songs saved.".to_string()
            } else {
                format!("Loaded {} song(s).", items.len())
            };
            SongListResponse {
                items,
                ok: true,
                error_code: None,
                message,
            }
        }
        Err((code, message)) => SongListResponse {
            items: Vec::new(),
            ok: false,
            error_code: Some(code.to_string()),
            message,
        },
    }
}

fn update_song_with(
    config: ConfigResult<'_>,
    previous_title: String,
    title: String,
    lyrics: String,
    tabs: String,
) -> SongActionResponse {
    let title = title.trim().to_string();
    if title.is_empty() {
        return SongActionResponse::failure("invalid_title", "Please enter a song title.");
    }
    let record = SongRecord::new(title, lyrics, tabs);
    run_action(config, "update_song", "Song updated.", |store| {
        let timestamp = store
            .load()?
            .get(previous_title.as_str())
            .and_then(|stored| stored.timestamp);
        let record = match timestamp {
            Some(timestamp) => record.with_timestamp(timestamp),
            None => record,
        };
        store.update(previous_title.as_str(), &record)
    })
}

fn delete_song_with(config: ConfigResult<'_>, title: String) -> SongActionResponse {
    run_action(config, "delete_song", "Song deleted.", |store| {
        store.delete(title.as_str())
    })
}

fn run_action(
    config: ConfigResult<'_>,
    operation: &str,
    success_message: &str,
    f: impl FnOnce(&mut RecordStore<StoreBackend>) -> RepoResult<()>,
) -> SongActionResponse {
    let config = match config {
        Ok(config) => config,
        Err((code, message)) => return SongActionResponse::failure(code, message),
    };
    let result = open_record_store(config).and_then(|mut store| f(&mut store));
    match result {
        Ok(()) => SongActionResponse::success(success_message),
        Err(err) => {
            let (code, message) = describe(operation, &err);
            SongActionResponse::failure(code, message)
        }
    }
}

fn describe(operation: &str, err: &RepoError) -> (&'static str, String) {
    (err.code(), format!("{operation} failed: {err}"))
}

fn resolve_store_config() -> ConfigResult<'static> {
    STORE_CONFIG
        .get_or_init(|| StoreConfig::from_env().map_err(|err| err.to_string()))
        .as_ref()
        .map_err(|message| ("config", message.clone()))
}

fn to_song_item(record: SongRecord) -> SongItem {
    SongItem {
        title: record.title,
        lyrics: record.lyrics,
        tabs: record.tabs,
        timestamp: record.timestamp,
    }
}
