//! Backend capability probe.
//!
//! # Responsibility
//! - Decide once per process whether the host offers a hierarchical
//!   filesystem or only a flat key-value store.
//!
//! # Invariants
//! - `probe_backend()` returns the same value for the whole process lifetime.
//! - An unclassifiable platform never fails: it resolves to
//!   `DEFAULT_BACKEND` and logs a warning.

use log::{info, warn};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend used when the platform cannot be classified.
pub const DEFAULT_BACKEND: BackendKind = BackendKind::Blob;

/// Config string value for the blob backend.
pub const BACKEND_BLOB: &str = "blob";
/// Config string value for the file backend.
pub const BACKEND_FILES: &str = "files";

static PROBED_BACKEND: OnceCell<BackendKind> = OnceCell::new();

/// Storage substrate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Whole collection serialized under one key-value key.
    Blob,
    /// One JSON file per record inside a directory.
    Filesystem,
}

impl BackendKind {
    /// Stable string id used in config and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blob => BACKEND_BLOB,
            Self::Filesystem => BACKEND_FILES,
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one backend id (`blob` | `files`, case-insensitive).
pub fn parse_backend_kind(value: &str) -> Result<BackendKind, BackendParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Err(BackendParseError::Empty),
        BACKEND_BLOB | "kv" => Ok(BackendKind::Blob),
        BACKEND_FILES | "filesystem" | "fs" => Ok(BackendKind::Filesystem),
        other => Err(BackendParseError::Unsupported(other.to_string())),
    }
}

/// Backend id parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendParseError {
    Empty,
    Unsupported(String),
}

impl Display for BackendParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "backend value must not be empty"),
            Self::Unsupported(value) => {
                write!(f, "unsupported backend `{value}`; expected blob|files")
            }
        }
    }
}

impl Error for BackendParseError {}

/// Raw classification of a target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Detected(BackendKind),
    /// Capability could not be determined.
    Indeterminate,
}

impl ProbeOutcome {
    /// Collapses the outcome to a usable backend.
    pub fn resolve(self) -> BackendKind {
        match self {
            Self::Detected(kind) => kind,
            Self::Indeterminate => DEFAULT_BACKEND,
        }
    }
}

/// Classifies a platform from its target `os` and `arch` strings.
///
/// Pure; takes the same values as `std::env::consts::{OS, ARCH}`.
pub fn classify_platform(os: &str, arch: &str) -> ProbeOutcome {
    match (os, arch) {
        // Browser targets: only web storage is reachable.
        ("unknown" | "", "wasm32" | "wasm64") => ProbeOutcome::Detected(BackendKind::Blob),
        (
            "linux" | "android" | "macos" | "ios" | "windows" | "freebsd" | "netbsd" | "openbsd"
            | "dragonfly" | "illumos" | "solaris" | "wasi",
            _,
        ) => ProbeOutcome::Detected(BackendKind::Filesystem),
        _ => ProbeOutcome::Indeterminate,
    }
}

/// Returns the backend for the running process, probing on first call.
pub fn probe_backend() -> BackendKind {
    *PROBED_BACKEND.get_or_init(|| {
        let os = std::env::consts::OS;
        let arch = std::env::consts::ARCH;
        match classify_platform(os, arch) {
            ProbeOutcome::Detected(kind) => {
                info!(
                    "event=backend_probe module=probe status=ok os={} arch={} backend={}",
                    os, arch, kind
                );
                kind
            }
            ProbeOutcome::Indeterminate => {
                warn!(
                    "event=backend_probe module=probe status=indeterminate os={} arch={} backend={}",
                    os, arch, DEFAULT_BACKEND
                );
                DEFAULT_BACKEND
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{
        classify_platform, parse_backend_kind, probe_backend, BackendKind, BackendParseError,
        ProbeOutcome, DEFAULT_BACKEND,
    };

    #[test]
    fn desktop_and_mobile_targets_use_filesystem() {
        for os in ["linux", "macos", "windows", "android", "ios"] {
            assert_eq!(
                classify_platform(os, "x86_64"),
                ProbeOutcome::Detected(BackendKind::Filesystem),
                "{os}"
            );
        }
    }

    #[test]
    fn browser_wasm_uses_blob() {
        assert_eq!(
            classify_platform("unknown", "wasm32"),
            ProbeOutcome::Detected(BackendKind::Blob)
        );
    }

    #[test]
    fn unknown_platform_resolves_to_default() {
        let outcome = classify_platform("plan9", "mips");
        assert_eq!(outcome, ProbeOutcome::Indeterminate);
        assert_eq!(outcome.resolve(), DEFAULT_BACKEND);
    }

    #[test]
    fn probe_is_stable_across_calls() {
        assert_eq!(probe_backend(), probe_backend());
    }

    #[test]
    fn parse_accepts_aliases_and_rejects_unknown() {
        assert_eq!(parse_backend_kind(" Blob "), Ok(BackendKind::Blob));
        assert_eq!(parse_backend_kind("fs"), Ok(BackendKind::Filesystem));
        assert_eq!(parse_backend_kind(""), Err(BackendParseError::Empty));
        assert!(matches!(
            parse_backend_kind("cloud"),
            Err(BackendParseError::Unsupported(value)) if value == "cloud"
        ));
    }
}
