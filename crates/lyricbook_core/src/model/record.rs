//! Song record domain model.
//!
//! # Responsibility
//! - Define the persisted record (`title`, `lyrics`, `tabs`, `timestamp`).
//! - Own the JSON encoding used by both the blob and the file backend.
//!
//! # Invariants
//! - `title` is the primary key and, on the file backend, the file stem.
//! - `timestamp` is carried through untouched; core never assigns it.
//! - Missing `lyrics`/`tabs` decode as empty text; a missing `title` does not
//!   decode at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller-facing projection of stored records keyed by title.
pub type RecordMap = BTreeMap<String, SongRecord>;

/// One persisted unit of song text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    /// Primary key. Non-emptiness is the caller's responsibility.
    pub title: String,
    /// Free-form lyrics text, may be empty.
    #[serde(default)]
    pub lyrics: String,
    /// Free-form tablature text, may be empty.
    #[serde(default)]
    pub tabs: String,
    /// Optional caller-owned timestamp (JSON number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl SongRecord {
    /// Creates a record without a timestamp.
    pub fn new(
        title: impl Into<String>,
        lyrics: impl Into<String>,
        tabs: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            lyrics: lyrics.into(),
            tabs: tabs.into(),
            timestamp: None,
        }
    }

    /// Returns the same record carrying `timestamp`.
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Keys records by title, later entries replacing earlier ones.
///
/// The blob backend may hold several entries with one title; the last
/// stored entry is the one callers see.
pub fn key_by_title(records: impl IntoIterator<Item = SongRecord>) -> RecordMap {
    let mut map = RecordMap::new();
    for record in records {
        map.insert(record.title.clone(), record);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::{key_by_title, SongRecord};

    #[test]
    fn timestamp_is_omitted_when_absent() {
        let json = serde_json::to_string(&SongRecord::new("A", "la", "e|--")).unwrap();
        assert_eq!(json, r#"{"title":"A","lyrics":"la","tabs":"e|--"}"#);
    }

    #[test]
    fn timestamp_passes_through_as_number() {
        let record = SongRecord::new("A", "", "").with_timestamp(1_700_000_000_000.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp"], serde_json::json!(1_700_000_000_000.0));

        let decoded: SongRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn missing_bodies_decode_as_empty_text() {
        let decoded: SongRecord = serde_json::from_str(r#"{"title":"Only"}"#).unwrap();
        assert_eq!(decoded, SongRecord::new("Only", "", ""));
    }

    #[test]
    fn missing_title_is_rejected() {
        let result = serde_json::from_str::<SongRecord>(r#"{"lyrics":"x","tabs":""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn key_by_title_keeps_last_duplicate() {
        let map = key_by_title(vec![
            SongRecord::new("A", "x", ""),
            SongRecord::new("B", "b", ""),
            SongRecord::new("A", "y", ""),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["A"].lyrics, "y");
    }
}
