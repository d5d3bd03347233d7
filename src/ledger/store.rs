// src/ledger/store.rs
// =============================================================================
// The URL store: every URL we know about, its usage and its status history.
//
// The store is a plain sorted map keyed by the literal URL string, so the
// results file comes out sorted and diffs cleanly between runs.
//
// Persistence:
// - a missing results file loads as an empty store
// - a malformed results file is an error (we never silently drop history)
// - saving rewrites the whole file through a temp file + rename, so a crash
//   mid-write leaves the previous file intact
// =============================================================================

use super::status::StatusRecord;
use super::usage::Usage;
use crate::context::Timestamp;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    #[serde(rename = "checks", default)]
    pub status_history: StatusRecord,

    #[serde(rename = "used", alias = "usage", default)]
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkStore {
    records: BTreeMap<String, UrlRecord>,
}

impl LinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the results file, or starts empty if there is none yet.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(LedgerError::io(path, e)),
        };

        serde_json::from_str(&text).map_err(|source| LedgerError::MalformedState {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Atomically replaces `path` with the current contents.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomically(path, self)
    }

    /// Returns the record for `url`, admitting it with an empty status
    /// history if it is new.
    pub fn admit(&mut self, url: &str) -> &mut UrlRecord {
        self.records.entry(url.to_string()).or_default()
    }

    pub fn get(&self, url: &str) -> Option<&UrlRecord> {
        self.records.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.records.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All known URLs, sorted.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UrlRecord)> {
        self.records.iter().map(|(url, record)| (url.as_str(), record))
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut UrlRecord> {
        self.records.values_mut()
    }

    /// Removes URLs no repository references any more and strips the empty
    /// per-repository markers from the rest. Returns the removed URLs.
    pub fn collect_garbage(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        self.records.retain(|url, record| {
            record.usage.prune_empty();
            let keep = record.usage.is_referenced();
            if !keep {
                removed.push(url.clone());
            }
            keep
        });
        removed
    }

    /// Folds a probe result into the status history of `url`.
    ///
    /// Returns false if the URL is not (or no longer) in the store.
    pub fn record_status(&mut self, url: &str, code: i32, when: Timestamp) -> bool {
        match self.records.get_mut(url) {
            Some(record) => {
                record.status_history.record(code, when);
                true
            }
            None => false,
        }
    }
}

/// Writes `value` as 4-space indented JSON with a trailing newline, via a
/// temporary file in the target directory that is renamed into place.
pub fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| LedgerError::io(path, std::io::Error::other(e)))?;
    bytes.push(b'\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LedgerError::io(dir, e))?;
    tmp.write_all(&bytes).map_err(|e| LedgerError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| LedgerError::io(path, e.error))?;
    Ok(())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why BTreeMap instead of HashMap?
//    - iteration is sorted by URL, so the saved file and the probe order are
//      stable from run to run
//
// 2. Why persist() on a NamedTempFile?
//    - the temp file lives in the target directory, so the final rename stays
//      on one filesystem and replaces the old file in one step
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_store() -> LinkStore {
        let json = r#"{
            "https://example.org/one.html": {
                "checks": { "status": 200, "200": "2023-05-04 08:55:37.504684" },
                "used": { "foo": ["posts/stuff.html"] }
            },
            "https://example.org/obsolete.html": {
                "checks": { "status": 200, "200": "2023-05-04 08:55:37.694390" },
                "used": { "foo": [] }
            },
            "https://example.org/three.html": {
                "checks": { "status": 200, "200": "2023-05-04 08:55:37.846483" },
                "used": { "foo": ["posts/more-stuff.html"], "bar": [] }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn garbage_collection_removes_unreferenced_urls() {
        let mut store = sample_store();
        let removed = store.collect_garbage();

        assert_eq!(removed, vec!["https://example.org/obsolete.html".to_string()]);
        assert!(store.contains("https://example.org/one.html"));
        assert!(store.contains("https://example.org/three.html"));

        let three = store.get("https://example.org/three.html").unwrap();
        assert_eq!(three.usage.repositories().collect::<Vec<_>>(), vec!["foo"]);
    }

    #[test]
    fn admit_creates_unchecked_record_once() {
        let mut store = LinkStore::new();
        store.admit("https://a.example/").usage.add("r", "f");
        store.admit("https://a.example/").usage.add("r", "g");
        assert_eq!(store.len(), 1);
        let record = store.get("https://a.example/").unwrap();
        assert!(!record.status_history.has_been_checked());
        assert_eq!(record.usage.files("r").unwrap().len(), 2);
    }

    #[test]
    fn record_status_ignores_unknown_urls() {
        let mut store = LinkStore::new();
        assert!(!store.record_status("https://gone/", 200, Timestamp::new("t")));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = LinkStore::load(&dir.path().join("checks.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checks.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = LinkStore::load(&path).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedState { .. }));
    }

    #[test]
    fn save_then_load_preserves_contents_and_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checks.json");
        let store = sample_store();

        store.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n    \"https://example.org/obsolete.html\": {"));

        assert_eq!(LinkStore::load(&path).unwrap(), store);
    }

    #[test]
    fn usage_alias_is_accepted() {
        let json = r#"{"https://x.test/": {"checks": {}, "usage": {"r": ["a"]}}}"#;
        let store: LinkStore = serde_json::from_str(json).unwrap();
        assert!(store.get("https://x.test/").unwrap().usage.references("r"));
    }
}
