// src/ledger/usage.rs
// =============================================================================
// Which repositories and files currently reference a URL.
//
// `Usage` maps a repository name to the files in it that contain the URL.
// An empty file list is meaningful: it marks a repository that referenced the
// URL on a previous run but has not (yet) on this one. The reconciler sets
// these markers and the garbage collector removes them.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Usage(BTreeMap<String, Vec<String>>);

impl Usage {
    /// Adds `file` under `repo`, once. Insertion order is kept.
    pub fn add(&mut self, repo: &str, file: &str) {
        let files = self.0.entry(repo.to_string()).or_default();
        if !files.iter().any(|known| known == file) {
            files.push(file.to_string());
        }
    }

    /// Empties the file list of `repo` if it has one, keeping the key as a
    /// removal candidate.
    pub fn clear_repository(&mut self, repo: &str) {
        if let Some(files) = self.0.get_mut(repo) {
            files.clear();
        }
    }

    /// Drops every repository whose file list is empty.
    pub fn prune_empty(&mut self) {
        self.0.retain(|_, files| !files.is_empty());
    }

    /// True if at least one repository still has a file referencing the URL.
    pub fn is_referenced(&self) -> bool {
        self.0.values().any(|files| !files.is_empty())
    }

    /// True if `repo` currently references the URL from at least one file.
    pub fn references(&self, repo: &str) -> bool {
        self.0.get(repo).is_some_and(|files| !files.is_empty())
    }

    pub fn files(&self, repo: &str) -> Option<&[String]> {
        self.0.get(repo).map(Vec::as_slice)
    }

    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
