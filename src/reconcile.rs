// src/reconcile.rs
// =============================================================================
// Rebuilds the usage index from fresh scan results.
//
// Per repository this is "clear, then repopulate":
// 1. every URL record that lists the repository gets its file list emptied
// 2. every URL found in the repository's current files is (re)added
//
// Only after all repositories of a run went through this does
// `LinkStore::collect_garbage` drop the URLs that nobody references anymore.
// Without the clear step a URL deleted from a file would stay referenced
// forever.
// =============================================================================

use crate::ledger::LinkStore;
use std::collections::BTreeSet;

/// What one repository contributed in a reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoUsage {
    pub files_with_links: usize,
    pub distinct_urls: usize,
}

/// Replaces the usage of `repo` in `store` with what `urls_for` reports for
/// each of `files`.
///
/// `urls_for` is asked once per file, in order, and returns the URLs found in
/// that file.
pub fn reconcile<F>(store: &mut LinkStore, repo: &str, files: &[String], mut urls_for: F) -> RepoUsage
where
    F: FnMut(&str) -> Vec<String>,
{
    // Step 1: clear. The repository keeps an empty entry, GC removes it later
    for record in store.records_mut() {
        record.usage.clear_repository(repo);
    }

    let mut summary = RepoUsage::default();
    let mut seen = BTreeSet::new();

    for file in files {
        let urls = urls_for(file);
        if urls.is_empty() {
            continue;
        }
        summary.files_with_links += 1;

        // Step 2: repopulate; new URLs start with no status history
        for url in urls {
            store.admit(&url).usage.add(repo, file);
            seen.insert(url);
        }
    }

    summary.distinct_urls = seen.len();
    summary
}
