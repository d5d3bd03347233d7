// src/report.rs
// =============================================================================
// Condensed pass/fail reports derived from the URL store.
//
// The condensed report has two parts:
// - repos: every tracked repository -> "passing" or "failing"
// - urls: every URL whose latest status is not 200, with its full record
//
// A repository fails as soon as one URL it currently uses is not 200.
// Per-repository reports are just the global report filtered down to the
// URLs that repository uses, so the two views can never disagree.
// =============================================================================

use crate::config::is_plain_name;
use crate::error::{LedgerError, Result};
use crate::ledger::{write_json_atomically, LinkStore, UrlRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoState {
    Passing,
    Failing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondensedReport {
    pub repos: BTreeMap<String, RepoState>,
    pub urls: BTreeMap<String, UrlRecord>,
}

impl CondensedReport {
    /// The slice of this report that concerns `repo` alone.
    pub fn for_repository(&self, repo: &str) -> CondensedReport {
        let urls: BTreeMap<String, UrlRecord> = self
            .urls
            .iter()
            .filter(|(_, record)| record.usage.references(repo))
            .map(|(url, record)| (url.clone(), record.clone()))
            .collect();

        let state = if urls.is_empty() {
            RepoState::Passing
        } else {
            RepoState::Failing
        };

        CondensedReport {
            repos: BTreeMap::from([(repo.to_string(), state)]),
            urls,
        }
    }

    pub fn failing_repositories(&self) -> impl Iterator<Item = &str> {
        self.repos
            .iter()
            .filter(|(_, state)| **state == RepoState::Failing)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_all_passing(&self) -> bool {
        self.failing_repositories().next().is_none()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomically(path, self)
    }

    /// Writes one `<name>.json` per repository into `dir`.
    ///
    /// Nothing is written if any repository name is not a plain file name.
    pub fn save_per_repository(&self, dir: &Path) -> Result<()> {
        // check every name up front so a bad one cannot leave half the files
        if let Some(name) = self.repos.keys().find(|name| !is_plain_name(name)) {
            return Err(LedgerError::UnsafeName { name: name.clone() });
        }

        std::fs::create_dir_all(dir).map_err(|e| LedgerError::io(dir, e))?;
        for repo in self.repos.keys() {
            self.for_repository(repo)
                .save(&dir.join(format!("{}.json", repo)))?;
        }
        Ok(())
    }
}

/// Builds the condensed report for `repos` from `store`.
pub fn condense<'a, I>(store: &LinkStore, repos: I) -> CondensedReport
where
    I: IntoIterator<Item = &'a str>,
{
    // every URL not currently at 200, including never-checked ones
    let urls: BTreeMap<String, UrlRecord> = store
        .iter()
        .filter(|(_, record)| !record.status_history.is_passing())
        .map(|(url, record)| (url.to_string(), record.clone()))
        .collect();

    let repos = repos
        .into_iter()
        .map(|repo| {
            // one failing URL is enough to fail the repository
            let failing = urls.values().any(|record| record.usage.references(repo));
            let state = if failing {
                RepoState::Failing
            } else {
                RepoState::Passing
            };
            (repo.to_string(), state)
        })
        .collect();

    CondensedReport { repos, urls }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Timestamp;

    fn store() -> LinkStore {
        let mut store = LinkStore::new();
        store.admit("https://ok.test/").usage.add("alpha", "a.md");
        store.admit("https://ok.test/").usage.add("beta", "b.md");
        store.admit("https://broken.test/").usage.add("beta", "b.md");
        store.admit("https://down.test/").usage.add("gamma", "c.md");

        store.record_status("https://ok.test/", 200, Timestamp::new("t1"));
        store.record_status("https://broken.test/", 404, Timestamp::new("t2"));
        store.record_status("https://down.test/", 200, Timestamp::new("t3"));
        store.record_status("https://down.test/", 0, Timestamp::new("t4"));
        store
    }

    #[test]
    fn condenses_failing_urls_and_repos() {
        let report = condense(&store(), ["alpha", "beta", "gamma", "empty"]);

        assert_eq!(report.repos["alpha"], RepoState::Passing);
        assert_eq!(report.repos["beta"], RepoState::Failing);
        assert_eq!(report.repos["gamma"], RepoState::Failing);
        assert_eq!(report.repos["empty"], RepoState::Passing);
        assert_eq!(
            report.urls.keys().collect::<Vec<_>>(),
            vec!["https://broken.test/", "https://down.test/"]
        );
        assert_eq!(report.failing_repositories().collect::<Vec<_>>(), vec!["beta", "gamma"]);
        assert!(!report.is_all_passing());
    }

    #[test]
    fn per_repository_view_is_a_filter() {
        let report = condense(&store(), ["alpha", "beta", "gamma"]);

        let beta = report.for_repository("beta");
        assert_eq!(beta.repos.get("beta"), Some(&RepoState::Failing));
        assert_eq!(beta.urls.keys().collect::<Vec<_>>(), vec!["https://broken.test/"]);
        assert_eq!(beta.urls["https://broken.test/"], report.urls["https://broken.test/"]);

        let alpha = report.for_repository("alpha");
        assert_eq!(alpha.repos.get("alpha"), Some(&RepoState::Passing));
        assert!(alpha.urls.is_empty());
    }

    #[test]
    fn serialises_state_words() {
        let report = condense(&store(), ["alpha", "beta"]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["repos"]["alpha"], "passing");
        assert_eq!(json["repos"]["beta"], "failing");
        assert_eq!(json["urls"]["https://down.test/"]["checks"]["200"], "t3");
        assert_eq!(json["urls"]["https://down.test/"]["checks"]["fail"]["from-code"], 0);
    }

    #[test]
    fn writes_one_file_per_repository() {
        let dir = tempfile::tempdir().unwrap();
        let report = condense(&store(), ["alpha", "beta"]);
        report.save_per_repository(&dir.path().join("repos")).unwrap();

        let text = std::fs::read_to_string(dir.path().join("repos/beta.json")).unwrap();
        let beta: CondensedReport = serde_json::from_str(&text).unwrap();
        assert_eq!(beta, report.for_repository("beta"));
        assert!(dir.path().join("repos/alpha.json").exists());
    }

    #[test]
    fn path_like_repository_names_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("repos");
        let report = condense(&store(), ["alpha", "../escape"]);

        let err = report.save_per_repository(&out).unwrap_err();
        assert!(matches!(err, LedgerError::UnsafeName { ref name } if name == "../escape"));
        assert!(!out.exists());
        assert!(!dir.path().join("escape.json").exists());
    }
}
