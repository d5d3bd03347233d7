// src/config.rs
// =============================================================================
// The repositories config document.
//
// Example:
//   {
//     "repos": {
//       "docs": { "url": "https://github.com/org/docs.git", "branch": "main",
//                 "ignore_files": ["^vendor/"] }
//     },
//     "ignore": ["^https://internal\\."],
//     "transforms": [ { "pattern": "\\.$", "replacement": "" } ]
//   }
//
// Older deployments keep a flat map of repositories instead:
//   { "docs": { "url": "https://github.com/org/docs.git", "branch": "main" } }
// A document without a `repos` key is read that way, with no extra ignores
// and no transforms.
//
// Either way at least the repositories must be there. A config naming none
// is rejected before anything is touched, since running with no
// repositories would garbage-collect the whole results file.
// =============================================================================

use crate::error::{LedgerError, Result};
use serde::de::Error as _;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Repository names become directory names under the gits dir and report
/// file names, so they must be a single plain path component.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoConfig {
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Regexes on tracked file paths; matching files are not scanned.
    #[serde(default)]
    pub ignore_files: Vec<String>,
}

/// One rewrite step applied to every extracted URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransformConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub repos: BTreeMap<String, RepoConfig>,
    /// Extra URL ignore regexes, on top of the built-in ones.
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LedgerError::io(path, e))?;
        Self::parse(&text).map_err(|source| LedgerError::MalformedConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let document: serde_json::Value = serde_json::from_str(text)?;

        // the full layout is recognised by its `repos` key
        let config: Config = if document.get("repos").is_some() {
            serde_json::from_value(document)?
        } else {
            // otherwise: the flat name -> repository map
            let repos: BTreeMap<String, RepoConfig> = serde_json::from_value(document)?;
            if repos.is_empty() {
                return Err(serde_json::Error::custom("no repositories configured"));
            }
            Config {
                repos,
                ignore: Vec::new(),
                transforms: Vec::new(),
            }
        };

        if let Some(name) = config.repository_names().find(|name| !is_plain_name(name)) {
            return Err(serde_json::Error::custom(format!(
                "repository name '{}' must be a plain file name",
                name
            )));
        }
        Ok(config)
    }

    pub fn repository_names(&self) -> impl Iterator<Item = &str> {
        self.repos.keys().map(String::as_str)
    }
}
