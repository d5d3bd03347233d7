// src/error.rs
// =============================================================================
// Typed errors for the parts of a pass that are allowed to fail hard.
//
// Only a handful of things abort a run:
// - the results file exists but is not valid JSON in our format
// - the repositories config is missing or malformed
// - a user-supplied regex does not compile
// - a repository name that cannot be used as a file or directory name
// - a file we must write cannot be written
//
// Mirror failures are also typed here, but the pass only logs them and moves
// on to the next repository. Probe failures never become errors at all, they
// are recorded as status code 0.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed results file {path}: {source}")]
    MalformedState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed config {path}: {source}")]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("repository name '{name}' cannot be used as a file name")]
    UnsafeName { name: String },

    #[error("cannot mirror repository '{name}': {source}")]
    Mirror {
        name: String,
        #[source]
        source: git2::Error,
    },

    #[error("mirror task for '{name}' did not finish: {reason}")]
    MirrorTask { name: String, reason: String },
}

impl LedgerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
