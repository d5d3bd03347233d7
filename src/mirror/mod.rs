// src/mirror/mod.rs
// =============================================================================
// Local copies of the tracked repositories.
//
// The rest of the program only needs two things from a mirror: bring the copy
// of a repository up to date and say which files it tracks, and tell where
// that copy lives on disk so the scanner can read the files.
// =============================================================================

mod git;

pub use git::GitMirror;

use crate::error::Result;
use std::path::PathBuf;

pub trait Mirror: Send + Sync {
    /// Updates the local copy of `name` to the latest `branch` of `url` and
    /// returns the paths of all files tracked there.
    fn sync(&self, name: &str, url: &str, branch: &str) -> Result<Vec<String>>;

    /// Directory holding the working copy of `name`.
    fn workdir(&self, name: &str) -> PathBuf;
}
