// src/mirror/git.rs
// =============================================================================
// Keeps a local working copy of each tracked repository with git2.
//
// For a repository named `docs` on branch `main`, `sync` does:
// 1. clone into <gits_dir>/docs on first use, otherwise open it
// 2. fetch refs/heads/main into refs/remotes/origin/main
// 3. point the local `main` at the fetched commit, make it HEAD and hard
//    reset the working copy to it
// 4. list every file tracked in that commit
//
// All of this is blocking; callers run it on a blocking thread.
// =============================================================================

use super::Mirror;
use crate::error::{LedgerError, Result};
use git2::build::RepoBuilder;
use git2::{ObjectType, Repository, ResetType, TreeWalkMode, TreeWalkResult};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GitMirror {
    gits_dir: PathBuf,
}

impl GitMirror {
    pub fn new(gits_dir: impl Into<PathBuf>) -> Self {
        GitMirror {
            gits_dir: gits_dir.into(),
        }
    }
}

impl Mirror for GitMirror {
    fn workdir(&self, name: &str) -> PathBuf {
        self.gits_dir.join(name)
    }

    fn sync(&self, name: &str, url: &str, branch: &str) -> Result<Vec<String>> {
        std::fs::create_dir_all(&self.gits_dir).map_err(|e| LedgerError::io(&self.gits_dir, e))?;

        let path = self.workdir(name);
        sync_repository(&path, url, branch).map_err(|source| LedgerError::Mirror {
            name: name.to_string(),
            source,
        })
    }
}

fn open_or_clone(path: &Path, url: &str, branch: &str) -> std::result::Result<Repository, git2::Error> {
    // an existing directory is trusted to be our earlier clone
    if path.exists() {
        debug!(path = %path.display(), "opening existing working copy");
        Repository::open(path)
    } else {
        debug!(%url, path = %path.display(), "cloning");
        RepoBuilder::new().branch(branch).clone(url, path)
    }
}

fn sync_repository(path: &Path, url: &str, branch: &str) -> std::result::Result<Vec<String>, git2::Error> {
    let repo = open_or_clone(path, url, branch)?;

    // force-update the remote-tracking ref, even if upstream was rewritten
    let refspec = format!("+refs/heads/{0}:refs/remotes/origin/{0}", branch);
    repo.find_remote("origin")?.fetch(&[refspec.as_str()], None, None)?;

    // the commit we are going to check out
    let commit = repo
        .find_reference(&format!("refs/remotes/origin/{}", branch))?
        .peel_to_commit()?;

    // set the ref directly: git2's branch() refuses to move the checked-out branch
    let local = format!("refs/heads/{}", branch);
    repo.reference(&local, commit.id(), true, "link-ledger: sync")?;
    repo.set_head(&local)?;
    repo.reset(commit.as_object(), ResetType::Hard, None)?;

    // collect every blob path; `root` is the directory prefix, e.g. "docs/"
    let mut files = Vec::new();
    commit.tree()?.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(ObjectType::Blob) {
            if let Some(name) = entry.name() {
                files.push(format!("{}{}", root, name));
            }
        }
        TreeWalkResult::Ok
    })?;

    Ok(files)
}
