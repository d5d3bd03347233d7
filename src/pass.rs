// src/pass.rs
// =============================================================================
// One full check pass over all tracked repositories.
//
// Order of work:
// 1. mirror each repository and rebuild its usage from the fresh files
//    (a repository whose mirror fails is skipped and keeps its old usage)
// 2. drop URLs nobody references anymore
// 3. group the remaining URLs by site and probe them
// 4. condense the merged store into the pass/fail report
//
// The store is only changed in memory here. Writing it back is left to the
// caller, after the pass returned, so an interrupted run leaves the previous
// results file untouched.
// =============================================================================

use crate::checker::{apply_outcomes, partition, CheckScheduler, CheckTally, Prober, SchedulerOptions};
use crate::config::Config;
use crate::context::Context;
use crate::error::{LedgerError, Result};
use crate::ledger::LinkStore;
use crate::mirror::Mirror;
use crate::reconcile::reconcile;
use crate::report::{condense, CondensedReport};
use crate::scanner::{FileFilter, LinkScanner};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters describing what a pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub repos_synced: usize,
    pub repos_skipped: Vec<String>,
    pub urls_removed: usize,
    pub urls_checked: usize,
    pub tally: CheckTally,
}

pub struct CheckPass<'a> {
    pub config: &'a Config,
    pub scanner: &'a LinkScanner,
    pub mirror: Arc<dyn Mirror>,
    pub prober: &'a dyn Prober,
    pub ctx: &'a Context,
    pub options: SchedulerOptions,
}

impl CheckPass<'_> {
    pub async fn run(&self, store: &mut LinkStore) -> Result<(CondensedReport, PassSummary)> {
        // compile everything up front: a bad pattern must fail before any mutation
        let filters = self
            .config
            .repos
            .iter()
            .map(|(name, repo)| -> Result<(String, FileFilter)> {
                Ok((name.clone(), FileFilter::new(&repo.ignore_files)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let mut summary = PassSummary::default();

        // Step 1: mirror + reconcile, one repository at a time
        for (name, repo) in &self.config.repos {
            info!(repo = %name, url = %repo.url, branch = %repo.branch, "mirroring");
            let files = match self.sync(name, &repo.url, &repo.branch).await {
                Ok(files) => files,
                Err(e) => {
                    warn!(repo = %name, error = %e, "mirror failed, keeping previous usage");
                    summary.repos_skipped.push(name.clone());
                    continue;
                }
            };

            // drop files the repository config says never to scan
            let files: Vec<String> = match filters.get(name.as_str()) {
                Some(filter) => files.into_iter().filter(|f| !filter.is_ignored(f)).collect(),
                None => files,
            };

            // clear this repository's old usage, then rescan every file
            let workdir = self.mirror.workdir(name);
            let usage = reconcile(store, name, &files, |file| self.scanner.scan_file(&workdir, file));
            info!(
                repo = %name,
                files = files.len(),
                files_with_links = usage.files_with_links,
                urls = usage.distinct_urls,
                "reconciled"
            );
            summary.repos_synced += 1;
        }

        // Step 2: forget URLs that no repository uses anymore
        let removed = store.collect_garbage();
        for url in &removed {
            debug!(%url, "no longer referenced, dropped");
        }
        summary.urls_removed = removed.len();

        // Step 3: probe everything that is left, one worker per site
        let groups = partition(store.urls());
        let scheduler = CheckScheduler::new(self.prober, self.ctx, self.options);
        let outcomes = scheduler.run(groups).await;
        summary.urls_checked = outcomes.len();
        summary.tally = apply_outcomes(store, outcomes);

        info!(
            checked = summary.urls_checked,
            passing = summary.tally.passing,
            failing = summary.tally.failing,
            removed = summary.urls_removed,
            skipped = summary.repos_skipped.len(),
            "pass finished"
        );

        // Step 4: roll the store up into the pass/fail report
        let report = condense(store, self.config.repository_names());
        Ok((report, summary))
    }

    // git2 is blocking, so the mirror runs on tokio's blocking pool.
    // spawn_blocking needs 'static data: hence the Arc clone and owned strings.
    async fn sync(&self, name: &str, url: &str, branch: &str) -> Result<Vec<String>> {
        let mirror = Arc::clone(&self.mirror);
        let (name, url, branch) = (name.to_string(), url.to_string(), branch.to_string());
        let task_name = name.clone();

        // outer error: the task panicked or was cancelled; inner: git itself failed
        tokio::task::spawn_blocking(move || mirror.sync(&name, &url, &branch))
            .await
            .map_err(|e| LedgerError::MirrorTask {
                name: task_name,
                reason: e.to_string(),
            })?
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does run() take `&mut LinkStore` instead of loading/saving itself?
//    - the caller decides whether to save (a dry run never does)
//    - tests can hand in a store built in memory and inspect it afterwards
//
// 2. Why `Arc<dyn Mirror>` but `&dyn Prober`?
//    - the mirror moves into a spawn_blocking closure, which must own it
//    - the prober is only borrowed by futures that live inside run()
// -----------------------------------------------------------------------------
