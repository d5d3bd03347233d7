// src/checker/scheduler.rs
// =============================================================================
// Runs the liveness probes for a whole pass.
//
// Concurrency model:
// - one worker per domain group, at most `workers` groups in flight
//   (stream::iter + buffer_unordered, the same pattern as a plain link check)
// - inside a group the URLs are probed one after the other, so a site with
//   hundreds of links only ever sees one request at a time from us
// - every probe is capped by the timeout; running over it counts as code 0
//
// Groups own disjoint URL lists, so workers share nothing but the prober and
// the clock. The results are merged into the store afterwards, sorted by URL,
// no matter in which order the workers finished.
// =============================================================================

use crate::context::{Context, Timestamp};
use crate::ledger::{LinkStore, DRY_RUN_CODE, SUCCESS_CODE, UNREACHABLE_CODE};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers "what code does this URL return right now?".
///
/// Implementations must not fail: anything that is not a protocol answer is
/// reported as code 0.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str, timeout: Duration) -> i32;
}

/// The result of probing one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub url: String,
    pub code: i32,
    pub when: Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    pub workers: usize,
    pub timeout: Duration,
    /// Record `DRY_RUN_CODE` instead of calling the prober.
    pub dry_run: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        SchedulerOptions {
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            dry_run: false,
        }
    }
}

pub struct CheckScheduler<'a> {
    prober: &'a dyn Prober,
    ctx: &'a Context,
    options: SchedulerOptions,
}

impl<'a> CheckScheduler<'a> {
    pub fn new(prober: &'a dyn Prober, ctx: &'a Context, options: SchedulerOptions) -> Self {
        CheckScheduler { prober, ctx, options }
    }

    /// Probes every URL of every group and returns the outcomes sorted by URL.
    pub async fn run(&self, groups: BTreeMap<String, Vec<String>>) -> Vec<ProbeOutcome> {
        let workers = self.options.workers.max(1);
        info!(
            groups = groups.len(),
            workers,
            dry_run = self.options.dry_run,
            "starting checks"
        );

        let per_group: Vec<Vec<ProbeOutcome>> = stream::iter(groups)
            .map(|(domain, urls)| self.check_group(domain, urls))
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut outcomes: Vec<ProbeOutcome> = per_group.into_iter().flatten().collect();
        outcomes.sort_by(|a, b| a.url.cmp(&b.url));
        outcomes
    }

    async fn check_group(&self, domain: String, urls: Vec<String>) -> Vec<ProbeOutcome> {
        debug!(%domain, urls = urls.len(), "worker picked up group");
        let mut outcomes = Vec::with_capacity(urls.len());

        for url in urls {
            let code = if self.options.dry_run {
                DRY_RUN_CODE
            } else {
                self.probe_one(&url).await
            };
            let when = self.ctx.now();
            debug!(%url, code, %when, "checked");
            outcomes.push(ProbeOutcome { url, code, when });
        }

        outcomes
    }

    async fn probe_one(&self, url: &str) -> i32 {
        let timeout = self.options.timeout;
        match tokio::time::timeout(timeout, self.prober.probe(url, timeout)).await {
            Ok(code) => code,
            Err(_) => {
                debug!(%url, "probe exceeded timeout");
                UNREACHABLE_CODE
            }
        }
    }
}

/// Tally of a merged check pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckTally {
    pub passing: usize,
    pub failing: usize,
}

/// Writes `outcomes` into the status histories of `store`, in the order
/// given (the scheduler hands them over sorted by URL).
pub fn apply_outcomes(store: &mut LinkStore, outcomes: Vec<ProbeOutcome>) -> CheckTally {
    let mut tally = CheckTally::default();
    for outcome in outcomes {
        let code = outcome.code;
        if store.record_status(&outcome.url, code, outcome.when) {
            if code == SUCCESS_CODE {
                tally.passing += 1;
            } else {
                tally.failing += 1;
            }
        }
    }
    tally
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why buffer_unordered and not tokio::spawn per group?
//    - the group futures borrow the prober and the clock; nothing needs to be
//      'static and no task handles have to be joined
//    - buffer_unordered(N) keeps at most N groups in flight on the current
//      task, and network waits interleave exactly like spawned tasks would
//
// 2. Why sort after collecting?
//    - groups finish in whatever order the network allows
//    - sorting by URL makes two runs over the same data produce the same
//      sequence of status updates (and the same diff in the results file)
// -----------------------------------------------------------------------------
