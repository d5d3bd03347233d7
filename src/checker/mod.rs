// src/checker/mod.rs
// =============================================================================
// Everything about actually checking links.
//
// Submodules:
// - partition: groups URLs by (approximate) site
// - scheduler: runs the probes, one sequential worker per site
// - http: the real HEAD-request prober
// =============================================================================

mod http;
mod partition;
mod scheduler;

pub use http::HttpProber;
pub use partition::partition;
pub use scheduler::{
    apply_outcomes, CheckScheduler, CheckTally, Prober, SchedulerOptions, DEFAULT_WORKERS,
};

#[cfg(test)]
pub use scheduler::testing;
