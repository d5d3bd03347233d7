// src/cli.rs
// =============================================================================
// Command-line interface, built with clap's derive API.
//
// Two subcommands:
// - check: mirror every repository, reconcile, probe, save, report
// - report: rebuild the reports from an existing results file, no network
//
// File name defaults match the names earlier deployments already use, so a
// cron job can run `link-ledger check` from the data directory unchanged.
// =============================================================================

use crate::checker::DEFAULT_WORKERS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-ledger",
    version,
    about = "Track the health of every link in a set of git repositories",
    long_about = "link-ledger mirrors a list of git repositories, finds the URLs in their files, \
                  checks each URL and keeps a running pass/fail history per URL in a JSON file. \
                  It is meant to run periodically, e.g. from cron or CI."
)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG when set)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full check pass and update the results file
    ///
    /// Example: link-ledger check --gits-dir gits --repos repos.json --checks checks.json
    Check {
        /// Directory holding the local working copies
        #[arg(long, default_value = "gits")]
        gits_dir: PathBuf,

        /// Repositories config (JSON)
        #[arg(long, default_value = "url-check-repos.json")]
        repos: PathBuf,

        /// Results file with usage and status history (JSON)
        #[arg(long, default_value = "url-check-checks.json")]
        checks: PathBuf,

        /// Seconds before a single URL check counts as unreachable
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// How many sites are checked at the same time
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Reconcile and report without touching the network for URL checks
        /// and without rewriting the results file
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rebuild the condensed reports from an existing results file
    Report {
        /// Repositories config (JSON)
        #[arg(long, default_value = "url-check-repos.json")]
        repos: PathBuf,

        /// Results file with usage and status history (JSON)
        #[arg(long, default_value = "url-check-checks.json")]
        checks: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write the condensed report (all repositories) to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write one condensed report per repository into this directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Print the condensed report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
