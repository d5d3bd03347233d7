// src/main.rs
// =============================================================================
// Entry point of link-ledger.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr)
// 3. Dispatch to the subcommand handler
// 4. Exit with 0 (all repositories passing), 1 (some failing) or 2 (error)
//
// Fatal errors (bad config, unreadable or malformed results file) are raised
// before the results file is touched; it is only rewritten after a complete
// pass.
// =============================================================================

mod checker;
mod cli;
mod config;
mod context;
mod error;
mod ledger;
mod mirror;
mod pass;
mod reconcile;
mod report;
mod scanner;

use anyhow::{Context as _, Result};
use clap::Parser;
use cli::{Cli, Commands, OutputArgs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checker::{HttpProber, SchedulerOptions};
use config::Config;
use context::Context;
use ledger::{LinkStore, UrlRecord, DRY_RUN_CODE, SUCCESS_CODE, UNREACHABLE_CODE};
use mirror::GitMirror;
use pass::CheckPass;
use report::{condense, CondensedReport, RepoState};
use scanner::LinkScanner;

#[tokio::main]
async fn main() {
    // Parse command line arguments (clap exits on --help / --version / bad args)
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 0 = all passing, 1 = something failing, 2 = we could not do the job

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout stays clean for --json output.
// RUST_LOG, when set, wins over --verbose.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check {
            gits_dir,
            repos,
            checks,
            timeout,
            workers,
            dry_run,
            output,
        } => {
            let options = SchedulerOptions {
                workers,
                timeout: Duration::from_secs(timeout),
                dry_run,
            };
            handle_check(&gits_dir, &repos, &checks, options, &output).await
        }
        Commands::Report {
            repos,
            checks,
            output,
        } => handle_report(&repos, &checks, &output),
    }
}

async fn handle_check(
    gits_dir: &Path,
    repos: &Path,
    checks: &Path,
    options: SchedulerOptions,
    output: &OutputArgs,
) -> Result<i32> {
    // Everything that can be wrong with the inputs fails here, before any
    // repository is touched
    let config = Config::load(repos)?;
    let scanner = LinkScanner::from_config(&config)?;
    let mut store = LinkStore::load(checks)?;
    if store.is_empty() {
        info!(path = %checks.display(), "no previous results, starting fresh");
    }

    // Real network, real git, real clock
    let prober = HttpProber::new().context("cannot build HTTP client")?;
    let ctx = Context::system();
    let pass = CheckPass {
        config: &config,
        scanner: &scanner,
        mirror: Arc::new(GitMirror::new(gits_dir)),
        prober: &prober,
        ctx: &ctx,
        options,
    };

    let (report, _summary) = pass.run(&mut store).await?;

    // Only a complete, real pass may replace the results file
    if options.dry_run {
        info!(path = %checks.display(), "dry run, results file left untouched");
    } else {
        store.save(checks)?;
        info!(path = %checks.display(), urls = store.len(), "results saved");
    }

    emit(&report, output)
}

fn handle_report(repos: &Path, checks: &Path, output: &OutputArgs) -> Result<i32> {
    let config = Config::load(repos)?;
    let store = LinkStore::load(checks)?;
    let report = condense(&store, config.repository_names());
    emit(&report, output)
}

// Writes the requested report files, prints the report and picks the exit code.
fn emit(report: &CondensedReport, output: &OutputArgs) -> Result<i32> {
    if let Some(path) = &output.report {
        report.save(path)?;
    }
    if let Some(dir) = &output.report_dir {
        report.save_per_repository(dir)?;
    }

    print_results(report, output.json)?;

    if report.is_all_passing() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn print_results(report: &CondensedReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

// Human-readable view: failing URLs first, then one line per repository.
fn print_table(report: &CondensedReport) {
    if !report.urls.is_empty() {
        println!("{:<60} {:<18} {:<28}", "URL", "STATUS", "FAILING SINCE");
        println!("{}", "=".repeat(106));

        for (url, record) in &report.urls {
            // Truncate long URLs so the table stays aligned
            let url_display = if url.chars().count() > 57 {
                format!("{}...", url.chars().take(57).collect::<String>())
            } else {
                url.clone()
            };
            let since = record
                .status_history
                .fail_window
                .as_ref()
                .map(|w| w.from.to_string())
                .unwrap_or_default();

            println!("{:<60} {:<18} {:<28}", url_display, format_status(record), since);
        }
        println!();
    }

    let failing = report.failing_repositories().count();
    println!("📊 Summary:");
    for (name, state) in &report.repos {
        let mark = match state {
            RepoState::Passing => "✅ passing",
            RepoState::Failing => "❌ failing",
        };
        println!("   {:<40} {}", name, mark);
    }
    println!("   📋 Repositories: {} ({} failing)", report.repos.len(), failing);
    println!("   🔗 Failing URLs: {}", report.urls.len());
}

fn format_status(record: &UrlRecord) -> String {
    match record.status_history.status {
        Some(SUCCESS_CODE) => "✅ OK".to_string(),
        Some(UNREACHABLE_CODE) => "⚠️  UNREACHABLE".to_string(),
        Some(DRY_RUN_CODE) => "⏭️  NOT CHECKED".to_string(),
        Some(code) => format!("❌ HTTP {}", code),
        None => "⏳ PENDING".to_string(),
    }
}
