// src/main.rs

mod catalog;
mod cli;
mod error;
mod history;
mod model;
mod parser;
mod ranking;
mod reconcile;
mod report;
mod scoring;
mod stats;

use anyhow::Context;
use catalog::PointCatalog;
use clap::Parser;
use cli::Args;
use history::GitHistory;
use scoring::ScoringFilters;
use stats::RunConfig;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("contribution_stats=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    let filters = ScoringFilters {
        include: cli::handle_set(&args.receive_users),
        exclude: cli::handle_set(&args.exclude_users),
        caps: cli::parse_user_points(&args.max_user_points).context("--max-user-points")?,
        bonuses: cli::parse_user_points(&args.additional_user_points).context("--additional-user-points")?,
    };
    let config = RunConfig {
        ledger_dir: args.ledger_dir.clone(),
        target_year: args.target_year,
        filters,
        tracked: args.tracked_repos(),
        repo_root: args.repo_root.clone(),
        after: args.after,
        reconcile: !args.skip_reconcile,
    };

    let catalog = PointCatalog::standard().context("building the point catalog")?;
    tracing::debug!(tags = catalog.len(), "point catalog ready");

    let report = stats::run(&config, &catalog, &GitHistory)
        .with_context(|| format!("contribution stats for {}", args.target_year))?;

    print!("{}", report::render_table(&report.rows, !args.no_rank));
    if let Some(findings) = &report.findings {
        print!("{}", report::render_discrepancies(findings));
    }

    tracing::info!(
        users = report.rows.len(),
        base_sum = report.scoreboard.base_sum,
        active_sum = report.scoreboard.active_sum,
        repos = report.commits.repos().count(),
        "finished in {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}
