// src/stats.rs

use crate::catalog::PointCatalog;
use crate::error::{Result, StatsError};
use crate::history::HistorySource;
use crate::model::*;
use crate::parser;
use crate::ranking::rank;
use crate::reconcile::{check_repositories, reconcile};
use crate::scoring::{score, ScoringFilters};
use chrono::NaiveDate;
use indicatif::ProgressBar;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const LEDGER_PREFIX: &str = "contribution_stats_";
const LEDGER_SUFFIX: &str = ".md";

/// Everything one run needs besides the ledgers themselves.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub ledger_dir: PathBuf,
    pub target_year: i32,
    pub filters: ScoringFilters,
    pub tracked: Vec<String>,
    pub repo_root: PathBuf,
    pub after: NaiveDate,
    pub reconcile: bool,
}

/// What a run produces: the target year's ranking and, unless skipped, the reconciliation findings.
#[derive(Debug)]
pub struct RunReport {
    pub rows: Vec<RankedRow>,
    pub scoreboard: Scoreboard,
    pub commits: CommitIndex,
    pub findings: Option<Vec<RepoDiscrepancy>>,
}

/// `contribution_stats_2024.md` -> `Some(2024)`
pub fn ledger_year(file_name: &str) -> Option<i32> {
    let digits = file_name.strip_prefix(LEDGER_PREFIX)?.strip_suffix(LEDGER_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Ledger files in `dir`, ordered by file name.
pub fn discover_ledgers(dir: &Path) -> Result<Vec<LedgerDocument>> {
    let io_err = |source| StatsError::Io { path: dir.to_path_buf(), source };

    let mut documents = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match ledger_year(name) {
            Some(year) if path.is_file() => documents.push(LedgerDocument { path, year }),
            Some(_) => warn!(path = %path.display(), "ledger name on a non-file, skipping"),
            None => {}
        }
    }
    documents.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(documents)
}

/// Parses every ledger, scoring only the target year and merging all commit references.
pub fn run(config: &RunConfig, catalog: &PointCatalog, history: &dyn HistorySource) -> Result<RunReport> {
    let documents = discover_ledgers(&config.ledger_dir)?;
    info!(dir = %config.ledger_dir.display(), ledgers = documents.len(), "discovered ledgers");

    let mut commits = CommitIndex::default();
    let mut target = None;
    for document in &documents {
        let text = fs::read_to_string(&document.path)
            .map_err(|source| StatsError::Io { path: document.path.clone(), source })?;
        let name = document.path.display().to_string();
        let ledger = parser::parse(&text, &name, catalog)?;
        info!(
            ledger = %name,
            year = document.year,
            users = ledger.users.len(),
            commits = ledger.commits.commit_count(),
            "parsed ledger"
        );

        if document.year == config.target_year {
            target = Some(score(&ledger.users, &config.filters));
        }
        commits.merge(ledger.commits);
    }

    let scoreboard = target.ok_or(StatsError::TargetYearMissing(config.target_year))?;
    let rows = rank(&scoreboard);

    check_repositories(&commits, &config.tracked)?;
    let findings = if config.reconcile {
        let histories = fetch_histories(history, &config.repo_root, &config.tracked, config.after)?;
        Some(reconcile(&commits, &histories, &config.tracked)?)
    } else {
        None
    };

    Ok(RunReport { rows, scoreboard, commits, findings })
}

/// Queries each tracked repository once, in order. The first failure aborts.
pub fn fetch_histories(
    history: &dyn HistorySource,
    repo_root: &Path,
    tracked: &[String],
    after: NaiveDate,
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let bar = ProgressBar::new(tracked.len() as u64);
    bar.set_message("Reading repository history");

    let mut histories = BTreeMap::new();
    for repo in tracked {
        let path = repo_root.join(repo);
        let ids = history.commit_ids(repo, &path, after)?;
        info!(repo = %repo, commits = ids.len(), "history queried");
        histories.insert(repo.clone(), ids);
        bar.inc(1);
    }
    bar.finish_and_clear();
    Ok(histories)
}
