// src/cli.rs

use crate::error::{Result, StatsError};
use crate::model::Handle;
use chrono::NaiveDate;
use clap::Parser;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

pub const DEFAULT_REPOS: &[&str] = &[
    "cpprefjp/site",
    "cpprefjp/site_generator",
    "cpprefjp/kunai",
    "cpprefjp/kunai_config",
    "cpprefjp/crsearch",
    "cpprefjp/markdown_to_html",
    "boostjp/site",
];

#[derive(Parser, Debug)]
#[command(author, version, about = "Score contribution ledgers and check every commit is accounted for", long_about = None)]
pub struct Args {
    /// Year whose ledger is reported
    #[arg(long = "year")]
    pub target_year: i32,

    /// Comma separated user ids that never count toward the active total
    #[arg(long, default_value = "")]
    pub exclude_users: String,

    /// Comma separated user ids that receive points (empty: everyone)
    #[arg(long, default_value = "")]
    pub receive_users: String,

    /// Comma separated `user=N` caps
    #[arg(long, default_value = "")]
    pub max_user_points: String,

    /// Comma separated `user=N` bonuses
    #[arg(long, default_value = "")]
    pub additional_user_points: String,

    /// Directory holding the contribution_stats_<year>.md ledgers
    #[arg(long, default_value = "cpprefjp/site/start_editing")]
    pub ledger_dir: PathBuf,

    /// Directory the tracked repositories are checked out under
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,

    /// Comma separated tracked repositories (default: the cpprefjp/boostjp set)
    #[arg(long)]
    pub repos: Option<String>,

    /// Only commits after this date are expected in the ledgers
    #[arg(long, default_value = "2023-01-01")]
    pub after: NaiveDate,

    /// Leave out the rank column
    #[arg(long)]
    pub no_rank: bool,

    /// Score only, without checking repository history
    #[arg(long)]
    pub skip_reconcile: bool,
}

impl Args {
    pub fn tracked_repos(&self) -> Vec<String> {
        match &self.repos {
            Some(list) => split_list(list),
            None => DEFAULT_REPOS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Splits a comma separated option, dropping empty items.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn handle_set(list: &str) -> HashSet<Handle> {
    split_list(list).into_iter().collect()
}

/// Parses `alice=10,bob=20`.
pub fn parse_user_points(list: &str) -> Result<HashMap<Handle, i64>> {
    let mut points = HashMap::new();
    for item in split_list(list) {
        let parsed = item
            .split_once('=')
            .filter(|(handle, _)| !handle.trim().is_empty())
            .and_then(|(handle, value)| value.trim().parse::<i64>().ok().map(|v| (handle.trim(), v)));
        let Some((handle, value)) = parsed else {
            return Err(StatsError::InvalidUserPoints(item.clone()));
        };
        points.insert(handle.to_string(), value);
    }
    Ok(points)
}
