// src/reconcile.rs

use crate::error::{Result, StatsError};
use crate::model::*;
use std::collections::{BTreeMap, BTreeSet};

/// History ids that no ledger id accounts for.
///
/// Ledgers may hold abbreviated ids while history holds full ones (or the other way
/// round), so an id also counts as accounted for when it and some ledger id are
/// prefixes of one another.
pub fn unaccounted_commits(history: &BTreeSet<String>, ledger: &BTreeSet<String>) -> BTreeSet<String> {
    history
        .difference(ledger)
        .filter(|commit| {
            !ledger
                .iter()
                .any(|known| known.starts_with(commit.as_str()) || commit.starts_with(known.as_str()))
        })
        .cloned()
        .collect()
}

/// Fails if the ledgers name a repository outside `tracked`.
pub fn check_repositories(index: &CommitIndex, tracked: &[String]) -> Result<()> {
    match index.repos().find(|repo| !tracked.iter().any(|t| t == repo)) {
        Some(unknown) => Err(StatsError::UnknownRepository(unknown.to_string())),
        None => Ok(()),
    }
}

/// Compares every tracked repository's history against the ledger index.
/// Only repositories with unaccounted commits appear in the result, in tracked order.
pub fn reconcile(
    index: &CommitIndex,
    histories: &BTreeMap<String, BTreeSet<String>>,
    tracked: &[String],
) -> Result<Vec<RepoDiscrepancy>> {
    check_repositories(index, tracked)?;

    let empty = BTreeSet::new();
    let mut findings = Vec::new();
    for repo in tracked {
        let history = histories.get(repo).unwrap_or(&empty);
        let ledger = index.get(repo).unwrap_or(&empty);
        let unaccounted = unaccounted_commits(history, ledger);
        if !unaccounted.is_empty() {
            findings.push(RepoDiscrepancy { repo: repo.clone(), unaccounted });
        }
    }
    Ok(findings)
}
