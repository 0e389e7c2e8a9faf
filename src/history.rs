// src/history.rs

use crate::error::{Result, StatsError};
use chrono::NaiveDate;
use git2::{Repository, Sort};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Supplies the authoritative set of commit ids for a repository.
pub trait HistorySource {
    /// Non-merge commits committed strictly after `after`.
    ///
    /// The cutoff is midnight UTC at the start of `after`, not local time, so a commit made
    /// late on the previous local day can fall on either side depending on the timezone.
    fn commit_ids(&self, repo: &str, repo_path: &Path, after: NaiveDate) -> Result<BTreeSet<String>>;
}

/// Reads history straight from the repository's object database.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitHistory;

impl HistorySource for GitHistory {
    fn commit_ids(&self, repo: &str, repo_path: &Path, after: NaiveDate) -> Result<BTreeSet<String>> {
        let failure = |source: git2::Error| StatsError::HistoryQueryFailure { repo: repo.to_string(), source };
        let cutoff = after.and_hms_opt(0, 0, 0).map_or(0, |t| t.and_utc().timestamp());

        let repository = Repository::open(repo_path).map_err(failure)?;
        let mut revwalk = repository.revwalk().map_err(failure)?;
        revwalk.push_head().map_err(failure)?;
        revwalk.set_sorting(Sort::TIME).map_err(failure)?;

        let mut ids = BTreeSet::new();
        for oid in revwalk {
            let oid = oid.map_err(failure)?;
            let commit = repository.find_commit(oid).map_err(failure)?;
            if commit.parent_count() > 1 || commit.time().seconds() <= cutoff {
                continue;
            }
            ids.insert(oid.to_string());
        }

        debug!(repo, path = %repo_path.display(), commits = ids.len(), "history loaded");
        Ok(ids)
    }
}
