// src/model.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// A user's handle as written in a section heading, without the leading `@`.
pub type Handle = String;

/// One ledger file, identified by its path and the year embedded in its name.
#[derive(Debug, Clone)]
pub struct LedgerDocument {
    pub path: PathBuf,
    pub year: i32,
}

/// Repository plus the commit ids one link in a row refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReference {
    pub repo: String,
    pub ids: Vec<String>,
}

/// A `tag` or `tag:quantity` item from the points column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointEntry {
    pub tag: String,
    pub quantity: i64,
}

/// A single `| [...] | ... |` line of a user section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionRow {
    pub commits: Vec<CommitReference>,
    pub points: Vec<PointEntry>,
}

/// Raw point total of one user within one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub handle: Handle,
    pub raw: i64,
}

/// Commit ids referenced by the ledgers, keyed by repository name.
/// Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitIndex {
    repos: BTreeMap<String, BTreeSet<String>>,
}

impl CommitIndex {
    pub fn insert<I>(&mut self, repo: &str, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.repos.entry(repo.to_string()).or_default().extend(ids);
    }

    pub fn merge(&mut self, other: CommitIndex) {
        for (repo, ids) in other.repos {
            self.insert(&repo, ids);
        }
    }

    pub fn get(&self, repo: &str) -> Option<&BTreeSet<String>> {
        self.repos.get(repo)
    }

    pub fn repos(&self) -> impl Iterator<Item = &str> {
        self.repos.keys().map(String::as_str)
    }

    pub fn commit_count(&self) -> usize {
        self.repos.values().map(BTreeSet::len).sum()
    }
}

/// Output of parsing one ledger document
#[derive(Debug, Clone, Default)]
pub struct ParsedLedger {
    /// In order of first appearance
    pub users: Vec<UserRecord>,
    pub commits: CommitIndex,
}

/// Per-user outcome of scoring
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredUser {
    pub handle: Handle,
    pub raw: i64,
    pub adjusted: i64,
    pub active: bool,
    pub base_rate: f64,
    pub active_rate: f64,
}

/// The complete results of scoring one document
#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    pub base_sum: i64,
    pub active_sum: i64,
    pub users: Vec<ScoredUser>,
}

/// A scored user with its competition rank
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub rank: usize,
    pub user: ScoredUser,
}

/// Commits found in a repository's history that no ledger accounts for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDiscrepancy {
    pub repo: String,
    pub unaccounted: BTreeSet<String>,
}
