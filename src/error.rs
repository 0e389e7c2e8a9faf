// src/error.rs

use std::path::PathBuf;

/// Everything that can abort a stats run. None of these are recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// A heading or row does not have the expected shape.
    #[error("{document}:{line}: malformed ledger line: {reason}")]
    MalformedLedger {
        document: String,
        line: usize,
        reason: String,
    },

    /// Commit ids must carry at least 7 characters.
    #[error("{document}:{line}: {id:?} (len:{len}) commit-id length should be greater than or equal 7")]
    InvalidCommitId {
        document: String,
        line: usize,
        id: String,
        len: usize,
    },

    #[error("{document}:{line}: invalid point tag `{tag}`")]
    InvalidPointTag {
        document: String,
        line: usize,
        tag: String,
    },

    #[error("{document}:{line}: invalid quantity: {entry:?}")]
    InvalidQuantity {
        document: String,
        line: usize,
        entry: String,
    },

    #[error("unknown repo name: {0}")]
    UnknownRepository(String),

    #[error("history query for {repo} failed: {source}")]
    HistoryQueryFailure {
        repo: String,
        #[source]
        source: git2::Error,
    },

    #[error("point tag `{0}` is defined more than once")]
    DuplicatePointTag(String),

    /// A `handle=N` option entry could not be understood.
    #[error("invalid user point entry {0:?}, expected `handle=N`")]
    InvalidUserPoints(String),

    #[error("no ledger found for year {0}")]
    TargetYearMissing(i32),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = StatsError> = std::result::Result<T, E>;
