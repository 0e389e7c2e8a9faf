// src/ranking.rs

use crate::model::*;

/// Orders users by raw total and assigns standard competition ranks
/// (`[50, 50, 30, 10]` ranks as `[1, 1, 3, 4]`). Ties keep ledger order.
pub fn rank(board: &Scoreboard) -> Vec<RankedRow> {
    let mut users = board.users.clone();
    users.sort_by(|a, b| b.raw.cmp(&a.raw));

    let mut rows: Vec<RankedRow> = Vec::with_capacity(users.len());
    for (position, user) in users.into_iter().enumerate() {
        let rank = match rows.last() {
            Some(prev) if prev.user.raw == user.raw => prev.rank,
            _ => position + 1,
        };
        rows.push(RankedRow { rank, user });
    }
    rows
}
