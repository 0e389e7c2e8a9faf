// src/scoring.rs

use crate::model::*;
use std::collections::{HashMap, HashSet};

/// Who counts toward the active total, and per-user point adjustments.
#[derive(Debug, Clone, Default)]
pub struct ScoringFilters {
    /// Empty means everyone not excluded is active
    pub include: HashSet<Handle>,
    pub exclude: HashSet<Handle>,
    pub caps: HashMap<Handle, i64>,
    pub bonuses: HashMap<Handle, i64>,
}

impl ScoringFilters {
    /// Exclusion wins; otherwise a non-empty inclusion list must name the user.
    pub fn is_active(&self, handle: &str) -> bool {
        if self.exclude.contains(handle) {
            return false;
        }
        self.include.is_empty() || self.include.contains(handle)
    }

    /// Bonus is added first; a cap then replaces the result with `min(cap, raw)`,
    /// so a capped user never keeps the bonus.
    pub fn adjusted(&self, handle: &str, raw: i64) -> i64 {
        let mut points = raw;
        if let Some(bonus) = self.bonuses.get(handle) {
            points = points.saturating_add(*bonus);
        }
        if let Some(&cap) = self.caps.get(handle) {
            points = cap.min(raw);
        }
        points
    }
}

pub fn score(records: &[UserRecord], filters: &ScoringFilters) -> Scoreboard {
    let base_sum = records.iter().fold(0i64, |sum, r| sum.saturating_add(r.raw));

    let mut users: Vec<ScoredUser> = records
        .iter()
        .map(|r| ScoredUser {
            handle: r.handle.clone(),
            raw: r.raw,
            adjusted: filters.adjusted(&r.handle, r.raw),
            active: filters.is_active(&r.handle),
            base_rate: percentage(r.raw, base_sum),
            active_rate: 0.0,
        })
        .collect();

    let active_sum = users
        .iter()
        .filter(|u| u.active)
        .fold(0i64, |sum, u| sum.saturating_add(u.adjusted));
    for user in users.iter_mut().filter(|u| u.active) {
        user.active_rate = percentage(user.adjusted, active_sum);
    }

    Scoreboard { base_sum, active_sum, users }
}

fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}
