// src/report.rs

use crate::model::*;

const SIGNIFICANT_DIGITS: i32 = 3;

/// Renders the ranking as a Markdown table, one row per user.
pub fn render_table(rows: &[RankedRow], with_rank: bool) -> String {
    let mut out = String::new();
    if with_rank {
        out.push_str("| No. | user | base point | point | base rate | rate |\n");
        out.push_str("|-----|------|------------|-------|-----------|------|\n");
    } else {
        out.push_str("| user | base point | point | base rate | rate |\n");
        out.push_str("|------|------------|-------|-----------|------|\n");
    }

    for row in rows {
        let user = &row.user;
        if with_rank {
            out.push_str(&format!("| {} ", row.rank));
        }
        out.push_str(&format!(
            "| @{} | {} | {} | {}% | {}% |\n",
            user.handle,
            user.raw,
            user.adjusted,
            format_rate(user.base_rate),
            format_rate(user.active_rate),
        ));
    }
    out
}

/// Lists the commits of each repository that no ledger mentions.
pub fn render_discrepancies(findings: &[RepoDiscrepancy]) -> String {
    let mut out = String::new();
    for finding in findings {
        out.push_str(&format!("unstats commits {}: {}\n", finding.repo, finding.unaccounted.len()));
        for id in &finding.unaccounted {
            out.push_str(&format!("  {id}\n"));
        }
    }
    out
}

/// Formats a percentage with three significant digits (`57.1`, `5.00`, `100`).
pub fn format_rate(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{:.*}", (SIGNIFICANT_DIGITS - 1) as usize, 0.0);
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (SIGNIFICANT_DIGITS - 1 - magnitude).max(0) as usize;
    let formatted = format!("{value:.decimals$}");

    // Rounding can carry into a new digit (99.96 -> "100.0"); drop one decimal then.
    let carried = formatted
        .parse::<f64>()
        .map_or(false, |v| v.abs() >= 10f64.powi(magnitude + 1));
    if carried && decimals > 0 {
        return format!("{value:.prec$}", prec = decimals - 1);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn row(rank: usize, handle: &str, raw: i64, adjusted: i64, base_rate: f64, active_rate: f64) -> RankedRow {
        RankedRow {
            rank,
            user: ScoredUser {
                handle: handle.to_string(),
                raw,
                adjusted,
                active: active_rate > 0.0,
                base_rate,
                active_rate,
            },
        }
    }

    #[test]
    fn rates_have_three_significant_digits() {
        assert_eq!(format_rate(57.142857), "57.1");
        assert_eq!(format_rate(5.0), "5.00");
        assert_eq!(format_rate(100.0), "100");
        assert_eq!(format_rate(0.123456), "0.123");
        assert_eq!(format_rate(99.96), "100");
        assert_eq!(format_rate(9.996), "10.0");
        assert_eq!(format_rate(0.0), "0.00");
    }

    #[test]
    fn table_with_and_without_rank() {
        let rows = vec![
            row(1, "alice", 40, 20, 80.0, 100.0),
            row(2, "bob", 10, 10, 20.0, 0.0),
        ];

        let ranked = render_table(&rows, true);
        let lines: Vec<&str> = ranked.lines().collect();
        assert_eq!(lines[0], "| No. | user | base point | point | base rate | rate |");
        assert_eq!(lines[2], "| 1 | @alice | 40 | 20 | 80.0% | 100% |");
        assert_eq!(lines[3], "| 2 | @bob | 10 | 10 | 20.0% | 0.00% |");

        let plain = render_table(&rows, false);
        assert_eq!(plain.lines().nth(2), Some("| @alice | 40 | 20 | 80.0% | 100% |"));
    }

    #[test]
    fn discrepancies_list_each_commit() {
        let findings = vec![RepoDiscrepancy {
            repo: "boostjp/site".to_string(),
            unaccounted: BTreeSet::from(["1111111".to_string(), "2222222".to_string()]),
        }];
        assert_eq!(
            render_discrepancies(&findings),
            "unstats commits boostjp/site: 2\n  1111111\n  2222222\n"
        );
        assert_eq!(render_discrepancies(&[]), "");
    }
}
