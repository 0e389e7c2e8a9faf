// src/parser.rs

use crate::catalog::{PointCatalog, PLACEHOLDER_TAG};
use crate::error::{Result, StatsError};
use crate::model::*;
use std::collections::HashMap;
use tracing::debug;

pub const MIN_COMMIT_ID_LEN: usize = 7;

const HEADING_PREFIX: &str = "## ";
const ROW_PREFIX: &str = "| [";
const COMMIT_LABEL_PREFIX: &str = "commit ";
const COMMIT_URL_SEGMENT: &str = "/commit/";

enum ScanState {
    NoActiveUser,
    InUserSection { handle: Handle, running: i64 },
}

/// Where in which document a line came from, for diagnostics.
#[derive(Clone, Copy)]
struct Position<'a> {
    document: &'a str,
    line: usize,
}

impl Position<'_> {
    fn malformed(&self, reason: impl Into<String>) -> StatsError {
        StatsError::MalformedLedger {
            document: self.document.to_string(),
            line: self.line,
            reason: reason.into(),
        }
    }
}

/// Parses one ledger document into per-user raw totals and the commits it references.
pub fn parse(text: &str, document: &str, catalog: &PointCatalog) -> Result<ParsedLedger> {
    let mut state = ScanState::NoActiveUser;
    let mut ledger = ParsedLedger::default();
    let mut record_index: HashMap<Handle, usize> = HashMap::new();

    for (i, line) in text.lines().enumerate() {
        let pos = Position { document, line: i + 1 };

        if let Some(heading) = line.strip_prefix(HEADING_PREFIX) {
            let handle = parse_heading(heading, pos)?;
            state = ScanState::InUserSection { handle, running: 0 };
            continue;
        }

        let ScanState::InUserSection { handle, running } = &mut state else {
            continue;
        };
        if !line.starts_with(ROW_PREFIX) {
            continue;
        }

        let row = parse_row(line, pos, catalog)?;
        for reference in &row.commits {
            ledger.commits.insert(&reference.repo, reference.ids.iter().cloned());
        }
        let points = row_points(&row, pos, catalog)?;
        *running = running.checked_add(points).ok_or_else(|| overflow(pos, cols_points(line)))?;
        debug!(document, line = pos.line, user = %handle, total = *running, "row parsed");

        // A repeated heading restarts the total and overwrites the earlier record.
        match record_index.get(handle.as_str()) {
            Some(&idx) => ledger.users[idx].raw = *running,
            None => {
                record_index.insert(handle.clone(), ledger.users.len());
                ledger.users.push(UserRecord { handle: handle.clone(), raw: *running });
            }
        }
    }

    Ok(ledger)
}

/// `[handle](url)` after the `## ` prefix.
fn parse_heading(heading: &str, pos: Position<'_>) -> Result<Handle> {
    let heading = heading.trim_end();
    let (label, url) = heading
        .strip_prefix('[')
        .and_then(|rest| rest.split_once("]("))
        .and_then(|(label, rest)| rest.strip_suffix(')').map(|url| (label, url)))
        .ok_or_else(|| pos.malformed(format!("expected `## [handle](url)`, got {heading:?}")))?;

    if label.is_empty() || url.is_empty() {
        return Err(pos.malformed(format!("empty handle or profile url in {heading:?}")));
    }
    Ok(label.to_string())
}

/// Splits a contribution row into its commit and points columns.
fn parse_row(line: &str, pos: Position<'_>, catalog: &PointCatalog) -> Result<ContributionRow> {
    let cols: Vec<&str> = line.split('|').collect();
    if cols.len() < 3 {
        return Err(pos.malformed("contribution row needs a commit column and a points column"));
    }

    let mut commits = Vec::new();
    for link in markdown_links(cols[1]) {
        if let Some(reference) = commit_reference(&link, pos)? {
            commits.push(reference);
        }
    }

    let mut points = Vec::new();
    for entry in cols[2].trim().split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        points.push(point_entry(entry, pos, catalog)?);
    }

    Ok(ContributionRow { commits, points })
}

/// Sum of `weight × quantity` over the row. Totals that do not fit an `i64` are rejected.
fn row_points(row: &ContributionRow, pos: Position<'_>, catalog: &PointCatalog) -> Result<i64> {
    row.points.iter().try_fold(0i64, |total, p| {
        let entry = || overflow(pos, format!("{}:{}", p.tag, p.quantity));
        let weight = i64::from(catalog.weight(&p.tag).unwrap_or(0));
        let points = weight.checked_mul(p.quantity).ok_or_else(entry)?;
        total.checked_add(points).ok_or_else(entry)
    })
}

fn cols_points(line: &str) -> String {
    line.split('|').nth(2).unwrap_or_default().trim().to_string()
}

fn overflow(pos: Position<'_>, entry: String) -> StatsError {
    StatsError::InvalidQuantity {
        document: pos.document.to_string(),
        line: pos.line,
        entry,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Link<'a> {
    label: &'a str,
    url: Option<&'a str>,
}

/// Finds every `[label]` or `[label](url)` in a column, left to right.
fn markdown_links(column: &str) -> Vec<Link<'_>> {
    let mut links = Vec::new();
    let mut rest = column;

    while let Some(open) = rest.find('[') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(']') else {
            break;
        };
        let label = &after_open[..close];
        rest = &after_open[close + 1..];

        let mut url = None;
        if let Some(target) = rest.strip_prefix('(') {
            if let Some(end) = target.find(')') {
                url = Some(&target[..end]);
                rest = &target[end + 1..];
            }
        }
        links.push(Link { label, url });
    }
    links
}

/// Interprets one link of the commit column.
///
/// Older ledgers spell the reference out in the label (`[commit repo, id1, id2](...)`),
/// newer ones link straight to the commit page (`[text](https://host/owner/name/commit/id)`).
/// Links of neither shape, such as issue links, are not commit references.
fn commit_reference(link: &Link<'_>, pos: Position<'_>) -> Result<Option<CommitReference>> {
    if let Some(spec) = link.label.strip_prefix(COMMIT_LABEL_PREFIX) {
        let mut items = spec.split(',');
        let repo = items.next().unwrap_or_default().trim();
        if repo.is_empty() {
            return Err(pos.malformed(format!("commit reference without repository: {:?}", link.label)));
        }
        let ids = items.map(|id| validate_commit_id(id.trim(), pos)).collect::<Result<Vec<_>>>()?;
        if ids.is_empty() {
            return Err(pos.malformed(format!("commit reference without ids: {:?}", link.label)));
        }
        return Ok(Some(CommitReference { repo: repo.to_string(), ids }));
    }

    let Some((base, tail)) = link.url.and_then(|url| url.split_once(COMMIT_URL_SEGMENT)) else {
        return Ok(None);
    };
    let mut segments = base.trim_end_matches('/').rsplit('/');
    let (name, owner) = match (segments.next(), segments.next()) {
        (Some(name), Some(owner)) if !name.is_empty() && !owner.is_empty() => (name, owner),
        _ => return Err(pos.malformed(format!("cannot tell repository from commit url {base:?}"))),
    };
    let id = tail.split(&['?', '#', '/'][..]).next().unwrap_or_default();
    let id = validate_commit_id(id, pos)?;

    Ok(Some(CommitReference { repo: format!("{owner}/{name}"), ids: vec![id] }))
}

fn validate_commit_id(id: &str, pos: Position<'_>) -> Result<String> {
    if id.is_empty() || id.chars().count() < MIN_COMMIT_ID_LEN {
        return Err(StatsError::InvalidCommitId {
            document: pos.document.to_string(),
            line: pos.line,
            id: id.to_string(),
            len: id.chars().count(),
        });
    }
    Ok(id.to_string())
}

fn point_entry(entry: &str, pos: Position<'_>, catalog: &PointCatalog) -> Result<PointEntry> {
    let invalid_quantity = || StatsError::InvalidQuantity {
        document: pos.document.to_string(),
        line: pos.line,
        entry: entry.to_string(),
    };

    let mut parts = entry.split(':');
    let tag = parts.next().unwrap_or_default().trim();
    let quantity = match (parts.next().map(str::trim), parts.next()) {
        (None, _) => 1,
        (Some(""), None) if tag == PLACEHOLDER_TAG => 1,
        (Some(value), None) => value.parse::<i64>().map_err(|_| invalid_quantity())?,
        (Some(_), Some(_)) => return Err(invalid_quantity()),
    };

    if catalog.weight(tag).is_none() {
        return Err(StatsError::InvalidPointTag {
            document: pos.document.to_string(),
            line: pos.line,
            tag: tag.to_string(),
        });
    }
    Ok(PointEntry { tag: tag.to_string(), quantity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn catalog() -> PointCatalog {
        PointCatalog::builder()
            .tag("fixs", 2)
            .and_then(|b| b.tag("typo", 1))
            .and_then(|b| b.tag("addref", 20))
            .unwrap()
            .build()
    }

    fn ids(index: &CommitIndex, repo: &str) -> Vec<String> {
        index.get(repo).map(|s| s.iter().cloned().collect()).unwrap_or_default()
    }

    #[test]
    fn row_with_quantities_and_default_quantity() {
        let text = "## [alice](https://github.com/alice)\n\
                    | [commit repoA, abcd123, abcd124](https://example.com) | fixs:2, typo |\n";
        let ledger = parse(text, "stats.md", &catalog()).unwrap();

        assert_eq!(ledger.users, vec![UserRecord { handle: "alice".into(), raw: 5 }]);
        assert_eq!(ids(&ledger.commits, "repoA"), vec!["abcd123", "abcd124"]);
    }

    #[test]
    fn preamble_before_first_heading_is_ignored() {
        let text = "# Contribution stats\n\
                    | [commit repoA, zz] | bogus |\n\
                    Some instructions.\n\
                    ## [bob](https://github.com/bob)\n\
                    | [commit repoA, 1111111](x) | addref |\n";
        let ledger = parse(text, "stats.md", &catalog()).unwrap();
        assert_eq!(ledger.users, vec![UserRecord { handle: "bob".into(), raw: 20 }]);
    }

    #[test]
    fn totals_are_kept_per_section_in_order() {
        let text = "## [bob](u)\n\
                    | [commit r, 1111111](x) | typo:3 |\n\
                    | [commit r, 2222222](x) | fixs |\n\
                    ## [alice](u)\n\
                    | [commit r, 3333333](x) | addref:2 |\n\
                    ## [carol](u)\n";
        let ledger = parse(text, "stats.md", &catalog()).unwrap();
        assert_eq!(
            ledger.users,
            vec![
                UserRecord { handle: "bob".into(), raw: 5 },
                UserRecord { handle: "alice".into(), raw: 40 },
            ]
        );
        assert_eq!(ledger.commits.commit_count(), 3);
    }

    #[test]
    fn repeated_heading_overwrites_record() {
        let text = "## [bob](u)\n\
                    | [commit r, 1111111](x) | addref |\n\
                    ## [alice](u)\n\
                    | [commit r, 2222222](x) | typo |\n\
                    ## [bob](u)\n\
                    | [commit r, 3333333](x) | fixs |\n";
        let ledger = parse(text, "stats.md", &catalog()).unwrap();
        assert_eq!(ledger.users[0], UserRecord { handle: "bob".into(), raw: 2 });
        assert_eq!(ledger.users.len(), 2);
    }

    #[test]
    fn short_commit_id_is_fatal() {
        let text = "## [bob](u)\n| [commit repoA, abcdef1, abc123](x) | typo |\n";
        let err = parse(text, "stats.md", &catalog()).unwrap_err();
        match err {
            StatsError::InvalidCommitId { id, len, line, .. } => {
                assert_eq!(id, "abc123");
                assert_eq!(len, 6);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_commit_id_is_fatal() {
        let text = "## [bob](u)\n| [commit repoA, abcdef1, ](x) | typo |\n";
        assert!(matches!(
            parse(text, "stats.md", &catalog()),
            Err(StatsError::InvalidCommitId { len: 0, .. })
        ));
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let text = "## [bob](u)\n| [commit r, 1111111](x) | typo, fixxl:2 |\n";
        assert!(matches!(
            parse(text, "stats.md", &catalog()),
            Err(StatsError::InvalidPointTag { tag, .. }) if tag == "fixxl"
        ));
    }

    #[test]
    fn bad_quantities_are_fatal() {
        for points in ["typo:", "typo:x", "typo:1:2", "fixs: 1.5"] {
            let text = format!("## [bob](u)\n| [commit r, 1111111](x) | {points} |\n");
            assert!(
                matches!(parse(&text, "stats.md", &catalog()), Err(StatsError::InvalidQuantity { .. })),
                "{points} should be rejected"
            );
        }
    }

    #[test]
    fn placeholder_tolerates_missing_quantity() {
        let text = "## [bob](u)\n| [commit r, 1111111](x) | ignore:, typo:2 |\n";
        let ledger = parse(text, "stats.md", &catalog()).unwrap();
        assert_eq!(ledger.users[0].raw, 2);
    }

    #[test]
    fn commit_urls_are_references_too() {
        let text = "## [bob](u)\n\
                    | [fix typo](https://github.com/cpprefjp/site/commit/0123456789abcdef), [#12](https://github.com/cpprefjp/site/issues/12) | typo |\n";
        let ledger = parse(text, "stats.md", &catalog()).unwrap();
        assert_eq!(ids(&ledger.commits, "cpprefjp/site"), vec!["0123456789abcdef"]);
        assert_eq!(ledger.commits.repos().count(), 1);
    }

    #[test]
    fn several_references_in_one_column() {
        let text = "## [bob](u)\n\
                    | [commit cpprefjp/site, 1111111](x), [commit boostjp/site, 2222222, 3333333](y) | typo |\n";
        let ledger = parse(text, "stats.md", &catalog()).unwrap();
        assert_eq!(ids(&ledger.commits, "cpprefjp/site"), vec!["1111111"]);
        assert_eq!(
            ledger.commits.get("boostjp/site").cloned().unwrap_or_default(),
            BTreeSet::from(["2222222".to_string(), "3333333".to_string()])
        );
    }

    #[test]
    fn malformed_heading_and_row() {
        let heading = "## alice\n";
        assert!(matches!(
            parse(heading, "stats.md", &catalog()),
            Err(StatsError::MalformedLedger { line: 1, .. })
        ));

        let row = "## [bob](u)\n| [commit r, 1111111](x)\n";
        assert!(matches!(
            parse(row, "stats.md", &catalog()),
            Err(StatsError::MalformedLedger { line: 2, .. })
        ));
    }

    #[test]
    fn huge_quantity_is_rejected_instead_of_overflowing() {
        let text = "## [bob](u)\n| [commit r, 1111111](x) | addref:1000000000000000000 |\n";
        assert!(matches!(
            parse(text, "stats.md", &catalog()),
            Err(StatsError::InvalidQuantity { line: 2, entry, .. }) if entry == "addref:1000000000000000000"
        ));
    }

    #[test]
    fn row_and_running_totals_are_overflow_checked() {
        let max = i64::MAX;
        let row = format!("## [bob](u)\n| [commit r, 1111111](x) | typo:{max}, typo:1 |\n");
        assert!(matches!(
            parse(&row, "stats.md", &catalog()),
            Err(StatsError::InvalidQuantity { line: 2, .. })
        ));

        let running = format!(
            "## [bob](u)\n| [commit r, 1111111](x) | typo:{max} |\n| [commit r, 2222222](x) | typo |\n"
        );
        assert!(matches!(
            parse(&running, "stats.md", &catalog()),
            Err(StatsError::InvalidQuantity { line: 3, entry, .. }) if entry == "typo"
        ));
    }

    #[test]
    fn commit_url_with_short_id_is_fatal() {
        let text = "## [bob](u)\n| [x](https://github.com/o/r/commit/abc12) | typo |\n";
        assert!(matches!(
            parse(text, "stats.md", &catalog()),
            Err(StatsError::InvalidCommitId { id, len: 5, .. }) if id == "abc12"
        ));
    }

    #[test]
    fn commit_url_without_repository_is_malformed() {
        let text = "## [bob](u)\n| [x](/commit/abcdef1) | typo |\n";
        assert!(matches!(
            parse(text, "stats.md", &catalog()),
            Err(StatsError::MalformedLedger { line: 2, .. })
        ));
    }

    #[test]
    fn commit_label_needs_repository_and_ids() {
        for column in [
            "[commit repoA](x)",
            "[commit , abcdef1](x)",
            "[commit message typo](https://github.com/o/r/pull/3)",
        ] {
            let text = format!("## [bob](u)\n| {column} | typo |\n");
            assert!(
                matches!(parse(&text, "stats.md", &catalog()), Err(StatsError::MalformedLedger { line: 2, .. })),
                "{column} should be rejected"
            );
        }
    }

    #[test]
    fn markdown_links_tokenizes_labels_and_urls() {
        let links = markdown_links(" [a](b), [c] [d](e) ");
        assert_eq!(
            links,
            vec![
                Link { label: "a", url: Some("b") },
                Link { label: "c", url: None },
                Link { label: "d", url: Some("e") },
            ]
        );
    }
}
