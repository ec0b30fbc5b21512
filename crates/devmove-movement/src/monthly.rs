//! Contribution volume per calendar month.

use std::collections::BTreeMap;

use devmove_core::ContributionEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Contributions of one developer to one repository in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperMonthlyTally {
    /// Developer login.
    pub developer: String,
    /// Repository identifier.
    pub repository: String,
    /// Month as `YYYY-MM` (UTC).
    pub month: String,
    /// Contribution type, when the source recorded one.
    pub kind: Option<String>,
    /// Number of contributions.
    pub contribution_count: usize,
}

/// Contributions to one repository in one month, across developers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryMonthlyTally {
    /// Month as `YYYY-MM` (UTC).
    pub month: String,
    /// Repository identifier.
    pub repository: String,
    /// Contribution type, when the source recorded one.
    pub kind: Option<String>,
    /// Number of contributions.
    pub contribution_count: usize,
}

fn month_of(event: &ContributionEvent) -> String {
    event.timestamp.format("%Y-%m").to_string()
}

/// Count contributions per (developer, repository, month, type).
///
/// Sorted by developer, repository, month, then type.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use devmove_core::ContributionEvent;
/// use devmove_movement::monthly::developer_monthly;
///
/// let t = |m, d| Utc.with_ymd_and_hms(2021, m, d, 0, 0, 0).unwrap();
/// let events = vec![
///     ContributionEvent::new("alice", "x/y", t(3, 1)).with_kind("pulls"),
///     ContributionEvent::new("alice", "x/y", t(3, 20)).with_kind("pulls"),
///     ContributionEvent::new("alice", "x/y", t(4, 2)).with_kind("pulls"),
/// ];
/// let tallies = developer_monthly(&events);
/// assert_eq!(tallies.len(), 2);
/// assert_eq!(tallies[0].month, "2021-03");
/// assert_eq!(tallies[0].contribution_count, 2);
/// ```
pub fn developer_monthly(events: &[ContributionEvent]) -> Vec<DeveloperMonthlyTally> {
    let mut counts: BTreeMap<(&str, &str, String, Option<&str>), usize> = BTreeMap::new();
    for event in events {
        let key = (
            event.developer.as_str(),
            event.repository.as_str(),
            month_of(event),
            event.kind.as_deref(),
        );
        *counts.entry(key).or_default() += 1;
    }

    let tallies: Vec<DeveloperMonthlyTally> = counts
        .into_iter()
        .map(|((developer, repository, month, kind), contribution_count)| DeveloperMonthlyTally {
            developer: developer.to_string(),
            repository: repository.to_string(),
            month,
            kind: kind.map(str::to_string),
            contribution_count,
        })
        .collect();
    debug!(rows = tallies.len(), "tallied developer contributions per month");
    tallies
}

/// Count contributions per (month, repository, type).
///
/// Sorted by month, repository, then type.
pub fn repository_monthly(events: &[ContributionEvent]) -> Vec<RepositoryMonthlyTally> {
    let mut counts: BTreeMap<(String, &str, Option<&str>), usize> = BTreeMap::new();
    for event in events {
        let key = (month_of(event), event.repository.as_str(), event.kind.as_deref());
        *counts.entry(key).or_default() += 1;
    }

    let tallies: Vec<RepositoryMonthlyTally> = counts
        .into_iter()
        .map(|((month, repository, kind), contribution_count)| RepositoryMonthlyTally {
            month,
            repository: repository.to_string(),
            kind: kind.map(str::to_string),
            contribution_count,
        })
        .collect();
    debug!(rows = tallies.len(), "tallied repository contributions per month");
    tallies
}
