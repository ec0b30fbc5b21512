//! Windowed co-contribution: who else was active on the same repository
//! around the same time.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use devmove_core::ContributionEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Developers seen on a repository within the window of another developer's
/// events there.
///
/// # Examples
///
/// ```
/// use devmove_movement::copresence::CoContribution;
///
/// let row = CoContribution {
///     developer: "alice".into(),
///     repository: "apache/zookeeper".into(),
///     co_contributors: vec!["bob".into()],
///     co_count: 1,
/// };
/// assert_eq!(row.co_count, row.co_contributors.len());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoContribution {
    /// Developer whose events anchor the window.
    pub developer: String,
    /// Repository both were active on.
    pub repository: String,
    /// Other developers active within the window, sorted.
    pub co_contributors: Vec<String>,
    /// Number of distinct co-contributors.
    pub co_count: usize,
}

/// Find co-contributors for every (developer, repository) pair.
///
/// Another developer counts when they have an event on the same repository
/// within `window` of any of the developer's events there (inclusive on both
/// ends). Pairs without co-contributors are omitted. Sorted by developer, then
/// repository.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use devmove_core::ContributionEvent;
/// use devmove_movement::copresence::co_contributions;
///
/// let t = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
/// let events = vec![
///     ContributionEvent::new("alice", "r", t),
///     ContributionEvent::new("bob", "r", t + Duration::days(3)),
///     ContributionEvent::new("carol", "r", t + Duration::days(30)),
/// ];
/// let rows = co_contributions(&events, Duration::days(5));
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].developer, "alice");
/// assert_eq!(rows[0].co_contributors, vec!["bob"]);
/// ```
pub fn co_contributions(events: &[ContributionEvent], window: Duration) -> Vec<CoContribution> {
    let mut by_repo: HashMap<&str, Vec<(DateTime<Utc>, &str)>> = HashMap::new();
    for event in events {
        by_repo
            .entry(event.repository.as_str())
            .or_default()
            .push((event.timestamp, event.developer.as_str()));
    }
    for timeline in by_repo.values_mut() {
        timeline.sort_by_key(|(t, _)| *t);
    }

    let mut found: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
    for event in events {
        let Some(timeline) = by_repo.get(event.repository.as_str()) else {
            continue;
        };
        for &(_, other) in within(timeline, event.timestamp, window) {
            if other != event.developer {
                found
                    .entry((event.developer.as_str(), event.repository.as_str()))
                    .or_default()
                    .insert(other);
            }
        }
    }

    let rows: Vec<CoContribution> = found
        .into_iter()
        .map(|((developer, repository), others)| CoContribution {
            developer: developer.to_string(),
            repository: repository.to_string(),
            co_count: others.len(),
            co_contributors: others.into_iter().map(str::to_string).collect(),
        })
        .collect();

    debug!(
        rows = rows.len(),
        window_days = window.num_days(),
        "computed co-contributions"
    );
    rows
}

/// Entries of a time-sorted slice that fall within `window` of `at`.
pub(crate) fn within<T>(
    sorted: &[(DateTime<Utc>, T)],
    at: DateTime<Utc>,
    window: Duration,
) -> &[(DateTime<Utc>, T)] {
    let start = at - window;
    let end = at + window;
    let lo = sorted.partition_point(|(t, _)| *t < start);
    let hi = sorted.partition_point(|(t, _)| *t <= end);
    &sorted[lo..hi.max(lo)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let events = vec![
            ContributionEvent::new("A", "r", at(10)),
            ContributionEvent::new("B", "r", at(15)),
            ContributionEvent::new("C", "r", at(16)),
        ];
        let rows = co_contributions(&events, Duration::days(5));
        let a = rows.iter().find(|r| r.developer == "A").unwrap();
        assert_eq!(a.co_contributors, vec!["B"]);
    }

    #[test]
    fn other_repositories_do_not_count() {
        let events = vec![
            ContributionEvent::new("A", "r1", at(1)),
            ContributionEvent::new("B", "r2", at(1)),
        ];
        assert!(co_contributions(&events, Duration::days(5)).is_empty());
    }

    #[test]
    fn own_events_do_not_count() {
        let events = vec![
            ContributionEvent::new("A", "r", at(1)),
            ContributionEvent::new("A", "r", at(2)),
        ];
        assert!(co_contributions(&events, Duration::days(5)).is_empty());
    }

    #[test]
    fn co_contributors_are_deduplicated_across_events() {
        let events = vec![
            ContributionEvent::new("A", "r", at(1)),
            ContributionEvent::new("A", "r", at(20)),
            ContributionEvent::new("B", "r", at(2)),
            ContributionEvent::new("B", "r", at(21)),
        ];
        let rows = co_contributions(&events, Duration::days(2));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.co_count == 1));
    }

    #[test]
    fn within_handles_negative_window() {
        let sorted = vec![(at(1), ()), (at(2), ())];
        assert!(within(&sorted, at(1), Duration::days(-1)).is_empty());
        assert_eq!(within(&sorted, at(1), Duration::days(1)).len(), 2);
    }
}
