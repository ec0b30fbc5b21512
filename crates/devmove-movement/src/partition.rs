//! Before/after partitioning of developer timelines around a pivot repository.
//!
//! Each timeline is walked once by a two-state machine. Repositories touched
//! before the first pivot contribution land in `before`; everything after it
//! lands in `after`. Later pivot visits never re-arm `before`.

use std::collections::BTreeSet;

use devmove_core::{ContributionEvent, DevmoveError, Side};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timeline::{group_by_developer, DeveloperTimeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PivotState {
    NotYetSeen,
    Seen,
}

impl PivotState {
    fn side(self) -> Side {
        match self {
            PivotState::NotYetSeen => Side::Before,
            PivotState::Seen => Side::After,
        }
    }
}

/// Distinct repositories a developer visited on each side of the pivot.
///
/// A repository may appear in both sets when it was visited on both sides of
/// the first pivot contribution.
///
/// # Examples
///
/// ```
/// use devmove_movement::partition::PartitionResult;
///
/// let result = PartitionResult::empty("alice");
/// assert!(result.before.is_empty() && result.after.is_empty());
/// assert!(!result.pivot_seen);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionResult {
    /// Developer the result belongs to.
    pub developer: String,
    /// Repositories visited strictly before the first pivot event.
    pub before: BTreeSet<String>,
    /// Repositories visited after the first pivot event.
    pub after: BTreeSet<String>,
    /// Whether the developer ever contributed to the pivot.
    pub pivot_seen: bool,
}

impl PartitionResult {
    /// A result with no repositories on either side.
    pub fn empty(developer: impl Into<String>) -> Self {
        Self {
            developer: developer.into(),
            before: BTreeSet::new(),
            after: BTreeSet::new(),
            pivot_seen: false,
        }
    }

    /// Repositories on the given side.
    pub fn side(&self, side: Side) -> &BTreeSet<String> {
        match side {
            Side::Before => &self.before,
            Side::After => &self.after,
        }
    }
}

/// Events of one developer split by side, without deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEvents {
    /// Developer the events belong to.
    pub developer: String,
    /// Non-pivot events before the first pivot event.
    pub before: Vec<ContributionEvent>,
    /// Non-pivot events after the first pivot event.
    pub after: Vec<ContributionEvent>,
}

impl SideEvents {
    /// Events on the given side.
    pub fn side(&self, side: Side) -> &[ContributionEvent] {
        match side {
            Side::Before => &self.before,
            Side::After => &self.after,
        }
    }
}

/// Drive the pivot state machine over `timeline`, reporting every non-pivot
/// event together with the side it falls on. Returns whether the pivot was seen.
fn walk<'a>(
    timeline: &'a DeveloperTimeline,
    pivot: &str,
    mut visit: impl FnMut(Side, &'a ContributionEvent),
) -> bool {
    let mut state = PivotState::NotYetSeen;
    for event in timeline.events() {
        if event.repository == pivot {
            state = PivotState::Seen;
        } else {
            visit(state.side(), event);
        }
    }
    state == PivotState::Seen
}

/// Partition one developer's timeline around `pivot`.
///
/// `pivot` is compared for exact string equality against each event's
/// repository. Pivot events are consumed as markers and never recorded.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use devmove_core::ContributionEvent;
/// use devmove_movement::partition::partition;
/// use devmove_movement::timeline::DeveloperTimeline;
///
/// let t = |d| Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap();
/// let events = ["x", "zk", "y", "zk", "z"]
///     .iter()
///     .enumerate()
///     .map(|(i, r)| ContributionEvent::new("A", *r, t(i as u32 + 1)))
///     .collect();
/// let timeline = DeveloperTimeline::new("A", events).unwrap();
///
/// let result = partition(&timeline, "zk");
/// assert_eq!(result.before.iter().collect::<Vec<_>>(), vec!["x"]);
/// assert_eq!(result.after.iter().collect::<Vec<_>>(), vec!["y", "z"]);
/// ```
pub fn partition(timeline: &DeveloperTimeline, pivot: &str) -> PartitionResult {
    let mut before = BTreeSet::new();
    let mut after = BTreeSet::new();
    let pivot_seen = walk(timeline, pivot, |side, event| {
        let set = match side {
            Side::Before => &mut before,
            Side::After => &mut after,
        };
        set.insert(event.repository.clone());
    });
    PartitionResult {
        developer: timeline.developer().to_string(),
        before,
        after,
        pivot_seen,
    }
}

/// Split one developer's timeline into per-side events, keeping duplicates.
///
/// Used for per-(repository, developer) event counts.
pub fn partition_events(timeline: &DeveloperTimeline, pivot: &str) -> SideEvents {
    let mut before = Vec::new();
    let mut after = Vec::new();
    walk(timeline, pivot, |side, event| match side {
        Side::Before => before.push(event.clone()),
        Side::After => after.push(event.clone()),
    });
    SideEvents {
        developer: timeline.developer().to_string(),
        before,
        after,
    }
}

/// Group `events` by developer and partition every timeline around `pivot`.
///
/// Results are sorted by developer id. Developers who never touched the pivot
/// are valid input and end up with everything in `before`.
///
/// # Errors
///
/// Returns [`DevmoveError::InputValidation`] if an event has an empty
/// developer or repository.
pub fn partition_all(
    events: &[ContributionEvent],
    pivot: &str,
) -> Result<Vec<PartitionResult>, DevmoveError> {
    let timelines = group_by_developer(events)?;
    let results: Vec<PartitionResult> = timelines.iter().map(|t| partition(t, pivot)).collect();

    let never_seen = results.iter().filter(|r| !r.pivot_seen).count();
    debug!(
        developers = results.len(),
        never_seen,
        pivot,
        "partitioned developer timelines"
    );

    Ok(results)
}

/// Like [`partition_all`], but keeps every non-pivot event.
///
/// # Errors
///
/// Returns [`DevmoveError::InputValidation`] if an event has an empty
/// developer or repository.
pub fn partition_all_events(
    events: &[ContributionEvent],
    pivot: &str,
) -> Result<Vec<SideEvents>, DevmoveError> {
    let timelines = group_by_developer(events)?;
    Ok(timelines.iter().map(|t| partition_events(t, pivot)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn timeline(dev: &str, repos: &[&str]) -> DeveloperTimeline {
        let events = repos
            .iter()
            .enumerate()
            .map(|(i, repo)| {
                ContributionEvent::new(
                    dev,
                    *repo,
                    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::hours(i as i64),
                )
            })
            .collect();
        DeveloperTimeline::new(dev, events).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn revisits_to_pivot_do_not_reset_before() {
        let result = partition(&timeline("A", &["x", "zk", "y", "zk", "z"]), "zk");
        assert_eq!(result.before, set(&["x"]));
        assert_eq!(result.after, set(&["y", "z"]));
        assert!(result.pivot_seen);
    }

    #[test]
    fn pivot_never_seen_puts_everything_before() {
        let result = partition(&timeline("A", &["x", "y"]), "zk");
        assert_eq!(result.before, set(&["x", "y"]));
        assert!(result.after.is_empty());
        assert!(!result.pivot_seen);
    }

    #[test]
    fn empty_timeline_gives_empty_sets() {
        let result = partition(&timeline("A", &[]), "zk");
        assert_eq!(result, PartitionResult::empty("A"));
    }

    #[test]
    fn repository_can_appear_on_both_sides() {
        let result = partition(&timeline("A", &["x", "zk", "x"]), "zk");
        assert_eq!(result.before, set(&["x"]));
        assert_eq!(result.after, set(&["x"]));
    }

    #[test]
    fn repeated_visits_are_deduplicated() {
        let result = partition(&timeline("A", &["x", "x", "x", "zk", "y", "y"]), "zk");
        assert_eq!(result.before.len(), 1);
        assert_eq!(result.after.len(), 1);
    }

    #[test]
    fn only_pivot_events_give_empty_sets() {
        let result = partition(&timeline("A", &["zk", "zk"]), "zk");
        assert!(result.before.is_empty());
        assert!(result.after.is_empty());
        assert!(result.pivot_seen);
    }

    #[test]
    fn pivot_comparison_is_exact() {
        let result = partition(&timeline("A", &["apache/zookeeper", "zookeeper"]), "zookeeper");
        assert_eq!(result.before, set(&["apache/zookeeper"]));
        assert!(result.after.is_empty());
    }

    #[test]
    fn partition_events_keeps_duplicates() {
        let events = partition_events(&timeline("A", &["x", "x", "zk", "y", "zk", "y"]), "zk");
        assert_eq!(events.before.len(), 2);
        assert_eq!(events.after.len(), 2);
        assert!(events.side(Side::After).iter().all(|e| e.repository == "y"));
    }

    #[test]
    fn partition_all_sorts_and_groups_developers() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let h = chrono::Duration::hours;
        let events = vec![
            ContributionEvent::new("bob", "zk", t),
            ContributionEvent::new("alice", "y", t + h(2)),
            ContributionEvent::new("alice", "zk", t + h(1)),
            ContributionEvent::new("bob", "x", t + h(1)),
            ContributionEvent::new("alice", "x", t),
        ];
        let results = partition_all(&events, "zk").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].developer, "alice");
        assert_eq!(results[0].before, set(&["x"]));
        assert_eq!(results[0].after, set(&["y"]));
        assert_eq!(results[1].developer, "bob");
        assert!(results[1].before.is_empty());
        assert_eq!(results[1].after, set(&["x"]));
    }

    #[test]
    fn result_side_accessor() {
        let result = partition(&timeline("A", &["x", "zk", "y"]), "zk");
        assert_eq!(result.side(Side::Before), &set(&["x"]));
        assert_eq!(result.side(Side::After), &set(&["y"]));
    }
}
