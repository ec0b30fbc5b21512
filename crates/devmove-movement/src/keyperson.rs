//! Key persons: developers who hop between repositories most often, and the
//! developers whose activity follows theirs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use devmove_core::ContributionEvent;
use serde::{Deserialize, Serialize};

use crate::copresence::within;

/// How often a developer moved between repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementCount {
    /// Developer login.
    pub developer: String,
    /// Sum over repositories of the distinct other repositories touched
    /// within the window.
    pub count: usize,
}

/// Another developer's activity around a key person's event.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use devmove_movement::keyperson::KeyPersonMovement;
///
/// let row = KeyPersonMovement {
///     key_person: "alice".into(),
///     from_repository: "apache/zookeeper".into(),
///     to_repository: "apache/curator".into(),
///     follower: "bob".into(),
///     time: Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap(),
/// };
/// assert_ne!(row.from_repository, row.to_repository);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPersonMovement {
    /// The key person.
    pub key_person: String,
    /// Repository of the key person's event.
    pub from_repository: String,
    /// Repository the follower was active on.
    pub to_repository: String,
    /// Developer active within the window.
    pub follower: String,
    /// When the follower's event happened.
    pub time: DateTime<Utc>,
}

/// Count repository moves per developer.
///
/// For each of a developer's events on repository `r`, their other
/// repositories within `window` are collected against `r`. The count is the
/// sum over `r` of the distinct repositories collected. Developers with no
/// moves are omitted. Sorted by count descending, then developer.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use devmove_core::ContributionEvent;
/// use devmove_movement::keyperson::movement_counts;
///
/// let t = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
/// let events = vec![
///     ContributionEvent::new("alice", "a", t),
///     ContributionEvent::new("alice", "b", t + Duration::days(1)),
///     ContributionEvent::new("bob", "a", t),
/// ];
/// let counts = movement_counts(&events, Duration::days(30));
/// assert_eq!(counts.len(), 1);
/// assert_eq!(counts[0].developer, "alice");
/// // a -> {b} and b -> {a}
/// assert_eq!(counts[0].count, 2);
/// ```
pub fn movement_counts(events: &[ContributionEvent], window: Duration) -> Vec<MovementCount> {
    let mut by_developer: BTreeMap<&str, Vec<(DateTime<Utc>, &str)>> = BTreeMap::new();
    for event in events {
        by_developer
            .entry(event.developer.as_str())
            .or_default()
            .push((event.timestamp, event.repository.as_str()));
    }

    let mut counts: Vec<MovementCount> = Vec::new();
    for (developer, mut timeline) in by_developer {
        timeline.sort_by_key(|(t, _)| *t);

        let mut moves: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for &(at, repository) in &timeline {
            for &(_, other) in within(&timeline, at, window) {
                if other != repository {
                    moves.entry(repository).or_default().insert(other);
                }
            }
        }

        let count: usize = moves.values().map(BTreeSet::len).sum();
        if count > 0 {
            counts.push(MovementCount {
                developer: developer.to_string(),
                count,
            });
        }
    }

    // Developers were visited in order, so the stable sort breaks ties by name.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `top` developers by [`movement_counts`].
pub fn key_persons(events: &[ContributionEvent], window: Duration, top: usize) -> Vec<String> {
    movement_counts(events, window)
        .into_iter()
        .take(top)
        .map(|m| m.developer)
        .collect()
}

/// List other developers' events on a different repository within `window`
/// of each key-person event.
///
/// Rows are grouped by key person (in the given order), then by the key
/// person's events in time order, then by follower event time.
pub fn follower_movements(
    events: &[ContributionEvent],
    key_persons: &[String],
    window: Duration,
) -> Vec<KeyPersonMovement> {
    let mut all: Vec<(DateTime<Utc>, &ContributionEvent)> =
        events.iter().map(|e| (e.timestamp, e)).collect();
    all.sort_by_key(|(t, _)| *t);

    let mut rows = Vec::new();
    for key_person in key_persons {
        let own = all.iter().filter(|(_, e)| &e.developer == key_person);
        for &(at, anchor) in own {
            for &(_, other) in within(&all, at, window) {
                if &other.developer == key_person || other.repository == anchor.repository {
                    continue;
                }
                rows.push(KeyPersonMovement {
                    key_person: key_person.clone(),
                    from_repository: anchor.repository.clone(),
                    to_repository: other.repository.clone(),
                    follower: other.developer.clone(),
                    time: other.timestamp,
                });
            }
        }
    }
    rows
}
