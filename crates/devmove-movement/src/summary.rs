//! Per-repository tallies of one or both sides of the pivot.

use std::collections::{BTreeMap, BTreeSet};

use devmove_core::Side;
use serde::{Deserialize, Serialize};

use crate::membership::RepositoryMembership;
use crate::partition::SideEvents;

/// Distinct developers recorded for a repository on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryTally {
    /// Repository identifier.
    pub repository: String,
    /// Number of distinct developers.
    pub count: usize,
    /// The developers, sorted. Empty when loaded from a count-only table.
    pub developers: Vec<String>,
}

/// Events a developer made on a repository on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTally {
    /// Repository identifier.
    pub repository: String,
    /// Developer login.
    pub developer: String,
    /// Number of events.
    pub count: usize,
}

/// Developer counts for a repository on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedTally {
    /// Repository identifier.
    pub repository: String,
    /// Count on the before side (0 when absent).
    pub before_count: usize,
    /// Count on the after side (0 when absent).
    pub after_count: usize,
}

/// Developers shared by a before-side and an after-side repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOverlap {
    /// Repository on the before side.
    pub before_repository: String,
    /// Repository on the after side.
    pub after_repository: String,
    /// Developers recorded on both.
    pub overlap_count: usize,
}

/// Tally developers per repository, busiest repositories first.
///
/// # Examples
///
/// ```
/// use devmove_movement::membership::RepositoryMembership;
/// use devmove_movement::summary::repository_tallies;
///
/// let mut membership = RepositoryMembership::new();
/// membership.insert("x/a", "alice");
/// membership.insert("x/b", "alice");
/// membership.insert("x/b", "bob");
///
/// let tallies = repository_tallies(&membership);
/// assert_eq!(tallies[0].repository, "x/b");
/// assert_eq!(tallies[0].count, 2);
/// ```
pub fn repository_tallies(membership: &RepositoryMembership) -> Vec<RepositoryTally> {
    let mut tallies: Vec<RepositoryTally> = membership
        .iter()
        .map(|(repository, developers)| RepositoryTally {
            repository: repository.clone(),
            count: developers.len(),
            developers: developers.iter().cloned().collect(),
        })
        .collect();
    // Membership iterates in repository order; a stable sort keeps it for ties.
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies
}

/// Count events per (repository, developer) on `side`.
///
/// Sorted by repository, then developer.
pub fn event_tallies(events: &[SideEvents], side: Side) -> Vec<EventTally> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for developer_events in events {
        for event in developer_events.side(side) {
            *counts
                .entry((event.repository.as_str(), event.developer.as_str()))
                .or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|((repository, developer), count)| EventTally {
            repository: repository.to_string(),
            developer: developer.to_string(),
            count,
        })
        .collect()
}

/// Outer-join before and after tallies on repository.
///
/// Missing counts become 0; repeated rows for one repository on the same side
/// are summed. Sorted by repository.
///
/// # Examples
///
/// ```
/// use devmove_movement::summary::{merge_tallies, RepositoryTally};
///
/// let tally = |repo: &str, count| RepositoryTally {
///     repository: repo.into(),
///     count,
///     developers: vec![],
/// };
/// let merged = merge_tallies(&[tally("a", 2)], &[tally("a", 1), tally("b", 4)]);
/// assert_eq!(merged.len(), 2);
/// assert_eq!((merged[0].before_count, merged[0].after_count), (2, 1));
/// assert_eq!((merged[1].before_count, merged[1].after_count), (0, 4));
/// ```
pub fn merge_tallies(before: &[RepositoryTally], after: &[RepositoryTally]) -> Vec<MergedTally> {
    let mut merged: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for tally in before {
        merged.entry(tally.repository.as_str()).or_default().0 += tally.count;
    }
    for tally in after {
        merged.entry(tally.repository.as_str()).or_default().1 += tally.count;
    }

    merged
        .into_iter()
        .map(|(repository, (before_count, after_count))| MergedTally {
            repository: repository.to_string(),
            before_count,
            after_count,
        })
        .collect()
}

/// Count developers shared by every (before repository, after repository)
/// pair.
///
/// Pairs with no shared developer are omitted. Sorted by overlap descending,
/// then before repository, then after repository.
///
/// # Examples
///
/// ```
/// use devmove_movement::membership::RepositoryMembership;
/// use devmove_movement::summary::overlap;
///
/// let mut before = RepositoryMembership::new();
/// before.insert("old", "alice");
/// before.insert("old", "bob");
/// let mut after = RepositoryMembership::new();
/// after.insert("new", "alice");
/// after.insert("new", "bob");
/// after.insert("other", "carol");
///
/// let pairs = overlap(&before, &after);
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs[0].before_repository, "old");
/// assert_eq!(pairs[0].overlap_count, 2);
/// ```
pub fn overlap(before: &RepositoryMembership, after: &RepositoryMembership) -> Vec<RepositoryOverlap> {
    let after_by_developer = repositories_by_developer(after);

    let mut shared: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for (developer, before_repos) in repositories_by_developer(before) {
        let Some(after_repos) = after_by_developer.get(developer) else {
            continue;
        };
        for &b in &before_repos {
            for &a in after_repos {
                *shared.entry((b, a)).or_default() += 1;
            }
        }
    }

    let mut pairs: Vec<RepositoryOverlap> = shared
        .into_iter()
        .map(|((b, a), overlap_count)| RepositoryOverlap {
            before_repository: b.to_string(),
            after_repository: a.to_string(),
            overlap_count,
        })
        .collect();
    // Map order already breaks ties by (before, after).
    pairs.sort_by(|x, y| y.overlap_count.cmp(&x.overlap_count));
    pairs
}

fn repositories_by_developer(membership: &RepositoryMembership) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut by_developer: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (repository, developers) in membership.iter() {
        for developer in developers {
            by_developer
                .entry(developer.as_str())
                .or_default()
                .insert(repository.as_str());
        }
    }
    by_developer
}
