//! Group co-occurrence: repositories shared by every member of a developer group.
//!
//! For a group size `k`, every unordered k-subset of each repository's
//! developers is enumerated exactly, and the repository is credited to that
//! subset. The count is exact; no sampling or pruning beyond skipping
//! repositories too small to hold a group.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::membership::RepositoryMembership;

/// Repositories shared by one developer group.
///
/// # Examples
///
/// ```
/// use devmove_movement::groups::GroupCommonRepoRecord;
///
/// let record = GroupCommonRepoRecord {
///     developers: vec!["A".into(), "B".into()],
///     common_repos_count: 1,
///     common_repos: vec!["r1".into()],
/// };
/// assert_eq!(record.size(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCommonRepoRecord {
    /// Group members, sorted.
    pub developers: Vec<String>,
    /// Number of repositories every member contributed to.
    pub common_repos_count: usize,
    /// Those repositories, sorted.
    pub common_repos: Vec<String>,
}

impl GroupCommonRepoRecord {
    /// Group size `k`.
    pub fn size(&self) -> usize {
        self.developers.len()
    }
}

/// Tuning for [`aggregate_with`].
///
/// # Examples
///
/// ```
/// use devmove_movement::groups::GroupOptions;
///
/// let opts = GroupOptions::default();
/// assert!(opts.max_developers_per_repo.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    /// Skip repositories with more developers than this. `None` enumerates
    /// every repository regardless of size.
    pub max_developers_per_repo: Option<usize>,
}

/// Count common repositories for every developer group of size `k`.
///
/// Returns records sorted by `common_repos_count` descending, ties by group
/// members ascending. `k < 2`, or `k` larger than the number of distinct
/// developers, yields an empty result.
///
/// # Examples
///
/// ```
/// use devmove_movement::groups::aggregate;
/// use devmove_movement::membership::RepositoryMembership;
///
/// let rows = |devs: &[&str]| devs.iter().map(|d| d.to_string()).collect();
/// let membership = RepositoryMembership::from_rows(vec![
///     ("r1".to_string(), rows(&["A", "B", "C"])),
///     ("r2".to_string(), rows(&["A", "B"])),
///     ("r3".to_string(), rows(&["A", "B", "C"])),
/// ]);
///
/// let pairs = aggregate(&membership, 2);
/// assert_eq!(pairs[0].developers, vec!["A", "B"]);
/// assert_eq!(pairs[0].common_repos_count, 3);
/// assert!(aggregate(&membership, 4).is_empty());
/// ```
pub fn aggregate(membership: &RepositoryMembership, k: usize) -> Vec<GroupCommonRepoRecord> {
    aggregate_with(membership, k, &GroupOptions::default())
}

/// [`aggregate`] with explicit options.
pub fn aggregate_with(
    membership: &RepositoryMembership,
    k: usize,
    options: &GroupOptions,
) -> Vec<GroupCommonRepoRecord> {
    if k < 2 {
        debug!(k, "group size below 2, no groups possible");
        return Vec::new();
    }
    let developers = membership.developer_count();
    if k > developers {
        debug!(k, developers, "group size exceeds developer count");
        return Vec::new();
    }

    let mut group_repos: BTreeMap<Vec<String>, BTreeSet<String>> = BTreeMap::new();

    for (repository, members) in membership.iter() {
        if members.len() < k {
            continue;
        }
        if let Some(max) = options.max_developers_per_repo {
            if members.len() > max {
                warn!(
                    repository = repository.as_str(),
                    developers = members.len(),
                    max,
                    "skipping repository above developer bound"
                );
                continue;
            }
        }

        // Members are a sorted set, so each combination is already canonical.
        let members: Vec<&str> = members.iter().map(String::as_str).collect();
        for_each_combination(&members, k, |group| {
            let key: Vec<String> = group.iter().map(|d| (*d).to_string()).collect();
            group_repos
                .entry(key)
                .or_default()
                .insert(repository.clone());
        });
    }

    let mut records: Vec<GroupCommonRepoRecord> = group_repos
        .into_iter()
        .map(|(developers, repos)| GroupCommonRepoRecord {
            developers,
            common_repos_count: repos.len(),
            common_repos: repos.into_iter().collect(),
        })
        .collect();

    records.sort_by(|a, b| {
        b.common_repos_count
            .cmp(&a.common_repos_count)
            .then_with(|| a.developers.cmp(&b.developers))
    });

    debug!(k, groups = records.len(), "aggregated developer groups");
    records
}

/// Run [`aggregate_with`] for several group sizes in parallel.
///
/// Each size is an independent unit of work over the shared, read-only
/// membership table. Duplicate sizes are collapsed.
pub fn aggregate_many(
    membership: &RepositoryMembership,
    sizes: &[usize],
    options: &GroupOptions,
) -> BTreeMap<usize, Vec<GroupCommonRepoRecord>> {
    let sizes: BTreeSet<usize> = sizes.iter().copied().collect();
    sizes
        .into_par_iter()
        .map(|k| (k, aggregate_with(membership, k, options)))
        .collect()
}

/// Call `visit` with every k-combination of `items`, in lexicographic index order.
fn for_each_combination<'a>(items: &[&'a str], k: usize, mut visit: impl FnMut(&[&'a str])) {
    let n = items.len();
    if k == 0 || k > n {
        return;
    }

    let mut indices: Vec<usize> = (0..k).collect();
    let mut group: Vec<&str> = Vec::with_capacity(k);
    loop {
        group.clear();
        group.extend(indices.iter().map(|&i| items[i]));
        visit(&group);

        // Rightmost index that can still move forward
        let Some(pos) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
            return;
        };
        indices[pos] += 1;
        for j in pos + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(rows: &[(&str, &[&str])]) -> RepositoryMembership {
        RepositoryMembership::from_rows(rows.iter().map(|(repo, devs)| {
            (
                repo.to_string(),
                devs.iter().map(|d| d.to_string()).collect(),
            )
        }))
    }

    fn find<'a>(records: &'a [GroupCommonRepoRecord], devs: &[&str]) -> &'a GroupCommonRepoRecord {
        records
            .iter()
            .find(|r| r.developers == devs)
            .unwrap_or_else(|| panic!("group {devs:?} missing"))
    }

    #[test]
    fn pair_counts_match_shared_repositories() {
        let m = membership(&[
            ("r1", &["A", "B", "C"]),
            ("r2", &["A", "B"]),
            ("r3", &["A", "B", "C"]),
        ]);
        let pairs = aggregate(&m, 2);
        assert_eq!(pairs.len(), 3);
        assert_eq!(find(&pairs, &["A", "B"]).common_repos_count, 3);
        assert_eq!(find(&pairs, &["A", "C"]).common_repos_count, 2);
        assert_eq!(find(&pairs, &["B", "C"]).common_repos_count, 2);
        assert_eq!(find(&pairs, &["A", "C"]).common_repos, vec!["r1", "r3"]);
    }

    #[test]
    fn output_sorted_by_count_then_group() {
        let m = membership(&[
            ("r1", &["A", "B", "C"]),
            ("r2", &["A", "B"]),
            ("r3", &["A", "B", "C"]),
        ]);
        let pairs = aggregate(&m, 2);
        let keys: Vec<_> = pairs.iter().map(|r| r.developers.join(",")).collect();
        assert_eq!(keys, vec!["A,B", "A,C", "B,C"]);
    }

    #[test]
    fn group_larger_than_any_repository_is_empty() {
        let m = membership(&[("r1", &["A", "B", "C"]), ("r2", &["B", "C", "D"])]);
        assert!(aggregate(&m, 4).is_empty());
    }

    #[test]
    fn group_size_below_two_is_empty() {
        let m = membership(&[("r1", &["A", "B"])]);
        assert!(aggregate(&m, 0).is_empty());
        assert!(aggregate(&m, 1).is_empty());
    }

    #[test]
    fn group_size_above_developer_count_is_empty() {
        let m = membership(&[("r1", &["A", "B"])]);
        assert!(aggregate(&m, 3).is_empty());
    }

    #[test]
    fn triples_enumerate_every_subset() {
        let m = membership(&[("r1", &["A", "B", "C", "D"])]);
        let triples = aggregate(&m, 3);
        // C(4, 3)
        assert_eq!(triples.len(), 4);
        assert!(triples.iter().all(|r| r.common_repos_count == 1));
        assert!(triples.iter().all(|r| r.size() == 3));
    }

    #[test]
    fn input_order_does_not_change_groups() {
        let a = membership(&[("r1", &["C", "A", "B"])]);
        let b = membership(&[("r1", &["B", "C", "A"])]);
        assert_eq!(aggregate(&a, 2), aggregate(&b, 2));
    }

    #[test]
    fn oversized_repositories_are_skipped_when_bounded() {
        let m = membership(&[("big", &["A", "B", "C", "D"]), ("small", &["A", "B"])]);
        let opts = GroupOptions {
            max_developers_per_repo: Some(3),
        };
        let pairs = aggregate_with(&m, 2, &opts);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].common_repos, vec!["small"]);
    }

    #[test]
    fn aggregate_many_matches_individual_runs() {
        let m = membership(&[
            ("r1", &["A", "B", "C"]),
            ("r2", &["A", "B", "D"]),
            ("r3", &["B", "C", "D"]),
        ]);
        let opts = GroupOptions::default();
        let all = aggregate_many(&m, &[3, 2, 2, 5], &opts);
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![2, 3, 5]);
        assert_eq!(all[&2], aggregate(&m, 2));
        assert_eq!(all[&3], aggregate(&m, 3));
        assert!(all[&5].is_empty());
    }

    #[test]
    fn combinations_are_lexicographic() {
        let items = ["a", "b", "c", "d"];
        let mut seen = Vec::new();
        for_each_combination(&items, 2, |g| seen.push(g.join("")));
        assert_eq!(seen, vec!["ab", "ac", "ad", "bc", "bd", "cd"]);
    }

    #[test]
    fn combination_of_all_items_is_single() {
        let items = ["a", "b", "c"];
        let mut count = 0;
        for_each_combination(&items, 3, |_| count += 1);
        assert_eq!(count, 1);
    }
}
