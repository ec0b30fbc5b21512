//! Repository membership: which developers appear on one side of the pivot
//! for each repository.

use std::collections::{BTreeMap, BTreeSet};

use devmove_core::Side;
use serde::Serialize;

use crate::partition::PartitionResult;

/// Mapping from repository to the developers recorded there on one side.
///
/// Both repositories and developers are kept sorted, so iteration order is
/// deterministic.
///
/// # Examples
///
/// ```
/// use devmove_movement::membership::RepositoryMembership;
///
/// let membership = RepositoryMembership::from_rows(vec![
///     ("r1".to_string(), vec!["B".to_string(), "A".to_string()]),
///     ("r2".to_string(), vec!["A".to_string()]),
/// ]);
/// assert_eq!(membership.len(), 2);
/// assert_eq!(membership.developer_count(), 2);
/// assert_eq!(membership.largest_group(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryMembership {
    repos: BTreeMap<String, BTreeSet<String>>,
}

impl RepositoryMembership {
    /// An empty membership table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invert partition results, taking `side` from every developer.
    ///
    /// # Examples
    ///
    /// ```
    /// use devmove_core::Side;
    /// use devmove_movement::membership::RepositoryMembership;
    /// use devmove_movement::partition::PartitionResult;
    ///
    /// let mut alice = PartitionResult::empty("alice");
    /// alice.after.insert("x/y".into());
    /// let mut bob = PartitionResult::empty("bob");
    /// bob.after.insert("x/y".into());
    /// bob.before.insert("a/b".into());
    ///
    /// let after = RepositoryMembership::from_partitions(&[alice, bob], Side::After);
    /// assert_eq!(after.get("x/y").unwrap().len(), 2);
    /// assert!(after.get("a/b").is_none());
    /// ```
    pub fn from_partitions(results: &[PartitionResult], side: Side) -> Self {
        let mut membership = Self::new();
        for result in results {
            for repository in result.side(side) {
                membership.insert(repository, &result.developer);
            }
        }
        membership
    }

    /// Build from `(repository, developers)` rows, as loaded from a table.
    ///
    /// Rows naming the same repository are merged. Blank developer ids are
    /// not developers and are skipped.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut membership = Self::new();
        for (repository, developers) in rows {
            let entry = membership.repos.entry(repository).or_default();
            entry.extend(developers.into_iter().filter(|d| !d.trim().is_empty()));
        }
        membership
    }

    /// Record `developer` as a member of `repository`.
    pub fn insert(&mut self, repository: &str, developer: &str) {
        self.repos
            .entry(repository.to_string())
            .or_default()
            .insert(developer.to_string());
    }

    /// Developers recorded for `repository`.
    pub fn get(&self, repository: &str) -> Option<&BTreeSet<String>> {
        self.repos.get(repository)
    }

    /// Iterate `(repository, developers)` in repository order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.repos.iter()
    }

    /// Number of repositories.
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    /// Whether no repository is recorded.
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Number of distinct developers across all repositories.
    pub fn developer_count(&self) -> usize {
        self.repos
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Size of the largest developer set of any repository.
    pub fn largest_group(&self) -> usize {
        self.repos.values().map(BTreeSet::len).max().unwrap_or(0)
    }
}
