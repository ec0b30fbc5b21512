//! Per-developer contribution timelines.
//!
//! Groups a flat event table by developer and orders each developer's events
//! chronologically, which is the precondition for partitioning.

use std::collections::BTreeMap;

use devmove_core::{ContributionEvent, DevmoveError};

/// The chronologically ordered events of exactly one developer.
///
/// Events with equal timestamps keep their input order.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use devmove_core::ContributionEvent;
/// use devmove_movement::timeline::DeveloperTimeline;
///
/// let t = |d| Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap();
/// let timeline = DeveloperTimeline::new(
///     "alice",
///     vec![
///         ContributionEvent::new("alice", "b/two", t(2)),
///         ContributionEvent::new("alice", "a/one", t(1)),
///     ],
/// )
/// .unwrap();
/// assert_eq!(timeline.events()[0].repository, "a/one");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperTimeline {
    developer: String,
    events: Vec<ContributionEvent>,
}

impl DeveloperTimeline {
    /// Build a timeline, sorting `events` by timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`DevmoveError::InputValidation`] if the developer id is empty,
    /// an event belongs to another developer, or an event has an empty
    /// repository.
    pub fn new(
        developer: impl Into<String>,
        mut events: Vec<ContributionEvent>,
    ) -> Result<Self, DevmoveError> {
        let developer = developer.into();
        if developer.trim().is_empty() {
            return Err(DevmoveError::InputValidation(
                "timeline has an empty developer id".into(),
            ));
        }

        for event in &events {
            if event.developer != developer {
                return Err(DevmoveError::InputValidation(format!(
                    "event by '{}' in timeline of '{developer}'",
                    event.developer
                )));
            }
            if event.repository.trim().is_empty() {
                return Err(DevmoveError::InputValidation(format!(
                    "event by '{developer}' at {} has no repository",
                    event.timestamp.to_rfc3339()
                )));
            }
        }

        // sort_by_key is stable, so same-instant events keep input order
        events.sort_by_key(|e| e.timestamp);

        Ok(Self { developer, events })
    }

    /// Developer this timeline belongs to.
    pub fn developer(&self) -> &str {
        &self.developer
    }

    /// Events in chronological order.
    pub fn events(&self) -> &[ContributionEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the timeline has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Split a flat event table into one timeline per developer.
///
/// Timelines are returned sorted by developer id.
///
/// # Errors
///
/// Returns [`DevmoveError::InputValidation`] if any event has an empty
/// developer or repository.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use devmove_core::ContributionEvent;
/// use devmove_movement::timeline::group_by_developer;
///
/// let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
/// let events = vec![
///     ContributionEvent::new("bob", "x/y", t),
///     ContributionEvent::new("alice", "x/y", t),
///     ContributionEvent::new("bob", "x/z", t),
/// ];
/// let timelines = group_by_developer(&events).unwrap();
/// assert_eq!(timelines.len(), 2);
/// assert_eq!(timelines[0].developer(), "alice");
/// assert_eq!(timelines[1].len(), 2);
/// ```
pub fn group_by_developer(
    events: &[ContributionEvent],
) -> Result<Vec<DeveloperTimeline>, DevmoveError> {
    let mut by_developer: BTreeMap<&str, Vec<ContributionEvent>> = BTreeMap::new();
    for event in events {
        by_developer
            .entry(event.developer.as_str())
            .or_default()
            .push(event.clone());
    }

    by_developer
        .into_iter()
        .map(|(developer, events)| DeveloperTimeline::new(developer, events))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(dev: &str, repo: &str, day: u32) -> ContributionEvent {
        ContributionEvent::new(dev, repo, Utc.with_ymd_and_hms(2021, 5, day, 12, 0, 0).unwrap())
    }

    #[test]
    fn events_are_sorted_by_timestamp() {
        let timeline = DeveloperTimeline::new(
            "alice",
            vec![event("alice", "c", 3), event("alice", "a", 1), event("alice", "b", 2)],
        )
        .unwrap();
        let repos: Vec<_> = timeline.events().iter().map(|e| e.repository.as_str()).collect();
        assert_eq!(repos, vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let timeline = DeveloperTimeline::new(
            "alice",
            vec![event("alice", "second", 1), event("alice", "first", 1)],
        )
        .unwrap();
        assert_eq!(timeline.events()[0].repository, "second");
        assert_eq!(timeline.events()[1].repository, "first");
    }

    #[test]
    fn foreign_event_is_rejected() {
        let err = DeveloperTimeline::new("alice", vec![event("bob", "a", 1)]).unwrap_err();
        assert!(matches!(err, DevmoveError::InputValidation(_)));
    }

    #[test]
    fn empty_repository_is_rejected() {
        let err = DeveloperTimeline::new("alice", vec![event("alice", " ", 1)]).unwrap_err();
        assert!(err.to_string().contains("no repository"));
    }

    #[test]
    fn empty_developer_is_rejected() {
        let err = group_by_developer(&[event("", "a", 1)]).unwrap_err();
        assert!(matches!(err, DevmoveError::InputValidation(_)));
    }

    #[test]
    fn empty_input_gives_no_timelines() {
        assert!(group_by_developer(&[]).unwrap().is_empty());
    }
}
