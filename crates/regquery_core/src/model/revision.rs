//! Immutable revisions and per-object revision histories.
//!
//! # Invariants
//! - Revisions of one key are strictly ordered by `effective_from` and never
//!   overlap.
//! - Only the last revision of a history is open (`effective_until = None`).
//! - `effective_until` is derived from the next revision's start; stored
//!   revisions are never rewritten.
//! - Intervals are half-open: `[effective_from, effective_until)`.

use crate::model::object::ObjectKey;
use crate::model::resource::ResourcePayload;
use chrono::{DateTime, Utc};

/// State an object is in during one revision interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionState {
    Live(ResourcePayload),
    /// Deletion marker: the object is logically absent from this revision's
    /// start until a later revision recreates it.
    Deleted,
}

/// One immutable version of an object, valid over a half-open interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub effective_from: DateTime<Utc>,
    /// `None` while this is the latest revision.
    pub effective_until: Option<DateTime<Utc>>,
    pub state: RevisionState,
}

impl Revision {
    /// Returns whether `instant` falls inside `[effective_from, effective_until)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.effective_from <= instant
            && self
                .effective_until
                .map_or(true, |effective_until| instant < effective_until)
    }

    pub fn is_open(&self) -> bool {
        self.effective_until.is_none()
    }

    pub fn is_deletion_marker(&self) -> bool {
        matches!(self.state, RevisionState::Deleted)
    }

    pub fn payload(&self) -> Option<&ResourcePayload> {
        match &self.state {
            RevisionState::Live(payload) => Some(payload),
            RevisionState::Deleted => None,
        }
    }
}

/// Ordered revision sequence for one key.
///
/// The history is materialized per `revisions()` call and can be iterated any
/// number of times; iteration order is ascending `effective_from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionHistory {
    key: ObjectKey,
    revisions: Vec<Revision>,
}

impl RevisionHistory {
    /// Builds a history from `(effective_from, state)` entries sorted by
    /// strictly increasing `effective_from`, closing each entry at the next
    /// one's start.
    pub(crate) fn from_ordered_entries(
        key: ObjectKey,
        entries: Vec<(DateTime<Utc>, RevisionState)>,
    ) -> Self {
        let boundaries: Vec<DateTime<Utc>> = entries.iter().map(|(from, _)| *from).collect();
        let revisions = entries
            .into_iter()
            .enumerate()
            .map(|(index, (effective_from, state))| Revision {
                effective_from,
                effective_until: boundaries.get(index + 1).copied(),
                state,
            })
            .collect();

        Self { key, revisions }
    }

    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Revision> {
        self.revisions.iter()
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Start of the open revision, i.e. the latest mutation instant.
    pub fn latest_boundary(&self) -> Option<DateTime<Utc>> {
        self.revisions.last().map(|revision| revision.effective_from)
    }
}

impl<'a> IntoIterator for &'a RevisionHistory {
    type Item = &'a Revision;
    type IntoIter = std::slice::Iter<'a, Revision>;

    fn into_iter(self) -> Self::IntoIter {
        self.revisions.iter()
    }
}

impl IntoIterator for RevisionHistory {
    type Item = Revision;
    type IntoIter = std::vec::IntoIter<Revision>;

    fn into_iter(self) -> Self::IntoIter {
        self.revisions.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{RevisionHistory, RevisionState};
    use crate::model::object::ObjectKey;
    use crate::model::resource::{HostResource, ResourcePayload};
    use chrono::{DateTime, Utc};

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn live(name: &str) -> RevisionState {
        RevisionState::Live(ResourcePayload::from(HostResource::new(name, "TheRegistrar")))
    }

    #[test]
    fn history_closes_each_revision_at_next_start() {
        let history = RevisionHistory::from_ordered_entries(
            ObjectKey::host("host-1"),
            vec![(at(10), live("host-1")), (at(20), RevisionState::Deleted)],
        );

        let revisions: Vec<_> = history.iter().collect();
        assert_eq!(revisions[0].effective_until, Some(at(20)));
        assert!(revisions[1].is_open());
        assert!(revisions[1].is_deletion_marker());
        assert_eq!(history.latest_boundary(), Some(at(20)));
    }

    #[test]
    fn contains_is_left_closed_right_open() {
        let history = RevisionHistory::from_ordered_entries(
            ObjectKey::host("host-1"),
            vec![(at(10), live("host-1")), (at(20), live("host-1"))],
        );
        let first = history.iter().next().unwrap();

        assert!(!first.contains(at(9)));
        assert!(first.contains(at(10)));
        assert!(first.contains(at(19)));
        assert!(!first.contains(at(20)));
    }

    #[test]
    fn history_iteration_is_restartable() {
        let history = RevisionHistory::from_ordered_entries(
            ObjectKey::host("host-1"),
            vec![(at(10), live("host-1")), (at(20), live("host-1"))],
        );

        assert_eq!(history.iter().count(), 2);
        assert_eq!((&history).into_iter().count(), 2);
    }
}
