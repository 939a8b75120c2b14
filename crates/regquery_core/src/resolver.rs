//! Point-in-time resolution of registry objects.
//!
//! # Responsibility
//! - Answer "what did object X look like at instant T" from its revision
//!   history.
//! - Be the only path by which flows, rendering and tooling decide whether
//!   an object exists at an instant.
//!
//! # Invariants
//! - Intervals are half-open: an instant on a boundary belongs to the
//!   revision that starts there.
//! - Instants before the first revision, and any instant inside a deletion
//!   marker's interval, resolve to `NotFound`.
//! - Instants past the last mutation resolve to the open revision; objects
//!   are assumed stable absent further mutation.
//! - Store failures are propagated, never folded into `NotFound`.

use crate::model::object::ObjectKey;
use crate::model::resource::ResourcePayload;
use crate::model::revision::{Revision, RevisionState};
use crate::store::{RevisionStore, StoreResult};
use chrono::{DateTime, Utc};

/// Instant a query is evaluated at. Created per query, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionContext {
    pub as_of: DateTime<Utc>,
}

impl ResolutionContext {
    pub fn at(as_of: DateTime<Utc>) -> Self {
        Self { as_of }
    }
}

/// Outcome of resolving one key at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Revision),
    NotFound,
}

impl Resolution {
    pub fn payload(&self) -> Option<&ResourcePayload> {
        match self {
            Self::Found(revision) => revision.payload(),
            Self::NotFound => None,
        }
    }

    pub fn into_payload(self) -> Option<ResourcePayload> {
        match self {
            Self::Found(Revision {
                state: RevisionState::Live(payload),
                ..
            }) => Some(payload),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Stateless resolver over a shared revision store.
pub struct ResourceResolver<'s, S: RevisionStore + ?Sized> {
    store: &'s S,
}

impl<S: RevisionStore + ?Sized> Clone for ResourceResolver<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: RevisionStore + ?Sized> Copy for ResourceResolver<'_, S> {}

impl<'s, S: RevisionStore + ?Sized> ResourceResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Resolves `key` at `as_of`.
    ///
    /// `Found` always carries a live revision; deletion markers resolve to
    /// `NotFound`.
    pub fn resolve(&self, key: &ObjectKey, as_of: DateTime<Utc>) -> StoreResult<Resolution> {
        let history = self.store.revisions(key)?;
        let containing = history
            .into_iter()
            .take_while(|revision| revision.effective_from <= as_of)
            .find(|revision| revision.contains(as_of));

        Ok(match containing {
            Some(revision) if !revision.is_deletion_marker() => Resolution::Found(revision),
            _ => Resolution::NotFound,
        })
    }

    /// Resolves `key` and returns only the payload.
    pub fn resolve_payload(
        &self,
        key: &ObjectKey,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Option<ResourcePayload>> {
        Ok(self.resolve(key, as_of)?.into_payload())
    }
}
