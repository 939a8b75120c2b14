//! In-process revision arena.
//!
//! Each key owns an append-only entry vector behind its own lock, so
//! mutations of different keys never contend. Used by offline tooling and
//! tests that do not need durability.

use super::{RevisionStore, StoreError, StoreResult};
use crate::model::object::ObjectKey;
use crate::model::revision::{RevisionHistory, RevisionState};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

type RevisionEntries = Vec<(DateTime<Utc>, RevisionState)>;

/// Thread-safe in-memory revision store.
#[derive(Debug, Default)]
pub struct MemoryRevisionStore {
    objects: RwLock<HashMap<ObjectKey, Arc<RwLock<RevisionEntries>>>>,
}

impl MemoryRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys that have at least one revision.
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    fn slot(&self, key: &ObjectKey) -> Arc<RwLock<RevisionEntries>> {
        if let Some(slot) = self.objects.read().get(key) {
            return Arc::clone(slot);
        }
        Arc::clone(self.objects.write().entry(key.clone()).or_default())
    }
}

impl RevisionStore for MemoryRevisionStore {
    fn append(
        &self,
        key: &ObjectKey,
        state: RevisionState,
        effective_from: DateTime<Utc>,
    ) -> StoreResult<()> {
        let slot = self.slot(key);
        let mut entries = slot.write();

        if let Some((latest, _)) = entries.last() {
            if effective_from <= *latest {
                return Err(StoreError::Conflict {
                    key: key.clone(),
                    effective_from,
                    latest: *latest,
                });
            }
        }

        entries.push((effective_from, state));
        Ok(())
    }

    fn revisions(&self, key: &ObjectKey) -> StoreResult<RevisionHistory> {
        let entries = match self.objects.read().get(key) {
            Some(slot) => slot.read().clone(),
            None => Vec::new(),
        };
        Ok(RevisionHistory::from_ordered_entries(key.clone(), entries))
    }
}
