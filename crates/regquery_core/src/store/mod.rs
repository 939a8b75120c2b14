//! Versioned object store contracts and implementations.
//!
//! # Responsibility
//! - Append revisions atomically per object key.
//! - Hand out ordered revision histories to the resolver and tooling.
//!
//! # Invariants
//! - Mutation time never moves backward for one key: a new revision must
//!   start strictly after the latest known boundary, else `Conflict`.
//! - Revisions are append-only; nothing is physically deleted.
//! - Concurrent mutations of one key serialize; the loser gets `Conflict`.
//!   Mutations of different keys never contend.

use crate::db::DbError;
use crate::model::object::ObjectKey;
use crate::model::resource::ResourcePayload;
use crate::model::revision::{RevisionHistory, RevisionState};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::time::Instant;
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryRevisionStore;
pub use sqlite::SqliteRevisionStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from revision store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mutation did not strictly follow the latest boundary of its key,
    /// usually because a concurrent writer got there first.
    #[error(
        "conflicting mutation of {key}: effective_from {effective_from} does not follow latest boundary {latest}"
    )]
    Conflict {
        key: ObjectKey,
        effective_from: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    #[error("payload for {payload_key} cannot be stored under {key}")]
    PayloadMismatch {
        key: ObjectKey,
        payload_key: ObjectKey,
    },
    /// Connection schema is not at the expected migrated version.
    #[error("revision store requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// The instant cannot be persisted without losing precision.
    #[error("instant {0} is outside the storable range")]
    InstantOutOfRange(DateTime<Utc>),
    #[error("invalid persisted revision data: {0}")]
    InvalidData(String),
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Transactional keyed store of object revisions.
///
/// Implementors provide `append` and `revisions`; `put` and `mark_deleted`
/// are the mutation entry points callers use.
pub trait RevisionStore {
    /// Atomically closes the open revision of `key` (if any) at
    /// `effective_from` and opens a new one in `state`.
    fn append(
        &self,
        key: &ObjectKey,
        state: RevisionState,
        effective_from: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Returns the revisions of `key` ordered by `effective_from`.
    ///
    /// Never-mutated keys yield an empty history.
    fn revisions(&self, key: &ObjectKey) -> StoreResult<RevisionHistory>;

    /// Records `payload` as the state of `key` from `effective_from` on.
    fn put(
        &self,
        key: &ObjectKey,
        payload: &ResourcePayload,
        effective_from: DateTime<Utc>,
    ) -> StoreResult<()> {
        let payload_key = payload.key();
        if payload_key != *key {
            return Err(StoreError::PayloadMismatch {
                key: key.clone(),
                payload_key,
            });
        }

        logged_mutation("revision_put", key, effective_from, || {
            self.append(key, RevisionState::Live(payload.clone()), effective_from)
        })
    }

    /// Records a deletion marker for `key` from `effective_from` on.
    fn mark_deleted(&self, key: &ObjectKey, effective_from: DateTime<Utc>) -> StoreResult<()> {
        logged_mutation("revision_delete", key, effective_from, || {
            self.append(key, RevisionState::Deleted, effective_from)
        })
    }
}

fn logged_mutation(
    event: &str,
    key: &ObjectKey,
    effective_from: DateTime<Utc>,
    mutate: impl FnOnce() -> StoreResult<()>,
) -> StoreResult<()> {
    let started_at = Instant::now();
    let result = mutate();
    match &result {
        Ok(()) => info!(
            "event={event} module=store status=ok kind={} unique_id={} effective_from={} duration_ms={}",
            key.kind,
            key.unique_id,
            effective_from.to_rfc3339(),
            started_at.elapsed().as_millis()
        ),
        Err(StoreError::Conflict { latest, .. }) => warn!(
            "event={event} module=store status=conflict kind={} unique_id={} effective_from={} latest={} duration_ms={}",
            key.kind,
            key.unique_id,
            effective_from.to_rfc3339(),
            latest.to_rfc3339(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=store status=error kind={} unique_id={} duration_ms={} error={}",
            key.kind,
            key.unique_id,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}
