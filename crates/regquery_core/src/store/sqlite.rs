//! SQLite-backed revision store.
//!
//! # Invariants
//! - Every mutation runs in one `IMMEDIATE` transaction: boundary check and
//!   insert see the same snapshot, and writers of one database serialize.
//! - Instants are stored as nanoseconds since the Unix epoch; instants
//!   outside what an `i64` of nanoseconds can hold are refused, never
//!   rounded.
//! - Read paths reject invalid persisted state instead of masking it.

use super::{RevisionStore, StoreError, StoreResult};
use crate::db::migrations::latest_version;
use crate::model::object::{ObjectKey, ObjectKind};
use crate::model::resource::ResourcePayload;
use crate::model::revision::{RevisionHistory, RevisionState};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, Row, Transaction, TransactionBehavior};

/// SQLite-backed revision store over a migrated connection.
pub struct SqliteRevisionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRevisionStore<'conn> {
    /// Creates a store from a connection returned by `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RevisionStore for SqliteRevisionStore<'_> {
    fn append(
        &self,
        key: &ObjectKey,
        state: RevisionState,
        effective_from: DateTime<Utc>,
    ) -> StoreResult<()> {
        let from_nanos = effective_from
            .timestamp_nanos_opt()
            .ok_or(StoreError::InstantOutOfRange(effective_from))?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(latest) = latest_boundary_in_tx(&tx, key)? {
            if from_nanos <= latest {
                return Err(StoreError::Conflict {
                    key: key.clone(),
                    effective_from,
                    latest: DateTime::from_timestamp_nanos(latest),
                });
            }
        }

        let (is_deleted, payload_json) = match &state {
            RevisionState::Live(payload) => (0_i64, Some(serde_json::to_string(payload)?)),
            RevisionState::Deleted => (1_i64, None),
        };

        let inserted = tx.execute(
            "INSERT INTO revisions (
                kind,
                unique_id,
                effective_from,
                is_deleted,
                payload
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                key.kind.as_str(),
                key.unique_id.as_str(),
                from_nanos,
                is_deleted,
                payload_json,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_constraint_violation(&err) => {
                return Err(StoreError::Conflict {
                    key: key.clone(),
                    effective_from,
                    latest: effective_from,
                });
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit()?;
        Ok(())
    }

    fn revisions(&self, key: &ObjectKey) -> StoreResult<RevisionHistory> {
        let mut stmt = self.conn.prepare(
            "SELECT
                effective_from,
                is_deleted,
                payload
             FROM revisions
             WHERE kind = ?1
               AND unique_id = ?2
             ORDER BY effective_from ASC;",
        )?;

        let mut rows = stmt.query(params![key.kind.as_str(), key.unique_id.as_str()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_revision_row(row, key)?);
        }

        Ok(RevisionHistory::from_ordered_entries(key.clone(), entries))
    }
}

fn latest_boundary_in_tx(tx: &Transaction<'_>, key: &ObjectKey) -> StoreResult<Option<i64>> {
    let latest: Option<i64> = tx.query_row(
        "SELECT MAX(effective_from)
         FROM revisions
         WHERE kind = ?1
           AND unique_id = ?2;",
        params![key.kind.as_str(), key.unique_id.as_str()],
        |row| row.get(0),
    )?;
    Ok(latest)
}

fn parse_revision_row(
    row: &Row<'_>,
    key: &ObjectKey,
) -> StoreResult<(DateTime<Utc>, RevisionState)> {
    let effective_from = DateTime::from_timestamp_nanos(row.get("effective_from")?);

    let state = match row.get::<_, i64>("is_deleted")? {
        1 => RevisionState::Deleted,
        0 => {
            let payload_text: Option<String> = row.get("payload")?;
            let payload_text = payload_text.ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "live revision of {key} at {} has no payload",
                    effective_from.to_rfc3339()
                ))
            })?;
            let payload: ResourcePayload = serde_json::from_str(&payload_text).map_err(|err| {
                StoreError::InvalidData(format!("unreadable payload for {key}: {err}"))
            })?;
            if payload.key() != *key {
                return Err(StoreError::InvalidData(format!(
                    "payload for {} stored under {key}",
                    payload.key()
                )));
            }
            RevisionState::Live(payload)
        }
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_deleted value `{other}` in revisions.is_deleted"
            )));
        }
    };

    Ok((effective_from, state))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SqliteRevisionStore;
    use crate::db::open_db_in_memory;
    use crate::model::object::ObjectKey;
    use crate::store::{RevisionStore, StoreError};
    use chrono::{DateTime, Utc};
    use rusqlite::Connection;

    #[test]
    fn unmigrated_connection_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteRevisionStore::try_new(&conn)
            .err()
            .expect("bare connection must be rejected");
        assert!(matches!(
            err,
            StoreError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn corrupt_payload_is_reported_not_masked() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO revisions (kind, unique_id, effective_from, is_deleted, payload)
             VALUES ('host', 'ns1.example.com', 10, 0, 'not json');",
            [],
        )
        .unwrap();

        let store = SqliteRevisionStore::try_new(&conn).unwrap();
        let err = store
            .revisions(&ObjectKey::host("ns1.example.com"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn instants_round_trip_at_nanosecond_precision() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRevisionStore::try_new(&conn).unwrap();
        let key = ObjectKey::host("ns1.example.com");
        let instant = DateTime::from_timestamp_nanos(1_700_000_000_123_456_789);

        store.mark_deleted(&key, instant).unwrap();

        let history = store.revisions(&key).unwrap();
        assert_eq!(history.latest_boundary(), Some(instant));
    }

    #[test]
    fn instants_beyond_nanosecond_range_are_refused() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteRevisionStore::try_new(&conn).unwrap();
        let key = ObjectKey::host("ns1.example.com");
        let far_future = DateTime::parse_from_rfc3339("2300-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let err = store.mark_deleted(&key, far_future).unwrap_err();
        assert!(matches!(err, StoreError::InstantOutOfRange(instant) if instant == far_future));
        assert!(store.revisions(&key).unwrap().is_empty());
    }
}
