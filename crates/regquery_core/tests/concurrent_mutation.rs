use chrono::{DateTime, Utc};
use regquery_core::db::open_db;
use regquery_core::{
    HostResource, MemoryRevisionStore, ObjectKey, ResourcePayload, ResourceResolver,
    RevisionStore, SqliteRevisionStore, StoreError, StoreResult,
};
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;

fn at(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap()
}

fn host(sponsor: &str) -> ResourcePayload {
    ResourcePayload::from(HostResource::new("ns1.example.com", sponsor))
}

fn split_outcomes(outcomes: Vec<StoreResult<()>>) -> (usize, usize) {
    let accepted = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(StoreError::Conflict { .. })))
        .count();
    (accepted, conflicts)
}

#[test]
fn racing_sqlite_writers_at_same_instant_admit_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");
    drop(open_db(&path).unwrap());

    let key = ObjectKey::host("ns1.example.com");
    let barrier = Arc::new(Barrier::new(2));
    let writers: Vec<_> = ["RegistrarA", "RegistrarB"]
        .into_iter()
        .map(|sponsor| {
            let path = path.clone();
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let store = SqliteRevisionStore::try_new(&conn).unwrap();
                barrier.wait();
                store.put(&key, &host(sponsor), at(100))
            })
        })
        .collect();
    let outcomes: Vec<_> = writers
        .into_iter()
        .map(|writer| writer.join().unwrap())
        .collect();

    assert_eq!(split_outcomes(outcomes), (1, 1));

    let conn = open_db(&path).unwrap();
    let store = SqliteRevisionStore::try_new(&conn).unwrap();
    let history = store.revisions(&key).unwrap();
    assert_eq!(history.len(), 1);
    assert!(ResourceResolver::new(&store)
        .resolve(&key, at(100))
        .unwrap()
        .is_found());
}

fn put_from_own_connection(path: &Path, sponsor: &str, millis: i64) -> StoreResult<()> {
    let conn = open_db(path).unwrap();
    let store = SqliteRevisionStore::try_new(&conn).unwrap();
    store.put(&ObjectKey::host("ns1.example.com"), &host(sponsor), at(millis))
}

fn sqlite_history_starts(path: &Path) -> Vec<DateTime<Utc>> {
    let conn = open_db(path).unwrap();
    let store = SqliteRevisionStore::try_new(&conn).unwrap();
    store
        .revisions(&ObjectKey::host("ns1.example.com"))
        .unwrap()
        .iter()
        .map(|revision| revision.effective_from)
        .collect()
}

#[test]
fn sqlite_writer_behind_a_committed_later_instant_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");
    drop(open_db(&path).unwrap());

    let (committed_tx, committed_rx) = mpsc::channel();
    let later_path = path.clone();
    let later = thread::spawn(move || {
        let outcome = put_from_own_connection(&later_path, "RegistrarLate", 200);
        committed_tx.send(()).unwrap();
        outcome
    });
    let earlier_path = path.clone();
    let earlier = thread::spawn(move || {
        committed_rx.recv().unwrap();
        put_from_own_connection(&earlier_path, "RegistrarEarly", 100)
    });

    let later = later.join().unwrap();
    let earlier = earlier.join().unwrap();
    assert!(matches!(earlier, Err(StoreError::Conflict { latest, .. }) if latest == at(200)));
    assert_eq!(split_outcomes(vec![later, earlier]), (1, 1));
    assert_eq!(sqlite_history_starts(&path), vec![at(200)]);
}

#[test]
fn racing_sqlite_writers_at_out_of_order_instants_keep_history_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");
    drop(open_db(&path).unwrap());

    let barrier = Arc::new(Barrier::new(2));
    let writers: Vec<_> = [("RegistrarLate", 200_i64), ("RegistrarEarly", 100)]
        .into_iter()
        .map(|(sponsor, millis)| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let store = SqliteRevisionStore::try_new(&conn).unwrap();
                barrier.wait();
                store.put(&ObjectKey::host("ns1.example.com"), &host(sponsor), at(millis))
            })
        })
        .collect();
    let mut outcomes = writers.into_iter().map(|writer| writer.join().unwrap());
    let later = outcomes.next().unwrap();
    let earlier = outcomes.next().unwrap();

    // The later instant always lands; the earlier one only if it committed first.
    assert!(later.is_ok());
    match earlier {
        Ok(()) => assert_eq!(sqlite_history_starts(&path), vec![at(100), at(200)]),
        Err(StoreError::Conflict { latest, .. }) => {
            assert_eq!(latest, at(200));
            assert_eq!(sqlite_history_starts(&path), vec![at(200)]);
        }
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn racing_memory_writers_at_same_instant_admit_exactly_one() {
    let store = Arc::new(MemoryRevisionStore::new());
    let key = ObjectKey::host("ns1.example.com");
    let barrier = Arc::new(Barrier::new(4));

    let writers: Vec<_> = (0..4)
        .map(|index| {
            let store = Arc::clone(&store);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.put(&key, &host(&format!("Registrar{index}")), at(100))
            })
        })
        .collect();
    let outcomes: Vec<_> = writers
        .into_iter()
        .map(|writer| writer.join().unwrap())
        .collect();

    assert_eq!(split_outcomes(outcomes), (1, 3));
    assert_eq!(store.revisions(&key).unwrap().len(), 1);
}

#[test]
fn concurrent_history_stays_strictly_ordered() {
    let store = Arc::new(MemoryRevisionStore::new());
    let key = ObjectKey::host("ns1.example.com");

    let writers: Vec<_> = (0..4_i64)
        .map(|writer| {
            let store = Arc::clone(&store);
            let key = key.clone();
            thread::spawn(move || {
                for step in 0..50_i64 {
                    let _ = store.put(&key, &host("RegistrarA"), at(step * 4 + writer));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let history = store.revisions(&key).unwrap();
    assert!(!history.is_empty());
    let starts: Vec<_> = history.iter().map(|revision| revision.effective_from).collect();
    assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(history
        .iter()
        .zip(history.iter().skip(1))
        .all(|(earlier, later)| earlier.effective_until == Some(later.effective_from)));
}

#[test]
fn writers_on_different_keys_do_not_conflict() {
    let store = Arc::new(MemoryRevisionStore::new());

    let writers: Vec<_> = (0..8)
        .map(|index| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let name = format!("ns{index}.example.com");
                let payload = ResourcePayload::from(HostResource::new(name.as_str(), "RegistrarA"));
                store.put(&ObjectKey::host(name.as_str()), &payload, at(100))
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap().unwrap();
    }
    assert_eq!(store.object_count(), 8);
}
