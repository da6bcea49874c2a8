use chrono::{TimeZone, Utc};
use laptimer_core::{Lap, LapEmission, LapStore, ObserveError, StoredLap};
use std::cell::RefCell;
use std::rc::Rc;

fn lap_at(secs: i64) -> Lap {
    Lap::at(Utc.timestamp_opt(secs, 0).single().unwrap())
}

type Seen = Rc<RefCell<Vec<Result<Vec<StoredLap>, String>>>>;

fn observe(store: &LapStore) -> (Seen, laptimer_core::Subscription) {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = store.observe_all(move |emission: &LapEmission| {
        sink.borrow_mut()
            .push(emission.clone().map_err(|err| err.to_string()));
    });
    (seen, subscription)
}

#[test]
fn subscription_emits_current_collection_immediately() {
    let store = LapStore::open_in_memory().unwrap();
    store.insert(&lap_at(10)).unwrap();

    let (seen, _subscription) = observe(&store);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].as_ref().unwrap().len(), 1);
}

#[test]
fn every_insert_emits_the_full_collection() {
    let store = LapStore::open_in_memory().unwrap();
    let (seen, _subscription) = observe(&store);

    store.insert(&lap_at(10)).unwrap();
    store.insert(&lap_at(20)).unwrap();

    let sizes = seen
        .borrow()
        .iter()
        .map(|emission| emission.as_ref().unwrap().len())
        .collect::<Vec<_>>();
    assert_eq!(sizes, vec![0, 1, 2]);
}

#[test]
fn resubscribing_without_changes_yields_same_snapshot() {
    let store = LapStore::open_in_memory().unwrap();
    store.insert(&lap_at(10)).unwrap();
    store.insert(&lap_at(20)).unwrap();

    let (first, first_subscription) = observe(&store);
    drop(first_subscription);
    let (second, _second_subscription) = observe(&store);

    assert_eq!(first.borrow()[0], second.borrow()[0]);
}

#[test]
fn dropped_subscription_receives_nothing_further() {
    let store = LapStore::open_in_memory().unwrap();
    let (seen, subscription) = observe(&store);
    assert_eq!(store.observer_count(), 1);

    subscription.cancel();
    store.insert(&lap_at(10)).unwrap();

    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(store.observer_count(), 0);
}

#[test]
fn external_deletes_are_observed_after_pump() {
    let store = LapStore::open_in_memory().unwrap();
    let first = store.insert(&lap_at(10)).unwrap();
    store.insert(&lap_at(20)).unwrap();
    let (seen, _subscription) = observe(&store);

    store
        .connection()
        .execute("DELETE FROM laps WHERE id = ?1;", [first])
        .unwrap();
    assert_eq!(store.pump(), 1);

    let seen = seen.borrow();
    let latest = seen.last().unwrap().as_ref().unwrap();
    assert_eq!(latest.len(), 1);
    assert_ne!(latest[0].id, first);
}

#[test]
fn failed_insert_does_not_emit() {
    let store = LapStore::open_in_memory().unwrap();
    let (seen, _subscription) = observe(&store);
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER reject_all BEFORE INSERT ON laps
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();

    let err = store.insert(&lap_at(10)).unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn read_failure_reaches_observer_as_storage_unavailable() {
    let store = LapStore::open_in_memory().unwrap();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let _subscription = store.observe_all(move |emission| {
        if let Err(err) = emission {
            sink.borrow_mut().push(err.clone());
        }
    });

    store
        .connection()
        .execute_batch("INSERT INTO laps (time_ms) VALUES (9223372036854775807);")
        .unwrap();
    store.pump();

    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ObserveError::StorageUnavailable(_)));
    assert_eq!(store.observer_count(), 1);
}

#[test]
fn laps_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("laps.sqlite3");

    let store = LapStore::open(&path).unwrap();
    let lap = lap_at(1_470_994_200);
    store.insert(&lap).unwrap();
    drop(store);

    let reopened = LapStore::open(&path).unwrap();
    let laps = reopened.snapshot().unwrap();
    assert_eq!(laps.len(), 1);
    assert_eq!(laps[0].time, lap.time);
    assert_eq!(reopened.count().unwrap(), 1);
}
