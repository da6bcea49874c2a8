use chrono::{TimeZone, Utc};
use laptimer_core::db::open_db_in_memory;
use laptimer_core::{Lap, LapRepository, RepoError, SqliteLapRepository};
use rusqlite::Connection;

fn lap_at(secs: i64, millis: u32) -> Lap {
    Lap::at(
        Utc.timestamp_opt(secs, millis * 1_000_000)
            .single()
            .unwrap(),
    )
}

#[test]
fn insert_and_list_roundtrip_preserves_time() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLapRepository::try_new(&conn).unwrap();

    let lap = lap_at(1_470_994_200, 250);
    let id = repo.insert_lap(&lap).unwrap();

    let laps = repo.list_laps().unwrap();
    assert_eq!(laps.len(), 1);
    assert_eq!(laps[0].id, id);
    assert_eq!(laps[0].time, lap.time);
    assert_eq!(laps[0].lap(), lap);
}

#[test]
fn list_returns_insertion_order_even_when_times_go_backwards() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLapRepository::try_new(&conn).unwrap();

    let later = lap_at(2_000, 0);
    let earlier = lap_at(1_000, 0);
    let first_id = repo.insert_lap(&later).unwrap();
    let second_id = repo.insert_lap(&earlier).unwrap();

    let laps = repo.list_laps().unwrap();
    assert_eq!(
        laps.iter().map(|lap| lap.id).collect::<Vec<_>>(),
        vec![first_id, second_id]
    );
    assert!(second_id > first_id);
}

#[test]
fn identical_times_get_distinct_identities() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLapRepository::try_new(&conn).unwrap();

    let lap = lap_at(1_000, 0);
    let a = repo.insert_lap(&lap).unwrap();
    let b = repo.insert_lap(&lap).unwrap();

    assert_ne!(a, b);
    assert_eq!(repo.count_laps().unwrap(), 2);
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteLapRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("laps table")));
}

#[test]
fn out_of_range_persisted_time_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO laps (time_ms) VALUES (?1);",
        [i64::MAX],
    )
    .unwrap();
    let repo = SqliteLapRepository::new(&conn);

    let err = repo.list_laps().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
