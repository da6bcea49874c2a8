//! Lap repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide append and read APIs over canonical `laps` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Listing returns laps in insertion order (`id ASC`).
//! - Rows with out-of-range timestamps surface as `InvalidData`.

use crate::db::DbError;
use crate::model::lap::{timestamp_from_millis, Lap, LapId, StoredLap};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const LAP_SELECT_SQL: &str = "SELECT id, time_ms FROM laps";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for lap persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted lap data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the append-only lap log.
pub trait LapRepository {
    fn insert_lap(&self, lap: &Lap) -> RepoResult<LapId>;
    fn list_laps(&self) -> RepoResult<Vec<StoredLap>>;
    fn count_laps(&self) -> RepoResult<u64>;
}

/// SQLite-backed lap repository.
pub struct SqliteLapRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLapRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a repository after checking that the `laps` table exists.
    ///
    /// Guards against connections that were not opened through
    /// [`crate::db::open_db`] and therefore never ran migrations.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'laps'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::InvalidData(
                "laps table is missing; run migrations first".to_string(),
            ));
        }
        Ok(Self::new(conn))
    }
}

impl LapRepository for SqliteLapRepository<'_> {
    fn insert_lap(&self, lap: &Lap) -> RepoResult<LapId> {
        self.conn.execute(
            "INSERT INTO laps (time_ms) VALUES (?1);",
            params![lap.epoch_ms()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_laps(&self) -> RepoResult<Vec<StoredLap>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{LAP_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut laps = Vec::new();

        while let Some(row) = rows.next()? {
            laps.push(parse_lap_row(row)?);
        }

        Ok(laps)
    }

    fn count_laps(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM laps;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative lap count `{count}`")))
    }
}

fn parse_lap_row(row: &Row<'_>) -> RepoResult<StoredLap> {
    let id: LapId = row.get("id")?;
    let time_ms: i64 = row.get("time_ms")?;
    let time = timestamp_from_millis(time_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "time_ms value `{time_ms}` out of range in laps.id={id}"
        ))
    })?;
    Ok(StoredLap { id, time })
}
