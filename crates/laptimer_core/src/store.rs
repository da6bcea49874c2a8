//! Lap store with live change observation.
//!
//! # Responsibility
//! - Own the SQLite connection holding the lap log.
//! - Append laps and re-emit the full collection to observers on change.
//!
//! # Invariants
//! - A new observer receives the current collection before `observe_all`
//!   returns.
//! - Every change to a `laps` row made through this connection produces
//!   exactly one further emission, in commit order. Changes made by `insert`
//!   are snapshotted right after the write, so each emission reflects the
//!   collection as of that change.
//! - Read failures reach observers as `ObserveError::StorageUnavailable`;
//!   the observation itself stays subscribed.
//! - Single-threaded: `LapStore` is neither `Send` nor `Sync`.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::lap::{Lap, LapId, StoredLap};
use crate::reactive::{Observable, Subscription};
use crate::repo::lap_repo::{LapRepository, RepoError, RepoResult, SqliteLapRepository};
use log::{debug, info, warn};
use rusqlite::hooks::Action;
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const LAPS_TABLE: &str = "laps";

/// Error delivered to observers in place of a snapshot.
#[derive(Debug, Clone)]
pub enum ObserveError {
    /// The collection could not be read from storage.
    StorageUnavailable(Rc<RepoError>),
}

impl Display for ObserveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "lap storage unavailable: {err}"),
        }
    }
}

impl Error for ObserveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err.as_ref()),
        }
    }
}

/// One element of the observed sequence: the full collection in insertion
/// order, or the reason it could not be read.
pub type LapEmission = Result<Vec<StoredLap>, ObserveError>;

/// Append-only lap log backed by SQLite.
pub struct LapStore {
    conn: Connection,
    changes: Observable<LapEmission>,
    pending: Arc<AtomicUsize>,
    queued: RefCell<VecDeque<LapEmission>>,
    notifying: Cell<bool>,
}

impl LapStore {
    /// Opens (or creates) a lap database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a fresh in-memory lap database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        let pending = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pending);
        conn.update_hook(Some(
            move |_action: Action, _db: &str, table: &str, _rowid: i64| {
                if table == LAPS_TABLE {
                    counter.fetch_add(1, Ordering::AcqRel);
                }
            },
        ));

        Self {
            conn,
            changes: Observable::new(),
            pending,
            queued: RefCell::new(VecDeque::new()),
            notifying: Cell::new(false),
        }
    }

    /// Subscribes to the full lap collection.
    ///
    /// `callback` runs once immediately with the current collection, then
    /// once per change until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription stops observation"]
    pub fn observe_all(&self, mut callback: impl FnMut(&LapEmission) + 'static) -> Subscription {
        callback(&self.read_emission());
        let subscription = self.changes.subscribe(callback);
        debug!(
            "event=store_observe module=store status=ok observers={}",
            self.changes.subscriber_count()
        );
        subscription
    }

    /// Appends a lap and notifies observers before returning.
    pub fn insert(&self, lap: &Lap) -> RepoResult<LapId> {
        let id = match SqliteLapRepository::new(&self.conn).insert_lap(lap) {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    "event=lap_insert module=store status=error time_ms={} error={}",
                    lap.epoch_ms(),
                    err
                );
                return Err(err);
            }
        };
        info!(
            "event=lap_insert module=store status=ok lap_id={} time_ms={}",
            id,
            lap.epoch_ms()
        );
        self.capture_changes();
        self.pump();
        Ok(id)
    }

    /// Reads the current collection in insertion order.
    pub fn snapshot(&self) -> RepoResult<Vec<StoredLap>> {
        SqliteLapRepository::new(&self.conn).list_laps()
    }

    /// Number of persisted laps.
    pub fn count(&self) -> RepoResult<u64> {
        SqliteLapRepository::new(&self.conn).count_laps()
    }

    /// Delivers notifications for changes not yet announced.
    ///
    /// `insert` pumps on its own. Call this after writing through
    /// [`LapStore::connection`] directly. Returns the number of emission
    /// emissions delivered; a call made from inside an observer callback
    /// returns `0` and its changes are delivered after the current emission.
    ///
    /// Each changed row counts as one change. Changes made outside `insert`
    /// are snapshotted when `pump` runs, so a multi-row statement yields one
    /// emission per row, all showing the collection after the statement.
    ///
    /// SQLite skips the update hook for an unqualified `DELETE FROM laps`
    /// (truncate optimization); such writes are not observed.
    pub fn pump(&self) -> usize {
        self.capture_changes();
        if self.notifying.get() {
            return 0;
        }
        let _guard = NotifyingGuard::enter(&self.notifying);

        let mut rounds = 0;
        loop {
            let next = self.queued.borrow_mut().pop_front();
            let Some(emission) = next else {
                break;
            };
            let delivered = self.changes.emit(&emission);
            rounds += 1;
            debug!(
                "event=store_emit module=store status={} observers={} round={}",
                if emission.is_ok() { "ok" } else { "error" },
                delivered,
                rounds
            );
        }
        rounds
    }

    /// Turns changes counted by the update hook into queued emissions.
    fn capture_changes(&self) {
        let changes = self.pending.swap(0, Ordering::AcqRel);
        if changes == 0 {
            return;
        }
        let emission = self.read_emission();
        let mut queued = self.queued.borrow_mut();
        queued.extend(std::iter::repeat(emission).take(changes));
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.changes.subscriber_count()
    }

    /// Underlying connection, for maintenance and diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn read_emission(&self) -> LapEmission {
        self.snapshot().map_err(|err| {
            warn!("event=store_read module=store status=error error={err}");
            ObserveError::StorageUnavailable(Rc::new(err))
        })
    }
}

impl Drop for LapStore {
    fn drop(&mut self) {
        debug!(
            "event=store_close module=store status=ok observers={}",
            self.changes.subscriber_count()
        );
    }
}

struct NotifyingGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> NotifyingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
