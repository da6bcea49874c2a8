//! Core domain logic for Laptimer.
//! This crate is the single source of truth for lap recording and the lap
//! screen's derived state; UI hosts only render what it emits.

pub mod db;
pub mod format;
pub mod logging;
pub mod model;
pub mod reactive;
pub mod repo;
pub mod screen;
pub mod store;

pub use db::{DbError, DbResult};
pub use format::{FormatError, LongTimeFormatter, TimeFormatter, ZoneSource};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::clock::{Clock, SystemClock};
pub use model::lap::{Lap, LapId, StoredLap, Timestamp};
pub use reactive::{DisposeBag, Observable, Subscription};
pub use repo::lap_repo::{LapRepository, RepoError, RepoResult, SqliteLapRepository};
pub use screen::{
    rows_for, title_for, FileStoreOpener, LapView, ScreenController, ScreenError, ScreenPhase,
    StoreOpener, TapSource,
};
pub use store::{LapEmission, LapStore, ObserveError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
