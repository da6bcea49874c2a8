//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the lap screen to Dart as sync, envelope-returning functions.
//! - Keep error semantics simple: messages, never panics.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One lap screen exists per UI thread; calls from another thread see
//!   their own (initially closed) screen.

use laptimer_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    FileStoreOpener, LapView, LongTimeFormatter, ScreenController, ScreenError, ScreenPhase,
    SystemClock,
};
use log::warn;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::OnceLock;

const LAP_DB_FILE_NAME: &str = "laptimer.sqlite3";
const LAP_DB_PATH_ENV: &str = "LAPTIMER_DB_PATH";
static LAP_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

thread_local! {
    static LAP_SCREEN: RefCell<Option<LapScreen>> = const { RefCell::new(None) };
}

struct LapScreen {
    controller: ScreenController<FfiLapView>,
    view: Rc<RefCell<FfiLapView>>,
}

/// Latest rendered state, mirrored for Dart to poll.
#[derive(Debug, Default)]
struct FfiLapView {
    title: String,
    rows: Vec<String>,
    error: Option<ScreenError>,
}

impl LapView for FfiLapView {
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_rows(&mut self, rows: &[String]) {
        self.rows = rows.to_vec();
        self.error = None;
    }

    fn show_error(&mut self, error: &ScreenError) {
        self.error = Some(error.clone());
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Snapshot of the lap screen for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapScreenState {
    /// Whether the screen is open and bound to storage.
    pub active: bool,
    /// `"<count> laps"`; empty before the first render.
    pub title: String,
    /// Formatted lap times, most recent first.
    pub rows: Vec<String>,
    /// Latest error message, if any.
    pub error: Option<String>,
    /// Whether `error` should replace the list instead of a transient message.
    pub error_is_fatal: bool,
}

/// Result envelope for screen actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapActionResponse {
    /// Whether the action succeeded.
    pub ok: bool,
    /// Machine-readable error code (`storage_unavailable|write_failed|...`).
    pub error_code: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl LapActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            message: message.into(),
        }
    }

    fn from_error(error: &ScreenError) -> Self {
        Self::failure(error.code(), error.to_string())
    }
}

/// Opens the lap screen over the file database.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Idempotent while the screen is open.
#[flutter_rust_bridge::frb(sync)]
pub fn lap_screen_open() -> LapActionResponse {
    LAP_SCREEN.with(|slot| {
        let mut slot = slot.borrow_mut();
        let screen = slot.get_or_insert_with(new_lap_screen);
        match screen.controller.activate() {
            Ok(()) => LapActionResponse::success("Lap screen opened."),
            Err(err) => LapActionResponse::from_error(&err),
        }
    })
}

/// Records one lap, as if the "Lap" button was tapped.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Fails with `screen_closed` when the screen is not open.
/// - A write failure leaves the list unchanged and returns `write_failed`.
#[flutter_rust_bridge::frb(sync)]
pub fn lap_screen_tap() -> LapActionResponse {
    LAP_SCREEN.with(|slot| {
        let slot = slot.borrow();
        let Some(screen) = slot
            .as_ref()
            .filter(|screen| screen.controller.phase() == ScreenPhase::Active)
        else {
            return LapActionResponse::failure("screen_closed", "Lap screen is not open.");
        };

        screen.view.borrow_mut().error = None;
        screen.controller.tap();
        let outcome = screen.view.borrow().error.clone();
        match outcome {
            Some(err) => {
                warn!("event=ffi_tap module=ffi status=error error_code={}", err.code());
                LapActionResponse::from_error(&err)
            }
            None => LapActionResponse::success("Lap recorded."),
        }
    })
}

/// Returns the current rendered state of the lap screen.
#[flutter_rust_bridge::frb(sync)]
pub fn lap_screen_state() -> LapScreenState {
    LAP_SCREEN.with(|slot| match slot.borrow().as_ref() {
        Some(screen) => {
            let view = screen.view.borrow();
            LapScreenState {
                active: screen.controller.phase() == ScreenPhase::Active,
                title: view.title.clone(),
                rows: view.rows.clone(),
                error: view.error.as_ref().map(ToString::to_string),
                error_is_fatal: view.error.as_ref().is_some_and(ScreenError::is_fatal),
            }
        }
        None => LapScreenState {
            active: false,
            title: String::new(),
            rows: Vec::new(),
            error: None,
            error_is_fatal: false,
        },
    })
}

/// Closes the lap screen, releasing its subscriptions and database handle.
#[flutter_rust_bridge::frb(sync)]
pub fn lap_screen_close() -> LapActionResponse {
    LAP_SCREEN.with(|slot| {
        if slot.borrow_mut().take().is_some() {
            LapActionResponse::success("Lap screen closed.")
        } else {
            LapActionResponse::success("Lap screen was not open.")
        }
    })
}

fn new_lap_screen() -> LapScreen {
    let view = Rc::new(RefCell::new(FfiLapView::default()));
    let controller = ScreenController::new(
        FileStoreOpener::new(resolve_lap_db_path()),
        Rc::clone(&view),
        Rc::new(LongTimeFormatter::local()),
        Rc::new(SystemClock),
    );
    LapScreen { controller, view }
}

fn resolve_lap_db_path() -> PathBuf {
    LAP_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(LAP_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(LAP_DB_FILE_NAME)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, lap_screen_close, lap_screen_open, lap_screen_state,
        lap_screen_tap, ping, resolve_lap_db_path, LAP_DB_FILE_NAME, LAP_DB_PATH,
    };
    use std::path::PathBuf;

    /// Pins the process-wide DB path to a per-process test directory before
    /// any screen call can resolve the default one.
    fn use_test_db() -> PathBuf {
        LAP_DB_PATH
            .get_or_init(|| {
                let dir = std::env::temp_dir()
                    .join(format!("laptimer-ffi-tests-{}", std::process::id()));
                std::fs::create_dir_all(&dir).expect("create test db dir");
                dir.join(LAP_DB_FILE_NAME)
            })
            .clone()
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn screen_tests_never_touch_the_default_database() {
        let path = use_test_db();
        assert_eq!(resolve_lap_db_path(), path);
        assert_ne!(path, std::env::temp_dir().join(LAP_DB_FILE_NAME));
    }

    #[test]
    fn tap_before_open_reports_closed_screen() {
        use_test_db();
        let response = lap_screen_tap();
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("screen_closed"));
        assert!(!lap_screen_state().active);
    }

    #[test]
    fn open_tap_and_close_updates_state() {
        use_test_db();
        let opened = lap_screen_open();
        assert!(opened.ok, "{}", opened.message);
        let before = lap_screen_state();
        assert!(before.active);
        let count_before = before.rows.len();
        assert_eq!(before.title, format!("{count_before} laps"));

        let tapped = lap_screen_tap();
        assert!(tapped.ok, "{}", tapped.message);

        let after = lap_screen_state();
        assert_eq!(after.rows.len(), count_before + 1);
        assert_eq!(after.title, format!("{} laps", count_before + 1));
        assert!(after.error.is_none());

        assert!(lap_screen_close().ok);
        assert!(!lap_screen_state().active);
    }
}
