//! Lap screen controller and its host-facing contracts.

use crate::db::{DbError, DbResult};
use crate::format::{FormatError, TimeFormatter};
use crate::model::clock::Clock;
use crate::model::lap::Lap;
use crate::reactive::{DisposeBag, Observable};
use crate::repo::lap_repo::RepoError;
use crate::screen::projection::{rows_for, title_for};
use crate::store::{LapEmission, LapStore, ObserveError};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// Tap events from the "add lap" action.
pub type TapSource = Observable<()>;

/// Screen-level failure reported to the view.
#[derive(Debug, Clone)]
pub enum ScreenError {
    /// Store could not be opened or read. Fatal to the screen.
    StorageUnavailable(Rc<RepoError>),
    /// One lap could not be persisted. Later taps are unaffected.
    WriteFailed(Rc<RepoError>),
    /// A lap time could not be rendered.
    Format(FormatError),
}

impl ScreenError {
    /// Whether the screen should replace its list with an error state.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::WriteFailed(_))
    }

    /// Stable machine-readable code for logs and host bindings.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::WriteFailed(_) => "write_failed",
            Self::Format(_) => "format_error",
        }
    }
}

impl Display for ScreenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "lap storage unavailable: {err}"),
            Self::WriteFailed(err) => write!(f, "failed to record lap: {err}"),
            Self::Format(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScreenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) | Self::WriteFailed(err) => Some(err.as_ref()),
            Self::Format(err) => Some(err),
        }
    }
}

impl From<ObserveError> for ScreenError {
    fn from(value: ObserveError) -> Self {
        match value {
            ObserveError::StorageUnavailable(err) => Self::StorageUnavailable(err),
        }
    }
}

impl From<DbError> for ScreenError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(Rc::new(RepoError::Db(value)))
    }
}

/// Host UI surface driven by the controller.
pub trait LapView {
    fn set_title(&mut self, title: &str);
    /// Replaces every list row; row 0 is the most recent lap.
    fn set_rows(&mut self, rows: &[String]);
    /// Fatal errors replace the list; others are transient messages.
    fn show_error(&mut self, error: &ScreenError);
}

/// Opens the store for one activation.
pub trait StoreOpener {
    fn open_store(&self) -> DbResult<LapStore>;
}

impl<F> StoreOpener for F
where
    F: Fn() -> DbResult<LapStore>,
{
    fn open_store(&self) -> DbResult<LapStore> {
        self()
    }
}

/// Opens a lap database file on every activation.
#[derive(Debug, Clone)]
pub struct FileStoreOpener {
    path: PathBuf,
}

impl FileStoreOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreOpener for FileStoreOpener {
    fn open_store(&self) -> DbResult<LapStore> {
        LapStore::open(&self.path)
    }
}

/// Activation state of a [`ScreenController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenPhase {
    Inactive,
    Active,
}

/// Binds the lap store to a [`LapView`] and the tap source to writes.
///
/// Dependencies are injected; the controller owns its subscriptions and the
/// store for exactly one activation at a time. Callbacks reach the view and
/// store only through `Weak` handles.
pub struct ScreenController<V: LapView + 'static> {
    opener: Box<dyn StoreOpener>,
    view: Rc<RefCell<V>>,
    formatter: Rc<dyn TimeFormatter>,
    clock: Rc<dyn Clock>,
    taps: TapSource,
    bag: DisposeBag,
    store: Option<Rc<LapStore>>,
}

impl<V: LapView + 'static> ScreenController<V> {
    pub fn new(
        opener: impl StoreOpener + 'static,
        view: Rc<RefCell<V>>,
        formatter: Rc<dyn TimeFormatter>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            opener: Box::new(opener),
            view,
            formatter,
            clock,
            taps: TapSource::new(),
            bag: DisposeBag::new(),
            store: None,
        }
    }

    pub fn phase(&self) -> ScreenPhase {
        if self.store.is_some() {
            ScreenPhase::Active
        } else {
            ScreenPhase::Inactive
        }
    }

    pub fn view(&self) -> &Rc<RefCell<V>> {
        &self.view
    }

    /// Store opened by the current activation.
    pub fn store(&self) -> Option<&LapStore> {
        self.store.as_deref()
    }

    /// Handle for wiring a host button to the add-lap action.
    pub fn tap_source(&self) -> TapSource {
        self.taps.clone()
    }

    /// Fires one tap. Returns `false` when no activation is bound to taps.
    pub fn tap(&self) -> bool {
        let handled = self.taps.emit(&()) > 0;
        if !handled {
            debug!("event=screen_tap module=screen status=ignored phase=inactive");
        }
        handled
    }

    /// Opens the store and binds observation and taps.
    ///
    /// A store that cannot be opened, or whose laps cannot be read, is
    /// reported to the view and returned as
    /// [`ScreenError::StorageUnavailable`]; the screen stays inactive.
    /// Activating an active screen is a no-op.
    pub fn activate(&mut self) -> Result<(), ScreenError> {
        if self.phase() == ScreenPhase::Active {
            return Ok(());
        }

        let store = match self.opener.open_store() {
            Ok(store) => Rc::new(store),
            Err(err) => return Err(self.fail_activation(ScreenError::from(err))),
        };
        if let Err(err) = store.snapshot() {
            return Err(self.fail_activation(ScreenError::StorageUnavailable(Rc::new(err))));
        }

        let view = Rc::downgrade(&self.view);
        let formatter = Rc::clone(&self.formatter);
        self.bag.add(store.observe_all(move |emission| {
            render_emission(&view, formatter.as_ref(), emission);
        }));

        let weak_store = Rc::downgrade(&store);
        let view = Rc::downgrade(&self.view);
        let clock = Rc::clone(&self.clock);
        self.bag.add(self.taps.subscribe(move |_| {
            record_lap(&weak_store, &view, clock.as_ref());
        }));

        self.store = Some(store);
        info!(
            "event=screen_activate module=screen status=ok subscriptions={}",
            self.bag.len()
        );
        Ok(())
    }

    fn fail_activation(&self, failure: ScreenError) -> ScreenError {
        error!(
            "event=screen_activate module=screen status=error error_code={} error={}",
            failure.code(),
            failure
        );
        self.view.borrow_mut().show_error(&failure);
        failure
    }

    /// Releases every subscription and closes the store.
    pub fn deactivate(&mut self) {
        if self.phase() == ScreenPhase::Inactive {
            return;
        }
        let released = self.bag.dispose();
        self.store = None;
        info!("event=screen_deactivate module=screen status=ok released={released}");
    }
}

impl<V: LapView + 'static> Drop for ScreenController<V> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn render_emission<V: LapView>(
    view: &Weak<RefCell<V>>,
    formatter: &dyn TimeFormatter,
    emission: &LapEmission,
) {
    let Some(view) = view.upgrade() else {
        return;
    };
    let mut view = view.borrow_mut();

    let laps = match emission {
        Ok(laps) => laps,
        Err(err) => {
            view.show_error(&ScreenError::from(err.clone()));
            return;
        }
    };

    match rows_for(laps, formatter) {
        Ok(rows) => {
            view.set_title(&title_for(laps));
            view.set_rows(&rows);
        }
        Err(err) => {
            error!("event=screen_render module=screen status=error error_code=format_error error={err}");
            view.show_error(&ScreenError::Format(err));
        }
    }
}

fn record_lap<V: LapView>(store: &Weak<LapStore>, view: &Weak<RefCell<V>>, clock: &dyn Clock) {
    let Some(store) = store.upgrade() else {
        return;
    };
    let lap = Lap::from_clock(clock);
    if let Err(err) = store.insert(&lap) {
        let failure = ScreenError::WriteFailed(Rc::new(err));
        warn!(
            "event=screen_tap module=screen status=error error_code={} error={}",
            failure.code(),
            failure
        );
        if let Some(view) = view.upgrade() {
            view.borrow_mut().show_error(&failure);
        }
    }
}
