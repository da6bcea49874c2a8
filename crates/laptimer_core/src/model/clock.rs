//! Time sources for stamping new laps.

use crate::model::lap::Timestamp;
use chrono::Utc;

/// Source of "now" for lap construction.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source backed by the host system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
