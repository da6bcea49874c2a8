//! Lap record model.
//!
//! # Responsibility
//! - Define the single-field lap value captured on tap.
//! - Define the persisted shape emitted by the store.
//!
//! # Invariants
//! - `time` is held at millisecond precision so that a lap read back from
//!   storage compares equal to the value that was written.
//! - `StoredLap` values are immutable snapshots of persisted rows.

use crate::model::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point in time recorded by a lap. Always UTC; zones are a display concern.
pub type Timestamp = DateTime<Utc>;

/// Storage-assigned identity of a persisted lap.
pub type LapId = i64;

/// A lap that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lap {
    pub time: Timestamp,
}

impl Lap {
    /// Creates a lap stamped with the current system time.
    pub fn new() -> Self {
        Self::from_clock(&SystemClock)
    }

    /// Creates a lap stamped by the given clock.
    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::at(clock.now())
    }

    /// Creates a lap for an explicit instant, truncated to milliseconds.
    pub fn at(time: Timestamp) -> Self {
        Self {
            time: truncate_to_millis(time),
        }
    }

    /// Epoch milliseconds as stored in `laps.time_ms`.
    pub fn epoch_ms(&self) -> i64 {
        self.time.timestamp_millis()
    }
}

impl Default for Lap {
    fn default() -> Self {
        Self::new()
    }
}

/// A lap as persisted by the store, carrying its storage identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLap {
    pub id: LapId,
    pub time: Timestamp,
}

impl StoredLap {
    /// Returns the unpersisted value this row was created from.
    pub fn lap(&self) -> Lap {
        Lap { time: self.time }
    }
}

/// Converts stored epoch milliseconds back into a timestamp.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn timestamp_from_millis(epoch_ms: i64) -> Option<Timestamp> {
    DateTime::from_timestamp_millis(epoch_ms)
}

fn truncate_to_millis(time: Timestamp) -> Timestamp {
    timestamp_from_millis(time.timestamp_millis()).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::{Lap, StoredLap, Timestamp};
    use crate::model::clock::Clock;
    use chrono::{TimeZone, Utc};

    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    #[test]
    fn at_truncates_sub_millisecond_precision() {
        let precise = Utc
            .timestamp_opt(1_700_000_000, 123_456_789)
            .single()
            .expect("valid timestamp");
        let lap = Lap::at(precise);
        assert_eq!(lap.epoch_ms(), 1_700_000_000_123);
        assert_eq!(lap.time.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn from_clock_uses_injected_time() {
        let instant = Utc.with_ymd_and_hms(2016, 8, 12, 9, 30, 0).unwrap();
        let lap = Lap::from_clock(&FixedClock(instant));
        assert_eq!(lap.time, instant);
    }

    #[test]
    fn new_is_close_to_now() {
        let before = Utc::now().timestamp_millis();
        let lap = Lap::new();
        let after = Utc::now().timestamp_millis();
        assert!(lap.epoch_ms() >= before && lap.epoch_ms() <= after);
    }

    #[test]
    fn stored_lap_serializes_with_id_and_time() {
        let stored = StoredLap {
            id: 7,
            time: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
        };
        let json = serde_json::to_value(stored).expect("serialize stored lap");
        assert_eq!(json["id"], 7);
        assert_eq!(json["time"], "2020-01-02T03:04:05Z");
        assert_eq!(stored.lap().time, stored.time);
    }
}
