//! Display formatting for lap times.
//!
//! # Responsibility
//! - Render a lap timestamp in long time style for list rows.
//!
//! # Invariants
//! - Formatting is a pure function of the timestamp and the formatter's zone;
//!   a persisted lap renders identically no matter how many laps follow it.

use crate::model::lap::Timestamp;
use chrono::{FixedOffset, Local, Offset, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter, Write};

const LONG_TIME_PATTERN: &str = "%-I:%M:%S %p";

/// Failure to render a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    message: String,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to format lap time: {}", self.message)
    }
}

impl Error for FormatError {}

/// Renders timestamps for display.
pub trait TimeFormatter {
    /// Long time style, e.g. `3:04:05 PM GMT+2`.
    fn format_long(&self, time: Timestamp) -> Result<String, FormatError>;
}

/// Which offset a [`LongTimeFormatter`] renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSource {
    /// Host local time, resolved per instant (DST aware).
    Local,
    Fixed(FixedOffset),
}

/// Long-style time formatter: `h:mm:ss AM/PM <zone>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongTimeFormatter {
    zone: ZoneSource,
}

impl LongTimeFormatter {
    pub fn local() -> Self {
        Self {
            zone: ZoneSource::Local,
        }
    }

    pub fn utc() -> Self {
        Self::with_offset(Utc.fix())
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            zone: ZoneSource::Fixed(offset),
        }
    }

    /// Fixed offset east of UTC in minutes; `None` when out of range.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        let seconds = minutes.checked_mul(60)?;
        FixedOffset::east_opt(seconds).map(Self::with_offset)
    }

    pub fn zone(&self) -> ZoneSource {
        self.zone
    }

    fn offset_at(&self, time: Timestamp) -> FixedOffset {
        match self.zone {
            ZoneSource::Local => *time.with_timezone(&Local).offset(),
            ZoneSource::Fixed(offset) => offset,
        }
    }
}

impl Default for LongTimeFormatter {
    fn default() -> Self {
        Self::local()
    }
}

impl TimeFormatter for LongTimeFormatter {
    fn format_long(&self, time: Timestamp) -> Result<String, FormatError> {
        let offset = self.offset_at(time);
        let zoned = time.with_timezone(&offset);

        let mut rendered = String::new();
        write!(rendered, "{}", zoned.format(LONG_TIME_PATTERN))
            .map_err(|_| FormatError::new(format!("pattern `{LONG_TIME_PATTERN}` rejected")))?;
        rendered.push(' ');
        rendered.push_str(&zone_label(offset));
        Ok(rendered)
    }
}

/// `UTC` for zero, otherwise `GMT+H` / `GMT-H:MM`.
fn zone_label(offset: FixedOffset) -> String {
    let total = offset.local_minus_utc();
    if total == 0 {
        return "UTC".to_string();
    }
    let sign = if total < 0 { '-' } else { '+' };
    let minutes = total.unsigned_abs() / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if minutes == 0 {
        format!("GMT{sign}{hours}")
    } else {
        format!("GMT{sign}{hours}:{minutes:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::{zone_label, LongTimeFormatter, TimeFormatter, ZoneSource};
    use chrono::{FixedOffset, TimeZone, Utc};

    #[test]
    fn fixed_offset_renders_twelve_hour_clock_with_zone() {
        let formatter = LongTimeFormatter::from_offset_minutes(120).unwrap();
        let time = Utc.with_ymd_and_hms(2016, 8, 12, 13, 4, 5).unwrap();
        assert_eq!(formatter.format_long(time).unwrap(), "3:04:05 PM GMT+2");
    }

    #[test]
    fn utc_midnight_renders_as_twelve_am() {
        let formatter = LongTimeFormatter::utc();
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(formatter.format_long(time).unwrap(), "12:00:00 AM UTC");
    }

    #[test]
    fn zone_label_includes_minutes_only_when_present() {
        assert_eq!(zone_label(FixedOffset::east_opt(0).unwrap()), "UTC");
        assert_eq!(zone_label(FixedOffset::west_opt(5 * 3600).unwrap()), "GMT-5");
        assert_eq!(zone_label(FixedOffset::east_opt(19_800).unwrap()), "GMT+5:30");
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(LongTimeFormatter::from_offset_minutes(24 * 60).is_none());
        assert_eq!(LongTimeFormatter::default().zone(), ZoneSource::Local);
    }
}
