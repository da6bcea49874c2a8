//! Pure projections from a lap collection to displayed text.

use crate::format::{FormatError, TimeFormatter};
use crate::model::lap::StoredLap;

/// Screen title: `"<count> laps"`.
pub fn title_for(laps: &[StoredLap]) -> String {
    format!("{} laps", laps.len())
}

/// List rows, most recent lap first.
///
/// `laps` is expected in insertion order, as emitted by the store.
pub fn rows_for(
    laps: &[StoredLap],
    formatter: &dyn TimeFormatter,
) -> Result<Vec<String>, FormatError> {
    laps.iter()
        .rev()
        .map(|lap| formatter.format_long(lap.time))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{rows_for, title_for};
    use crate::format::{FormatError, LongTimeFormatter, TimeFormatter};
    use crate::model::lap::{StoredLap, Timestamp};
    use chrono::{TimeZone, Utc};

    fn stored(id: i64, hour: u32) -> StoredLap {
        StoredLap {
            id,
            time: Utc.with_ymd_and_hms(2016, 8, 12, hour, 0, 0).unwrap(),
        }
    }

    struct FailingFormatter;

    impl TimeFormatter for FailingFormatter {
        fn format_long(&self, _time: Timestamp) -> Result<String, FormatError> {
            Err(FormatError::new("unsupported"))
        }
    }

    #[test]
    fn title_counts_every_lap_without_pluralization() {
        assert_eq!(title_for(&[]), "0 laps");
        assert_eq!(title_for(&[stored(1, 9)]), "1 laps");
        assert_eq!(title_for(&[stored(1, 9), stored(2, 10)]), "2 laps");
    }

    #[test]
    fn rows_are_reverse_insertion_order() {
        let laps = [stored(1, 9), stored(2, 10), stored(3, 11)];
        let rows = rows_for(&laps, &LongTimeFormatter::utc()).unwrap();
        assert_eq!(
            rows,
            vec!["11:00:00 AM UTC", "10:00:00 AM UTC", "9:00:00 AM UTC"]
        );
    }

    #[test]
    fn rows_surface_formatter_failure() {
        let err = rows_for(&[stored(1, 9)], &FailingFormatter).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
        assert!(rows_for(&[], &FailingFormatter).unwrap().is_empty());
    }
}
