//! Time normalisation helpers
//!
//! All instants crossing the calendar boundary are UTC. Matching compares
//! bounds at minute precision.

use chrono::{DateTime, NaiveDate, Timelike, Utc};

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(value: DateTime<Utc>) -> DateTime<Utc> {
    value.with_second(0).and_then(|v| v.with_nanosecond(0)).unwrap_or(value)
}

/// Midnight UTC at the start of an all-day date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn truncation_drops_seconds_and_nanos() {
        let value = Utc.with_ymd_and_hms(2025, 3, 10, 10, 30, 45).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(truncate_to_minute(value), Utc.with_ymd_and_hms(2025, 3, 10, 10, 30, 0).unwrap());
    }

    #[test]
    fn start_of_day_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(start_of_day(date), Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
    }
}
