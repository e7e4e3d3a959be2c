//! Calendar date helpers for day-granularity scheduling.
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};

/// Today's calendar date from the wall clock.
///
/// Only used when the caller does not manage its own clock; the engine and
/// queue builder always take the reference date as a parameter.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Adds a day offset to a calendar date.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Midnight timestamp for a date, for callers whose "now" is only known
/// at day resolution (the simulated app clock).
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_days_crosses_month_boundary() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        assert_eq!(
            add_days(date, 5),
            NaiveDate::from_ymd_opt(2024, 2, 4).unwrap()
        );
    }

    #[test]
    fn test_add_days_zero_is_identity() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(add_days(date, 0), date);
    }

    #[test]
    fn test_midnight_utc_keeps_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(midnight_utc(date).date_naive(), date);
    }
}
