// src/utils/date.rs

//! Calendar-day arithmetic for lifecycle counters.
//!
//! All lifecycle math is done on date-only values. Elapsed wall-clock time is
//! never used, so timezone and DST shifts cannot introduce off-by-one days.

use chrono::NaiveDate;

/// Inclusive day count between two dates, minimum 1.
///
/// A listing first seen today has been available for 1 day, not 0.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_same_day_is_one() {
        assert_eq!(days_between(d("2024-01-01"), d("2024-01-01")), 1);
    }

    #[test]
    fn test_inclusive_count() {
        assert_eq!(days_between(d("2024-01-01"), d("2024-01-03")), 3);
    }

    #[test]
    fn test_reversed_dates_clamp_to_one() {
        assert_eq!(days_between(d("2024-01-05"), d("2024-01-01")), 1);
    }

    #[test]
    fn test_across_month_boundary() {
        assert_eq!(days_between(d("2024-01-30"), d("2024-02-02")), 4);
    }
}
