//! Certified service hours.

use chrono::{DateTime, Utc};
use doccon_core::models::enrollment::duration_days;

/// `round(weekly_hours × duration_days / 7)`, never less than one hour.
pub fn total_hours(weekly_hours: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let days = duration_days(start, end) as f64;
    let hours = (f64::from(weekly_hours) * days / 7.0).round();
    (hours as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn two_weeks_at_twenty_hours() {
        assert_eq!(total_hours(20, day(1), day(15)), 40);
    }

    #[test]
    fn partial_week_rounds_to_nearest_hour() {
        // 10 days × 8 h / 7 = 11.43
        assert_eq!(total_hours(8, day(1), day(11)), 11);
        // 3 days × 40 h / 7 = 17.14
        assert_eq!(total_hours(40, day(1), day(4)), 17);
    }

    #[test]
    fn never_below_one_hour() {
        let start = day(1);
        let end = start + chrono::Duration::hours(2);
        assert_eq!(total_hours(1, start, end), 1);
        assert_eq!(total_hours(5, day(2), day(1)), 1);
    }
}
