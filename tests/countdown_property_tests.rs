use chrono::{NaiveDate, Timelike, Utc};
use proptest::prelude::*;

use prayerboard::prayer::schedule::{countdown, parse_time_to_epoch, split_time};

fn seconds_of(countdown: &str) -> i64 {
    let parts: Vec<i64> = countdown.split(':').map(|p| p.parse().unwrap()).collect();
    assert_eq!(parts.len(), 3, "{countdown}");
    parts[0] * 3600 + parts[1] * 60 + parts[2]
}

proptest! {
    /// Whole seconds remaining, floored, and never below zero
    #[test]
    fn test_countdown_matches_remaining_seconds(
        now in 0i64..4_000_000_000_000,
        delta in -90_000_000i64..90_000_000,
    ) {
        let shown = countdown(now, Some(now + delta));
        prop_assert!(!shown.contains('-'));
        prop_assert_eq!(seconds_of(&shown), delta.max(0) / 1000);
    }

    #[test]
    fn test_countdown_is_zero_at_target(now in 0i64..4_000_000_000_000) {
        prop_assert_eq!(countdown(now, Some(now)), "00:00:00");
    }

    /// `h:mm AM` strings land on the wall time they name
    #[test]
    fn test_twelve_hour_times_read_back(hour in 0u32..24, minute in 0u32..60) {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let text = date
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .format("%-I:%M %p")
            .to_string();

        let epoch = parse_time_to_epoch(&text, date, &Utc).unwrap();
        let parsed = chrono::DateTime::from_timestamp_millis(epoch).unwrap();
        prop_assert_eq!(parsed.date_naive(), date);
        prop_assert_eq!((parsed.hour(), parsed.minute()), (hour, minute));

        let (time, ampm) = split_time(&text);
        prop_assert_eq!(ampm, if hour < 12 { "AM" } else { "PM" });
        prop_assert!(text.starts_with(&time));
    }
}

#[test]
fn test_no_target_shows_nothing() {
    assert_eq!(countdown(1_717_275_600_000, None), "");
}
