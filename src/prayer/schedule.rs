//! Next-prayer selection and countdown.
//!
//! Formatted times are turned into epoch instants on the day they belong to.
//! After Isha the next prayer is tomorrow's Fajr, computed once per day and
//! remembered until the times are applied again.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use super::cache::{PrayerTimeCache, local_date_key};
use super::{PrayerKey, PrayerTimes};
use crate::settings::PrayerSettings;

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([AP]M)$").expect("valid time pattern"));

static MERIDIEM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)\s*([AP]M)$").expect("valid meridiem pattern"));

/// Epoch milliseconds of a `h:mm AM` string on `base_date` in `zone`.
///
/// `None` for anything that does not look like `h:mm AM`/`h:mm PM`. A wall
/// time skipped by a DST change resolves to the hour after.
pub fn parse_time_to_epoch<Z: TimeZone>(value: &str, base_date: NaiveDate, zone: &Z) -> Option<i64> {
    let caps = TIME_PATTERN.captures(value.trim())?;
    let hour12: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let pm = caps[3].eq_ignore_ascii_case("PM");

    let hour24 = hour12 % 12 + if pm { 12 } else { 0 };
    let naive = base_date.and_hms_opt(hour24, minute, 0)?;

    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.timestamp_millis())
}

/// Split `5:27 AM` into `("5:27", "AM")`.
///
/// Values without a trailing AM/PM come back whole with an empty suffix.
pub fn split_time(value: &str) -> (String, String) {
    match MERIDIEM_PATTERN.captures(value.trim()) {
        Some(caps) => (caps[1].to_string(), caps[2].to_uppercase()),
        None => (value.to_string(), String::new()),
    }
}

/// `HH:MM:SS` until `target`, never negative. Empty without a target.
pub fn countdown(now_ms: i64, target_ms: Option<i64>) -> String {
    let Some(target) = target_ms else {
        return String::new();
    };

    let total_seconds = (target - now_ms).max(0) / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

/// The upcoming prayer and when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextPrayer {
    pub key: PrayerKey,
    /// `None` when the instant cannot be known (no location configured)
    pub at: Option<i64>,
}

impl NextPrayer {
    pub fn label(&self) -> String {
        self.key.as_str().to_uppercase()
    }
}

/// Today's prayer instants plus the remembered tomorrow-Fajr.
#[derive(Debug, Default)]
pub struct PrayerScheduler {
    instants: [Option<i64>; 5],
    tomorrow_fajr: Option<i64>,
    /// Date key of the day the tomorrow-Fajr was computed on
    tomorrow_fajr_for: Option<String>,
}

impl PrayerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive instants for `base_date` and forget any remembered tomorrow-Fajr.
    ///
    /// Times that fail to parse are left out of scheduling.
    pub fn apply_times<Z: TimeZone>(&mut self, raw: &PrayerTimes, base_date: NaiveDate, zone: &Z) {
        for (slot, key) in self.instants.iter_mut().zip(PrayerKey::ALL) {
            *slot = parse_time_to_epoch(raw.get(key), base_date, zone);
            if slot.is_none() {
                log_warning!("Could not read {} time {:?}, skipping it", key.title(), raw.get(key));
            }
        }
        self.tomorrow_fajr = None;
        self.tomorrow_fajr_for = None;
    }

    pub fn instant(&self, key: PrayerKey) -> Option<i64> {
        self.instants[key as usize]
    }

    /// First of today's prayers strictly after `now`, otherwise tomorrow's Fajr.
    ///
    /// Tomorrow's Fajr is computed through `cache` at most once per date key of
    /// `now`. Without coordinates it has no instant.
    pub fn select_next<Z: TimeZone>(
        &mut self,
        now: &DateTime<Z>,
        cache: &PrayerTimeCache,
        settings: &PrayerSettings,
    ) -> NextPrayer {
        let now_ms = now.timestamp_millis();
        for key in PrayerKey::ALL {
            if let Some(at) = self.instant(key)
                && now_ms < at
            {
                return NextPrayer { key, at: Some(at) };
            }
        }

        if settings.coords.is_none() {
            return NextPrayer {
                key: PrayerKey::Fajr,
                at: None,
            };
        }

        let today = now.date_naive();
        let today_key = local_date_key(today);
        if self.tomorrow_fajr_for.as_deref() != Some(today_key.as_str()) {
            self.tomorrow_fajr = today
                .succ_opt()
                .and_then(|tomorrow| Self::tomorrow_fajr(cache, settings, tomorrow, &now.timezone()));
            self.tomorrow_fajr_for = Some(today_key);
        }

        NextPrayer {
            key: PrayerKey::Fajr,
            at: self.tomorrow_fajr,
        }
    }

    fn tomorrow_fajr<Z: TimeZone>(
        cache: &PrayerTimeCache,
        settings: &PrayerSettings,
        tomorrow: NaiveDate,
        zone: &Z,
    ) -> Option<i64> {
        match cache.compute_times(settings, tomorrow) {
            Ok(times) => parse_time_to_epoch(&times.fajr, tomorrow, zone),
            Err(e) => {
                log_warning!("Could not compute tomorrow's Fajr: {e}");
                None
            }
        }
    }
}
