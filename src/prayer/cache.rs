//! Per-day cache of computed prayer times.
//!
//! The latest computation is persisted together with the settings it was
//! computed from. It is served again only for the same day in the configured zone and the same
//! location, method, Asr convention and timezone; anything else recomputes.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use super::engine::AstronomicalEngine;
use super::{ConfigurationError, PrayerTimes};
use crate::common::constants::PRAYER_TIMES_STORAGE_KEY;
use crate::io::storage::Storage;
use crate::settings::{AsrConvention, CalculationMethod, Coordinates, PrayerSettings};
use crate::time::source::TimeSource;

/// The persisted result of one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// `YYYY-MM-DD` in the settings' zone the times belong to
    pub date_key: String,
    /// Settings snapshot the times were computed from
    #[serde(deserialize_with = "settings_snapshot")]
    pub settings: PrayerSettings,
    pub method: CalculationMethod,
    pub asr: AsrConvention,
    pub times: PrayerTimes,
}

impl CacheEntry {
    /// Whether this entry was computed for the same inputs as `settings`.
    ///
    /// Settings without coordinates never match.
    pub fn matches(&self, settings: &PrayerSettings) -> bool {
        let (Some(wanted), Some(cached)) = (settings.coords, self.settings.coords) else {
            return false;
        };

        self.method == settings.method
            && self.asr == settings.asr
            && self.settings.timezone == settings.timezone
            && cached.lat == wanted.lat
            && cached.lng == wanted.lng
    }
}

/// Snapshots go through the same lenient field-by-field parse as the settings
/// record, except that coordinates are taken literally.
fn settings_snapshot<'de, D>(deserializer: D) -> Result<PrayerSettings, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let mut settings = PrayerSettings::from_record(&value.to_string());
    settings.coords = value
        .get("coords")
        .and_then(|coords| serde_json::from_value::<Coordinates>(coords.clone()).ok());
    Ok(settings)
}

/// Format a date the way cache entries are keyed.
pub fn local_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Wraps an [`AstronomicalEngine`] with the persisted per-day cache.
pub struct PrayerTimeCache {
    storage: Arc<dyn Storage>,
    engine: Arc<dyn AstronomicalEngine>,
    clock: Arc<dyn TimeSource>,
}

impl PrayerTimeCache {
    pub fn new(
        storage: Arc<dyn Storage>,
        engine: Arc<dyn AstronomicalEngine>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            storage,
            engine,
            clock,
        }
    }

    /// Today's date in the settings' zone, from the injected clock.
    pub fn today(&self, settings: &PrayerSettings) -> NaiveDate {
        settings.date_at(&self.clock.now())
    }

    pub fn today_key(&self, settings: &PrayerSettings) -> String {
        local_date_key(self.today(settings))
    }

    /// The last persisted entry, whatever day it is for.
    pub fn read_cache(&self) -> Option<CacheEntry> {
        let raw = match self.storage.read(PRAYER_TIMES_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log_warning!("Could not read cached prayer times: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log_warning!("Ignoring unreadable prayer times cache: {e}");
                None
            }
        }
    }

    /// The cached entry when it is for today and for these settings.
    pub fn get_cached_today_times(&self, settings: &PrayerSettings) -> Option<CacheEntry> {
        settings.coords?;
        let cached = self.read_cache()?;
        if cached.date_key != self.today_key(settings) || !cached.matches(settings) {
            return None;
        }
        Some(cached)
    }

    /// Compute today's times, persist them and return the new entry.
    ///
    /// Always recomputes. Fails with [`ConfigurationError::MissingCoordinates`]
    /// when no location is set; a failed write is logged and ignored.
    pub fn compute_and_cache_today_times(&self, settings: &PrayerSettings) -> Result<CacheEntry> {
        if settings.coords.is_none() {
            return Err(ConfigurationError::MissingCoordinates.into());
        }

        let today = self.today(settings);
        let times = self.compute_times(settings, today)?;

        let entry = CacheEntry {
            date_key: local_date_key(today),
            settings: settings.clone(),
            method: settings.method,
            asr: settings.asr,
            times,
        };

        let result = serde_json::to_string(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|record| self.storage.write(PRAYER_TIMES_STORAGE_KEY, &record));
        if let Err(e) = result {
            log_warning!("Failed to persist prayer times: {e}");
        }

        Ok(entry)
    }

    /// Times for an arbitrary date, without touching the cache.
    pub fn compute_times(&self, settings: &PrayerSettings, date: NaiveDate) -> Result<PrayerTimes> {
        let coordinates = settings
            .coords
            .ok_or(ConfigurationError::MissingCoordinates)?;

        self.engine.compute(
            settings.method,
            settings.asr,
            coordinates,
            &settings.timezone,
            date,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::prayer::engine::MockAstronomicalEngine;
    use crate::time::source::{ManualTimeSource, parse_datetime_in};

    fn settings() -> PrayerSettings {
        PrayerSettings {
            coords: Some(Coordinates::new(42.4788, -83.0248)),
            method: CalculationMethod::Isna,
            asr: AsrConvention::Hanafi,
            timezone: "America/Detroit".to_string(),
            panel_left: true,
            city_id: None,
        }
    }

    fn fixture_times() -> PrayerTimes {
        PrayerTimes {
            fajr: "4:15 AM".to_string(),
            sunrise: "5:57 AM".to_string(),
            dhuhr: "1:30 PM".to_string(),
            asr: "5:33 PM".to_string(),
            maghrib: "9:03 PM".to_string(),
            sunset: "9:03 PM".to_string(),
            isha: "10:45 PM".to_string(),
        }
    }

    fn engine_expecting(calls: usize) -> Arc<dyn AstronomicalEngine> {
        let mut engine = MockAstronomicalEngine::new();
        engine
            .expect_compute()
            .times(calls)
            .returning(|_, _, _, _, _| Ok(fixture_times()));
        Arc::new(engine)
    }

    fn clock_at(value: &str) -> Arc<ManualTimeSource> {
        Arc::new(ManualTimeSource::new(
            parse_datetime_in(value, "America/Detroit").unwrap(),
        ))
    }

    #[test]
    fn test_local_date_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(local_date_key(date), "2024-06-01");
    }

    #[test]
    fn test_compute_then_hit() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = PrayerTimeCache::new(
            storage.clone(),
            engine_expecting(1),
            clock_at("2024-06-01 09:00:00"),
        );

        assert_eq!(cache.get_cached_today_times(&settings()), None);

        let entry = cache.compute_and_cache_today_times(&settings()).unwrap();
        assert_eq!(entry.date_key, "2024-06-01");
        assert_eq!(entry.times, fixture_times());

        assert_eq!(cache.get_cached_today_times(&settings()), Some(entry));
    }

    #[test]
    fn test_each_fingerprint_dimension_misses() {
        let cache = PrayerTimeCache::new(
            Arc::new(MemoryStorage::new()),
            engine_expecting(1),
            clock_at("2024-06-01 09:00:00"),
        );
        cache.compute_and_cache_today_times(&settings()).unwrap();

        let mut changed = settings();
        changed.method = CalculationMethod::Mwl;
        assert!(cache.get_cached_today_times(&changed).is_none());

        let mut changed = settings();
        changed.asr = AsrConvention::Standard;
        assert!(cache.get_cached_today_times(&changed).is_none());

        let mut changed = settings();
        changed.timezone = "America/Toronto".to_string();
        assert!(cache.get_cached_today_times(&changed).is_none());

        let mut changed = settings();
        changed.coords = Some(Coordinates::new(42.4789, -83.0248));
        assert!(cache.get_cached_today_times(&changed).is_none());

        let mut changed = settings();
        changed.coords = Some(Coordinates::new(42.4788, -83.0249));
        assert!(cache.get_cached_today_times(&changed).is_none());

        let mut changed = settings();
        changed.coords = None;
        assert!(cache.get_cached_today_times(&changed).is_none());

        // Layout-only changes keep the entry.
        let mut changed = settings();
        changed.panel_left = false;
        changed.city_id = Some("southfield-mi".to_string());
        assert!(cache.get_cached_today_times(&changed).is_some());
    }

    #[test]
    fn test_next_day_misses() {
        let clock = clock_at("2024-06-01 23:59:59");
        let cache = PrayerTimeCache::new(
            Arc::new(MemoryStorage::new()),
            engine_expecting(1),
            clock.clone(),
        );
        cache.compute_and_cache_today_times(&settings()).unwrap();

        clock.advance(chrono::Duration::seconds(2));
        assert!(cache.get_cached_today_times(&settings()).is_none());
        assert_eq!(cache.read_cache().unwrap().date_key, "2024-06-01");
    }

    #[test]
    fn test_day_follows_settings_zone() {
        // 10 PM in Detroit is already the next day in Karachi
        let cache = PrayerTimeCache::new(
            Arc::new(MemoryStorage::new()),
            engine_expecting(1),
            clock_at("2024-06-01 22:00:00"),
        );
        assert_eq!(cache.today_key(&settings()), "2024-06-01");

        let karachi = PrayerSettings {
            timezone: "Asia/Karachi".to_string(),
            ..settings()
        };
        let entry = cache.compute_and_cache_today_times(&karachi).unwrap();
        assert_eq!(entry.date_key, "2024-06-02");
        assert!(cache.get_cached_today_times(&karachi).is_some());
    }

    #[test]
    fn test_missing_coordinates_is_configuration_error() {
        let cache = PrayerTimeCache::new(
            Arc::new(MemoryStorage::new()),
            engine_expecting(0),
            clock_at("2024-06-01 09:00:00"),
        );
        let mut unset = settings();
        unset.coords = None;

        let err = cache.compute_and_cache_today_times(&unset).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::MissingCoordinates)
        );
        assert!(cache.read_cache().is_none());
    }

    #[test]
    fn test_compute_times_has_no_side_effects() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = PrayerTimeCache::new(
            storage.clone(),
            engine_expecting(1),
            clock_at("2024-06-01 09:00:00"),
        );

        let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert_eq!(cache.compute_times(&settings(), date).unwrap(), fixture_times());
        assert_eq!(storage.read(PRAYER_TIMES_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_reads_record_written_by_older_build() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write(
                PRAYER_TIMES_STORAGE_KEY,
                r#"{"dateKey":"2024-06-01",
                    "settings":{"coords":{"lat":42.4788,"lng":-83.0248},"method":"ISNA","asr":"Hanafi","timezone":"America/Detroit"},
                    "method":"ISNA","asr":"Hanafi",
                    "times":{"fajr":"4:15 AM","sunrise":"5:57 AM","dhuhr":"1:30 PM","asr":"5:33 PM",
                             "maghrib":"9:03 PM","sunset":"9:03 PM","isha":"10:45 PM","midnight":"1:00 AM"}}"#,
            )
            .unwrap();

        let cache = PrayerTimeCache::new(
            storage,
            engine_expecting(0),
            clock_at("2024-06-01 12:00:00"),
        );
        let hit = cache.get_cached_today_times(&settings()).unwrap();
        assert_eq!(hit.times, fixture_times());
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(PRAYER_TIMES_STORAGE_KEY, "{\"dateKey\":").unwrap();

        let cache = PrayerTimeCache::new(
            storage,
            engine_expecting(0),
            clock_at("2024-06-01 12:00:00"),
        );
        assert!(cache.read_cache().is_none());
        assert!(cache.get_cached_today_times(&settings()).is_none());
    }
}
