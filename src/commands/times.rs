//! Print one day's prayer times.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::io::storage::Storage;
use crate::prayer::cache::{PrayerTimeCache, local_date_key};
use crate::prayer::engine::SolarEngine;
use crate::prayer::{PrayerKey, PrayerTimes};
use crate::settings::{PrayerSettings, SettingsStore};
use crate::time::labels::{DateLabels, TabularIslamicCalendar};
use crate::time::source::RealTimeSource;

/// Times for `date`, taken from today's cache entry when it applies.
pub(crate) fn times_for(
    cache: &PrayerTimeCache,
    settings: &PrayerSettings,
    date: NaiveDate,
) -> Result<PrayerTimes> {
    if local_date_key(date) == cache.today_key(settings)
        && let Some(entry) = cache.get_cached_today_times(settings)
    {
        return Ok(entry.times);
    }
    cache
        .compute_times(settings, date)
        .context("Failed to compute prayer times")
}

pub fn handle_times_command(date: Option<NaiveDate>, debug_enabled: bool) -> Result<()> {
    let storage: Arc<dyn Storage> = super::state_storage()?;
    let settings = SettingsStore::load(storage.clone()).get();
    let cache = PrayerTimeCache::new(
        storage,
        Arc::new(SolarEngine::new()),
        Arc::new(RealTimeSource),
    );

    let date = date.unwrap_or_else(|| cache.today(&settings));
    let times = times_for(&cache, &settings, date)?;
    let labels = DateLabels::for_date(date, &TabularIslamicCalendar);

    log_version!();
    log_block_start!("{} {}", labels.gregorian, labels.hijri);
    for key in PrayerKey::ALL {
        log_indented!("{:<8} {}", key.title(), times.get(key));
    }
    log_pipe!();
    log_indented!("{:<8} {}", "Sunrise", times.sunrise);
    log_indented!("{:<8} {}", "Sunset", times.sunset);

    if debug_enabled {
        log_pipe!();
        log_debug!(
            "{} / {} in {}",
            settings.method,
            settings.asr,
            settings.timezone
        );
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("times - Print prayer times");
    log_block_start!("Usage: prayerboard times [--date YYYY-MM-DD]");
    log_block_start!("Description:");
    log_indented!("Prints the five prayers, sunrise and sunset for today, or for");
    log_indented!("the given date, using the saved location and method.");
    log_block_start!("Examples:");
    log_indented!("prayerboard times");
    log_indented!("prayerboard times --date 2024-06-01");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::prayer::engine::MockAstronomicalEngine;
    use crate::settings::{AsrConvention, CalculationMethod, Coordinates};

    fn fixture_times(fajr: &str) -> PrayerTimes {
        PrayerTimes {
            fajr: fajr.to_string(),
            sunrise: "5:57 AM".to_string(),
            dhuhr: "1:30 PM".to_string(),
            asr: "5:33 PM".to_string(),
            maghrib: "9:03 PM".to_string(),
            sunset: "9:03 PM".to_string(),
            isha: "10:45 PM".to_string(),
        }
    }

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

    #[test]
    fn test_today_comes_from_cache() {
        let storage = Arc::new(MemoryStorage::new());
        let mut engine = MockAstronomicalEngine::new();
        engine
            .expect_compute()
            .times(1)
            .returning(|_, _, _, _, _| Ok(fixture_times("4:15 AM")));
        let cache = PrayerTimeCache::new(storage, Arc::new(engine), Arc::new(RealTimeSource));

        cache.compute_and_cache_today_times(&settings()).unwrap();
        let today = cache.today(&settings());
        assert_eq!(
            times_for(&cache, &settings(), today).unwrap().fajr,
            "4:15 AM"
        );
    }

    #[test]
    fn test_other_dates_are_computed() {
        let mut engine = MockAstronomicalEngine::new();
        engine
            .expect_compute()
            .withf(|_, _, _, tz, date| {
                tz.to_string() == "America/Detroit"
                    && *date == NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(fixture_times("4:16 AM")));
        let cache = PrayerTimeCache::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(engine),
            Arc::new(RealTimeSource),
        );

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(times_for(&cache, &settings(), date).unwrap().fajr, "4:16 AM");
    }

    #[test]
    fn test_missing_location_is_an_error() {
        let mut engine = MockAstronomicalEngine::new();
        engine.expect_compute().never();
        let cache = PrayerTimeCache::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(engine),
            Arc::new(RealTimeSource),
        );

        let no_location = PrayerSettings {
            coords: None,
            ..settings()
        };
        let today = cache.today(&no_location);
        let err = times_for(&cache, &no_location, today).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to compute prayer times"));
    }
}
