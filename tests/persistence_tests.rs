//! Settings and cached times surviving a restart, on real files.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tempfile::TempDir;

use prayerboard::common::constants::{PRAYER_TIMES_STORAGE_KEY, SETTINGS_STORAGE_KEY};
use prayerboard::io::storage::{FileStorage, Storage};
use prayerboard::prayer::cache::PrayerTimeCache;
use prayerboard::prayer::engine::SolarEngine;
use prayerboard::settings::link::{apply_setup_link, setup_link};
use prayerboard::settings::{
    AsrConvention, CalculationMethod, Coordinates, PrayerSettings, SettingsStore,
};
use prayerboard::time::source::RealTimeSource;

fn karachi() -> PrayerSettings {
    PrayerSettings {
        coords: Some(Coordinates::new(24.8607, 67.0011)),
        method: CalculationMethod::Karachi,
        asr: AsrConvention::Hanafi,
        timezone: "Asia/Karachi".to_string(),
        panel_left: false,
        city_id: Some("karachi".to_string()),
    }
}

#[test]
fn test_saved_settings_survive_restart() {
    let dir = TempDir::new().unwrap();

    let mut store = SettingsStore::load(Arc::new(FileStorage::new(dir.path())));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = store.subscribe(move |s| sink.borrow_mut().push(s.method));
    store.save(karachi());
    assert_eq!(*seen.borrow(), vec![CalculationMethod::Karachi]);

    let reloaded = SettingsStore::load(Arc::new(FileStorage::new(dir.path())));
    assert_eq!(reloaded.get(), karachi());
    assert!(dir.path().join(format!("{SETTINGS_STORAGE_KEY}.json")).exists());
}

#[test]
fn test_reload_sees_another_writer() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()));
    storage
        .write(SETTINGS_STORAGE_KEY, &karachi().to_record().unwrap())
        .unwrap();

    let mut board_store = SettingsStore::load(storage.clone());
    assert!(!board_store.reload());

    // a command-line setup run writes through its own store
    let mut command_store = SettingsStore::load(Arc::new(FileStorage::new(dir.path())));
    let current = command_store.get();
    command_store.save(
        apply_setup_link("/settings?lat=21.4225&lng=39.8262&method=Makkah", &current).unwrap(),
    );

    assert!(board_store.reload());
    let settings = board_store.get();
    assert_eq!(settings.method, CalculationMethod::Makkah);
    assert_eq!(settings.coords, Some(Coordinates::new(21.4225, 39.8262)));
    assert_eq!(settings.timezone, "Asia/Karachi");
    assert!(!settings.panel_left);
    assert_eq!(settings.city_id, None);
}

#[test]
fn test_setup_link_reproduces_settings_elsewhere() {
    let source = karachi();
    let link = setup_link("https://kiosk.example/", &source);
    assert!(link.starts_with("https://kiosk.example/settings?"));

    let target = PrayerSettings {
        panel_left: true,
        ..PrayerSettings::default()
    };
    let applied = apply_setup_link(&link, &target).unwrap();
    assert_eq!(applied.coords, source.coords);
    assert_eq!(applied.method, source.method);
    assert_eq!(applied.asr, source.asr);
    assert_eq!(applied.timezone, source.timezone);
    assert!(applied.panel_left);
}

#[test]
fn test_todays_times_are_cached_on_disk() {
    let dir = TempDir::new().unwrap();
    let settings = karachi();

    let cache = PrayerTimeCache::new(
        Arc::new(FileStorage::new(dir.path())),
        Arc::new(SolarEngine::new()),
        Arc::new(RealTimeSource),
    );
    let computed = cache.compute_and_cache_today_times(&settings).unwrap();

    let restarted = PrayerTimeCache::new(
        Arc::new(FileStorage::new(dir.path())),
        Arc::new(SolarEngine::new()),
        Arc::new(RealTimeSource),
    );
    let cached = restarted.get_cached_today_times(&settings).unwrap();
    assert_eq!(cached.times, computed.times);
    assert_eq!(cached.date_key, restarted.today_key(&settings));

    let moved = PrayerSettings {
        coords: Some(Coordinates::new(24.8607, 67.0012)),
        ..settings
    };
    assert!(restarted.get_cached_today_times(&moved).is_none());
    assert!(
        FileStorage::new(dir.path())
            .read(PRAYER_TIMES_STORAGE_KEY)
            .unwrap()
            .is_some()
    );
}
