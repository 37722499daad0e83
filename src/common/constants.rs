//! Application-wide constants and defaults.

use std::time::Duration;

// # Persisted Record Keys
// Key names carry the schema version so an incompatible change never reads old data.

pub const SETTINGS_STORAGE_KEY: &str = "prayerSettings.v1";
pub const PRAYER_TIMES_STORAGE_KEY: &str = "prayerTimes.v3";

// # Default Prayer Settings
// ZIP 48015, so a fresh kiosk shows a schedule without any setup.

pub const DEFAULT_LATITUDE: f64 = 42.4788;
pub const DEFAULT_LONGITUDE: f64 = -83.0248;
pub const DEFAULT_PANEL_LEFT: bool = true;
pub const FALLBACK_TIMEZONE: &str = "UTC";

// # Runtime Config Defaults

pub const DEFAULT_TICK_INTERVAL: u64 = 1000; // milliseconds
pub const DEFAULT_ROLLOVER_POLL_INTERVAL: u64 = 300; // seconds
pub const DEFAULT_HOLD_DURATION: u64 = 1800; // milliseconds
pub const DEFAULT_WEATHER: bool = true;
pub const DEFAULT_SYSTEM_EVENTS: bool = true;
pub const DEFAULT_DISPLAY: &str = "auto";
pub const DEFAULT_SETUP_ORIGIN: &str = "http://localhost:4200";

// # Validation Limits

pub const MINIMUM_TICK_INTERVAL: u64 = 100;
pub const MAXIMUM_TICK_INTERVAL: u64 = 5000;
pub const MINIMUM_ROLLOVER_POLL_INTERVAL: u64 = 10;
pub const MAXIMUM_ROLLOVER_POLL_INTERVAL: u64 = 3600;
pub const MINIMUM_HOLD_DURATION: u64 = 200;
pub const MAXIMUM_HOLD_DURATION: u64 = 10_000;

// # Collaborators

pub const WEATHER_API_BASE: &str = "https://api.open-meteo.com/v1/forecast";
pub const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);
pub const WEATHER_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(15);
pub const GEOCLUE_DESKTOP_ID: &str = "prayerboard";

// # Terminal Input
// Top-left cells that start the settings hold when pressed with the mouse.

pub const HOT_CORNER_COLUMNS: u16 = 8;
pub const HOT_CORNER_ROWS: u16 = 3;

/// Debounce for settings-file change events, editors often write in several steps.
pub const WATCHER_DEBOUNCE_MS: u64 = 500;

// # Exit Codes

pub const EXIT_FAILURE: i32 = 1;
