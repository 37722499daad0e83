//! Operator settings: location, calculation method, Asr convention and layout.
//!
//! Settings are persisted as a JSON record and loaded field by field, so a
//! record written by an older build (or partly corrupted by hand editing)
//! still yields usable settings with defaults filling the gaps.

pub mod cities;
pub mod edit;
pub mod link;

use chrono::{DateTime, Local, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::common::constants::*;
use crate::common::utils::system_timezone;
use crate::io::storage::Storage;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within ±90 latitude, ±180 longitude.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Twilight-angle conventions for Fajr and Isha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMethod {
    #[serde(rename = "ISNA")]
    Isna,
    #[serde(rename = "MWL")]
    Mwl,
    Egypt,
    Makkah,
    Karachi,
    Singapore,
    France,
    Russia,
    Tehran,
    Jafari,
}

impl CalculationMethod {
    pub const ALL: [CalculationMethod; 10] = [
        CalculationMethod::Isna,
        CalculationMethod::Mwl,
        CalculationMethod::Egypt,
        CalculationMethod::Makkah,
        CalculationMethod::Karachi,
        CalculationMethod::Singapore,
        CalculationMethod::France,
        CalculationMethod::Russia,
        CalculationMethod::Tehran,
        CalculationMethod::Jafari,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMethod::Isna => "ISNA",
            CalculationMethod::Mwl => "MWL",
            CalculationMethod::Egypt => "Egypt",
            CalculationMethod::Makkah => "Makkah",
            CalculationMethod::Karachi => "Karachi",
            CalculationMethod::Singapore => "Singapore",
            CalculationMethod::France => "France",
            CalculationMethod::Russia => "Russia",
            CalculationMethod::Tehran => "Tehran",
            CalculationMethod::Jafari => "Jafari",
        }
    }

    /// Exact, case-sensitive match against the persisted names.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shadow-length convention for the Asr prayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsrConvention {
    /// Shadow equals object length plus noon shadow
    Standard,
    /// Shadow equals twice the object length plus noon shadow
    Hanafi,
}

impl AsrConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            AsrConvention::Standard => "Standard",
            AsrConvention::Hanafi => "Hanafi",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Standard" => Some(AsrConvention::Standard),
            "Hanafi" => Some(AsrConvention::Hanafi),
            _ => None,
        }
    }

    pub fn shadow_factor(&self) -> f64 {
        match self {
            AsrConvention::Standard => 1.0,
            AsrConvention::Hanafi => 2.0,
        }
    }
}

impl fmt::Display for AsrConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the operator can configure about the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerSettings {
    /// No computation happens while this is `None`
    pub coords: Option<Coordinates>,
    pub method: CalculationMethod,
    pub asr: AsrConvention,
    /// IANA zone name, passed through to the engine unvalidated
    pub timezone: String,
    /// `true` puts the clock/date panel on the left
    pub panel_left: bool,
    /// City picker id, absent when coordinates were entered by hand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<String>,
}

impl Default for PrayerSettings {
    fn default() -> Self {
        Self {
            coords: Some(Coordinates::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)),
            method: CalculationMethod::Isna,
            asr: AsrConvention::Hanafi,
            timezone: system_timezone(),
            panel_left: DEFAULT_PANEL_LEFT,
            city_id: None,
        }
    }
}

impl PrayerSettings {
    /// Parse a persisted record, taking each field from the record when it is
    /// usable and from the defaults otherwise.
    ///
    /// A record that is not a JSON object at all yields the defaults.
    pub fn from_record(raw: &str) -> Self {
        let defaults = Self::default();
        let Ok(serde_json::Value::Object(record)) = serde_json::from_str(raw) else {
            return defaults;
        };

        fn field<T: serde::de::DeserializeOwned>(
            record: &serde_json::Map<String, serde_json::Value>,
            name: &str,
        ) -> Option<T> {
            record
                .get(name)
                .filter(|value| !value.is_null())
                .and_then(|value| serde_json::from_value(value.clone()).ok())
        }

        Self {
            coords: field::<Coordinates>(&record, "coords")
                .filter(Coordinates::is_valid)
                .or(defaults.coords),
            method: field(&record, "method").unwrap_or(defaults.method),
            asr: field(&record, "asr").unwrap_or(defaults.asr),
            timezone: field::<String>(&record, "timezone")
                .filter(|zone| !zone.trim().is_empty())
                .unwrap_or(defaults.timezone),
            panel_left: field(&record, "panelLeft").unwrap_or(defaults.panel_left),
            city_id: match record.get("cityId") {
                Some(serde_json::Value::String(id)) => Some(id.clone()),
                _ => None,
            },
        }
    }

    pub fn to_record(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// The configured zone, when it names one chrono-tz knows.
    pub fn zone(&self) -> Option<Tz> {
        self.timezone.parse().ok()
    }

    /// The calendar date at `now` on the board's clocks: in the configured
    /// zone, or the machine's when the zone is unknown.
    pub fn date_at(&self, now: &DateTime<Local>) -> NaiveDate {
        match self.zone() {
            Some(zone) => now.with_timezone(&zone).date_naive(),
            None => now.date_naive(),
        }
    }
}

type Observer = Box<dyn FnMut(&PrayerSettings)>;

#[derive(Default)]
struct ObserverList {
    next_id: u64,
    entries: Vec<(u64, Observer)>,
    /// Set while `publish` holds the entries outside the list
    delivering: bool,
    /// Unsubscribed during delivery
    removed: Vec<u64>,
}

/// Handle returned by [`SettingsStore::subscribe`].
///
/// Dropping the handle keeps the observer registered; call [`unsubscribe`](Self::unsubscribe)
/// to remove it.
pub struct Subscription {
    id: u64,
    observers: Weak<RefCell<ObserverList>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(observers) = self.observers.upgrade() {
            let mut list = observers.borrow_mut();
            list.entries.retain(|(id, _)| *id != self.id);
            if list.delivering {
                list.removed.push(self.id);
            }
        }
    }
}

/// Holds the current settings, persists saves and notifies observers.
///
/// Lives on the main thread; observers are called synchronously in
/// registration order on every save, one call per save.
pub struct SettingsStore {
    storage: Arc<dyn Storage>,
    current: PrayerSettings,
    observers: Rc<RefCell<ObserverList>>,
}

impl SettingsStore {
    /// Load the persisted record, falling back to defaults when it is missing or unreadable.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let current = match storage.read(SETTINGS_STORAGE_KEY) {
            Ok(Some(raw)) => PrayerSettings::from_record(&raw),
            Ok(None) => PrayerSettings::default(),
            Err(e) => {
                log_warning!("Could not read saved settings: {e}");
                log_indented!("Using default settings");
                PrayerSettings::default()
            }
        };

        Self {
            storage,
            current,
            observers: Rc::new(RefCell::new(ObserverList::default())),
        }
    }

    pub fn get(&self) -> PrayerSettings {
        self.current.clone()
    }

    /// Replace the settings, notify observers, then persist.
    ///
    /// A persistence failure is logged and otherwise ignored; the in-memory
    /// settings stay authoritative.
    pub fn save(&mut self, next: PrayerSettings) {
        self.current = next;
        self.publish();

        let result = self
            .current
            .to_record()
            .map_err(anyhow::Error::from)
            .and_then(|record| self.storage.write(SETTINGS_STORAGE_KEY, &record));
        if let Err(e) = result {
            log_warning!("Failed to persist settings: {e}");
        }
    }

    /// Observe every subsequent save.
    pub fn subscribe(&self, observer: impl FnMut(&PrayerSettings) + 'static) -> Subscription {
        let mut list = self.observers.borrow_mut();
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, Box::new(observer)));

        Subscription {
            id,
            observers: Rc::downgrade(&self.observers),
        }
    }

    /// Pick up a record written by another process.
    ///
    /// Publishes and returns `true` only when the stored settings differ from
    /// the current ones. A missing or unreadable record changes nothing.
    pub fn reload(&mut self) -> bool {
        let raw = match self.storage.read(SETTINGS_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                log_warning!("Could not re-read settings: {e}");
                return false;
            }
        };

        let stored = PrayerSettings::from_record(&raw);
        if stored == self.current {
            return false;
        }

        self.current = stored;
        self.publish();
        true
    }

    /// Call every observer with the current settings.
    ///
    /// The entries are taken out of the list for the duration, so observers
    /// may subscribe or unsubscribe. One that is unsubscribed before its turn
    /// is skipped; one subscribed during delivery first hears the next save.
    fn publish(&self) {
        let snapshot = self.current.clone();
        let mut delivering = {
            let mut list = self.observers.borrow_mut();
            list.delivering = true;
            std::mem::take(&mut list.entries)
        };

        for (id, observer) in delivering.iter_mut() {
            if self.observers.borrow().removed.contains(id) {
                continue;
            }
            observer(&snapshot);
        }

        let mut list = self.observers.borrow_mut();
        let removed = std::mem::take(&mut list.removed);
        delivering.retain(|(id, _)| !removed.contains(id));
        delivering.append(&mut list.entries);
        list.entries = delivering;
        list.delivering = false;
    }
}
