//! Board state: clock face, date labels, today's times and the next prayer.
//!
//! The board owns the settings store, the per-day cache and the scheduler and
//! is driven entirely from the main loop: [`Board::tick`] on every display
//! tick, [`Board::refresh_if_date_changed`] on the rollover poll and on wake
//! events, and the settings/hold methods in response to input. Nothing here
//! blocks or spawns.
//!
//! Dates, the clock face and prayer instants are read in the configured
//! timezone, falling back to the machine's zone when it is not a known name.

use chrono::{DateTime, Local, NaiveDate};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::hold::HoldGesture;
use crate::display::{Frame, PrayerRow, Screen};
use crate::io::storage::Storage;
use crate::prayer::PrayerKey;
use crate::prayer::PrayerTimes;
use crate::prayer::cache::{PrayerTimeCache, local_date_key};
use crate::prayer::engine::AstronomicalEngine;
use crate::prayer::schedule::{NextPrayer, PrayerScheduler, countdown, split_time};
use crate::settings::cities::find_city;
use crate::settings::link::{LinkError, apply_setup_link, setup_link};
use crate::settings::{Coordinates, PrayerSettings, SettingsStore, Subscription};
use crate::time::labels::{CalendarConverter, ClockFace, DateLabels};
use crate::time::source::TimeSource;

/// Shown when no coordinates are configured.
pub const LOCATION_HINT: &str =
    "Location not set: run `prayerboard setup <link>` or `prayerboard locate`";

/// Everything a [`Board`] is built from.
pub struct BoardParams {
    pub storage: Arc<dyn Storage>,
    pub engine: Arc<dyn AstronomicalEngine>,
    pub clock: Arc<dyn TimeSource>,
    pub calendar: Box<dyn CalendarConverter>,
    pub hold_duration: Duration,
    pub setup_origin: String,
}

pub struct Board {
    store: SettingsStore,
    subscription: Option<Subscription>,
    /// Saves seen by the store observer, applied by `flush_settings_changes`
    settings_changes: Rc<RefCell<VecDeque<PrayerSettings>>>,
    cache: PrayerTimeCache,
    scheduler: PrayerScheduler,
    clock: Arc<dyn TimeSource>,
    calendar: Box<dyn CalendarConverter>,
    hold: HoldGesture,
    setup_origin: String,

    last_date_key: Option<String>,
    labels: DateLabels,
    clock_face: ClockFace,
    times: Option<PrayerTimes>,
    next: Option<NextPrayer>,
    countdown: String,
    temperature: Option<f64>,
    screen: Screen,
    status: Option<String>,
}

impl Board {
    pub fn new(params: BoardParams) -> Self {
        let store = SettingsStore::load(params.storage.clone());
        let settings_changes = Rc::new(RefCell::new(VecDeque::new()));

        let queue = settings_changes.clone();
        let subscription = store.subscribe(move |settings: &PrayerSettings| {
            queue.borrow_mut().push_back(settings.clone());
        });

        Self {
            store,
            subscription: Some(subscription),
            settings_changes,
            cache: PrayerTimeCache::new(params.storage, params.engine, params.clock.clone()),
            scheduler: PrayerScheduler::new(),
            clock: params.clock,
            calendar: params.calendar,
            hold: HoldGesture::new(params.hold_duration),
            setup_origin: params.setup_origin,
            last_date_key: None,
            labels: DateLabels::default(),
            clock_face: ClockFace::default(),
            times: None,
            next: None,
            countdown: String::new(),
            temperature: None,
            screen: Screen::Home,
            status: None,
        }
    }

    /// Show today's times, from the cache when it still matches.
    pub fn start(&mut self) {
        let now = self.clock.now();
        let settings = self.store.get();
        self.set_date(settings.date_at(&now));

        match self.cache.get_cached_today_times(&settings) {
            Some(entry) => {
                log_decorated!("Using cached prayer times for {}", entry.date_key);
                self.apply_times(&entry.times, &settings);
            }
            None => self.load_prayer_times(),
        }

        self.set_now(now);
    }

    /// Advance the display to the injected clock's current time.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.set_now(now);
    }

    /// Update the clock face, then either handle a new day or move the countdown.
    ///
    /// A date change reloads the times and leaves the countdown until the
    /// following tick.
    pub fn set_now(&mut self, now: DateTime<Local>) {
        let settings = self.store.get();
        self.clock_face = match settings.zone() {
            Some(zone) => ClockFace::at(&now.with_timezone(&zone)),
            None => ClockFace::at(&now),
        };

        let today = settings.date_at(&now);
        if self.last_date_key.as_deref() != Some(local_date_key(today).as_str()) {
            log_pipe!();
            log_info!("Date changed to {}", local_date_key(today));
            self.set_date(today);
            self.load_prayer_times();
            return;
        }

        if self.times.is_some() {
            self.update_next(&now, &settings);
        }
        self.countdown = countdown(now.timestamp_millis(), self.next.and_then(|n| n.at));
    }

    /// Reload the times when the date changed, or unconditionally when `force`.
    ///
    /// Returns whether the times were reloaded.
    pub fn refresh_if_date_changed(&mut self, force: bool) -> bool {
        let today = self.store.get().date_at(&self.clock.now());
        let changed = self.last_date_key.as_deref() != Some(local_date_key(today).as_str());

        if !force && !changed {
            return false;
        }

        if changed {
            self.set_date(today);
        }
        self.load_prayer_times();
        true
    }

    /// Persist new settings and apply them.
    pub fn save_settings(&mut self, next: PrayerSettings) {
        self.store.save(next);
        self.flush_settings_changes();
    }

    /// Apply a setup link on top of the current settings and return home.
    pub fn apply_link(&mut self, link: &str) -> Result<(), LinkError> {
        let next = apply_setup_link(link, &self.store.get())?;
        self.save_settings(next);
        self.screen = Screen::Home;
        Ok(())
    }

    /// Pick up settings saved by another process. `true` when they changed.
    pub fn reload_settings(&mut self) -> bool {
        if !self.store.reload() {
            return false;
        }
        log_block_start!("Settings changed");
        self.flush_settings_changes();
        true
    }

    pub fn settings(&self) -> PrayerSettings {
        self.store.get()
    }

    /// Where to ask for the temperature, if anywhere.
    pub fn weather_coords(&self) -> Option<Coordinates> {
        self.store.get().coords
    }

    pub fn set_temperature(&mut self, temperature: Option<f64>) {
        self.temperature = temperature;
    }

    /// Start the settings hold. Ignored away from the home screen.
    pub fn hold_press(&mut self, now: Instant) {
        if self.screen == Screen::Home {
            self.hold.press(now);
        }
    }

    pub fn hold_release(&mut self) {
        self.hold.release();
    }

    pub fn hold_remaining(&self, now: Instant) -> Option<Duration> {
        self.hold.remaining(now)
    }

    /// Switch to the settings screen once the hold completes.
    pub fn poll_hold(&mut self, now: Instant) -> bool {
        if !self.hold.poll(now) {
            return false;
        }
        log_decorated!("Showing settings");
        self.screen = Screen::Settings;
        true
    }

    pub fn set_hold_duration(&mut self, hold_duration: Duration) {
        self.hold = HoldGesture::new(hold_duration);
    }

    pub fn set_setup_origin(&mut self, origin: &str) {
        self.setup_origin = origin.to_string();
    }

    /// Leave the settings screen. `false` when already home.
    pub fn back(&mut self) -> bool {
        if self.screen == Screen::Settings {
            self.screen = Screen::Home;
            return true;
        }
        false
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn next_prayer(&self) -> Option<NextPrayer> {
        self.next
    }

    pub fn frame(&self) -> Frame {
        let settings = self.store.get();

        let prayers = match &self.times {
            Some(times) => PrayerKey::ALL
                .into_iter()
                .map(|key| {
                    let (time, ampm) = split_time(times.get(key));
                    PrayerRow {
                        key,
                        time,
                        ampm,
                        is_next: self.next.is_some_and(|next| next.key == key),
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        Frame {
            clock: self.clock_face.clone(),
            labels: self.labels.clone(),
            prayers,
            sunrise: self.times.as_ref().map(|t| split_time(&t.sunrise)),
            sunset: self.times.as_ref().map(|t| split_time(&t.sunset)),
            next_label: self
                .next
                .map(|next| next.label())
                .unwrap_or_else(|| "PRAYER".to_string()),
            countdown: self.countdown.clone(),
            temperature: self.temperature,
            panel_left: settings.panel_left,
            screen: self.screen,
            settings: settings_lines(&settings),
            setup_link: setup_link(&self.setup_origin, &settings),
            status: self.status.clone(),
        }
    }

    /// Detach from the store and drop any pending hold.
    pub fn shutdown(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.hold.release();
    }

    fn flush_settings_changes(&mut self) {
        loop {
            let Some(settings) = self.settings_changes.borrow_mut().pop_front() else {
                break;
            };
            self.on_settings_changed(&settings);
        }
    }

    fn on_settings_changed(&mut self, settings: &PrayerSettings) {
        // a new zone can move the board to another date
        self.set_date(settings.date_at(&self.clock.now()));

        match self.cache.get_cached_today_times(settings) {
            Some(entry) => {
                self.status = None;
                self.apply_times(&entry.times, settings);
            }
            None => self.compute_and_apply(settings),
        }
    }

    fn load_prayer_times(&mut self) {
        let settings = self.store.get();
        self.compute_and_apply(&settings);
    }

    fn compute_and_apply(&mut self, settings: &PrayerSettings) {
        if settings.coords.is_none() {
            self.clear_times();
            self.status = Some(LOCATION_HINT.to_string());
            return;
        }

        match self.cache.compute_and_cache_today_times(settings) {
            Ok(entry) => {
                self.status = None;
                self.apply_times(&entry.times, settings);
            }
            Err(e) => {
                log_warning!("Could not compute prayer times: {e}");
                self.clear_times();
                self.status = Some(format!("Could not compute prayer times: {e}"));
            }
        }
    }

    /// Drop the shown times so a stale day is never counted down to.
    fn clear_times(&mut self) {
        self.times = None;
        self.next = None;
        self.countdown.clear();
        self.scheduler = PrayerScheduler::new();
    }

    fn set_date(&mut self, today: NaiveDate) {
        self.labels = DateLabels::for_date(today, self.calendar.as_ref());
        self.last_date_key = Some(local_date_key(today));
    }

    fn apply_times(&mut self, raw: &PrayerTimes, settings: &PrayerSettings) {
        let now = self.clock.now();
        let today = settings.date_at(&now);
        match settings.zone() {
            Some(zone) => self.scheduler.apply_times(raw, today, &zone),
            None => self.scheduler.apply_times(raw, today, &Local),
        }
        self.times = Some(raw.clone());
        self.update_next(&now, settings);
    }

    fn update_next(&mut self, now: &DateTime<Local>, settings: &PrayerSettings) {
        let next = match settings.zone() {
            Some(zone) => {
                self.scheduler
                    .select_next(&now.with_timezone(&zone), &self.cache, settings)
            }
            None => self.scheduler.select_next(now, &self.cache, settings),
        };
        self.next = Some(next);
    }
}

/// Label/value pairs describing `settings`, as shown on the settings screen.
pub fn settings_lines(settings: &PrayerSettings) -> Vec<(String, String)> {
    let location = match settings.coords {
        Some(coords) => format!("{:.4}, {:.4}", coords.lat, coords.lng),
        None => "Not set".to_string(),
    };

    let mut lines = vec![
        ("Location".to_string(), location),
        ("Method".to_string(), settings.method.to_string()),
        ("Asr".to_string(), settings.asr.to_string()),
        ("Timezone".to_string(), settings.timezone.clone()),
        (
            "Panel".to_string(),
            if settings.panel_left { "Left" } else { "Right" }.to_string(),
        ),
    ];
    if let Some(id) = &settings.city_id {
        let name = find_city(id).map_or_else(|| id.clone(), |city| city.name.to_string());
        lines.push(("City".to_string(), name));
    }
    lines
}
