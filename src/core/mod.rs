//! The board's main loop.
//!
//! [`Core`] owns the board, the renderer and the receiving end of the event
//! channel. It blocks in `recv_timeout` until the earliest of the display
//! tick, the rollover poll, a pending hold or the next weather refresh, and
//! handles every event on this thread:
//!
//! - Wake and focus events force a date check
//! - Settings changes (SIGUSR2 or file writes) reload the settings record
//! - Config file changes update the cadence and hold duration
//! - Input events drive the press-and-hold gesture and leave the settings screen
//!
//! Pending events are always drained before a due tick is processed.

pub mod board;
pub mod hold;
pub mod refresh;

use anyhow::Result;
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use crate::{
    common::constants::WEATHER_REFRESH_INTERVAL,
    config::Config,
    core::{board::Board, refresh::RefreshTrigger},
    display::Renderer,
    io::{
        lock::InstanceLock,
        signals::{BoardEvent, SignalState},
        weather::{WeatherProvider, spawn_fetch},
    },
};

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub board: Board,
    pub renderer: Box<dyn Renderer>,
    pub config: Config,
    pub signal_state: SignalState,
    /// `None` turns weather off regardless of the config
    pub weather: Option<Arc<dyn WeatherProvider>>,
    pub debug_enabled: bool,
    pub lock: Option<InstanceLock>,
}

pub(crate) struct Core {
    board: Board,
    renderer: Box<dyn Renderer>,
    config: Config,
    signal_state: SignalState,
    weather: Option<Arc<dyn WeatherProvider>>,
    debug_enabled: bool,
    lock: Option<InstanceLock>,
    refresh: RefreshTrigger,
    next_weather: Option<Instant>,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let now = Instant::now();
        let refresh = RefreshTrigger::new(
            params.config.tick_interval(),
            params.config.rollover_poll_interval(),
            now,
        );
        let next_weather =
            (params.weather.is_some() && params.config.weather_enabled()).then_some(now);

        Self {
            board: params.board,
            renderer: params.renderer,
            config: params.config,
            signal_state: params.signal_state,
            weather: params.weather,
            debug_enabled: params.debug_enabled,
            lock: params.lock,
            refresh,
            next_weather,
        }
    }

    /// Run until shutdown, then restore the terminal and release the lock.
    pub fn execute(mut self) -> Result<()> {
        self.board.start();
        self.render();

        let result = self.main_loop();

        let Core {
            board,
            mut renderer,
            lock,
            ..
        } = self;

        if let Err(e) = renderer.finish() {
            log_warning!("Failed to restore the terminal: {e}");
        }

        log_block_start!("Shutting down prayerboard...");
        board.shutdown();
        if let Some(lock) = lock {
            lock.release();
        }
        log_end!();

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        while self.signal_state.is_running() {
            let timeout = self.time_until_next_deadline(Instant::now());
            let mut dirty = false;

            match self.signal_state.receiver.recv_timeout(timeout) {
                Ok(event) => {
                    dirty |= self.handle_event(event);
                    while let Ok(event) = self.signal_state.receiver.try_recv() {
                        dirty |= self.handle_event(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log_pipe!();
                    log_critical!("Event channel disconnected unexpectedly");
                    self.signal_state.stop();
                }
            }

            if !self.signal_state.is_running() {
                break;
            }

            let now = Instant::now();
            dirty |= self.board.poll_hold(now);

            let due = self.refresh.take_due(now);
            if due.rollover_poll && self.board.refresh_if_date_changed(false) {
                dirty = true;
            }
            if due.tick {
                self.board.tick();
            }

            if self.next_weather.is_some_and(|at| now >= at) {
                self.fetch_weather(now);
            }

            if due.any() || dirty {
                self.render();
            }
        }

        Ok(())
    }

    /// Apply one event. Returns whether the frame needs redrawing.
    fn handle_event(&mut self, event: BoardEvent) -> bool {
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Event: {event:?}");
        }

        match event {
            BoardEvent::Wake(reason) => {
                log_pipe!();
                log_info!("Re-checking the date: {}", reason.describe());
                self.board.refresh_if_date_changed(true)
            }
            BoardEvent::Focus => self.board.refresh_if_date_changed(true),
            BoardEvent::ReloadSettings => {
                let changed = self.board.reload_settings();
                if changed && self.next_weather.is_some() {
                    self.next_weather = Some(Instant::now());
                }
                changed
            }
            BoardEvent::ReloadConfig => {
                self.reload_config();
                true
            }
            BoardEvent::Weather(temperature) => {
                self.board.set_temperature(temperature);
                true
            }
            BoardEvent::HoldPress => {
                self.board.hold_press(Instant::now());
                false
            }
            BoardEvent::HoldRelease => {
                self.board.hold_release();
                false
            }
            BoardEvent::Back => {
                if !self.board.back() {
                    self.signal_state.stop();
                }
                true
            }
            BoardEvent::Shutdown => {
                self.signal_state.stop();
                false
            }
        }
    }

    fn reload_config(&mut self) {
        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_pipe!();
                log_warning!("Failed to reload configuration: {e}");
                log_indented!("Keeping the previous configuration");
                return;
            }
        };

        let now = Instant::now();
        self.refresh.set_intervals(
            config.tick_interval(),
            config.rollover_poll_interval(),
            now,
        );
        self.board.set_hold_duration(config.hold_duration());
        self.board.set_setup_origin(config.setup_origin());

        if config.weather_enabled() != self.config.weather_enabled() {
            if config.weather_enabled() && self.weather.is_some() {
                self.next_weather = Some(now);
            } else {
                self.next_weather = None;
                self.board.set_temperature(None);
            }
        }

        log_block_start!("Configuration reloaded");
        config.log_config();
        self.config = config;
    }

    fn fetch_weather(&mut self, now: Instant) {
        self.next_weather = Some(now + WEATHER_REFRESH_INTERVAL);

        let Some(provider) = &self.weather else {
            return;
        };
        match self.board.weather_coords() {
            Some(coords) => spawn_fetch(provider.clone(), coords, self.signal_state.sender.clone()),
            None => self.board.set_temperature(None),
        }
    }

    fn time_until_next_deadline(&self, now: Instant) -> Duration {
        let mut timeout = self.refresh.time_until_due(now);
        if let Some(remaining) = self.board.hold_remaining(now) {
            timeout = timeout.min(remaining);
        }
        if let Some(at) = self.next_weather {
            timeout = timeout.min(at.saturating_duration_since(now));
        }
        timeout
    }

    fn render(&mut self) {
        if let Err(e) = self.renderer.render(&self.board.frame()) {
            log_warning!("Failed to draw the board: {e}");
        }
    }
}
