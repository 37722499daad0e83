//! Runtime configuration for the board process.
//!
//! Loaded from `prayerboard.toml` in `$XDG_CONFIG_HOME/prayerboard/` (or the
//! directory given with `--config`). A commented default file is written on
//! first run. Every field is optional:
//!
//! ```toml
//! #[Refresh]
//! tick_interval = 1000           # Display tick in milliseconds (100-5000)
//! rollover_poll_interval = 300   # Day rollover check in seconds (10-3600)
//!
//! #[Display]
//! display = "auto"               # Output: "auto", "terminal" or "log"
//! hold_duration = 1800           # Press-and-hold to open settings in milliseconds (200-10000)
//! weather = true                 # Show the current temperature (Open-Meteo)
//! setup_origin = "http://localhost:4200" # Origin used for the shareable setup link
//!
//! #[System]
//! system_events = true           # Re-check the date on resume and clock changes
//! ```
//!
//! This is process configuration. Location, method and layout are operator
//! settings and live in the persisted settings record instead.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::constants::*;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_file_watcher;

/// Where frames go.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Terminal when stdout is a TTY, log output otherwise
    Auto,
    Terminal,
    Log,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Auto => "auto",
            DisplayMode::Terminal => "terminal",
            DisplayMode::Log => "log",
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Display tick in milliseconds
    pub tick_interval: Option<u64>,
    /// Day rollover poll in seconds
    pub rollover_poll_interval: Option<u64>,
    /// Settings hold in milliseconds
    pub hold_duration: Option<u64>,
    pub weather: Option<bool>,
    pub display: Option<DisplayMode>,
    pub system_events: Option<bool>,
    pub setup_origin: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        loading::load()
    }

    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        loading::load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        loading::get_config_path()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval.unwrap_or(DEFAULT_TICK_INTERVAL))
    }

    pub fn rollover_poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.rollover_poll_interval
                .unwrap_or(DEFAULT_ROLLOVER_POLL_INTERVAL),
        )
    }

    pub fn hold_duration(&self) -> Duration {
        Duration::from_millis(self.hold_duration.unwrap_or(DEFAULT_HOLD_DURATION))
    }

    pub fn weather_enabled(&self) -> bool {
        self.weather.unwrap_or(DEFAULT_WEATHER)
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display.unwrap_or(DisplayMode::Auto)
    }

    pub fn system_events_enabled(&self) -> bool {
        self.system_events.unwrap_or(DEFAULT_SYSTEM_EVENTS)
    }

    pub fn setup_origin(&self) -> &str {
        self.setup_origin.as_deref().unwrap_or(DEFAULT_SETUP_ORIGIN)
    }

    /// Log the effective configuration.
    pub fn log_config(&self) {
        let source = match get_custom_config_dir() {
            Some(dir) => format!(
                "configuration from {}",
                crate::common::utils::private_path(&dir)
            ),
            None => "configuration".to_string(),
        };

        log_block_start!("Loaded {source}");
        log_indented!("Display: {}", self.display_mode().as_str());
        log_indented!("Tick interval: {}ms", self.tick_interval().as_millis());
        log_indented!(
            "Rollover poll: {}s",
            self.rollover_poll_interval().as_secs()
        );
        log_indented!("Settings hold: {}ms", self.hold_duration().as_millis());
        log_indented!(
            "Weather: {}",
            if self.weather_enabled() { "on" } else { "off" }
        );
        log_indented!(
            "System events: {}",
            if self.system_events_enabled() {
                "on"
            } else {
                "off"
            }
        );
    }
}

#[cfg(test)]
mod tests;
