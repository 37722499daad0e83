//! Configuration loading functionality.
//!
//! Handles locating `prayerboard.toml`, creating it on first run, parsing and
//! applying defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::validation::validate_config;
use super::{Config, DisplayMode};
use crate::common::constants::*;
use crate::common::utils::private_path;

const CONFIG_FILE_NAME: &str = "prayerboard.toml";

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Load configuration, creating the default file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific path. Does not create a missing file.
pub fn load_from_path(path: &PathBuf) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found at {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;
    apply_defaults(&mut config);

    Ok(config)
}

pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("prayerboard").join(CONFIG_FILE_NAME))
}

fn apply_defaults(config: &mut Config) {
    if config.tick_interval.is_none() {
        config.tick_interval = Some(DEFAULT_TICK_INTERVAL);
    }
    if config.rollover_poll_interval.is_none() {
        config.rollover_poll_interval = Some(DEFAULT_ROLLOVER_POLL_INTERVAL);
    }
    if config.hold_duration.is_none() {
        config.hold_duration = Some(DEFAULT_HOLD_DURATION);
    }
    if config.weather.is_none() {
        config.weather = Some(DEFAULT_WEATHER);
    }
    if config.display.is_none() {
        config.display = Some(DisplayMode::Auto);
    }
    if config.system_events.is_none() {
        config.system_events = Some(DEFAULT_SYSTEM_EVENTS);
    }
    if config.setup_origin.is_none() {
        config.setup_origin = Some(DEFAULT_SETUP_ORIGIN.to_string());
    }
}
