//! Default configuration file creation.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::common::constants::*;
use crate::common::utils::private_path;

/// Write a commented default `prayerboard.toml` at `path`.
pub fn create_default_config(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));
    Ok(())
}

pub(crate) fn default_config_content() -> String {
    let mut content = ConfigBuilder::new()
        .add_section("Refresh")
        .add_setting(
            "tick_interval",
            &DEFAULT_TICK_INTERVAL.to_string(),
            &format!(
                "Display tick in milliseconds ({MINIMUM_TICK_INTERVAL}-{MAXIMUM_TICK_INTERVAL})"
            ),
        )
        .add_setting(
            "rollover_poll_interval",
            &DEFAULT_ROLLOVER_POLL_INTERVAL.to_string(),
            &format!(
                "Day rollover check in seconds ({MINIMUM_ROLLOVER_POLL_INTERVAL}-{MAXIMUM_ROLLOVER_POLL_INTERVAL})"
            ),
        )
        .add_section("Display")
        .add_setting(
            "display",
            &format!("\"{DEFAULT_DISPLAY}\""),
            "Output: \"auto\", \"terminal\" or \"log\"",
        )
        .add_setting(
            "hold_duration",
            &DEFAULT_HOLD_DURATION.to_string(),
            &format!(
                "Press-and-hold to open settings in milliseconds ({MINIMUM_HOLD_DURATION}-{MAXIMUM_HOLD_DURATION})"
            ),
        )
        .add_setting(
            "weather",
            &DEFAULT_WEATHER.to_string(),
            "Show the current temperature (Open-Meteo)",
        )
        .add_setting(
            "setup_origin",
            &format!("\"{DEFAULT_SETUP_ORIGIN}\""),
            "Origin used for the shareable setup link",
        )
        .add_section("System")
        .add_setting(
            "system_events",
            &DEFAULT_SYSTEM_EVENTS.to_string(),
            "Re-check the date on resume and clock changes",
        )
        .build();
    content.push('\n');
    content
}

/// Builds TOML with comments aligned to one column across all settings.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // +1 for one space between setting and comment
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
