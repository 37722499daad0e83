//! Apply a setup link from the command line.

use anyhow::{Result, anyhow};

use crate::core::board::settings_lines;
use crate::settings::link::apply_setup_link;
use crate::settings::{PrayerSettings, SettingsStore};

/// Merge `link` into the stored settings and save them.
pub(crate) fn apply_link(link: &str, store: &mut SettingsStore) -> Result<PrayerSettings> {
    let next = apply_setup_link(link, &store.get())
        .map_err(|e| anyhow!("Setup link rejected: {e}"))?;
    store.save(next.clone());
    Ok(next)
}

pub fn handle_setup_command(link: &str, debug_enabled: bool) -> Result<()> {
    log_version!();

    let mut store = SettingsStore::load(super::state_storage()?);
    let saved = apply_link(link, &mut store)?;

    log_block_start!("Settings saved");
    super::log_settings_lines(&settings_lines(&saved));
    super::notify_running_board(debug_enabled);
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("setup - Apply a setup link");
    log_block_start!("Usage: prayerboard setup <link>");
    log_block_start!("Description:");
    log_indented!("Reads the location, calculation method, Asr convention and");
    log_indented!("timezone from a link and saves them. Accepts a full link,");
    log_indented!("a /settings?... path or a bare query string.");
    log_block_start!("Parameters:");
    log_indented!("lat, latitude          Latitude in degrees (required)");
    log_indented!("lng, lon, longitude    Longitude in degrees (required)");
    log_indented!("method                 ISNA, MWL, Egypt, Makkah, Karachi, ...");
    log_indented!("asr                    Standard or Hanafi");
    log_indented!("timezone, tz           IANA timezone name");
    log_block_start!("Examples:");
    log_indented!("prayerboard setup 'http://kiosk:4200/settings?lat=42.4788&lng=-83.0248&method=ISNA'");
    log_indented!("prayerboard setup 'lat=21.4225&lng=39.8262&method=Makkah&tz=Asia/Riyadh'");
    log_end!();
}
