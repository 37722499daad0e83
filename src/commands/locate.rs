//! Explicit geolocation: the only way the board ever asks for a position.

use anyhow::{Result, anyhow};

use crate::core::board::settings_lines;
use crate::io::geolocation::{GeoClueGeolocation, GeoError, GeolocationProvider};
use crate::settings::{Coordinates, PrayerSettings, SettingsStore};

/// Ask `provider` for a fix and save it as the board's location.
///
/// Everything but the coordinates is kept; the city id is cleared since the
/// position no longer comes from the city list.
pub(crate) fn locate_and_save(
    provider: &dyn GeolocationProvider,
    store: &mut SettingsStore,
) -> Result<PrayerSettings, GeoError> {
    let coords: Coordinates = provider.request_position()?;
    let next = PrayerSettings {
        coords: Some(coords),
        city_id: None,
        ..store.get()
    };
    store.save(next.clone());
    Ok(next)
}

pub fn handle_locate_command(debug_enabled: bool) -> Result<()> {
    log_version!();
    log_block_start!("Requesting current location...");

    let mut store = SettingsStore::load(super::state_storage()?);
    let provider = GeoClueGeolocation::new();

    match locate_and_save(&provider, &mut store) {
        Ok(saved) => {
            log_block_start!("Location saved");
            super::log_settings_lines(&settings_lines(&saved));
            super::notify_running_board(debug_enabled);
            log_end!();
            Ok(())
        }
        Err(e) => {
            if debug_enabled {
                log_pipe!();
                log_debug!("Geolocation failed: {}", e.as_str());
            }
            Err(anyhow!("{}", e.status_message()))
        }
    }
}

pub fn display_help() {
    log_version!();
    log_block_start!("locate - Detect and save the current location");
    log_block_start!("Usage: prayerboard locate");
    log_block_start!("Description:");
    log_indented!("Asks GeoClue for the device position and saves it as the");
    log_indented!("board location. Method, Asr convention and timezone are kept.");
    log_indented!("The board itself never requests a position on its own.");
    log_end!();
}
