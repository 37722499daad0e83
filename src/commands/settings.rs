//! Change the saved settings, then print them with their shareable setup link.

use anyhow::{Result, anyhow};

use crate::config::Config;
use crate::core::board::settings_lines;
use crate::settings::edit::{SettingsEdit, apply_edit};
use crate::settings::link::setup_link;
use crate::settings::{PrayerSettings, SettingsStore};

/// Apply `edit` to the stored settings and save them.
pub(crate) fn edit_and_save(edit: &SettingsEdit, store: &mut SettingsStore) -> Result<PrayerSettings> {
    let next = apply_edit(edit, &store.get()).map_err(|e| anyhow!("Settings not saved: {e}"))?;
    store.save(next.clone());
    Ok(next)
}

pub fn handle_settings_command(edit: &SettingsEdit, debug_enabled: bool) -> Result<()> {
    let config = Config::load()?;
    let storage = super::state_storage()?;

    if debug_enabled {
        log_pipe!();
        log_debug!(
            "Settings record: {}",
            crate::common::utils::private_path(storage.dir())
        );
    }

    let mut store = SettingsStore::load(storage);

    log_version!();
    let settings = if edit.is_empty() {
        log_block_start!("Current settings");
        store.get()
    } else {
        let saved = edit_and_save(edit, &mut store)?;
        log_block_start!("Settings saved");
        saved
    };
    super::log_settings_lines(&settings_lines(&settings));

    if !edit.is_empty() {
        super::notify_running_board(debug_enabled);
    }

    let link = setup_link(config.setup_origin(), &settings);
    if link.is_empty() {
        log_block_start!("No setup link: location not set");
    } else {
        log_block_start!("Setup link:");
        log_indented!("{link}");
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("settings - Show or change the saved settings");
    log_block_start!("Usage: prayerboard settings [options]");
    log_block_start!("Description:");
    log_indented!("Without options, prints the location, method, Asr convention,");
    log_indented!("timezone and panel side, followed by a setup link that");
    log_indented!("reproduces them on another board. The link origin comes from");
    log_indented!("setup_origin in prayerboard.toml. With options, the given");
    log_indented!("fields are changed and saved first; a running board picks the");
    log_indented!("change up immediately.");
    log_block_start!("Options:");
    log_indented!("--city <id>            Preset city (sets location and timezone)");
    log_indented!("--lat <deg> --lng <deg>");
    log_indented!("                       Location entered by hand");
    log_indented!("--method <name>        ISNA, MWL, Egypt, Makkah, Karachi, ...");
    log_indented!("--asr <name>           Standard or Hanafi");
    log_indented!("--timezone <zone>      IANA timezone name");
    log_indented!("--panel <left|right>   Side of the clock and date panel");
    log_block_start!("Cities:");
    for city in crate::settings::cities::CITIES {
        log_indented!("{:<22} {}", city.id, city.name);
    }
    log_block_start!("Examples:");
    log_indented!("prayerboard settings --panel right");
    log_indented!("prayerboard settings --city dearborn-mi --asr Standard");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::settings::Coordinates;
    use std::sync::Arc;

    #[test]
    fn test_edit_persists_panel_and_city() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SettingsStore::load(storage.clone());
        assert!(store.get().panel_left);

        let edit = SettingsEdit {
            panel: Some("right".to_string()),
            city: Some("ann-arbor-mi".to_string()),
            ..SettingsEdit::default()
        };
        edit_and_save(&edit, &mut store).unwrap();

        let reloaded = SettingsStore::load(storage).get();
        assert!(!reloaded.panel_left);
        assert_eq!(reloaded.city_id.as_deref(), Some("ann-arbor-mi"));
        assert_eq!(reloaded.coords, Some(Coordinates::new(42.2808, -83.743)));
        assert_eq!(reloaded.timezone, "America/Detroit");
    }

    #[test]
    fn test_rejected_edit_saves_nothing() {
        use crate::common::constants::SETTINGS_STORAGE_KEY;
        use crate::io::storage::Storage;

        let storage = Arc::new(MemoryStorage::new());
        let mut store = SettingsStore::load(storage.clone());

        let edit = SettingsEdit {
            panel: Some("right".to_string()),
            method: Some("Moonsighting".to_string()),
            ..SettingsEdit::default()
        };
        let err = edit_and_save(&edit, &mut store).unwrap_err();
        assert!(err.to_string().starts_with("Settings not saved"));
        assert!(store.get().panel_left);
        assert!(storage.read(SETTINGS_STORAGE_KEY).unwrap().is_none());
    }
}
