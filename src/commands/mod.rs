//! Command-line command handlers for prayerboard.
//!
//! One-shot commands that read or change the saved settings without showing
//! the board. Commands that save settings notify a running board so it picks
//! the change up immediately.

pub mod help;
pub mod locate;
pub mod settings;
pub mod setup;
pub mod times;

use anyhow::Result;
use std::sync::Arc;

use crate::io::lock;
use crate::io::storage::FileStorage;

/// The state directory the board reads its records from.
pub(crate) fn state_storage() -> Result<Arc<FileStorage>> {
    Ok(Arc::new(FileStorage::new(FileStorage::default_dir()?)))
}

/// Ask a running board to reload its settings.
pub(crate) fn notify_running_board(debug_enabled: bool) {
    match lock::signal_settings_reload() {
        Ok(true) => log_decorated!("Running board notified"),
        Ok(false) => {
            if debug_enabled {
                log_pipe!();
                log_debug!("No running board to notify");
            }
        }
        Err(e) => {
            log_pipe!();
            log_warning!("Could not notify the running board: {e}");
            log_indented!("It will pick up the change from the settings file");
        }
    }
}

/// Log each label/value pair on its own aligned line.
pub(crate) fn log_settings_lines(lines: &[(String, String)]) {
    let width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in lines {
        log_indented!("{label:<width$}  {value}");
    }
}
