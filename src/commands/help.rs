//! Help command implementation for prayerboard.
//!
//! This module provides a dispatcher for the help command that shows
//! command-specific help or general help based on the arguments provided.

use anyhow::Result;

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("help") => display_help_help(),
        Some("locate") => super::locate::display_help(),
        Some("run") => display_run_help(),
        Some("settings") => super::settings::display_help(),
        Some("setup") => super::setup::display_help(),
        Some("times") => super::times::display_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("run                    Show the board (default)");
    log_indented!("setup <link>           Apply a setup link and save the settings");
    log_indented!("times [--date <date>]  Print the prayer times for today or a date");
    log_indented!("settings [options]     Change and print the saved settings");
    log_indented!("locate                 Detect the current location and save it");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'prayerboard help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'prayerboard --help' to see all options and general usage.");
    log_end!();
}

fn display_run_help() {
    log_version!();
    log_block_start!("run - Show the board");
    log_block_start!("Usage: prayerboard [run] [--headless] [--log <file>]");
    log_block_start!("Description:");
    log_indented!("Shows the clock, the Gregorian and Hijri dates, today's prayer");
    log_indented!("times and a countdown to the next prayer. The day rolls over");
    log_indented!("on its own, and after resume or a clock change.");
    log_block_start!("Controls:");
    log_indented!("Hold the mouse in the top-left corner (or hold 's' where the");
    log_indented!("terminal reports key releases) to open the settings screen.");
    log_indented!("Esc leaves the settings screen; q or Esc on the board quits.");
    log_block_start!("Display:");
    log_indented!("With display = \"auto\" the board draws on a terminal and logs");
    log_indented!("schedule changes otherwise. --headless always logs.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: prayerboard help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("prayerboard help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("prayerboard help setup");
    log_indented!("prayerboard help times");
    log_end!();
}
