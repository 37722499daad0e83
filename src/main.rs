//! prayerboard binary: argument dispatch.
//!
//! Everything else lives in the library; this file turns the parsed command
//! line into a call and the call's result into an exit code.

use anyhow::Result;

use prayerboard::args::{self, CliAction, ParsedArgs};
use prayerboard::common::constants::EXIT_FAILURE;
use prayerboard::logger::Log;
use prayerboard::{Prayerboard, commands, config, log_end, log_error_exit};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    if let Err(e) = run(parsed_args.action) {
        Log::set_enabled(true);
        log_error_exit!("{e:#}");
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(action: CliAction) -> Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Run {
            debug_enabled,
            config_dir,
            headless,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;

            // Flushes the log file when dropped.
            let _log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path)?),
                None => None,
            };

            let board = Prayerboard::new(debug_enabled);
            if headless {
                board.headless().run()
            } else {
                board.run()
            }
        }
        CliAction::Setup {
            debug_enabled,
            config_dir,
            link,
        } => {
            config::set_config_dir(config_dir)?;
            commands::setup::handle_setup_command(&link, debug_enabled)
        }
        CliAction::Times {
            debug_enabled,
            config_dir,
            date,
        } => {
            config::set_config_dir(config_dir)?;
            commands::times::handle_times_command(date, debug_enabled)
        }
        CliAction::Settings {
            debug_enabled,
            config_dir,
            edit,
        } => {
            config::set_config_dir(config_dir)?;
            commands::settings::handle_settings_command(&edit, debug_enabled)
        }
        CliAction::Locate {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            commands::locate::handle_locate_command(debug_enabled)
        }
    }
}
