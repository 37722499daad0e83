//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. Flags may appear anywhere on the
//! command line; the first positional argument selects the command.

use chrono::NaiveDate;

use crate::settings::edit::SettingsEdit;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the board (the default when no command is given)
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        /// Force log output even on a terminal
        headless: bool,
        log_file: Option<String>,
    },
    /// Apply a setup link and save the result
    Setup {
        debug_enabled: bool,
        config_dir: Option<String>,
        link: String,
    },
    /// Print one day's schedule
    Times {
        debug_enabled: bool,
        config_dir: Option<String>,
        date: Option<NaiveDate>,
    },
    /// Print the saved settings and their setup link, after applying any edits
    Settings {
        debug_enabled: bool,
        config_dir: Option<String>,
        edit: SettingsEdit,
    },
    /// Ask the system for the current position and save it
    Locate {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Detailed help for a command
    Help { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped. Version wins over
    /// help, and both win over any command.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut headless = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut date_arg: Option<String> = None;
        let mut edit = SettingsEdit::default();
        let mut positionals: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--headless" => headless = true,
                "--config" | "-c" | "--log" | "--date" => {
                    let value = args_vec.get(i + 1).filter(|next| !next.starts_with('-'));
                    match (arg, value) {
                        ("--config" | "-c", Some(dir)) => config_dir = Some(dir.clone()),
                        ("--log", Some(path)) => log_file = Some(path.clone()),
                        ("--date", Some(date)) => date_arg = Some(date.clone()),
                        ("--config" | "-c", None) => {
                            log_warning!(
                                "Missing directory for --config. Usage: --config <directory>"
                            );
                            unknown_arg_found = true;
                        }
                        ("--log", None) => {
                            log_warning!("Missing path for --log. Usage: --log <file>");
                            unknown_arg_found = true;
                        }
                        _ => {
                            log_warning!("Missing date for --date. Usage: --date YYYY-MM-DD");
                            unknown_arg_found = true;
                        }
                    }
                    if value.is_some() {
                        i += 1;
                    }
                }
                "--lat" | "--lng" | "--city" | "--method" | "--asr" | "--timezone" | "--panel" => {
                    // coordinates may be negative
                    let value = args_vec.get(i + 1).filter(|next| {
                        !next.starts_with('-')
                            || (matches!(arg, "--lat" | "--lng") && next.parse::<f64>().is_ok())
                    });
                    match value {
                        Some(value) => {
                            let slot = match arg {
                                "--lat" => &mut edit.lat,
                                "--lng" => &mut edit.lng,
                                "--city" => &mut edit.city,
                                "--method" => &mut edit.method,
                                "--asr" => &mut edit.asr,
                                "--timezone" => &mut edit.timezone,
                                _ => &mut edit.panel,
                            };
                            *slot = Some(value.clone());
                            i += 1;
                        }
                        None => {
                            log_warning!("Missing value for {}. See 'prayerboard help settings'", arg);
                            unknown_arg_found = true;
                        }
                    }
                }
                _ if arg.starts_with('-') && arg.len() > 1 => {
                    log_warning!("Unknown argument: {}", arg);
                    unknown_arg_found = true;
                }
                _ => positionals.push(arg.to_string()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let command = positionals.first().map(String::as_str);
        let rest = positionals.get(1..).unwrap_or_default();

        if date_arg.is_some() && command != Some("times") {
            log_warning!("--date only applies to the times command");
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        if !edit.is_empty() && command != Some("settings") {
            log_warning!("Settings options only apply to the settings command");
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let action = match (command, rest) {
            (None | Some("run"), []) => CliAction::Run {
                debug_enabled,
                config_dir,
                headless,
                log_file,
            },
            (Some("setup"), [link]) => CliAction::Setup {
                debug_enabled,
                config_dir,
                link: link.clone(),
            },
            (Some("setup"), []) => {
                log_warning!("Missing link. Usage: prayerboard setup <link>");
                CliAction::ShowHelpDueToError
            }
            (Some("times"), []) => match date_arg.as_deref().map(parse_date) {
                None => CliAction::Times {
                    debug_enabled,
                    config_dir,
                    date: None,
                },
                Some(Some(date)) => CliAction::Times {
                    debug_enabled,
                    config_dir,
                    date: Some(date),
                },
                Some(None) => {
                    log_warning!(
                        "Invalid date: {}. Expected YYYY-MM-DD",
                        date_arg.unwrap_or_default()
                    );
                    CliAction::ShowHelpDueToError
                }
            },
            (Some("settings"), []) => CliAction::Settings {
                debug_enabled,
                config_dir,
                edit,
            },
            (Some("locate"), []) => CliAction::Locate {
                debug_enabled,
                config_dir,
            },
            (Some("help"), []) => CliAction::Help { command: None },
            (Some("help"), [command]) => CliAction::Help {
                command: Some(command.clone()),
            },
            (Some(command), extra)
                if matches!(
                    command,
                    "run" | "setup" | "times" | "settings" | "locate" | "help"
                ) =>
            {
                log_warning!(
                    "Too many arguments for {}: {}",
                    command,
                    extra.join(" ")
                );
                CliAction::ShowHelpDueToError
            }
            (Some(command), _) => {
                log_warning!("Unknown command: {}", command);
                CliAction::ShowHelpDueToError
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("prayerboard [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration and state directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("    --headless         Log the schedule instead of drawing the board");
    log_indented!("    --log <file>       Write log output to a file");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Show the board (default)");
    log_indented!("setup <link>           Apply a setup link and save the settings");
    log_indented!("times [--date <date>]  Print the prayer times for today or a date");
    log_indented!("settings [options]     Change and print the saved settings");
    log_indented!("locate                 Detect the current location and save it");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        let mut full = vec!["prayerboard"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full).action
    }

    fn run(debug_enabled: bool) -> CliAction {
        CliAction::Run {
            debug_enabled,
            config_dir: None,
            headless: false,
            log_file: None,
        }
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), run(false));
        assert_eq!(parse(&["run"]), run(false));
    }

    #[test]
    fn test_parse_debug_flag() {
        assert_eq!(parse(&["--debug"]), run(true));
        assert_eq!(parse(&["-d"]), run(true));
    }

    #[test]
    fn test_parse_run_options() {
        assert_eq!(
            parse(&["run", "--headless", "--log", "/tmp/board.log", "-c", "/srv/board"]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: Some("/srv/board".to_string()),
                headless: true,
                log_file: Some("/tmp/board.log".to_string()),
            }
        );
    }

    #[test]
    fn test_help_and_version_precedence() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-h", "times"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        assert_eq!(parse(&["-v"]), CliAction::ShowVersion);
        assert_eq!(
            parse(&["--version", "--help", "--debug"]),
            CliAction::ShowVersion
        );
    }

    #[test]
    fn test_parse_unknown_arguments() {
        assert_eq!(parse(&["--unknown"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--debug", "--invalid"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["sunrise"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--config"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_setup() {
        assert_eq!(
            parse(&["setup", "https://kiosk/settings?lat=1&lng=2", "-d"]),
            CliAction::Setup {
                debug_enabled: true,
                config_dir: None,
                link: "https://kiosk/settings?lat=1&lng=2".to_string(),
            }
        );
        assert_eq!(parse(&["setup"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["setup", "a", "b"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_times() {
        assert_eq!(
            parse(&["times"]),
            CliAction::Times {
                debug_enabled: false,
                config_dir: None,
                date: None,
            }
        );
        assert_eq!(
            parse(&["--date", "2024-06-01", "times"]),
            CliAction::Times {
                debug_enabled: false,
                config_dir: None,
                date: NaiveDate::from_ymd_opt(2024, 6, 1),
            }
        );
        assert_eq!(
            parse(&["times", "--date", "June 1"]),
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            parse(&["--date", "2024-06-01"]),
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(
            parse(&["settings", "--config", "/srv/board"]),
            CliAction::Settings {
                debug_enabled: false,
                config_dir: Some("/srv/board".to_string()),
                edit: SettingsEdit::default(),
            }
        );
        assert_eq!(
            parse(&["locate"]),
            CliAction::Locate {
                debug_enabled: false,
                config_dir: None,
            }
        );
        assert_eq!(parse(&["help"]), CliAction::Help { command: None });
        assert_eq!(
            parse(&["help", "setup"]),
            CliAction::Help {
                command: Some("setup".to_string())
            }
        );
        assert_eq!(parse(&["locate", "now"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_settings_edits() {
        assert_eq!(
            parse(&["settings", "--panel", "right", "--city", "troy-mi", "--asr", "Standard"]),
            CliAction::Settings {
                debug_enabled: false,
                config_dir: None,
                edit: SettingsEdit {
                    panel: Some("right".to_string()),
                    city: Some("troy-mi".to_string()),
                    asr: Some("Standard".to_string()),
                    ..SettingsEdit::default()
                },
            }
        );
        assert_eq!(
            parse(&[
                "settings",
                "--lat",
                "-33.8688",
                "--lng",
                "151.2093",
                "--timezone",
                "Australia/Sydney",
                "--method",
                "MWL",
            ]),
            CliAction::Settings {
                debug_enabled: false,
                config_dir: None,
                edit: SettingsEdit {
                    lat: Some("-33.8688".to_string()),
                    lng: Some("151.2093".to_string()),
                    timezone: Some("Australia/Sydney".to_string()),
                    method: Some("MWL".to_string()),
                    ..SettingsEdit::default()
                },
            }
        );
    }

    #[test]
    fn test_settings_options_need_values_and_the_settings_command() {
        assert_eq!(parse(&["settings", "--panel"]), CliAction::ShowHelpDueToError);
        assert_eq!(
            parse(&["settings", "--method", "--debug"]),
            CliAction::ShowHelpDueToError
        );
        assert_eq!(parse(&["--panel", "left"]), CliAction::ShowHelpDueToError);
        assert_eq!(
            parse(&["times", "--city", "troy-mi"]),
            CliAction::ShowHelpDueToError
        );
    }
}
