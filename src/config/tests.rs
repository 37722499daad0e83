use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn parse(content: &str) -> Result<Config> {
    let dir = tempdir()?;
    let path = dir.path().join("prayerboard.toml");
    fs::write(&path, content)?;
    load_from_path(&path)
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("prayerboard").join("prayerboard.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config.tick_interval, Some(DEFAULT_TICK_INTERVAL));
    assert_eq!(config.display, Some(DisplayMode::Auto));
}

#[test]
fn test_default_content_parses_to_defaults() {
    let config = parse(&builder::default_config_content()).unwrap();

    assert_eq!(config.tick_interval(), Duration::from_millis(1000));
    assert_eq!(config.rollover_poll_interval(), Duration::from_secs(300));
    assert_eq!(config.hold_duration(), Duration::from_millis(1800));
    assert!(config.weather_enabled());
    assert!(config.system_events_enabled());
    assert_eq!(config.display_mode(), DisplayMode::Auto);
    assert_eq!(config.setup_origin(), "http://localhost:4200");
}

#[test]
fn test_default_content_comments_are_aligned() {
    let content = builder::default_config_content();
    let columns: Vec<usize> = content
        .lines()
        .filter(|line| !line.starts_with('#') && !line.is_empty())
        .map(|line| line.find(" # ").unwrap())
        .collect();

    assert!(!columns.is_empty());
    assert!(columns.iter().all(|&c| c == columns[0]));
    assert!(content.contains("#[Refresh]"));
    assert!(content.contains("#[System]"));
}

#[test]
fn test_empty_file_gets_defaults() {
    let config = parse("").unwrap();
    assert_eq!(config.hold_duration, Some(DEFAULT_HOLD_DURATION));
    assert_eq!(config.weather, Some(true));
}

#[test]
fn test_partial_file() {
    let config = parse("display = \"log\"\nweather = false\ntick_interval = 250\n").unwrap();
    assert_eq!(config.display_mode(), DisplayMode::Log);
    assert!(!config.weather_enabled());
    assert_eq!(config.tick_interval(), Duration::from_millis(250));
    assert_eq!(config.rollover_poll_interval(), Duration::from_secs(300));
}

#[test]
fn test_unknown_display_mode_fails_to_parse() {
    let err = parse("display = \"hologram\"\n").unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config"));
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempdir().unwrap();
    assert!(load_from_path(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_validation_ranges() {
    let valid = Config {
        tick_interval: Some(MINIMUM_TICK_INTERVAL),
        rollover_poll_interval: Some(MAXIMUM_ROLLOVER_POLL_INTERVAL),
        hold_duration: Some(MINIMUM_HOLD_DURATION),
        setup_origin: Some("https://board.example.org".to_string()),
        ..Config::default()
    };
    assert!(validate_config(&valid).is_ok());

    let cases = [
        Config {
            tick_interval: Some(MINIMUM_TICK_INTERVAL - 1),
            ..Config::default()
        },
        Config {
            tick_interval: Some(MAXIMUM_TICK_INTERVAL + 1),
            ..Config::default()
        },
        Config {
            rollover_poll_interval: Some(MINIMUM_ROLLOVER_POLL_INTERVAL - 1),
            ..Config::default()
        },
        Config {
            hold_duration: Some(MAXIMUM_HOLD_DURATION + 1),
            ..Config::default()
        },
        Config {
            setup_origin: Some("kiosk:4200".to_string()),
            ..Config::default()
        },
        Config {
            setup_origin: Some("ftp://kiosk".to_string()),
            ..Config::default()
        },
    ];

    for config in cases {
        assert!(validate_config(&config).is_err(), "{config:?}");
    }
}

#[test]
fn test_validation_error_message() {
    let err = parse("hold_duration = 50\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "hold_duration (50 ms) must be between 200 and 10000 milliseconds"
    );
}
