//! Configuration validation functionality.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;

/// Reject values outside their supported ranges.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(interval) = config.tick_interval
        && !(MINIMUM_TICK_INTERVAL..=MAXIMUM_TICK_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "tick_interval ({} ms) must be between {} and {} milliseconds",
            interval,
            MINIMUM_TICK_INTERVAL,
            MAXIMUM_TICK_INTERVAL
        );
    }

    if let Some(interval) = config.rollover_poll_interval
        && !(MINIMUM_ROLLOVER_POLL_INTERVAL..=MAXIMUM_ROLLOVER_POLL_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "rollover_poll_interval ({} s) must be between {} and {} seconds",
            interval,
            MINIMUM_ROLLOVER_POLL_INTERVAL,
            MAXIMUM_ROLLOVER_POLL_INTERVAL
        );
    }

    if let Some(duration) = config.hold_duration
        && !(MINIMUM_HOLD_DURATION..=MAXIMUM_HOLD_DURATION).contains(&duration)
    {
        anyhow::bail!(
            "hold_duration ({} ms) must be between {} and {} milliseconds",
            duration,
            MINIMUM_HOLD_DURATION,
            MAXIMUM_HOLD_DURATION
        );
    }

    if let Some(origin) = &config.setup_origin {
        let parsed = url::Url::parse(origin);
        let is_http = matches!(
            parsed.as_ref().map(|u| u.scheme()),
            Ok("http") | Ok("https")
        );
        if !is_http {
            anyhow::bail!(
                "setup_origin ({}) must be an http:// or https:// URL",
                origin
            );
        }
    }

    Ok(())
}
