//! Small helpers shared by configuration, storage and process management.

use std::path::{Path, PathBuf};

use crate::common::constants::FALLBACK_TIMEZONE;

/// Render a path for logs with the home directory collapsed to `~`.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Detect the system's IANA timezone name.
///
/// Checks `TZ` first, then the `/etc/localtime` symlink target, then
/// `/etc/timezone`. Falls back to `UTC` when nothing usable is found.
pub fn system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        let tz = tz.trim().trim_start_matches(':');
        if !tz.is_empty() {
            return tz.to_string();
        }
    }

    if let Ok(target) = std::fs::read_link("/etc/localtime")
        && let Some(name) = zone_name_from_localtime_target(&target)
    {
        return name;
    }

    if let Ok(content) = std::fs::read_to_string("/etc/timezone") {
        let name = content.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    FALLBACK_TIMEZONE.to_string()
}

/// Extract `Region/City` from a target like `/usr/share/zoneinfo/Region/City`.
fn zone_name_from_localtime_target(target: &Path) -> Option<String> {
    let text = target.to_string_lossy();
    let (_, name) = text.split_once("zoneinfo/")?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Whether a process with this PID is alive.
pub fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}
