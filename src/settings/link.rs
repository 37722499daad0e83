//! Shareable setup links.
//!
//! A setup link carries a location and calculation choices in its query
//! string, e.g. `https://board.local/settings?lat=42.33&lng=-83.05&method=ISNA`.
//! Applying one merges it into the current settings. Links using the old
//! `/setup` path are handled exactly like `/settings`.

use std::fmt;
use url::form_urlencoded;

use super::{AsrConvention, CalculationMethod, Coordinates, PrayerSettings};

/// Why a link was not applied.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// Neither coordinate parameter is present
    NoCoordinates,
    /// A coordinate is missing, not a finite number, or out of range
    InvalidCoordinates,
    /// The link points somewhere other than the settings page
    UnknownPath(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::NoCoordinates => write!(f, "link has no lat/lng parameters"),
            LinkError::InvalidCoordinates => {
                write!(f, "link coordinates are missing, malformed or out of range")
            }
            LinkError::UnknownPath(path) => {
                write!(f, "link path '{path}' is not /settings or /setup")
            }
        }
    }
}

impl std::error::Error for LinkError {}

/// Query parameters of a link, in order of appearance.
struct LinkParams(Vec<(String, String)>);

impl LinkParams {
    /// Accepts a full URL, a `/settings?...` path or a bare query string.
    fn parse(link: &str) -> Result<Self, LinkError> {
        let link = link.trim();

        let (path, query) = if link.contains("://") {
            match url::Url::parse(link) {
                Ok(parsed) => (
                    parsed.path().to_string(),
                    parsed.query().unwrap_or_default().to_string(),
                ),
                Err(_) => return Err(LinkError::InvalidCoordinates),
            }
        } else {
            match link.split_once('?') {
                Some((path, query)) => (path.to_string(), query.to_string()),
                None if link.contains('=') => (String::new(), link.to_string()),
                None => (link.to_string(), String::new()),
            }
        };

        let route = path.trim_matches('/');
        if !matches!(route, "" | "settings" | "setup") {
            return Err(LinkError::UnknownPath(path));
        }

        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self(pairs))
    }

    /// Value of the first of `names` that is present at all, even if empty.
    fn first_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| {
            self.0
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        })
    }
}

/// A finite number, `None` for missing, blank or malformed input.
pub(super) fn parse_number(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Merge a setup link into `current`.
///
/// Both coordinates must be valid or the link is rejected. An unknown method
/// or Asr convention keeps the current value, as does a missing or blank
/// timezone. The panel side always comes from `current` and the city id is
/// cleared since the link carries raw coordinates.
pub fn apply_setup_link(link: &str, current: &PrayerSettings) -> Result<PrayerSettings, LinkError> {
    let params = LinkParams::parse(link)?;

    let lat_raw = params.first_of(&["lat", "latitude"]);
    let lng_raw = params.first_of(&["lng", "lon", "longitude"]);
    if lat_raw.is_none() && lng_raw.is_none() {
        return Err(LinkError::NoCoordinates);
    }

    let (Some(lat), Some(lng)) = (parse_number(lat_raw), parse_number(lng_raw)) else {
        return Err(LinkError::InvalidCoordinates);
    };
    let coords = Coordinates::new(lat, lng);
    if !coords.is_valid() {
        return Err(LinkError::InvalidCoordinates);
    }

    let method = params
        .first_of(&["method"])
        .and_then(CalculationMethod::parse)
        .unwrap_or(current.method);
    let asr = params
        .first_of(&["asr"])
        .and_then(AsrConvention::parse)
        .unwrap_or(current.asr);
    let timezone = params
        .first_of(&["timezone", "tz"])
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .unwrap_or(current.timezone.trim())
        .to_string();

    Ok(PrayerSettings {
        coords: Some(coords),
        method,
        asr,
        timezone,
        panel_left: current.panel_left,
        city_id: None,
    })
}

/// Build the shareable link for `settings`, empty when it has no valid coordinates.
pub fn setup_link(origin: &str, settings: &PrayerSettings) -> String {
    let Some(coords) = settings.coords.filter(Coordinates::is_valid) else {
        return String::new();
    };

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("lat", &coords.lat.to_string())
        .append_pair("lng", &coords.lng.to_string())
        .append_pair("method", settings.method.as_str())
        .append_pair("asr", settings.asr.as_str())
        .append_pair("timezone", &settings.timezone)
        .finish();

    format!("{}/settings?{query}", origin.trim_end_matches('/'))
}
