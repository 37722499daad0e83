//! Direct edits to the stored settings, one field at a time.
//!
//! Fields left out of an edit keep their current value. Unlike a setup link,
//! an edit names its fields explicitly, so a value that does not parse is an
//! error instead of being ignored.

use std::fmt;

use super::cities::{CITIES, find_city};
use super::link::parse_number;
use super::{AsrConvention, CalculationMethod, Coordinates, PrayerSettings};

/// Requested changes, as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsEdit {
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// City id from [`CITIES`]; sets coordinates and timezone together
    pub city: Option<String>,
    pub method: Option<String>,
    pub asr: Option<String>,
    pub timezone: Option<String>,
    /// `left` or `right`
    pub panel: Option<String>,
}

impl SettingsEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Why an edit was not applied.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    UnknownCity(String),
    /// A city and explicit coordinates in the same edit
    CityWithCoordinates,
    /// Only one coordinate, not a finite number, or out of range
    InvalidCoordinates,
    UnknownMethod(String),
    UnknownAsr(String),
    BlankTimezone,
    InvalidPanel(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::UnknownCity(id) => {
                let known: Vec<&str> = CITIES.iter().map(|city| city.id).collect();
                write!(f, "unknown city '{id}' (known: {})", known.join(", "))
            }
            EditError::CityWithCoordinates => {
                write!(f, "--city cannot be combined with --lat/--lng")
            }
            EditError::InvalidCoordinates => write!(
                f,
                "--lat and --lng must both be given, latitude within ±90 and longitude within ±180"
            ),
            EditError::UnknownMethod(method) => {
                let known: Vec<&str> = CalculationMethod::ALL.iter().map(|m| m.as_str()).collect();
                write!(f, "unknown method '{method}' (known: {})", known.join(", "))
            }
            EditError::UnknownAsr(asr) => {
                write!(f, "unknown Asr convention '{asr}' (Standard or Hanafi)")
            }
            EditError::BlankTimezone => write!(f, "timezone must not be blank"),
            EditError::InvalidPanel(panel) => {
                write!(f, "panel side '{panel}' is not left or right")
            }
        }
    }
}

impl std::error::Error for EditError {}

/// Apply `edit` on top of `current`.
///
/// Picking a city sets its coordinates, timezone and id; entering coordinates
/// by hand clears the city id. An explicit timezone wins over the city's.
pub fn apply_edit(edit: &SettingsEdit, current: &PrayerSettings) -> Result<PrayerSettings, EditError> {
    let mut next = current.clone();

    if let Some(id) = &edit.city {
        if edit.lat.is_some() || edit.lng.is_some() {
            return Err(EditError::CityWithCoordinates);
        }
        let city = find_city(id).ok_or_else(|| EditError::UnknownCity(id.trim().to_string()))?;
        next.coords = Some(Coordinates::new(city.lat, city.lng));
        next.timezone = city.timezone.to_string();
        next.city_id = Some(city.id.to_string());
    } else if edit.lat.is_some() || edit.lng.is_some() {
        let (Some(lat), Some(lng)) = (
            parse_number(edit.lat.as_deref()),
            parse_number(edit.lng.as_deref()),
        ) else {
            return Err(EditError::InvalidCoordinates);
        };
        let coords = Coordinates::new(lat, lng);
        if !coords.is_valid() {
            return Err(EditError::InvalidCoordinates);
        }
        next.coords = Some(coords);
        next.city_id = None;
    }

    if let Some(method) = &edit.method {
        next.method = CalculationMethod::parse(method.trim())
            .ok_or_else(|| EditError::UnknownMethod(method.clone()))?;
    }
    if let Some(asr) = &edit.asr {
        next.asr =
            AsrConvention::parse(asr.trim()).ok_or_else(|| EditError::UnknownAsr(asr.clone()))?;
    }
    if let Some(timezone) = &edit.timezone {
        let timezone = timezone.trim();
        if timezone.is_empty() {
            return Err(EditError::BlankTimezone);
        }
        next.timezone = timezone.to_string();
    }
    if let Some(panel) = &edit.panel {
        next.panel_left = match panel.trim().to_ascii_lowercase().as_str() {
            "left" => true,
            "right" => false,
            _ => return Err(EditError::InvalidPanel(panel.clone())),
        };
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> PrayerSettings {
        PrayerSettings {
            coords: Some(Coordinates::new(21.4225, 39.8262)),
            method: CalculationMethod::Makkah,
            asr: AsrConvention::Standard,
            timezone: "Asia/Riyadh".to_string(),
            panel_left: true,
            city_id: None,
        }
    }

    fn edit() -> SettingsEdit {
        SettingsEdit::default()
    }

    #[test]
    fn test_empty_edit_changes_nothing() {
        assert!(edit().is_empty());
        assert_eq!(apply_edit(&edit(), &current()), Ok(current()));
    }

    #[test]
    fn test_panel_side_flips() {
        let right = apply_edit(
            &SettingsEdit {
                panel: Some("right".to_string()),
                ..edit()
            },
            &current(),
        )
        .unwrap();
        assert!(!right.panel_left);
        assert_eq!(right.coords, current().coords);

        let left = apply_edit(
            &SettingsEdit {
                panel: Some("Left".to_string()),
                ..edit()
            },
            &right,
        )
        .unwrap();
        assert!(left.panel_left);

        assert_eq!(
            apply_edit(
                &SettingsEdit {
                    panel: Some("top".to_string()),
                    ..edit()
                },
                &current()
            ),
            Err(EditError::InvalidPanel("top".to_string()))
        );
    }

    #[test]
    fn test_city_sets_location_timezone_and_id() {
        let next = apply_edit(
            &SettingsEdit {
                city: Some("dearborn-mi".to_string()),
                ..edit()
            },
            &current(),
        )
        .unwrap();

        assert_eq!(next.coords, Some(Coordinates::new(42.3223, -83.1763)));
        assert_eq!(next.timezone, "America/Detroit");
        assert_eq!(next.city_id.as_deref(), Some("dearborn-mi"));
        assert_eq!(next.method, CalculationMethod::Makkah);
    }

    #[test]
    fn test_explicit_timezone_wins_over_city() {
        let next = apply_edit(
            &SettingsEdit {
                city: Some("troy-mi".to_string()),
                timezone: Some(" America/Toronto ".to_string()),
                ..edit()
            },
            &current(),
        )
        .unwrap();
        assert_eq!(next.timezone, "America/Toronto");
        assert_eq!(next.city_id.as_deref(), Some("troy-mi"));
    }

    #[test]
    fn test_coordinates_clear_city() {
        let in_city = PrayerSettings {
            city_id: Some("warren-mi".to_string()),
            ..current()
        };
        let next = apply_edit(
            &SettingsEdit {
                lat: Some("-33.8688".to_string()),
                lng: Some("151.2093".to_string()),
                ..edit()
            },
            &in_city,
        )
        .unwrap();
        assert_eq!(next.coords, Some(Coordinates::new(-33.8688, 151.2093)));
        assert_eq!(next.city_id, None);
        assert_eq!(next.timezone, "Asia/Riyadh");
    }

    #[test]
    fn test_rejected_edits() {
        let c = current();
        let only_lat = SettingsEdit {
            lat: Some("10".to_string()),
            ..edit()
        };
        assert_eq!(apply_edit(&only_lat, &c), Err(EditError::InvalidCoordinates));

        let out_of_range = SettingsEdit {
            lat: Some("95".to_string()),
            lng: Some("0".to_string()),
            ..edit()
        };
        assert_eq!(apply_edit(&out_of_range, &c), Err(EditError::InvalidCoordinates));

        let both = SettingsEdit {
            city: Some("troy-mi".to_string()),
            lat: Some("1".to_string()),
            ..edit()
        };
        assert_eq!(apply_edit(&both, &c), Err(EditError::CityWithCoordinates));

        let unknown_city = SettingsEdit {
            city: Some("lansing-mi".to_string()),
            ..edit()
        };
        assert_eq!(
            apply_edit(&unknown_city, &c),
            Err(EditError::UnknownCity("lansing-mi".to_string()))
        );

        let method = SettingsEdit {
            method: Some("Moonsighting".to_string()),
            ..edit()
        };
        assert_eq!(
            apply_edit(&method, &c),
            Err(EditError::UnknownMethod("Moonsighting".to_string()))
        );

        let asr = SettingsEdit {
            asr: Some("Shafi".to_string()),
            ..edit()
        };
        assert_eq!(apply_edit(&asr, &c), Err(EditError::UnknownAsr("Shafi".to_string())));

        let timezone = SettingsEdit {
            timezone: Some("  ".to_string()),
            ..edit()
        };
        assert_eq!(apply_edit(&timezone, &c), Err(EditError::BlankTimezone));
    }

    #[test]
    fn test_method_and_asr_change() {
        let next = apply_edit(
            &SettingsEdit {
                method: Some("ISNA".to_string()),
                asr: Some("Hanafi".to_string()),
                ..edit()
            },
            &current(),
        )
        .unwrap();
        assert_eq!(next.method, CalculationMethod::Isna);
        assert_eq!(next.asr, AsrConvention::Hanafi);
    }
}
