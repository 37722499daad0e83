//! Preset locations an operator can pick by id.
//!
//! Ids are stored in the settings record, so they must stay stable.

/// A selectable city with the zone its clocks keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub id: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    /// IANA zone applied when the city is selected
    pub timezone: &'static str,
}

const fn city(id: &'static str, name: &'static str, lat: f64, lng: f64) -> City {
    City {
        id,
        name,
        lat,
        lng,
        timezone: "America/Detroit",
    }
}

pub const CITIES: [City; 10] = [
    city("center-line-mi", "Center Line, MI", 42.485, -83.0277),
    city("warren-mi", "Warren, MI", 42.5145, -83.0147),
    city("detroit-mi", "Detroit, MI", 42.3314, -83.0458),
    city("dearborn-mi", "Dearborn, MI", 42.3223, -83.1763),
    city("sterling-heights-mi", "Sterling Heights, MI", 42.5803, -83.0302),
    city("troy-mi", "Troy, MI", 42.6056, -83.1499),
    city("ann-arbor-mi", "Ann Arbor, MI", 42.2808, -83.743),
    city("livonia-mi", "Livonia, MI", 42.3684, -83.3527),
    city("farmington-hills-mi", "Farmington Hills, MI", 42.4989, -83.3677),
    city("westland-mi", "Westland, MI", 42.3242, -83.4002),
];

/// Look a city up by id, ignoring case and surrounding whitespace.
pub fn find_city(id: &str) -> Option<&'static City> {
    let id = id.trim();
    CITIES.iter().find(|city| city.id.eq_ignore_ascii_case(id))
}
