//! Astronomical computation of the daily prayer times.
//!
//! The board only relies on the [`AstronomicalEngine`] trait. [`SolarEngine`]
//! is the built-in implementation: sunrise and sunset come from the `sunrise`
//! crate, the twilight and shadow-based times are derived from the sun's
//! declination and equation of time around solar noon.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use super::PrayerTimes;
use crate::settings::{AsrConvention, CalculationMethod, Coordinates};

/// Computes one day's formatted prayer times.
#[cfg_attr(test, mockall::automock)]
pub trait AstronomicalEngine: Send + Sync {
    /// Times for `date` at `coordinates`, formatted as `h:mm AM` in `timezone`.
    fn compute(
        &self,
        method: CalculationMethod,
        asr: AsrConvention,
        coordinates: Coordinates,
        timezone: &str,
        date: NaiveDate,
    ) -> Result<PrayerTimes>;
}

/// Depression of the sun's centre at apparent sunrise/sunset, in degrees.
const HORIZON_DEPRESSION: f64 = 0.833;

/// Offset between chrono's day count and the Julian date at 0h UTC.
const CE_TO_JULIAN_DATE: f64 = 1_721_424.5;

/// How Isha is placed after sunset.
#[derive(Debug, Clone, Copy, PartialEq)]
enum IshaRule {
    /// Sun this many degrees below the horizon
    Angle(f64),
    /// Fixed minutes after Maghrib
    MinutesAfterMaghrib(i64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MethodParams {
    fajr_angle: f64,
    isha: IshaRule,
    /// `None` means Maghrib is at sunset
    maghrib_angle: Option<f64>,
}

fn method_params(method: CalculationMethod) -> MethodParams {
    use CalculationMethod::*;

    let (fajr_angle, isha, maghrib_angle) = match method {
        Mwl => (18.0, IshaRule::Angle(17.0), None),
        Isna => (15.0, IshaRule::Angle(15.0), None),
        Egypt => (19.5, IshaRule::Angle(17.5), None),
        Makkah => (18.5, IshaRule::MinutesAfterMaghrib(90), None),
        Karachi => (18.0, IshaRule::Angle(18.0), None),
        Tehran => (17.7, IshaRule::Angle(14.0), Some(4.5)),
        Jafari => (16.0, IshaRule::Angle(14.0), Some(4.0)),
        France => (12.0, IshaRule::Angle(12.0), None),
        Russia => (16.0, IshaRule::Angle(15.0), None),
        Singapore => (20.0, IshaRule::Angle(18.0), None),
    };

    MethodParams {
        fajr_angle,
        isha,
        maghrib_angle,
    }
}

/// Declination (degrees) and equation of time (hours) for a Julian date.
fn sun_position(julian_date: f64) -> (f64, f64) {
    let d = julian_date - 2_451_545.0;
    let g = (357.529 + 0.985_600_28 * d).rem_euclid(360.0).to_radians();
    let q = (280.459 + 0.985_647_36 * d).rem_euclid(360.0);
    let l = (q + 1.915 * g.sin() + 0.020 * (2.0 * g).sin())
        .rem_euclid(360.0)
        .to_radians();
    let e = (23.439 - 0.000_000_36 * d).to_radians();

    let right_ascension = ((e.cos() * l.sin()).atan2(l.cos()).to_degrees() / 15.0).rem_euclid(24.0);
    let equation_of_time = (q / 15.0 - right_ascension + 12.0).rem_euclid(24.0) - 12.0;
    let declination = (e.sin() * l.sin()).asin().to_degrees();

    (declination, equation_of_time)
}

/// Hours between solar noon and the sun reaching `depression` degrees below
/// the horizon. `None` when it never gets there on this day.
fn hour_angle(depression: f64, declination: f64, latitude: f64) -> Option<f64> {
    let (dec, lat) = (declination.to_radians(), latitude.to_radians());
    let cos_h = (-depression.to_radians().sin() - dec.sin() * lat.sin()) / (dec.cos() * lat.cos());
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }
    Some(cos_h.acos().to_degrees() / 15.0)
}

/// Sun altitude (degrees) at which an object's shadow reaches Asr length.
fn asr_altitude(shadow_factor: f64, declination: f64, latitude: f64) -> f64 {
    let noon_shadow = (latitude - declination).abs().to_radians().tan();
    (1.0 / (shadow_factor + noon_shadow)).atan().to_degrees()
}

fn round_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    let rounded = (instant.timestamp() + 30).div_euclid(60) * 60;
    DateTime::from_timestamp(rounded, 0).unwrap_or(instant)
}

fn format_in_zone(instant: DateTime<Utc>, timezone: &str) -> String {
    let instant = round_to_minute(instant);
    match timezone.parse::<Tz>() {
        Ok(tz) => instant.with_timezone(&tz).format("%-I:%M %p").to_string(),
        Err(_) => instant.with_timezone(&Local).format("%-I:%M %p").to_string(),
    }
}

/// Prayer times from solar geometry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolarEngine;

impl SolarEngine {
    pub fn new() -> Self {
        Self
    }

    fn sunrise_sunset(coordinates: Coordinates, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        use sunrise::{Coordinates as SolarCoordinates, SolarDay, SolarEvent};

        let coord = SolarCoordinates::new(coordinates.lat, coordinates.lng)
            .ok_or_else(|| anyhow::anyhow!("Invalid coordinates"))?;
        let solar_day = SolarDay::new(coord, date);
        Ok((
            solar_day.event_time(SolarEvent::Sunrise),
            solar_day.event_time(SolarEvent::Sunset),
        ))
    }
}

impl AstronomicalEngine for SolarEngine {
    fn compute(
        &self,
        method: CalculationMethod,
        asr: AsrConvention,
        coordinates: Coordinates,
        timezone: &str,
        date: NaiveDate,
    ) -> Result<PrayerTimes> {
        let params = method_params(method);
        let lat = coordinates.lat;

        let julian_date = date.num_days_from_ce() as f64 + CE_TO_JULIAN_DATE;
        let (declination, equation_of_time) =
            sun_position(julian_date + 0.5 - coordinates.lng / 360.0);

        let midnight = Utc
            .from_utc_datetime(&date.and_hms_opt(0, 0, 0).context("Invalid date")?);
        let at_hours = |hours: f64| midnight + chrono::Duration::milliseconds((hours * 3_600_000.0).round() as i64);

        let noon = 12.0 - equation_of_time - coordinates.lng / 15.0;

        // Polar day or night: no prayer schedule can be derived.
        let day_half = hour_angle(HORIZON_DEPRESSION, declination, lat).with_context(|| {
            format!("The sun does not rise and set at latitude {lat:.2} on {date}")
        })?;

        let (sunrise, sunset) = Self::sunrise_sunset(coordinates, date)?;
        let dhuhr = at_hours(noon);

        let asr_time = hour_angle(
            -asr_altitude(asr.shadow_factor(), declination, lat),
            declination,
            lat,
        )
        .map(|h| at_hours(noon + h))
        .unwrap_or(sunset);

        let maghrib = match params.maghrib_angle {
            Some(angle) => hour_angle(angle, declination, lat)
                .map(|h| at_hours(noon + h))
                .unwrap_or(sunset),
            None => sunset,
        };

        // High latitudes: twilight may never end, or end too late to be useful.
        // Fajr and Isha are then held to half of the night.
        let night_hours = 24.0 - 2.0 * day_half;
        let night_half = chrono::Duration::milliseconds((night_hours * 1_800_000.0).round() as i64);

        let fajr = match hour_angle(params.fajr_angle, declination, lat).map(|h| at_hours(noon - h)) {
            Some(fajr) if sunrise - fajr <= night_half => fajr,
            _ => sunrise - night_half,
        };

        let isha = match params.isha {
            IshaRule::MinutesAfterMaghrib(minutes) => maghrib + chrono::Duration::minutes(minutes),
            IshaRule::Angle(angle) => {
                match hour_angle(angle, declination, lat).map(|h| at_hours(noon + h)) {
                    Some(isha) if isha - sunset <= night_half => isha,
                    _ => sunset + night_half,
                }
            }
        };

        Ok(PrayerTimes {
            fajr: format_in_zone(fajr, timezone),
            sunrise: format_in_zone(sunrise, timezone),
            dhuhr: format_in_zone(dhuhr, timezone),
            asr: format_in_zone(asr_time, timezone),
            maghrib: format_in_zone(maghrib, timezone),
            sunset: format_in_zone(sunset, timezone),
            isha: format_in_zone(isha, timezone),
        })
    }
}
