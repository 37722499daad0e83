//! Gregorian and Hijri date labels for the kiosk header.
//!
//! Calendar conversion is isolated behind [`CalendarConverter`] because
//! calendar data differs between platforms; the board only needs a month
//! number and a day for the Hijri line. The default converter is the tabular
//! Islamic calendar, which may differ by a day from sighting-based calendars.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike};
use std::fmt::Display;

/// English month names for the Hijri calendar, 1-indexed by month.
const HIJRI_MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabiʻ I",
    "Rabiʻ II",
    "Jumada I",
    "Jumada II",
    "Rajab",
    "Shaʻban",
    "Ramadan",
    "Shawwal",
    "Dhuʻl-Qiʻdah",
    "Dhuʻl-Hijjah",
];

/// Julian day number of 1 Muharram 1 AH in the civil tabular calendar.
const ISLAMIC_EPOCH_JDN: i64 = 1_948_440;

/// Offset between chrono's day count (0001-01-01 = 1) and the Julian day number.
const CE_TO_JDN: i64 = 1_721_425;

/// A date in the Islamic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HijriDate {
    pub year: i64,
    /// 1 = Muharram ... 12 = Dhuʻl-Hijjah
    pub month: u32,
    pub day: u32,
}

impl HijriDate {
    pub fn month_name(&self) -> &'static str {
        HIJRI_MONTH_NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }
}

/// Converts Gregorian dates to the Islamic calendar.
pub trait CalendarConverter: Send + Sync {
    /// Returns `None` when the converter has no data for the date.
    fn to_hijri(&self, date: NaiveDate) -> Option<HijriDate>;
}

/// Arithmetic (civil) Islamic calendar with the 30-year leap cycle.
pub struct TabularIslamicCalendar;

impl TabularIslamicCalendar {
    fn hijri_to_jdn(year: i64, month: i64, day: i64) -> i64 {
        // ceil(29.5 * (month - 1)) in integers
        day + (59 * (month - 1) + 1) / 2
            + (year - 1) * 354
            + (3 + 11 * year) / 30
            + ISLAMIC_EPOCH_JDN
            - 1
    }
}

impl CalendarConverter for TabularIslamicCalendar {
    fn to_hijri(&self, date: NaiveDate) -> Option<HijriDate> {
        let jdn = date.num_days_from_ce() as i64 + CE_TO_JDN;
        if jdn < ISLAMIC_EPOCH_JDN {
            return None;
        }

        let year = (30 * (jdn - ISLAMIC_EPOCH_JDN) + 10646) / 10631;
        let into_year = jdn - 29 - Self::hijri_to_jdn(year, 1, 1);
        let month = ((2.0 * into_year as f64 / 59.0).ceil() as i64 + 1).clamp(1, 12);
        let day = jdn - Self::hijri_to_jdn(year, month, 1) + 1;

        Some(HijriDate {
            year,
            month: month as u32,
            day: day as u32,
        })
    }
}

/// The two date lines shown above the clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateLabels {
    /// e.g. `SUNDAY, DEC 8`
    pub gregorian: String,
    /// e.g. `JUMADA II 6`
    pub hijri: String,
}

impl DateLabels {
    pub fn for_date(date: NaiveDate, calendar: &dyn CalendarConverter) -> Self {
        Self {
            gregorian: gregorian_label(date),
            hijri: hijri_label(date, calendar),
        }
    }
}

pub fn gregorian_label(date: NaiveDate) -> String {
    date.format("%A, %b %-d").to_string().to_uppercase()
}

/// Hijri month and day, hyphens in month names shown as spaces.
///
/// Empty when the converter has no answer for the date.
pub fn hijri_label(date: NaiveDate, calendar: &dyn CalendarConverter) -> String {
    match calendar.to_hijri(date) {
        Some(hijri) => {
            let month = hijri.month_name().replace('-', " ");
            format!("{} {}", month.to_uppercase(), hijri.day)
                .trim()
                .to_string()
        }
        None => String::new(),
    }
}

/// The big clock: `h:mm`, seconds and meridiem shown separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClockFace {
    pub time: String,
    pub seconds: String,
    pub ampm: String,
    /// 10, 11 and 12 o'clock need the wider layout
    pub two_digit_hour: bool,
}

impl ClockFace {
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: Display,
    {
        let (_, hour12) = now.hour12();
        Self {
            time: now.format("%-I:%M").to_string(),
            seconds: now.format("%S").to_string(),
            ampm: now.format("%p").to_string(),
            two_digit_hour: hour12 >= 10,
        }
    }
}
