use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use proptest::prelude::*;

use prayerboard::prayer::PrayerKey;
use prayerboard::prayer::engine::{AstronomicalEngine, SolarEngine};
use prayerboard::prayer::schedule::parse_time_to_epoch;
use prayerboard::settings::{AsrConvention, CalculationMethod, Coordinates};

/// Cities at moderate latitudes, each with the zone it keeps its clocks in
const CITIES: [(f64, f64, &str); 6] = [
    (33.749, -84.388, "America/New_York"),
    (19.433, -99.133, "America/Mexico_City"),
    (30.044, 31.236, "Africa/Cairo"),
    (24.861, 67.010, "Asia/Karachi"),
    (-6.208, 106.846, "Asia/Jakarta"),
    (-33.869, 151.209, "Australia/Sydney"),
];

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0..366i64).prop_map(|offset| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset))
}

fn method_strategy() -> impl Strategy<Value = CalculationMethod> {
    (0..CalculationMethod::ALL.len()).prop_map(|i| CalculationMethod::ALL[i])
}

fn asr_strategy() -> impl Strategy<Value = AsrConvention> {
    prop_oneof![Just(AsrConvention::Standard), Just(AsrConvention::Hanafi)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// The day's times always come out in prayer order
    #[test]
    fn test_times_are_ordered(
        city in 0..CITIES.len(),
        delta_lat in -2.0..2.0f64,
        delta_lng in -2.0..2.0f64,
        date in date_strategy(),
        method in method_strategy(),
        asr in asr_strategy(),
    ) {
        let (lat, lng, zone_name) = CITIES[city];
        let zone: Tz = zone_name.parse().unwrap();
        let times = SolarEngine::new()
            .compute(method, asr, Coordinates::new(lat + delta_lat, lng + delta_lng), zone_name, date)
            .unwrap();

        let at = |value: &str| {
            parse_time_to_epoch(value, date, &zone)
                .unwrap_or_else(|| panic!("unreadable time {value:?} on {date}"))
        };

        let fajr = at(times.get(PrayerKey::Fajr));
        let sunrise = at(&times.sunrise);
        let dhuhr = at(times.get(PrayerKey::Dhuhr));
        let asr_at = at(times.get(PrayerKey::Asr));
        let maghrib = at(times.get(PrayerKey::Maghrib));
        let sunset = at(&times.sunset);
        let isha = at(times.get(PrayerKey::Isha));

        prop_assert!(fajr < sunrise, "{times:?} on {date}");
        prop_assert!(sunrise < dhuhr, "{times:?} on {date}");
        prop_assert!(dhuhr < asr_at, "{times:?} on {date}");
        prop_assert!(asr_at < maghrib, "{times:?} on {date}");
        prop_assert!(maghrib < isha, "{times:?} on {date}");
        prop_assert!(sunset <= maghrib, "{times:?} on {date}");
    }

    /// Hanafi Asr never comes before the standard one
    #[test]
    fn test_hanafi_asr_is_later(
        city in 0..CITIES.len(),
        date in date_strategy(),
    ) {
        let (lat, lng, zone_name) = CITIES[city];
        let zone: Tz = zone_name.parse().unwrap();
        let engine = SolarEngine::new();
        let coordinates = Coordinates::new(lat, lng);

        let standard = engine
            .compute(CalculationMethod::Mwl, AsrConvention::Standard, coordinates, zone_name, date)
            .unwrap();
        let hanafi = engine
            .compute(CalculationMethod::Mwl, AsrConvention::Hanafi, coordinates, zone_name, date)
            .unwrap();

        let standard_at = parse_time_to_epoch(&standard.asr, date, &zone).unwrap();
        let hanafi_at = parse_time_to_epoch(&hanafi.asr, date, &zone).unwrap();
        prop_assert!(standard_at < hanafi_at, "{} vs {} on {date}", standard.asr, hanafi.asr);
        prop_assert_eq!(standard.fajr, hanafi.fajr);
    }

    /// Every method shares sunrise and sunset for the same place and day
    #[test]
    fn test_method_does_not_move_the_sun(
        city in 0..CITIES.len(),
        date in date_strategy(),
        method in method_strategy(),
    ) {
        let (lat, lng, zone_name) = CITIES[city];
        let engine = SolarEngine::new();
        let coordinates = Coordinates::new(lat, lng);

        let reference = engine
            .compute(CalculationMethod::Isna, AsrConvention::Standard, coordinates, zone_name, date)
            .unwrap();
        let other = engine
            .compute(method, AsrConvention::Standard, coordinates, zone_name, date)
            .unwrap();

        prop_assert_eq!(reference.sunrise, other.sunrise);
        prop_assert_eq!(reference.sunset, other.sunset);
        prop_assert_eq!(reference.dhuhr, other.dhuhr);
    }
}
