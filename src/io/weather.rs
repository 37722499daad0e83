//! Current temperature from Open-Meteo (no API key required).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::thread;

use crate::common::constants::{WEATHER_API_BASE, WEATHER_TIMEOUT};
use crate::io::signals::BoardEvent;
use crate::settings::Coordinates;

pub trait WeatherProvider: Send + Sync {
    /// Current temperature in Fahrenheit, `None` on any failure.
    fn current_temp_f(&self, coords: Coordinates) -> Option<f64>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
}

pub struct OpenMeteo {
    agent: ureq::Agent,
    base: String,
}

impl OpenMeteo {
    pub fn new() -> Self {
        Self::with_base(WEATHER_API_BASE)
    }

    pub fn with_base(base: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(WEATHER_TIMEOUT).build(),
            base: base.to_string(),
        }
    }

    pub fn forecast_url(&self, coords: Coordinates) -> String {
        format!(
            "{}?latitude={}&longitude={}&current=temperature_2m&temperature_unit=fahrenheit",
            self.base, coords.lat, coords.lng
        )
    }

    fn fetch(&self, coords: Coordinates) -> Result<Option<f64>> {
        // Non-2xx statuses come back as Err(ureq::Error::Status(..)).
        let response: ForecastResponse = self
            .agent
            .get(&self.forecast_url(coords))
            .call()
            .context("Weather request failed")?
            .into_json()
            .context("Unreadable weather response")?;

        Ok(response.current.and_then(|c| c.temperature_2m))
    }
}

impl Default for OpenMeteo {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherProvider for OpenMeteo {
    fn current_temp_f(&self, coords: Coordinates) -> Option<f64> {
        match self.fetch(coords) {
            Ok(temp) => temp,
            Err(e) => {
                log_debug!("Weather unavailable: {e:#}");
                None
            }
        }
    }
}

/// Fetch in a helper thread and deliver the result as [`BoardEvent::Weather`].
pub fn spawn_fetch(
    provider: std::sync::Arc<dyn WeatherProvider>,
    coords: Coordinates,
    sender: Sender<BoardEvent>,
) {
    thread::spawn(move || {
        let temp = provider.current_temp_f(coords);
        let _ = sender.send(BoardEvent::Weather(temp));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc::channel;

    #[test]
    fn test_forecast_url() {
        let provider = OpenMeteo::new();
        assert_eq!(
            provider.forecast_url(Coordinates::new(42.4788, -83.0248)),
            "https://api.open-meteo.com/v1/forecast?latitude=42.4788&longitude=-83.0248&current=temperature_2m&temperature_unit=fahrenheit"
        );
    }

    #[test]
    fn test_response_shapes() {
        let full: ForecastResponse =
            serde_json::from_str(r#"{"current":{"time":"2024-06-01T17:00","temperature_2m":71.6}}"#)
                .unwrap();
        assert_eq!(full.current.and_then(|c| c.temperature_2m), Some(71.6));

        let missing: ForecastResponse = serde_json::from_str(r#"{"latitude":42.5}"#).unwrap();
        assert!(missing.current.is_none());
    }

    #[test]
    fn test_unreachable_host_yields_none() {
        let provider = OpenMeteo::with_base("http://127.0.0.1:9/v1/forecast");
        assert_eq!(provider.current_temp_f(Coordinates::new(0.0, 0.0)), None);
    }

    struct FixedWeather(Option<f64>);

    impl WeatherProvider for FixedWeather {
        fn current_temp_f(&self, _coords: Coordinates) -> Option<f64> {
            self.0
        }
    }

    #[test]
    fn test_spawn_fetch_delivers_event() {
        let (sender, receiver) = channel();
        spawn_fetch(Arc::new(FixedWeather(Some(55.0))), Coordinates::new(1.0, 2.0), sender);
        assert_eq!(receiver.recv().unwrap(), BoardEvent::Weather(Some(55.0)));
    }
}
