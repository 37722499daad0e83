//! Time source abstraction for real and hand-driven clocks.
//!
//! Everything that asks "what time is it" goes through a [`TimeSource`] handed
//! to it at construction, so the board can be driven across midnight in tests
//! without waiting for it.

use chrono::{DateTime, Local};

/// Trait for abstracting the wall clock.
pub trait TimeSource: Send + Sync {
    /// Get the current local time
    fn now(&self) -> DateTime<Local>;
}

/// Real-time implementation that uses the system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to.
#[cfg(any(test, feature = "testing-support"))]
pub struct ManualTimeSource {
    current: std::sync::Mutex<DateTime<Local>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl ManualTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: std::sync::Mutex::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: DateTime<Local>) {
        *self.current.lock().unwrap() = time;
    }

    /// Move forward by a duration.
    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.current.lock().unwrap();
        *guard += by;
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap()
    }
}

/// Build an instant from `YYYY-MM-DD HH:MM:SS` read as wall time in the IANA
/// zone `timezone`.
///
/// Ambiguous wall times (DST fall-back) resolve to the earlier instant.
pub fn parse_datetime_in(s: &str, timezone: &str) -> Result<DateTime<Local>, String> {
    use chrono::{NaiveDateTime, TimeZone};

    let zone: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| format!("Unknown timezone {timezone}"))?;
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|instant| instant.with_timezone(&Local))
        .ok_or_else(|| format!("{s} does not exist in {timezone}"))
}
