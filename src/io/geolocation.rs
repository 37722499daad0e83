//! One-shot device geolocation through GeoClue2.
//!
//! Only the explicit `locate` command asks for a position; the board itself
//! never does, so an unattended kiosk never triggers an agent prompt.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use zbus::blocking::Connection;
use zbus::proxy::CacheProperties;
use zbus::zvariant::OwnedObjectPath;

use crate::common::constants::{GEOCLUE_DESKTOP_ID, GEOLOCATION_TIMEOUT};
use crate::settings::Coordinates;

/// GeoClue accuracy level `EXACT`.
const ACCURACY_EXACT: u32 = 8;
const LOCATION_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoError {
    Unsupported,
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl GeoError {
    /// Stable status code.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoError::Unsupported => "unsupported",
            GeoError::PermissionDenied => "permission_denied",
            GeoError::PositionUnavailable => "position_unavailable",
            GeoError::Timeout => "timeout",
        }
    }

    /// Short status line for the operator.
    pub fn status_message(&self) -> &'static str {
        match self {
            GeoError::Unsupported => "Location services are not available on this device",
            GeoError::PermissionDenied => "Location permission was denied",
            GeoError::PositionUnavailable => "Current position is unavailable",
            GeoError::Timeout => "Timed out waiting for a position",
        }
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for GeoError {}

pub trait GeolocationProvider {
    fn request_position(&self) -> Result<Coordinates, GeoError>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Manager",
    default_service = "org.freedesktop.GeoClue2",
    default_path = "/org/freedesktop/GeoClue2/Manager"
)]
trait GeoClueManager {
    fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Client",
    default_service = "org.freedesktop.GeoClue2"
)]
trait GeoClueClient {
    fn start(&self) -> zbus::Result<()>;
    fn stop(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn set_desktop_id(&self, id: &str) -> zbus::Result<()>;

    #[zbus(property)]
    fn set_requested_accuracy_level(&self, level: u32) -> zbus::Result<()>;

    #[zbus(property)]
    fn location(&self) -> zbus::Result<OwnedObjectPath>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Location",
    default_service = "org.freedesktop.GeoClue2"
)]
trait GeoClueLocation {
    #[zbus(property)]
    fn latitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn longitude(&self) -> zbus::Result<f64>;
}

/// Map a D-Bus failure onto the status codes the board reports.
fn classify(error: &zbus::Error) -> GeoError {
    match error {
        zbus::Error::MethodError(name, _, _) => match name.as_str() {
            "org.freedesktop.DBus.Error.AccessDenied" => GeoError::PermissionDenied,
            "org.freedesktop.DBus.Error.ServiceUnknown"
            | "org.freedesktop.DBus.Error.NameHasNoOwner" => GeoError::Unsupported,
            _ => GeoError::PositionUnavailable,
        },
        zbus::Error::InputOutput(_) | zbus::Error::Address(_) => GeoError::Unsupported,
        _ => GeoError::PositionUnavailable,
    }
}

/// Accept a fix only when both coordinates are finite.
pub fn validate_fix(lat: f64, lng: f64) -> Result<Coordinates, GeoError> {
    if lat.is_finite() && lng.is_finite() {
        Ok(Coordinates::new(lat, lng))
    } else {
        Err(GeoError::PositionUnavailable)
    }
}

pub struct GeoClueGeolocation {
    timeout: Duration,
}

impl GeoClueGeolocation {
    pub fn new() -> Self {
        Self {
            timeout: GEOLOCATION_TIMEOUT,
        }
    }

    fn locate(&self, connection: &Connection) -> Result<Coordinates, GeoError> {
        let manager = GeoClueManagerProxyBlocking::new(connection).map_err(|e| classify(&e))?;
        let client_path = manager.get_client().map_err(|e| classify(&e))?;

        let client = GeoClueClientProxyBlocking::builder(connection)
            .path(client_path)
            .and_then(|builder| builder.cache_properties(CacheProperties::No).build())
            .map_err(|e| classify(&e))?;

        client
            .set_desktop_id(GEOCLUE_DESKTOP_ID)
            .map_err(|e| classify(&e))?;
        client
            .set_requested_accuracy_level(ACCURACY_EXACT)
            .map_err(|e| classify(&e))?;
        client.start().map_err(|e| classify(&e))?;

        let result = self.wait_for_fix(connection, &client);
        let _ = client.stop();
        result
    }

    fn wait_for_fix(
        &self,
        connection: &Connection,
        client: &GeoClueClientProxyBlocking<'_>,
    ) -> Result<Coordinates, GeoError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let path = client.location().map_err(|e| classify(&e))?;
            if path.as_str() != "/" {
                let location = GeoClueLocationProxyBlocking::builder(connection)
                    .path(path)
                    .and_then(|builder| builder.cache_properties(CacheProperties::No).build())
                    .map_err(|e| classify(&e))?;
                let lat = location.latitude().map_err(|e| classify(&e))?;
                let lng = location.longitude().map_err(|e| classify(&e))?;
                return validate_fix(lat, lng);
            }

            if Instant::now() >= deadline {
                return Err(GeoError::Timeout);
            }
            thread::sleep(LOCATION_POLL_INTERVAL);
        }
    }
}

impl Default for GeoClueGeolocation {
    fn default() -> Self {
        Self::new()
    }
}

impl GeolocationProvider for GeoClueGeolocation {
    fn request_position(&self) -> Result<Coordinates, GeoError> {
        let connection = Connection::system().map_err(|_| GeoError::Unsupported)?;
        self.locate(&connection)
    }
}
