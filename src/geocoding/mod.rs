//! Address to coordinate resolution.
//!
//! [`Geocoder`] is the seam to the external geocoding service. The feature
//! pipeline never talks to a geocoder directly: it goes through
//! [`RateLimitedGeocoder`], which applies the pause/backoff policy and turns
//! every failure into missing coordinates.

pub mod photon;

pub use photon::PhotonGeocoder;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// A latitude/longitude pair in degrees. NaN means unknown.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The missing pair.
    pub fn missing() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    pub fn is_missing(&self) -> bool {
        self.latitude.is_nan() || self.longitude.is_nan()
    }
}

/// Failure talking to a geocoding service.
#[derive(Clone, Debug, PartialEq)]
pub enum GeocodeError {
    /// The request did not complete within the timeout.
    Timeout,
    /// The service could not be reached or refused the request.
    Unavailable(String),
    /// The service answered with something that is not a geocoding result.
    InvalidResponse(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::Timeout => write!(f, "Geocoding request timed out"),
            GeocodeError::Unavailable(msg) => write!(f, "Geocoding service unavailable: {}", msg),
            GeocodeError::InvalidResponse(msg) => {
                write!(f, "Invalid geocoding response: {}", msg)
            }
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Resolves a free-text address to coordinates.
pub trait Geocoder {
    /// `Ok(None)` when the service has no match for the address.
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        (**self).geocode(address)
    }
}

/// Always answers with the same result, without any I/O.
///
/// Used when coordinates are already known (e.g. supplied on the command
/// line) and in tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedGeocoder(pub Option<Coordinates>);

impl Geocoder for FixedGeocoder {
    fn geocode(&self, _address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        Ok(self.0)
    }
}

/// Applies the request pause and failure policy around any [`Geocoder`].
///
/// - after every request: sleep `request_pause`
/// - timeout or unavailable: log, sleep `backoff_pause`, return missing
/// - no match or malformed answer: return missing
///
/// No retries. [`RateLimitedGeocoder::locate`] never fails.
#[derive(Clone, Debug)]
pub struct RateLimitedGeocoder<G> {
    inner: G,
    request_pause: Duration,
    backoff_pause: Duration,
}

impl<G: Geocoder> RateLimitedGeocoder<G> {
    /// Wrap `inner` with the default pauses (300 ms, 2 s).
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            request_pause: Duration::from_millis(300),
            backoff_pause: Duration::from_secs(2),
        }
    }

    pub fn with_request_pause(mut self, pause: Duration) -> Self {
        self.request_pause = pause;
        self
    }

    pub fn with_backoff_pause(mut self, pause: Duration) -> Self {
        self.backoff_pause = pause;
        self
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Resolve `address`, returning the missing pair on any failure.
    pub fn locate(&self, address: &str) -> Coordinates {
        let result = self.inner.geocode(address);
        match result {
            Ok(Some(coordinates)) => {
                pause(self.request_pause);
                debug!(address, ?coordinates, "geocoded address");
                coordinates
            }
            Ok(None) => {
                pause(self.request_pause);
                warn!(address, "geocoder found no match");
                Coordinates::missing()
            }
            Err(e @ (GeocodeError::Timeout | GeocodeError::Unavailable(_))) => {
                warn!(address, error = %e, "geocoding failed, backing off");
                pause(self.backoff_pause);
                Coordinates::missing()
            }
            Err(e) => {
                pause(self.request_pause);
                warn!(address, error = %e, "geocoding failed");
                Coordinates::missing()
            }
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
