//! Client for the Photon geocoding API (OpenStreetMap data).

use super::{Coordinates, GeocodeError, Geocoder};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_PHOTON_URL: &str = "https://photon.komoot.io";
const DEFAULT_USER_AGENT: &str = "toronto-rent-features";

/// Blocking Photon client. One request per address, first hit only.
pub struct PhotonGeocoder {
    client: Client,
    base_url: String,
}

impl PhotonGeocoder {
    /// Client against the public Photon instance with a 10 s timeout.
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_settings(DEFAULT_PHOTON_URL, DEFAULT_USER_AGENT, Duration::from_secs(10))
    }

    pub fn with_settings(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Geocoder for PhotonGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let resp = self
            .client
            .get(format!("{}/api/", self.base_url))
            .query(&[("q", address), ("limit", "1")])
            .send()
            .map_err(classify)?;

        let status = resp.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::Unavailable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(GeocodeError::InvalidResponse(format!("HTTP {}", status)));
        }

        let body = resp.text().map_err(classify)?;
        parse_photon_response(&body)
    }
}

fn classify(e: reqwest::Error) -> GeocodeError {
    if e.is_timeout() {
        GeocodeError::Timeout
    } else if e.is_connect() || e.is_request() {
        GeocodeError::Unavailable(e.to_string())
    } else {
        GeocodeError::InvalidResponse(e.to_string())
    }
}

/// Extract the first feature's point from a Photon GeoJSON answer.
///
/// GeoJSON orders coordinates `[longitude, latitude]`. An empty feature list
/// is "no match", not an error.
pub fn parse_photon_response(body: &str) -> Result<Option<Coordinates>, GeocodeError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    let features = json
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| GeocodeError::InvalidResponse("missing 'features' array".to_string()))?;

    let first = match features.first() {
        Some(feature) => feature,
        None => return Ok(None),
    };

    let point = first
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| GeocodeError::InvalidResponse("feature without coordinates".to_string()))?;

    match (
        point.first().and_then(Value::as_f64),
        point.get(1).and_then(Value::as_f64),
    ) {
        (Some(longitude), Some(latitude)) => Ok(Some(Coordinates::new(latitude, longitude))),
        _ => Err(GeocodeError::InvalidResponse(
            "coordinates are not a [lon, lat] pair".to_string(),
        )),
    }
}
