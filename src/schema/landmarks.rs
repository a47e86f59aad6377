//! Reference landmarks for distance features.

use serde::{Deserialize, Serialize};

/// Toronto reference points: `(name, latitude, longitude)`.
///
/// `downtown` is the CN Tower.
pub const TORONTO_LANDMARKS: [(&str, f64, f64); 7] = [
    ("downtown", 43.6426, -79.3871),
    ("Forest Hill", 43.6936, -79.4139),
    ("Rosedale", 43.6790, -79.3780),
    ("Lawrence Park", 43.7220, -79.3879),
    ("Flemingdon Park", 43.7184, -79.3332),
    ("Weston", 43.7007, -79.5138),
    ("Dorset Park", 43.7612, -79.2846),
];

/// A named geographic reference point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Landmark {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Name of the feature column holding the distance to this landmark.
    pub fn feature_name(&self) -> String {
        format!("distance to {} (km)", self.name)
    }
}

/// The seven Toronto landmarks as owned values.
pub fn toronto_landmarks() -> Vec<Landmark> {
    TORONTO_LANDMARKS
        .iter()
        .map(|&(name, lat, lon)| Landmark::new(name, lat, lon))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_name_convention() {
        let landmark = Landmark::new("Weston", 43.7007, -79.5138);
        assert_eq!(landmark.feature_name(), "distance to Weston (km)");
    }

    #[test]
    fn test_toronto_landmarks() {
        let landmarks = toronto_landmarks();
        assert_eq!(landmarks.len(), 7);
        assert_eq!(
            landmarks[0].feature_name(),
            "distance to downtown (km)"
        );
    }
}
