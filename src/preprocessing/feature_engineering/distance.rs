//! Great-circle distances to fixed landmarks.

use crate::dataset::{Column, Frame};
use crate::error::FeatureError;
use crate::preprocessing::traits::FeatureStep;
use crate::schema::Landmark;
use ndarray::{Array1, ArrayView1, Zip};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in km between two points given in degrees.
///
/// No range validation is done; NaN in any input gives NaN.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Haversine distance from every `(lats[i], lons[i])` to one fixed point.
pub fn haversine_km_array(
    lats: ArrayView1<f64>,
    lons: ArrayView1<f64>,
    lat: f64,
    lon: f64,
) -> Array1<f64> {
    Zip::from(&lats)
        .and(&lons)
        .map_collect(|&la, &lo| haversine_km(la, lo, lat, lon))
}

/// Appends one distance column per landmark.
///
/// Requires numeric latitude and longitude columns; missing coordinates yield
/// missing distances.
#[derive(Clone, Debug)]
pub struct DistanceFeatureSet {
    latitude: String,
    longitude: String,
    landmarks: Vec<Landmark>,
}

impl DistanceFeatureSet {
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        landmarks: Vec<Landmark>,
    ) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            landmarks,
        }
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }
}

impl FeatureStep for DistanceFeatureSet {
    fn step_name(&self) -> &'static str {
        "DistanceFeatureSet"
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError> {
        let lats = ArrayView1::from(frame.numeric(&self.latitude)?);
        let lons = ArrayView1::from(frame.numeric(&self.longitude)?);
        let distances: Vec<(String, Array1<f64>)> = self
            .landmarks
            .iter()
            .map(|l| {
                (
                    l.feature_name(),
                    haversine_km_array(lats, lons, l.latitude, l.longitude),
                )
            })
            .collect();

        for (name, values) in distances {
            frame.add_column(name, Column::Numeric(values.to_vec()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::toronto_landmarks;
    use ndarray::array;

    const TORONTO: (f64, f64) = (43.6532, -79.3832);

    #[test]
    fn test_haversine_same_point_is_zero() {
        let (lat, lon) = TORONTO;
        assert_eq!(haversine_km(lat, lon, lat, lon), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = haversine_km(43.6532, -79.3832, 43.7735, -79.2577);
        let b = haversine_km(43.7735, -79.2577, 43.6532, -79.3832);
        assert!((a - b).abs() < 1e-9);
        assert!(a > 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude along a meridian
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_haversine_nan_propagates() {
        assert!(haversine_km(f64::NAN, -79.0, 43.0, -79.0).is_nan());
    }

    #[test]
    fn test_haversine_array_matches_scalar() {
        let lats = array![43.6532, 43.7, f64::NAN];
        let lons = array![-79.3832, -79.4, -79.4];
        let d = haversine_km_array(lats.view(), lons.view(), 43.7735, -79.2577);

        assert_eq!(d[0], haversine_km(43.6532, -79.3832, 43.7735, -79.2577));
        assert_eq!(d[1], haversine_km(43.7, -79.4, 43.7735, -79.2577));
        assert!(d[2].is_nan());
    }

    #[test]
    fn test_distance_feature_set() {
        let mut frame = Frame::from_columns([
            ("latitude", Column::Numeric(vec![43.6532, f64::NAN])),
            ("longitude", Column::Numeric(vec![-79.3832, f64::NAN])),
        ])
        .unwrap();
        DistanceFeatureSet::new("latitude", "longitude", toronto_landmarks())
            .apply(&mut frame)
            .unwrap();

        assert_eq!(frame.n_columns(), 9);
        for landmark in toronto_landmarks() {
            let values = frame.numeric(&landmark.feature_name()).unwrap();
            assert!(values[0] >= 0.0);
            assert!(values[1].is_nan());
        }
    }

    #[test]
    fn test_distance_feature_set_missing_coordinates() {
        let mut frame =
            Frame::from_columns([("latitude", Column::Numeric(vec![43.0]))]).unwrap();
        let result = DistanceFeatureSet::new("latitude", "longitude", toronto_landmarks())
            .apply(&mut frame);
        assert!(matches!(result, Err(FeatureError::MissingColumn(_))));
    }
}
