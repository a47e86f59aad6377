//! Feature engineering steps.
//!
//! - [`DistanceFeatureSet`]: Haversine distance from each listing to each landmark.
//! - [`ColumnSum`]: a derived column holding the sum of two others.

pub mod distance;
pub mod sum;

pub use distance::{haversine_km, haversine_km_array, DistanceFeatureSet, EARTH_RADIUS_KM};
pub use sum::ColumnSum;
