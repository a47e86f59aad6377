//! Feature preprocessing steps.
//!
//! Every step reads and writes named columns of a [`Frame`](crate::dataset::Frame)
//! through [`FeatureStep`]. [`SizeImputer`] is the only step that looks at
//! the whole batch before writing.
//!
//! # Modules
//!
//! - [`encoding`]: label tables, compound splits and appliance flags
//! - [`imputation`]: group-mean size imputation
//! - [`feature_engineering`]: landmark distances and derived sums
//! - [`filter`]: training-time row selection

pub mod encoding;
pub mod feature_engineering;
pub mod filter;
pub mod imputation;
pub mod traits;

pub use encoding::{AppliancesExpander, CategoricalEncoder, CompoundSplitter};
pub use feature_engineering::{
    haversine_km, haversine_km_array, ColumnSum, DistanceFeatureSet, EARTH_RADIUS_KM,
};
pub use filter::RowFilter;
pub use imputation::SizeImputer;
pub use traits::FeatureStep;
