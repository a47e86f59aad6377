//! Feature engineering for Toronto rental price estimation.
//!
//! Raw rental listings (training) and a single UI listing form (serving) are
//! turned into the same model-ready feature table. One declarative
//! [`FeatureSchema`] holds every encoding table, landmark and imputation rule;
//! both [`TrainingPipeline`] and [`InferencePipeline`] are built from it, so
//! the columns the model sees cannot drift between the two.
//!
//! ```ignore
//! use std::sync::Arc;
//! use toronto_rent_features::{load_raw_csv, FeatureSchema, TrainingPipeline};
//!
//! let schema = Arc::new(FeatureSchema::toronto());
//! let table = TrainingPipeline::new(schema)?.run(load_raw_csv("listings.csv")?)?;
//! let x = table.numeric_matrix()?;
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod form;
pub mod geocoding;
pub mod pipeline;
pub mod preprocessing;
pub mod schema;
pub mod serialization;

pub use config::PipelineConfig;
pub use dataset::{load_raw_csv, Column, Frame};
pub use error::FeatureError;
pub use evaluation::{train_test_split, RegressionMetrics};
pub use form::{FormValue, ListingForm};
pub use geocoding::{Coordinates, FixedGeocoder, Geocoder, PhotonGeocoder, RateLimitedGeocoder};
pub use pipeline::{FeatureManifest, FeatureTable, InferencePipeline, TrainingPipeline};
pub use schema::FeatureSchema;
pub use serialization::BinaryEncoding;
