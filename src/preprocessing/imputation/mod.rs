//! Imputation steps for handling missing values.
//!
//! # Available Steps
//!
//! | Step | Description |
//! |-------------|-------------|
//! | [`SizeImputer`] | Clean floor areas and fill gaps with the group mean |

pub mod size;

pub use size::SizeImputer;
