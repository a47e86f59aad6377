//! Core trait for preprocessing steps.

use crate::dataset::Frame;
use crate::error::FeatureError;

/// An operation on the columns of a frame.
///
/// Steps mutate the frame in place and are stored as `Box<dyn FeatureStep>`
/// so a pipeline can hold a heterogeneous list of them.
pub trait FeatureStep {
    /// Short name for logging.
    fn step_name(&self) -> &'static str;

    /// Apply the step.
    ///
    /// # Errors
    /// Returns [`FeatureError`] if a column the step reads is absent or has
    /// the wrong kind. Unmapped values are not errors; they become missing.
    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError>;
}
