//! Derived feature: sum of two numeric columns.

use crate::dataset::{Column, Frame};
use crate::error::FeatureError;
use crate::preprocessing::traits::FeatureStep;
use crate::schema::DerivedSum;

/// Writes `left + right` into `name`. NaN in either input gives NaN.
#[derive(Clone, Debug)]
pub struct ColumnSum {
    name: String,
    left: String,
    right: String,
}

impl ColumnSum {
    pub fn new(
        name: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn from_spec(spec: &DerivedSum) -> Self {
        Self::new(spec.name.as_str(), spec.left.as_str(), spec.right.as_str())
    }
}

impl FeatureStep for ColumnSum {
    fn step_name(&self) -> &'static str {
        "ColumnSum"
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError> {
        let left = frame.numeric(&self.left)?;
        let right = frame.numeric(&self.right)?;
        let sum: Vec<f64> = left.iter().zip(right).map(|(a, b)| a + b).collect();
        frame.set_column(self.name.as_str(), Column::Numeric(sum))
    }
}
