//! Closed-table encoding of one label column.

use crate::dataset::{Column, Frame};
use crate::error::FeatureError;
use crate::preprocessing::traits::FeatureStep;
use crate::schema::LookupTable;

/// Replaces a text column with its table encoding, under the same name.
///
/// Labels absent from the table (and missing labels) become NaN. There is no
/// fallback value unless the table itself declares one.
///
/// # Example
/// ```ignore
/// let encoder = CategoricalEncoder::new("Pet Friendly", LookupTable::new([
///     ("No", 0.0), ("Limited", 0.5), ("Yes", 1.0),
/// ]));
/// encoder.apply(&mut frame)?;
/// ```
#[derive(Clone, Debug)]
pub struct CategoricalEncoder {
    column: String,
    table: LookupTable,
}

impl CategoricalEncoder {
    pub fn new(column: impl Into<String>, table: LookupTable) -> Self {
        Self {
            column: column.into(),
            table,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Encode a slice of labels.
    pub fn encode(&self, labels: &[Option<String>]) -> Vec<f64> {
        labels
            .iter()
            .map(|label| self.table.encode(label.as_deref()))
            .collect()
    }
}

impl FeatureStep for CategoricalEncoder {
    fn step_name(&self) -> &'static str {
        "CategoricalEncoder"
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError> {
        let encoded = self.encode(frame.text(&self.column)?);
        frame.set_column(self.column.as_str(), Column::Numeric(encoded))
    }
}
