//! Decomposition of a compound label column into several numeric columns.

use crate::dataset::{Column, Frame};
use crate::error::FeatureError;
use crate::preprocessing::traits::FeatureStep;
use crate::schema::CompoundTable;

/// Splits one compound label column into one numeric column per target.
///
/// Each table entry maps a label to a tuple with one value per target column.
/// A label absent from the table (or a missing label) yields NaN in every
/// target; there is no partial matching of sub-features. The source column is
/// removed.
#[derive(Clone, Debug)]
pub struct CompoundSplitter {
    source: String,
    targets: Vec<String>,
    table: CompoundTable,
}

impl CompoundSplitter {
    /// Create a splitter, checking that every tuple has one value per target.
    ///
    /// # Errors
    /// [`FeatureError::TupleArity`] if any tuple length differs from
    /// `targets.len()`.
    pub fn new(
        source: impl Into<String>,
        targets: Vec<String>,
        table: CompoundTable,
    ) -> Result<Self, FeatureError> {
        let source = source.into();
        table.check_arity(&source, targets.len())?;
        Ok(Self {
            source,
            targets,
            table,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Split labels into one value vector per target.
    pub fn split(&self, labels: &[Option<String>]) -> Vec<Vec<f64>> {
        let mut outputs = vec![Vec::with_capacity(labels.len()); self.targets.len()];
        for label in labels {
            let tuple = label.as_deref().and_then(|l| self.table.get(l));
            for (idx, output) in outputs.iter_mut().enumerate() {
                output.push(tuple.map_or(f64::NAN, |t| t[idx]));
            }
        }
        outputs
    }
}

impl FeatureStep for CompoundSplitter {
    fn step_name(&self) -> &'static str {
        "CompoundSplitter"
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError> {
        frame.require_absent(&self.targets)?;
        let outputs = self.split(frame.text(&self.source)?);
        for (target, values) in self.targets.iter().zip(outputs) {
            frame.add_column(target.as_str(), Column::Numeric(values))?;
        }
        frame.remove_column(&self.source)?;
        Ok(())
    }
}
