//! Training-time row selection.

use crate::dataset::Frame;
use crate::error::FeatureError;
use crate::preprocessing::traits::FeatureStep;
use crate::schema::RowFilterSpec;
use tracing::debug;

/// Drops rows missing a required column, then rows priced outside `[min, max]`.
///
/// Both bounds are inclusive. A missing price is out of bounds. The price
/// column must already be numeric.
#[derive(Clone, Debug)]
pub struct RowFilter {
    required_column: String,
    price_column: String,
    min: f64,
    max: f64,
}

impl RowFilter {
    pub fn new(
        required_column: impl Into<String>,
        price_column: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Result<Self, FeatureError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(FeatureError::InvalidParameter(format!(
                "price bounds [{}, {}] are not a valid range",
                min, max
            )));
        }
        Ok(Self {
            required_column: required_column.into(),
            price_column: price_column.into(),
            min,
            max,
        })
    }

    pub fn from_spec(spec: &RowFilterSpec, price_column: &str) -> Result<Self, FeatureError> {
        Self::new(
            spec.required_column.as_str(),
            price_column,
            spec.min_price,
            spec.max_price,
        )
    }

    fn in_bounds(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

impl FeatureStep for RowFilter {
    fn step_name(&self) -> &'static str {
        "RowFilter"
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError> {
        let before = frame.n_rows();

        let required = frame.column(&self.required_column)?;
        let present: Vec<bool> = (0..before).map(|row| !required.is_missing(row)).collect();
        frame.retain_rows(&present)?;
        let after_required = frame.n_rows();

        let keep: Vec<bool> = frame
            .numeric(&self.price_column)?
            .iter()
            .map(|&price| self.in_bounds(price))
            .collect();
        frame.retain_rows(&keep)?;

        debug!(
            rows_in = before,
            missing_required = before - after_required,
            out_of_bounds = after_required - frame.n_rows(),
            rows_out = frame.n_rows(),
            "filtered rows"
        );
        Ok(())
    }
}
