//! Size Imputer.
//!
//! Cleans the free-text floor area column and fills missing sizes with the
//! mean size of listings in the same group (by default, the same number of
//! rooms).
//!
//! The group means are statistics of the batch being imputed. They are
//! computed and applied in one pass and never stored.
//!
//! Note: NaN is treated as missing, both in sizes and in group keys.
//!
//! # Example
//! ```ignore
//! use toronto_rent_features::preprocessing::{FeatureStep, SizeImputer};
//!
//! let imputer = SizeImputer::new("Size (sqft)", "Rooms");
//! imputer.apply(&mut frame)?;
//! ```

use crate::dataset::{Column, Frame};
use crate::error::FeatureError;
use crate::preprocessing::traits::FeatureStep;
use crate::schema::SizeSpec;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Group-mean imputer for the size column.
#[derive(Clone, Debug)]
pub struct SizeImputer {
    column: String,
    group_by: String,
    placeholder: String,
    thousands_separator: char,
}

impl SizeImputer {
    /// Create an imputer for `column`, grouping by `group_by`.
    ///
    /// Defaults: placeholder `"Not Available"`, thousands separator `','`.
    pub fn new(column: impl Into<String>, group_by: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            group_by: group_by.into(),
            placeholder: "Not Available".to_string(),
            thousands_separator: ',',
        }
    }

    /// Build from the schema's size settings.
    pub fn from_spec(spec: &SizeSpec) -> Self {
        Self::new(spec.column.as_str(), spec.group_by.as_str())
            .with_placeholder(spec.placeholder.as_str())
            .with_thousands_separator(spec.thousands_separator)
    }

    /// Set the text that stands for "size unknown".
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the character stripped before parsing.
    pub fn with_thousands_separator(mut self, separator: char) -> Self {
        self.thousands_separator = separator;
        self
    }

    fn clean(&self, frame: &Frame) -> Result<Vec<f64>, FeatureError> {
        clean_sizes(
            &self.column,
            frame.column(&self.column)?,
            &self.placeholder,
            self.thousands_separator,
        )
    }

    fn fill(&self, mut sizes: Vec<f64>, groups: &[f64], means: &HashMap<u64, f64>) -> Vec<f64> {
        let mut unresolved = 0;
        for (size, &group) in sizes.iter_mut().zip(groups) {
            if !size.is_nan() {
                continue;
            }
            match group_key(group).and_then(|key| means.get(&key)) {
                Some(&mean) => *size = mean,
                None => unresolved += 1,
            }
        }
        debug!(
            column = %self.column,
            groups = means.len(),
            "imputed sizes by group mean"
        );
        if unresolved > 0 {
            warn!(
                column = %self.column,
                group_by = %self.group_by,
                rows = unresolved,
                "sizes left missing: no known size in their group"
            );
        }
        sizes
    }
}

/// Normalized hash key for a group value; `None` for a missing group.
fn group_key(value: f64) -> Option<u64> {
    if value.is_nan() {
        None
    } else if value == 0.0 {
        Some(0.0f64.to_bits())
    } else {
        Some(value.to_bits())
    }
}

/// Parse sizes: placeholder and missing become NaN, separators are stripped.
fn clean_sizes(
    name: &str,
    column: &Column,
    placeholder: &str,
    separator: char,
) -> Result<Vec<f64>, FeatureError> {
    let values = match column {
        Column::Numeric(values) => return Ok(values.clone()),
        Column::Text(values) => values,
    };

    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            let text = match value.as_deref().map(str::trim) {
                None => return Ok(f64::NAN),
                Some(text) if text == placeholder => return Ok(f64::NAN),
                Some(text) => text,
            };
            let stripped: String = text.chars().filter(|&c| c != separator).collect();
            stripped
                .parse::<f64>()
                .map_err(|_| FeatureError::InvalidNumber {
                    column: name.to_string(),
                    row,
                    value: text.to_string(),
                })
        })
        .collect()
}

/// Arithmetic mean of known sizes per group.
fn compute_group_means(sizes: &[f64], groups: &[f64]) -> HashMap<u64, f64> {
    let mut totals: HashMap<u64, (f64, usize)> = HashMap::new();
    for (&size, &group) in sizes.iter().zip(groups) {
        if size.is_nan() {
            continue;
        }
        if let Some(key) = group_key(group) {
            let entry = totals.entry(key).or_insert((0.0, 0));
            entry.0 += size;
            entry.1 += 1;
        }
    }
    totals
        .into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

impl FeatureStep for SizeImputer {
    fn step_name(&self) -> &'static str {
        "SizeImputer"
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError> {
        if frame.n_rows() == 0 {
            return Err(FeatureError::EmptyData(
                "Cannot impute sizes on empty data".to_string(),
            ));
        }
        let sizes = self.clean(frame)?;
        let groups = frame.numeric(&self.group_by)?;
        let means = compute_group_means(&sizes, groups);
        let filled = self.fill(sizes, groups, &means);
        frame.set_column(self.column.as_str(), Column::Numeric(filled))
    }
}
