//! Closed encoding tables.

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};

/// Closed mapping from a raw label to one number.
///
/// Entries keep their declaration order so the keys double as the option list
/// offered to the form. Lookups of labels not in the table yield NaN.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    entries: Vec<(String, f64)>,
}

impl LookupTable {
    /// Build a table from `(label, value)` pairs.
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The `No → 0, Yes → 1` table used for yes/no answers.
    pub fn binary() -> Self {
        Self::new([("No", 0.0), ("Yes", 1.0)])
    }

    /// Value for `label`, if mapped.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|&(_, value)| value)
    }

    /// Encode one cell. Missing or unmapped labels become NaN.
    pub fn encode(&self, label: Option<&str>) -> f64 {
        label.and_then(|l| self.get(l)).unwrap_or(f64::NAN)
    }

    /// Labels in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Closed mapping from a compound label to a tuple, one value per target column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundTable {
    entries: Vec<(String, Vec<f64>)>,
}

impl CompoundTable {
    /// Build a table from `(label, tuple)` pairs.
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, Vec<f64>)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Tuple for `label`, if mapped.
    pub fn get(&self, label: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, values)| values.as_slice())
    }

    /// Labels in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every tuple has exactly `arity` values.
    pub fn check_arity(&self, column: &str, arity: usize) -> Result<(), FeatureError> {
        for (key, values) in &self.entries {
            if values.len() != arity {
                return Err(FeatureError::TupleArity {
                    column: column.to_string(),
                    key: key.clone(),
                    expected: arity,
                    got: values.len(),
                });
            }
        }
        Ok(())
    }
}
