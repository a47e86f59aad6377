//! The listing form submitted at serving time.

use crate::dataset::{Column, Frame};
use crate::error::FeatureError;
use crate::schema::{FeatureSchema, FieldInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// A single form value: free text or a number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(f64),
    Text(String),
}

impl FormValue {
    fn to_text(&self) -> String {
        match self {
            FormValue::Text(text) => text.clone(),
            FormValue::Number(value) => value.to_string(),
        }
    }

    fn to_number(&self, field: &str) -> Result<f64, FeatureError> {
        match self {
            FormValue::Number(value) => Ok(*value),
            FormValue::Text(text) => {
                text.trim()
                    .parse()
                    .map_err(|_| FeatureError::InvalidNumber {
                        column: field.to_string(),
                        row: 0,
                        value: text.clone(),
                    })
            }
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        FormValue::Number(value)
    }
}

/// One listing as entered in the UI, keyed by field name.
///
/// Serialized as a flat JSON object, e.g.
/// `{"Address": "100 Queen St W", "Bedrooms": 2, "Furnished": "No"}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingForm {
    fields: BTreeMap<String, FormValue>,
}

impl ListingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, FeatureError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, FeatureError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FormValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One-row frame with a column per serving field, in serving field order.
    ///
    /// Choice and free-text fields become text columns; number fields become
    /// numeric columns. Unknown choices are kept as-is (the encoders turn them
    /// into missing values). Numbers outside the field's range are kept and
    /// logged.
    ///
    /// # Errors
    /// [`FeatureError::MissingColumn`] for an absent field,
    /// [`FeatureError::InvalidNumber`] for a number field that does not parse.
    pub fn to_frame(&self, schema: &FeatureSchema) -> Result<Frame, FeatureError> {
        let fields = schema.serving_fields();
        let mut frame = Frame::new();

        for field in &fields {
            let value = self
                .get(&field.name)
                .ok_or_else(|| FeatureError::MissingColumn(field.name.clone()))?;

            let column = match &field.input {
                FieldInput::FreeText => Column::Text(vec![Some(value.to_text())]),
                FieldInput::Choice { options } => {
                    let text = value.to_text();
                    if !options.contains(&text) {
                        warn!(field = %field.name, value = %text, "value is not one of the form options");
                    }
                    Column::Text(vec![Some(text)])
                }
                FieldInput::Number { min, max } => {
                    let number = value.to_number(&field.name)?;
                    if number < *min || number > *max {
                        warn!(field = %field.name, value = number, min, max, "value outside form range");
                    }
                    Column::Numeric(vec![number])
                }
            };
            frame.add_column(field.name.as_str(), column)?;
        }

        let extra = self
            .fields
            .keys()
            .filter(|name| !fields.iter().any(|f| &f.name == *name))
            .count();
        if extra > 0 {
            debug!(extra, "ignored form fields not in the schema");
        }
        Ok(frame)
    }
}
