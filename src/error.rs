//! Error types for feature derivation.
//!
//! Missing values are *not* errors: unmapped categories, failed geocoding and
//! empty imputation groups all surface as NaN / `None` cells. Everything in
//! [`FeatureError`] is a schema or IO problem that must stop the pipeline.

use std::fmt;

/// Error type for feature derivation and dataset IO.
#[derive(Debug)]
pub enum FeatureError {
    /// A required column (raw dataset column or form field) is absent.
    MissingColumn(String),
    /// A column exists but holds the wrong kind of values.
    ColumnKind { column: String, expected: &'static str },
    /// A column with this name already exists where a new one was expected.
    DuplicateColumn(String),
    /// Column length does not match the frame height.
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
    /// A compound table entry does not have one value per target column.
    TupleArity {
        column: String,
        key: String,
        expected: usize,
        got: usize,
    },
    /// A value that must be numeric could not be parsed.
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
    /// Produced feature columns differ from the recorded manifest.
    SchemaDrift { expected: Vec<String>, got: Vec<String> },
    /// Invalid configuration or hyperparameter value.
    InvalidParameter(String),
    /// Empty data provided where non-empty was required.
    EmptyData(String),
    /// CSV reading or writing failed.
    Csv(String),
    /// Serialization or deserialization error.
    SerializationError(String),
    /// I/O error during file operations.
    IoError(String),
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::MissingColumn(column) => {
                write!(f, "Missing column: {}", column)
            }
            FeatureError::ColumnKind { column, expected } => {
                write!(f, "Column '{}' is not a {} column", column, expected)
            }
            FeatureError::DuplicateColumn(column) => {
                write!(f, "Duplicate column: {}", column)
            }
            FeatureError::LengthMismatch {
                column,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Length mismatch for column '{}': expected {} rows, got {}",
                    column, expected, got
                )
            }
            FeatureError::TupleArity {
                column,
                key,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Compound mapping for '{}' key '{}' has {} values, expected {}",
                    column, key, got, expected
                )
            }
            FeatureError::InvalidNumber { column, row, value } => {
                write!(
                    f,
                    "Invalid number in column '{}' at row {}: '{}'",
                    column, row, value
                )
            }
            FeatureError::SchemaDrift { expected, got } => {
                write!(
                    f,
                    "Schema drift: expected columns {:?}, got {:?}",
                    expected, got
                )
            }
            FeatureError::InvalidParameter(msg) => {
                write!(f, "Invalid parameter: {}", msg)
            }
            FeatureError::EmptyData(msg) => {
                write!(f, "Empty data: {}", msg)
            }
            FeatureError::Csv(msg) => {
                write!(f, "CSV error: {}", msg)
            }
            FeatureError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            FeatureError::IoError(msg) => {
                write!(f, "I/O error: {}", msg)
            }
        }
    }
}

impl std::error::Error for FeatureError {}

impl From<std::io::Error> for FeatureError {
    fn from(err: std::io::Error) -> Self {
        FeatureError::IoError(err.to_string())
    }
}

impl From<csv::Error> for FeatureError {
    fn from(err: csv::Error) -> Self {
        FeatureError::Csv(err.to_string())
    }
}

impl From<bincode::Error> for FeatureError {
    fn from(err: bincode::Error) -> Self {
        FeatureError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::SerializationError(err.to_string())
    }
}
