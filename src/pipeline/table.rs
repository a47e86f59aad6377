//! The finished feature table and its manifest.

use crate::dataset::{self, Column, Frame};
use crate::error::FeatureError;
use crate::schema::{FeatureColumn, FeatureKind, FeatureSchema, ModelColumnGroups};
use crate::serialization::BinaryEncoding;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Training labels, kept beside the features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub values: Vec<f64>,
}

/// Output of a feature pipeline: schema-ordered columns plus an optional target.
///
/// The numeric columns are handed to the model as an `ndarray` matrix; the
/// categorical passthrough columns stay as text for the model's own one-hot
/// encoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<FeatureColumn>,
    features: Frame,
    target: Option<Target>,
}

impl FeatureTable {
    /// Wrap `features`, whose columns must match `columns` exactly, in order
    /// and in kind.
    pub fn new(
        columns: Vec<FeatureColumn>,
        features: Frame,
        target: Option<Target>,
    ) -> Result<Self, FeatureError> {
        let expected: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        if features.column_names() != expected.as_slice() {
            return Err(FeatureError::SchemaDrift {
                expected,
                got: features.column_names().to_vec(),
            });
        }
        for column in &columns {
            let matches = match (column.kind, features.column(&column.name)?) {
                (FeatureKind::Numeric, Column::Numeric(_)) => true,
                (FeatureKind::Categorical, Column::Text(_)) => true,
                _ => false,
            };
            if !matches {
                return Err(FeatureError::ColumnKind {
                    column: column.name.clone(),
                    expected: match column.kind {
                        FeatureKind::Numeric => "numeric",
                        FeatureKind::Categorical => "text",
                    },
                });
            }
        }
        if let Some(target) = &target {
            if target.values.len() != features.n_rows() {
                return Err(FeatureError::LengthMismatch {
                    column: target.name.clone(),
                    expected: features.n_rows(),
                    got: target.values.len(),
                });
            }
        }
        Ok(Self {
            columns,
            features,
            target,
        })
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> &[String] {
        self.features.column_names()
    }

    pub fn n_rows(&self) -> usize {
        self.features.n_rows()
    }

    pub fn features(&self) -> &Frame {
        &self.features
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Target values as an array, if the table carries a target.
    pub fn target_array(&self) -> Option<Array1<f64>> {
        self.target
            .as_ref()
            .map(|t| Array1::from(t.values.clone()))
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == FeatureKind::Numeric)
            .map(|c| c.name.clone())
            .collect()
    }

    /// `(n_rows, n_numeric)` matrix of the numeric columns. NaN = missing.
    pub fn numeric_matrix(&self) -> Result<Array2<f64>, FeatureError> {
        self.features.numeric_matrix(&self.numeric_names())
    }

    /// A categorical passthrough column.
    pub fn categorical(&self, name: &str) -> Result<&[Option<String>], FeatureError> {
        self.features.text(name)
    }

    /// Features followed by the target column, if any.
    pub fn to_frame(&self) -> Result<Frame, FeatureError> {
        let mut frame = self.features.clone();
        if let Some(target) = &self.target {
            frame.add_column(target.name.as_str(), Column::Numeric(target.values.clone()))?;
        }
        Ok(frame)
    }

    /// Rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Result<FeatureTable, FeatureError> {
        let features = self.features.take(indices)?;
        let target = self.target.as_ref().map(|t| Target {
            name: t.name.clone(),
            values: indices.iter().map(|&i| t.values[i]).collect(),
        });
        Ok(Self {
            columns: self.columns.clone(),
            features,
            target,
        })
    }

    /// Write as CSV: schema columns, then the target. Missing cells are empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), FeatureError> {
        dataset::write_csv(&self.to_frame()?, writer)
    }

    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), FeatureError> {
        dataset::write_csv_file(&self.to_frame()?, path)
    }

    /// Save the table in binary form.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let bytes = self.to_bytes().map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Load a table saved with [`FeatureTable::save_to_file`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FeatureError> {
        let bytes = std::fs::read(path)?;
        let table = Self::from_bytes(&bytes)
            .map_err(|e| FeatureError::SerializationError(e.to_string()))?;
        // Re-check the invariants a hand-edited file could break.
        Self::new(table.columns, table.features, table.target)
    }
}

/// Record of the feature contract, written at training time.
///
/// Serving checks its output against the manifest so a schema change between
/// training and serving is an error instead of a silently misaligned model
/// input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureManifest {
    pub columns: Vec<FeatureColumn>,
    pub target: String,
    pub groups: ModelColumnGroups,
}

impl FeatureManifest {
    pub fn from_schema(schema: &FeatureSchema) -> Self {
        Self {
            columns: schema.feature_columns(),
            target: schema.target.clone(),
            groups: schema.model_column_groups(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Fail with [`FeatureError::SchemaDrift`] unless `table` has exactly the
    /// recorded columns, kinds and order.
    pub fn verify(&self, table: &FeatureTable) -> Result<(), FeatureError> {
        if self.columns.as_slice() != table.columns() {
            return Err(FeatureError::SchemaDrift {
                expected: self.column_names(),
                got: table.column_names().to_vec(),
            });
        }
        Ok(())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), FeatureError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, FeatureError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<FeatureColumn> {
        vec![
            FeatureColumn {
                name: "Building Type".to_string(),
                kind: FeatureKind::Categorical,
            },
            FeatureColumn {
                name: "Rooms".to_string(),
                kind: FeatureKind::Numeric,
            },
            FeatureColumn {
                name: "latitude".to_string(),
                kind: FeatureKind::Numeric,
            },
        ]
    }

    fn table() -> FeatureTable {
        let features = Frame::from_columns([
            (
                "Building Type",
                Column::Text(vec![Some("Condo".to_string()), None, Some("House".to_string())]),
            ),
            ("Rooms", Column::Numeric(vec![2.0, 3.5, 4.0])),
            ("latitude", Column::Numeric(vec![43.6, f64::NAN, 43.7])),
        ])
        .unwrap();
        let target = Target {
            name: "Price($)".to_string(),
            values: vec![1800.0, 2400.0, 3100.0],
        };
        FeatureTable::new(columns(), features, Some(target)).unwrap()
    }

    #[test]
    fn test_table_rejects_misordered_columns() {
        let features = Frame::from_columns([
            ("Rooms", Column::Numeric(vec![2.0])),
            ("Building Type", Column::Text(vec![None])),
            ("latitude", Column::Numeric(vec![43.6])),
        ])
        .unwrap();
        let result = FeatureTable::new(columns(), features, None);
        assert!(matches!(result, Err(FeatureError::SchemaDrift { .. })));
    }

    #[test]
    fn test_table_rejects_wrong_column_kind() {
        let features = Frame::from_columns([
            ("Building Type", Column::Text(vec![None])),
            ("Rooms", Column::Text(vec![Some("2".to_string())])),
            ("latitude", Column::Numeric(vec![43.6])),
        ])
        .unwrap();
        let result = FeatureTable::new(columns(), features, None);
        assert!(matches!(
            result,
            Err(FeatureError::ColumnKind { column, expected: "numeric" }) if column == "Rooms"
        ));
    }

    #[test]
    fn test_load_rejects_wrong_column_kind() {
        // Bypass `new` the way a hand-edited file would
        let table = FeatureTable {
            columns: columns(),
            features: Frame::from_columns([
                ("Building Type", Column::Numeric(vec![1.0])),
                ("Rooms", Column::Numeric(vec![2.0])),
                ("latitude", Column::Numeric(vec![43.6])),
            ])
            .unwrap(),
            target: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.bin");
        table.save_to_file(&path).unwrap();

        let result = FeatureTable::load_from_file(&path);
        assert!(matches!(
            result,
            Err(FeatureError::ColumnKind { expected: "text", .. })
        ));
    }

    #[test]
    fn test_numeric_matrix_skips_categorical() {
        let matrix = table().numeric_matrix().unwrap();
        assert_eq!(matrix.shape(), &[3, 2]);
        assert_eq!(matrix[[1, 0]], 3.5);
        assert!(matrix[[1, 1]].is_nan());
    }

    #[test]
    fn test_take_keeps_target_aligned() {
        let subset = table().take(&[2, 0]).unwrap();
        assert_eq!(subset.target().unwrap().values, vec![3100.0, 1800.0]);
        assert_eq!(
            subset.categorical("Building Type").unwrap(),
            &[Some("House".to_string()), Some("Condo".to_string())]
        );
    }

    #[test]
    fn test_write_csv_appends_target() {
        let mut out = Vec::new();
        table().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), "Building Type,Rooms,latitude,Price($)");
        assert_eq!(lines.next().unwrap(), "Condo,2,43.6,1800");
        assert_eq!(lines.next().unwrap(), ",3.5,,2400");
    }

    #[test]
    fn test_table_file_roundtrip() {
        let table = table();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.bin");
        table.save_to_file(&path).unwrap();

        let loaded = FeatureTable::load_from_file(&path).unwrap();
        assert_eq!(loaded.column_names(), table.column_names());
        assert_eq!(loaded.target(), table.target());
        assert_eq!(loaded.n_rows(), 3);
    }

    #[test]
    fn test_manifest_verify() {
        let schema = FeatureSchema::toronto();
        let manifest = FeatureManifest::from_schema(&schema);
        assert_eq!(manifest.column_names(), schema.feature_names());

        let drifted = table();
        assert!(matches!(
            manifest.verify(&drifted),
            Err(FeatureError::SchemaDrift { .. })
        ));
    }

    #[test]
    fn test_manifest_json_roundtrip() {
        let manifest = FeatureManifest::from_schema(&FeatureSchema::toronto());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        manifest.save_json(&path).unwrap();
        assert_eq!(FeatureManifest::load_json(&path).unwrap(), manifest);
    }
}
