//! The declarative feature schema shared by training and serving.
//!
//! Every column name, encoding table, landmark and imputation rule lives in
//! one [`FeatureSchema`]. Both [`TrainingPipeline`](crate::pipeline::TrainingPipeline)
//! and [`InferencePipeline`](crate::pipeline::InferencePipeline) read it, and
//! both select their output through [`FeatureSchema::feature_names`], so the
//! column list the model sees is written down exactly once.
//!
//! The registry is plain data: it serializes to JSON and can be replaced from
//! a config file (see [`PipelineConfig`](crate::config::PipelineConfig)).

pub mod landmarks;
pub mod tables;

pub use self::landmarks::{toronto_landmarks, Landmark, TORONTO_LANDMARKS};
pub use self::tables::{CompoundTable, LookupTable};

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a serving form supplies a single-valued column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServingInput {
    /// The form supplies a label, encoded with the same table as training.
    Label,
    /// The form supplies the number directly, within `[min, max]`.
    Number { min: f64, max: f64 },
}

/// Encoding of one raw column into feature columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoding {
    /// One label column to one numeric column, same name.
    Single {
        column: String,
        table: LookupTable,
        serving: ServingInput,
    },
    /// One compound label column to several numeric columns.
    ///
    /// At serving time each target is asked directly as a yes/no answer.
    Compound {
        source: String,
        targets: Vec<String>,
        table: CompoundTable,
    },
    /// Delimiter-joined inventory text to one presence flag per known item.
    ///
    /// At serving time each item is asked directly as a yes/no answer.
    Appliances { source: String, known: Vec<String> },
}

impl ColumnEncoding {
    /// Raw column this encoding reads at training time.
    pub fn source(&self) -> &str {
        match self {
            ColumnEncoding::Single { column, .. } => column,
            ColumnEncoding::Compound { source, .. } => source,
            ColumnEncoding::Appliances { source, .. } => source,
        }
    }

    /// Feature columns this encoding produces, in order.
    pub fn outputs(&self) -> Vec<String> {
        match self {
            ColumnEncoding::Single { column, .. } => vec![column.clone()],
            ColumnEncoding::Compound { targets, .. } => targets.clone(),
            ColumnEncoding::Appliances { known, .. } => known.clone(),
        }
    }
}

/// A text column passed through untouched for the model's one-hot encoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Passthrough {
    pub column: String,
    /// Values the form offers.
    pub options: Vec<String>,
}

/// Size cleaning and group-mean imputation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeSpec {
    pub column: String,
    pub group_by: String,
    pub placeholder: String,
    pub thousands_separator: char,
    /// Range the form accepts.
    pub serving_min: f64,
    pub serving_max: f64,
}

/// A feature computed as `left + right`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedSum {
    pub name: String,
    pub left: String,
    pub right: String,
}

/// Training-time row selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowFilterSpec {
    /// Rows missing this raw column are dropped.
    pub required_column: String,
    pub min_price: f64,
    pub max_price: f64,
}

/// Kind of a produced feature column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// One column of the feature table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// What a form field accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldInput {
    FreeText,
    Choice { options: Vec<String> },
    Number { min: f64, max: f64 },
}

/// One field of the serving form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServingField {
    pub name: String,
    pub input: FieldInput,
}

/// How the downstream model pipeline treats each feature column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelColumnGroups {
    /// Mean-imputed then standardized (coordinates and distances).
    pub impute_and_scale: Vec<String>,
    /// Standardized only (counts and sizes).
    pub scale: Vec<String>,
    /// One-hot encoded.
    pub one_hot: Vec<String>,
    /// Passed through unchanged.
    pub passthrough: Vec<String>,
}

/// Registry of every feature derivation rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub target: String,
    pub address_field: String,
    pub latitude: String,
    pub longitude: String,
    /// Raw columns discarded at training time.
    pub pruned_raw_columns: Vec<String>,
    pub row_filter: RowFilterSpec,
    pub passthrough: Vec<Passthrough>,
    pub encodings: Vec<ColumnEncoding>,
    pub size: SizeSpec,
    pub derived_sums: Vec<DerivedSum>,
    pub landmarks: Vec<Landmark>,
    /// Table for yes/no answers to pre-split compound and appliance questions.
    pub answers: LookupTable,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::toronto()
    }
}

fn single(column: &str, entries: &[(&str, f64)], serving: ServingInput) -> ColumnEncoding {
    ColumnEncoding::Single {
        column: column.to_string(),
        table: LookupTable::new(entries.iter().copied()),
        serving,
    }
}

fn compound(source: &str, targets: &[&str], entries: &[(&str, &[f64])]) -> ColumnEncoding {
    ColumnEncoding::Compound {
        source: source.to_string(),
        targets: targets.iter().map(|t| t.to_string()).collect(),
        table: CompoundTable::new(entries.iter().map(|&(k, v)| (k, v.to_vec()))),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl FeatureSchema {
    /// The schema for the Toronto rental listings dataset.
    pub fn toronto() -> Self {
        let encodings = vec![
            single(
                "Bedrooms",
                &[
                    ("Bachelor/Studio", 0.5),
                    ("1", 1.0),
                    ("1 + Den", 1.5),
                    ("2", 2.0),
                    ("2 + Den", 2.5),
                    ("3", 3.0),
                    ("3 + Den", 3.5),
                    ("4", 4.0),
                    ("4 + Den", 4.5),
                    ("5+", 5.0),
                ],
                ServingInput::Number { min: 0.0, max: 5.0 },
            ),
            single(
                "Bathrooms",
                &[("1", 1.0), ("1.5", 1.5), ("2", 2.0), ("2.5", 2.5), ("3", 3.0)],
                ServingInput::Number { min: 1.0, max: 3.0 },
            ),
            single(
                "Parking Included",
                &[("0", 0.0), ("1", 1.0), ("2", 2.0), ("3+", 3.0)],
                ServingInput::Number { min: 0.0, max: 3.0 },
            ),
            single(
                "Furnished",
                &[("No", 0.0), ("Yes", 1.0)],
                ServingInput::Label,
            ),
            single(
                "Air Conditioning",
                &[("No", 0.0), ("Not Available", 0.0), ("Yes", 1.0)],
                ServingInput::Label,
            ),
            single(
                "Smoking Permitted",
                &[("No", 0.0), ("Outdoors only", 0.5), ("Yes", 1.0)],
                ServingInput::Label,
            ),
            single(
                "Pet Friendly",
                &[("No", 0.0), ("Limited", 0.5), ("Yes", 1.0)],
                ServingInput::Label,
            ),
            compound(
                "Wi-Fi and More",
                &["Internet", "Cable_TV"],
                &[
                    ("Not Included", &[0.0, 0.0]),
                    ("Internet", &[1.0, 0.0]),
                    ("Cable / TVInternet", &[1.0, 1.0]),
                    ("Cable / TV", &[0.0, 1.0]),
                ],
            ),
            compound(
                "Personal Outdoor Space",
                &["Balcony", "Yard"],
                &[
                    ("Not Included", &[0.0, 0.0]),
                    ("Balcony", &[1.0, 0.0]),
                    ("Yard", &[0.0, 1.0]),
                    ("YardBalcony", &[1.0, 1.0]),
                ],
            ),
            compound(
                "Utilities",
                &["Hydro", "Heat", "Water"],
                &[
                    ("Hydro_No,Heat_Yes,Water_Yes", &[0.0, 1.0, 1.0]),
                    ("Hydro_Yes,Heat_Yes,Water_Yes", &[1.0, 1.0, 1.0]),
                    ("Hydro_No,Heat_Yes,Water_No", &[0.0, 1.0, 0.0]),
                    ("Hydro_No,Heat_No,Water_Yes", &[0.0, 0.0, 1.0]),
                    ("Hydro_Yes,Heat_No,Water_Yes", &[1.0, 0.0, 1.0]),
                    ("Hydro_Yes,Heat_No,Water_No", &[1.0, 0.0, 0.0]),
                    ("Hydro_Yes,Heat_Yes,Water_No", &[1.0, 1.0, 0.0]),
                    ("NaN", &[0.0, 0.0, 0.0]),
                ],
            ),
            ColumnEncoding::Appliances {
                source: "Appliances".to_string(),
                known: strings(&[
                    "Laundry (In Building)",
                    "Laundry (In Unit)",
                    "Fridge / Freezer",
                    "Dishwasher",
                ]),
            },
        ];

        Self {
            target: "Price($)".to_string(),
            address_field: "Address".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            pruned_raw_columns: strings(&[
                "Unnamed: 0",
                "Address",
                "Title",
                "Date Posted",
                "Move-In Date",
                "Visit Counter",
                "url",
                "Description",
                "Amenities",
                "Agreement Type",
            ]),
            row_filter: RowFilterSpec {
                required_column: "Bedrooms".to_string(),
                min_price: 1000.0,
                max_price: 4000.0,
            },
            passthrough: vec![Passthrough {
                column: "Building Type".to_string(),
                options: strings(&[
                    "Apartment",
                    "House",
                    "Condo",
                    "Basement",
                    "Townhouse",
                    "Duplex/Triplex",
                ]),
            }],
            encodings,
            size: SizeSpec {
                column: "Size (sqft)".to_string(),
                group_by: "Rooms".to_string(),
                placeholder: "Not Available".to_string(),
                thousands_separator: ',',
                serving_min: 0.0,
                serving_max: 10000.0,
            },
            derived_sums: vec![DerivedSum {
                name: "Rooms".to_string(),
                left: "Bedrooms".to_string(),
                right: "Bathrooms".to_string(),
            }],
            landmarks: toronto_landmarks(),
            answers: LookupTable::binary(),
        }
    }

    /// Check internal consistency: tuple arities, unique output names, and
    /// that derived and imputation inputs exist by the time those steps run.
    pub fn validate(&self) -> Result<(), FeatureError> {
        for encoding in &self.encodings {
            if let ColumnEncoding::Compound {
                source,
                targets,
                table,
            } = encoding
            {
                table.check_arity(source, targets.len())?;
            }
        }

        let mut seen = HashSet::new();
        for column in self.feature_columns() {
            if !seen.insert(column.name.clone()) {
                return Err(FeatureError::DuplicateColumn(column.name));
            }
        }
        if seen.contains(&self.target) {
            return Err(FeatureError::DuplicateColumn(self.target.clone()));
        }

        // Sums and the size imputer run before compound targets, appliance
        // flags and distances exist, so only single encodings (and earlier
        // sums) are numeric by then.
        let mut available: HashSet<String> = self
            .encodings
            .iter()
            .filter(|e| matches!(e, ColumnEncoding::Single { .. }))
            .map(|e| e.source().to_string())
            .collect();
        for sum in &self.derived_sums {
            for input in [&sum.left, &sum.right] {
                if !available.contains(input) {
                    return Err(FeatureError::InvalidParameter(format!(
                        "derived feature '{}' reads '{}', which is not a single-label encoding or an earlier sum",
                        sum.name, input
                    )));
                }
            }
            available.insert(sum.name.clone());
        }
        if !available.contains(&self.size.group_by) {
            return Err(FeatureError::InvalidParameter(format!(
                "size imputation groups by '{}', which is not a single-label encoding or a derived sum",
                self.size.group_by
            )));
        }
        if self.landmarks.is_empty() {
            return Err(FeatureError::InvalidParameter(
                "at least one landmark is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Every feature column, in output order.
    ///
    /// Order: passthrough, encodings (registry order), size, derived sums,
    /// coordinates, landmark distances.
    pub fn feature_columns(&self) -> Vec<FeatureColumn> {
        let numeric = |name: String| FeatureColumn {
            name,
            kind: FeatureKind::Numeric,
        };

        let mut columns: Vec<FeatureColumn> = self
            .passthrough
            .iter()
            .map(|p| FeatureColumn {
                name: p.column.clone(),
                kind: FeatureKind::Categorical,
            })
            .collect();
        columns.extend(
            self.encodings
                .iter()
                .flat_map(|e| e.outputs())
                .map(numeric),
        );
        columns.push(numeric(self.size.column.clone()));
        columns.extend(self.derived_sums.iter().map(|s| numeric(s.name.clone())));
        columns.push(numeric(self.latitude.clone()));
        columns.push(numeric(self.longitude.clone()));
        columns.extend(self.landmarks.iter().map(|l| numeric(l.feature_name())));
        columns
    }

    /// Feature column names, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        self.feature_columns().into_iter().map(|c| c.name).collect()
    }

    /// Names of the landmark distance columns.
    pub fn distance_names(&self) -> Vec<String> {
        self.landmarks.iter().map(|l| l.feature_name()).collect()
    }

    /// Raw columns the training dataset must contain.
    pub fn required_raw_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.passthrough.iter().map(|p| p.column.clone()).collect();
        columns.extend(self.encodings.iter().map(|e| e.source().to_string()));
        columns.push(self.size.column.clone());
        columns.push(self.latitude.clone());
        columns.push(self.longitude.clone());
        columns.push(self.target.clone());
        if !columns.contains(&self.row_filter.required_column) {
            columns.push(self.row_filter.required_column.clone());
        }
        columns
    }

    /// Fields of the serving form, with what each accepts.
    pub fn serving_fields(&self) -> Vec<ServingField> {
        let answers: Vec<String> = self.answers.keys().map(str::to_string).collect();
        let choice = |name: &str, options: Vec<String>| ServingField {
            name: name.to_string(),
            input: FieldInput::Choice { options },
        };

        let mut fields = vec![ServingField {
            name: self.address_field.clone(),
            input: FieldInput::FreeText,
        }];
        fields.extend(
            self.passthrough
                .iter()
                .map(|p| choice(&p.column, p.options.clone())),
        );
        for encoding in &self.encodings {
            match encoding {
                ColumnEncoding::Single {
                    column,
                    table,
                    serving: ServingInput::Label,
                } => fields.push(choice(column, table.keys().map(str::to_string).collect())),
                ColumnEncoding::Single {
                    column,
                    serving: ServingInput::Number { min, max },
                    ..
                } => fields.push(ServingField {
                    name: column.clone(),
                    input: FieldInput::Number {
                        min: *min,
                        max: *max,
                    },
                }),
                ColumnEncoding::Compound { targets, .. } => {
                    fields.extend(targets.iter().map(|t| choice(t, answers.clone())))
                }
                ColumnEncoding::Appliances { known, .. } => {
                    fields.extend(known.iter().map(|k| choice(k, answers.clone())))
                }
            }
        }
        fields.push(ServingField {
            name: self.size.column.clone(),
            input: FieldInput::Number {
                min: self.size.serving_min,
                max: self.size.serving_max,
            },
        });
        fields
    }

    /// Column groups for the downstream model pipeline.
    ///
    /// Coordinates and distances can be missing after a failed geocode and
    /// are imputed then scaled; count-like columns (numeric form inputs, size
    /// and derived sums) are scaled; passthrough text is one-hot encoded;
    /// flags and label encodings pass through.
    pub fn model_column_groups(&self) -> ModelColumnGroups {
        let mut groups = ModelColumnGroups {
            impute_and_scale: vec![self.latitude.clone(), self.longitude.clone()],
            ..Default::default()
        };
        groups.impute_and_scale.extend(self.distance_names());

        for encoding in &self.encodings {
            match encoding {
                ColumnEncoding::Single {
                    column,
                    serving: ServingInput::Number { .. },
                    ..
                } => groups.scale.push(column.clone()),
                other => groups.passthrough.extend(other.outputs()),
            }
        }
        groups.scale.push(self.size.column.clone());
        groups
            .scale
            .extend(self.derived_sums.iter().map(|s| s.name.clone()));
        groups.one_hot = self.passthrough.iter().map(|p| p.column.clone()).collect();
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toronto_schema_is_valid() {
        FeatureSchema::toronto().validate().unwrap();
    }

    #[test]
    fn test_feature_names() {
        let names = FeatureSchema::toronto().feature_names();

        assert_eq!(names.len(), 30);
        assert_eq!(names[0], "Building Type");
        assert!(names.contains(&"Cable_TV".to_string()));
        assert!(names.contains(&"Rooms".to_string()));
        assert!(names.contains(&"distance to Dorset Park (km)".to_string()));
        assert!(!names.contains(&"Utilities".to_string()));
        assert!(!names.contains(&"Price($)".to_string()));
    }

    #[test]
    fn test_validate_rejects_bad_arity() {
        let mut schema = FeatureSchema::toronto();
        schema.encodings.push(compound(
            "Parking Type",
            &["Garage", "Street"],
            &[("Garage", &[1.0])],
        ));
        assert!(matches!(
            schema.validate(),
            Err(FeatureError::TupleArity { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_outputs() {
        let mut schema = FeatureSchema::toronto();
        schema
            .encodings
            .push(single("Furnished", &[("No", 0.0)], ServingInput::Label));
        assert!(matches!(
            schema.validate(),
            Err(FeatureError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_sum_input() {
        let mut schema = FeatureSchema::toronto();
        schema.derived_sums.push(DerivedSum {
            name: "Everything".to_string(),
            left: "Bedrooms".to_string(),
            right: "Dens".to_string(),
        });
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_sum_over_later_stage() {
        let mut schema = FeatureSchema::toronto();
        schema.derived_sums.push(DerivedSum {
            name: "Utilities Included".to_string(),
            left: "Hydro".to_string(),
            right: "Heat".to_string(),
        });
        assert!(matches!(
            schema.validate(),
            Err(FeatureError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_validate_rejects_group_by_later_stage() {
        let mut schema = FeatureSchema::toronto();
        schema.size.group_by = "Hydro".to_string();
        assert!(matches!(
            schema.validate(),
            Err(FeatureError::InvalidParameter(_))
        ));

        schema.size.group_by = "distance to downtown (km)".to_string();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_chained_sums() {
        let mut schema = FeatureSchema::toronto();
        schema.derived_sums.push(DerivedSum {
            name: "Rooms and Parking".to_string(),
            left: "Rooms".to_string(),
            right: "Parking Included".to_string(),
        });
        schema.size.group_by = "Bedrooms".to_string();
        schema.validate().unwrap();
    }

    #[test]
    fn test_serving_fields_cover_features() {
        let schema = FeatureSchema::toronto();
        let fields: Vec<String> = schema
            .serving_fields()
            .into_iter()
            .map(|f| f.name)
            .collect();

        assert!(fields.contains(&"Address".to_string()));
        for name in schema.feature_names() {
            let derived = name == "Rooms"
                || name == schema.latitude
                || name == schema.longitude
                || name.starts_with("distance to ");
            assert_eq!(fields.contains(&name), !derived, "field {}", name);
        }
    }

    #[test]
    fn test_serving_choices_all_encode() {
        let schema = FeatureSchema::toronto();
        for field in schema.serving_fields() {
            let options = match field.input {
                FieldInput::Choice { options } => options,
                _ => continue,
            };
            let table = schema.encodings.iter().find_map(|e| match e {
                ColumnEncoding::Single { column, table, .. } if *column == field.name => {
                    Some(table.clone())
                }
                _ => None,
            });
            let is_passthrough = schema.passthrough.iter().any(|p| p.column == field.name);
            if is_passthrough {
                continue;
            }
            let table = table.unwrap_or_else(|| schema.answers.clone());
            for option in options {
                assert!(
                    !table.encode(Some(&option)).is_nan(),
                    "{} option {} is unmapped",
                    field.name,
                    option
                );
            }
        }
    }

    #[test]
    fn test_model_column_groups() {
        let schema = FeatureSchema::toronto();
        let groups = schema.model_column_groups();

        assert_eq!(groups.impute_and_scale.len(), 9);
        assert_eq!(
            groups.scale,
            vec![
                "Bedrooms",
                "Bathrooms",
                "Parking Included",
                "Size (sqft)",
                "Rooms"
            ]
        );
        assert_eq!(groups.one_hot, vec!["Building Type"]);

        let total = groups.impute_and_scale.len()
            + groups.scale.len()
            + groups.one_hot.len()
            + groups.passthrough.len();
        assert_eq!(total, schema.feature_names().len());
    }

    #[test]
    fn test_schema_json_roundtrip() {
        let schema = FeatureSchema::toronto();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.feature_names(), schema.feature_names());
    }
}
