//! Named-column table with explicit missing values.

use crate::error::FeatureError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A single column of a [`Frame`].
///
/// Text cells use `None` for missing, numeric cells use NaN. Missing is never
/// represented by zero or an empty string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Raw or categorical text values.
    Text(Vec<Option<String>>),
    /// Numeric values, NaN = missing.
    Numeric(Vec<f64>),
}

impl Column {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Column::Text(values) => values.len(),
            Column::Numeric(values) => values.len(),
        }
    }

    /// True if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Column::Text(_) => "text",
            Column::Numeric(_) => "numeric",
        }
    }

    /// Whether the cell at `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Text(values) => values.get(row).map_or(true, |v| v.is_none()),
            Column::Numeric(values) => values.get(row).map_or(true, |v| v.is_nan()),
        }
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    fn retain(&mut self, keep: &[bool]) {
        match self {
            Column::Text(values) => {
                let mut flags = keep.iter();
                values.retain(|_| *flags.next().unwrap_or(&false));
            }
            Column::Numeric(values) => {
                let mut flags = keep.iter();
                values.retain(|_| *flags.next().unwrap_or(&false));
            }
        }
    }
}

/// Ordered collection of uniquely named, equal-length columns.
///
/// This is the working representation of both a raw listing batch and a
/// finished feature table. Column order is preserved and significant: it is
/// the order the model-facing side sees.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Create an empty frame. Its height is fixed by the first column added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, column)` pairs.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> Result<Self, FeatureError> {
        let mut frame = Frame::new();
        for (name, column) in columns {
            frame.add_column(name, column)?;
        }
        Ok(frame)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// True if the frame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Borrow a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, FeatureError> {
        self.position(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
    }

    /// Borrow a text column by name.
    pub fn text(&self, name: &str) -> Result<&[Option<String>], FeatureError> {
        match self.column(name)? {
            Column::Text(values) => Ok(values),
            Column::Numeric(_) => Err(FeatureError::ColumnKind {
                column: name.to_string(),
                expected: "text",
            }),
        }
    }

    /// Borrow a numeric column by name.
    pub fn numeric(&self, name: &str) -> Result<&[f64], FeatureError> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Text(_) => Err(FeatureError::ColumnKind {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    fn check_len(&self, name: &str, column: &Column) -> Result<(), FeatureError> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(FeatureError::LengthMismatch {
                column: name.to_string(),
                expected: self.n_rows,
                got: column.len(),
            });
        }
        Ok(())
    }

    /// Append a new column. Fails if the name is taken.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), FeatureError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(FeatureError::DuplicateColumn(name));
        }
        self.check_len(&name, &column)?;
        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Replace a column in place, or append it if absent.
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), FeatureError> {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => {
                if self.columns.len() == 1 {
                    self.n_rows = column.len();
                } else {
                    self.check_len(&name, &column)?;
                }
                self.columns[idx] = column;
                Ok(())
            }
            None => self.add_column(name, column),
        }
    }

    /// Remove a column and return it.
    pub fn remove_column(&mut self, name: &str) -> Result<Column, FeatureError> {
        let idx = self
            .position(name)
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))?;
        self.names.remove(idx);
        let column = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.n_rows = 0;
        }
        Ok(column)
    }

    /// Remove every listed column that is present; returns how many were removed.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let mut removed = 0;
        for name in names {
            if self.remove_column(name.as_ref()).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Fail with [`FeatureError::MissingColumn`] on the first absent name.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<(), FeatureError> {
        for name in names {
            if !self.contains(name.as_ref()) {
                return Err(FeatureError::MissingColumn(name.as_ref().to_string()));
            }
        }
        Ok(())
    }

    /// Fail with [`FeatureError::DuplicateColumn`] if any name is already
    /// taken, or repeated within `names`.
    pub fn require_absent<S: AsRef<str>>(&self, names: &[S]) -> Result<(), FeatureError> {
        for (idx, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let repeated = names[..idx].iter().any(|n| n.as_ref() == name);
            if repeated || self.contains(name) {
                return Err(FeatureError::DuplicateColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Keep only rows whose flag is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<(), FeatureError> {
        if keep.len() != self.n_rows {
            return Err(FeatureError::LengthMismatch {
                column: "<row mask>".to_string(),
                expected: self.n_rows,
                got: keep.len(),
            });
        }
        for column in &mut self.columns {
            column.retain(keep);
        }
        self.n_rows = keep.iter().filter(|&&k| k).count();
        Ok(())
    }

    /// Convert a text column to numeric in place.
    ///
    /// Missing text becomes NaN; surrounding whitespace is ignored. Any other
    /// value that does not parse is an error. Numeric columns are left as-is.
    pub fn coerce_numeric(&mut self, name: &str) -> Result<(), FeatureError> {
        let values = match self.column(name)? {
            Column::Numeric(_) => return Ok(()),
            Column::Text(values) => parse_numbers(name, values)?,
        };
        self.set_column(name, Column::Numeric(values))
    }

    /// New frame holding the listed columns, in the listed order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame, FeatureError> {
        let mut selected = Frame::new();
        for name in names {
            let column = self.column(name.as_ref())?.clone();
            selected.add_column(name.as_ref(), column)?;
        }
        if selected.is_empty() {
            selected.n_rows = self.n_rows;
        }
        Ok(selected)
    }

    /// New frame holding the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Result<Frame, FeatureError> {
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= self.n_rows) {
            return Err(FeatureError::InvalidParameter(format!(
                "row index {} out of bounds for {} rows",
                bad, self.n_rows
            )));
        }
        let columns = self.columns.iter().map(|column| match column {
            Column::Text(values) => Column::Text(indices.iter().map(|&i| values[i].clone()).collect()),
            Column::Numeric(values) => Column::Numeric(indices.iter().map(|&i| values[i]).collect()),
        });
        let mut taken = Frame::from_columns(self.names.iter().cloned().zip(columns))?;
        if taken.is_empty() {
            taken.n_rows = indices.len();
        }
        Ok(taken)
    }

    /// Row-major `(n_rows, names.len())` matrix of the listed numeric columns.
    pub fn numeric_matrix<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f64>, FeatureError> {
        let mut flat = Vec::with_capacity(self.n_rows * names.len());
        let columns: Vec<&[f64]> = names
            .iter()
            .map(|name| self.numeric(name.as_ref()))
            .collect::<Result<_, _>>()?;
        for row in 0..self.n_rows {
            for column in &columns {
                flat.push(column[row]);
            }
        }
        Array2::from_shape_vec((self.n_rows, names.len()), flat)
            .map_err(|e| FeatureError::InvalidParameter(e.to_string()))
    }
}

/// Parse a text column into numbers; `None` becomes NaN.
pub(crate) fn parse_numbers(
    column: &str,
    values: &[Option<String>],
) -> Result<Vec<f64>, FeatureError> {
    values
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            None => Ok(f64::NAN),
            Some(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| FeatureError::InvalidNumber {
                    column: column.to_string(),
                    row,
                    value: text.clone(),
                }),
        })
        .collect()
}
