//! CSV reading and writing for listing frames.

use super::frame::{Column, Frame};
use crate::error::FeatureError;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Cell contents read as missing, matching the NA tokens of common dataframe
/// CSV readers so a scraped export loads the same way it was analysed.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_na(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

/// Load a raw listings CSV from disk. Every column is read as text.
pub fn load_raw_csv<P: AsRef<Path>>(path: P) -> Result<Frame, FeatureError> {
    let file = File::open(path)?;
    read_raw_csv(BufReader::new(file))
}

/// Read a raw listings CSV. Every column is read as text; NA tokens become
/// missing cells.
///
/// A leading unnamed index column (empty header) is named `Unnamed: 0`.
pub fn read_raw_csv<R: Read>(reader: R) -> Result<Frame, FeatureError> {
    let mut rdr = ReaderBuilder::new().flexible(false).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            if h.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        let record = result?;
        for (idx, value) in record.iter().enumerate() {
            cells[idx].push(if is_na(value) {
                None
            } else {
                Some(value.to_string())
            });
        }
    }

    Frame::from_columns(
        headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| (name, Column::Text(values))),
    )
}

/// Write a frame as CSV. Missing cells are written as empty fields.
pub fn write_csv<W: Write>(frame: &Frame, writer: W) -> Result<(), FeatureError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(frame.column_names())?;

    let columns: Vec<&Column> = frame
        .column_names()
        .iter()
        .map(|name| frame.column(name))
        .collect::<Result<_, _>>()?;

    for row in 0..frame.n_rows() {
        let record: Vec<String> = columns
            .iter()
            .map(|column| match column {
                Column::Text(values) => values[row].clone().unwrap_or_default(),
                Column::Numeric(values) if values[row].is_nan() => String::new(),
                Column::Numeric(values) => values[row].to_string(),
            })
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a frame as CSV to a file.
pub fn write_csv_file<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<(), FeatureError> {
    let file = File::create(path)?;
    write_csv(frame, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_raw_csv_na_tokens() {
        let data = "Price($),Bedrooms,Utilities\n2000,2,NaN\n1500,,Hydro_No,Heat_Yes,Water_Yes\n";
        // Second record has too many fields unless quoted
        assert!(read_raw_csv(data.as_bytes()).is_err());

        let data = "Price($),Bedrooms,Utilities\n2000,2,NaN\n1500,,\"Hydro_No,Heat_Yes,Water_Yes\"\n";
        let frame = read_raw_csv(data.as_bytes()).unwrap();

        assert_eq!(frame.n_rows(), 2);
        let bedrooms = frame.text("Bedrooms").unwrap();
        assert_eq!(bedrooms[0].as_deref(), Some("2"));
        assert_eq!(bedrooms[1], None);
        let utilities = frame.text("Utilities").unwrap();
        assert_eq!(utilities[0], None);
        assert_eq!(
            utilities[1].as_deref(),
            Some("Hydro_No,Heat_Yes,Water_Yes")
        );
    }

    #[test]
    fn test_read_raw_csv_unnamed_index() {
        let data = ",Price($)\n0,2000\n1,2100\n";
        let frame = read_raw_csv(data.as_bytes()).unwrap();
        assert!(frame.contains("Unnamed: 0"));
    }

    #[test]
    fn test_write_csv_missing_as_empty() {
        let frame = Frame::from_columns([
            ("a", Column::Numeric(vec![1.5, f64::NAN])),
            ("b", Column::Text(vec![Some("x".to_string()), None])),
        ])
        .unwrap();

        let mut buf = Vec::new();
        write_csv(&frame, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert_eq!(out, "a,b\n1.5,x\n,\n");
    }

    #[test]
    fn test_csv_file_roundtrip_shape() {
        let frame = Frame::from_columns([("a", Column::Numeric(vec![1.0, 2.0]))]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.csv");

        write_csv_file(&frame, &path).unwrap();
        let loaded = load_raw_csv(&path).unwrap();

        assert_eq!(loaded.n_rows(), 2);
        assert_eq!(loaded.text("a").unwrap()[1].as_deref(), Some("2"));
    }
}
