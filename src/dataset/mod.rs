//! Listing tables and their on-disk formats.
//!
//! A [`Frame`] holds a batch of listings as named columns. Raw scraped data is
//! loaded with every column as text ([`load_raw_csv`]); the pipelines convert
//! columns to numbers as they derive features.
//!
//! # Example
//!
//! ```no_run
//! use toronto_rent_features::dataset::load_raw_csv;
//!
//! let raw = load_raw_csv("data/Toronto_rental_location.csv").unwrap();
//! println!("{} listings, {} raw columns", raw.n_rows(), raw.n_columns());
//! ```

pub mod frame;
pub mod io;

pub use self::frame::{Column, Frame};
pub use self::io::{load_raw_csv, read_raw_csv, write_csv, write_csv_file, NA_TOKENS};
