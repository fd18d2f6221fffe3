//! Table reader trait and common types
//!
//! The `TableReader` trait provides a uniform interface for reading
//! tabular datasets from the supported file formats.

use crate::schema::RawTable;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading datasets
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Cannot open {0}")]
    OpenFailed(String),

    #[error("Unreadable table: {0}")]
    InvalidFormat(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Year not available: {0}")]
    YearNotFound(i32),

    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Ways in which a dataset can fail the common-format check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("The \"variable\" column is non-unique ({0} values)")]
    NonUniqueVariable(usize),

    #[error("The \"unit\" column is non-unique ({0} values)")]
    NonUniqueUnit(usize),

    #[error("Countries appear more than once: {}", .0.join(", "))]
    RepeatedCountries(Vec<String>),

    #[error("No year columns found")]
    NoYearColumns,
}

/// Result alias for dataset reading
pub type IoResult<T> = Result<T, IoError>;

/// Something that yields a raw table
pub trait TableReader {
    /// Read the whole table as header + string records
    fn read_raw(&self) -> IoResult<RawTable>;

    /// Path of the underlying file
    fn path(&self) -> Option<&str> {
        None
    }

    /// Short name of the file format
    fn format_name(&self) -> &'static str;
}

/// Reader chosen at runtime from the file extension
pub type BoxedReader = Box<dyn TableReader>;

/// Pick a reader for `path`
///
/// Only delimited text is supported.
pub fn open_file(path: impl AsRef<Path>) -> IoResult<BoxedReader> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            use crate::csv_reader::CsvReader;
            Ok(Box::new(CsvReader::open(path)?))
        }

        "tsv" => {
            use crate::csv_reader::{CsvOptions, CsvReader};
            let options = CsvOptions {
                delimiter: b'\t',
                ..CsvOptions::default()
            };
            Ok(Box::new(CsvReader::open_with_options(path, options)?))
        }

        _ => Err(IoError::InvalidFormat(format!(
            "Unknown file extension: {}",
            extension
        ))),
    }
}

/// Extensions understood by [`open_file`]
pub fn supported_extensions() -> Vec<&'static str> {
    vec!["csv", "tsv"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        let extensions = supported_extensions();
        assert!(extensions.contains(&"csv"));
    }

    #[test]
    fn test_open_unknown_extension() {
        let err = open_file("data.xlsx").err().unwrap();
        assert!(matches!(err, IoError::InvalidFormat(_)));
    }

    #[test]
    fn test_format_error_messages() {
        let err = FormatError::MissingColumns(vec!["unit".into(), "country".into()]);
        assert_eq!(err.to_string(), "Missing columns: unit, country");
    }
}
