//! Raw tables and the year-column convention
//!
//! Datasets mix metadata columns (`country`, `unit`, `entity`, ...) with
//! one column per year. A column is a year column when its header is four
//! to seven digits; headers written as `Y1990` are renamed to `1990`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

lazy_static! {
    static ref YEAR_COLUMN: Regex = Regex::new(r"^[0-9]{4,7}$").unwrap();
    static ref PREFIXED_YEAR: Regex = Regex::new(r"^Y([0-9]{4})$").unwrap();
}

/// Whether a header names a year column
pub fn is_year_column(header: &str) -> bool {
    YEAR_COLUMN.is_match(header)
}

/// Parse a year column header
pub fn parse_year(header: &str) -> Option<i32> {
    if is_year_column(header) {
        header.parse().ok()
    } else {
        None
    }
}

/// Rename `Y1990`-style headers to `1990`; other headers are returned as is
pub fn normalize_year_header(header: &str) -> String {
    match PREFIXED_YEAR.captures(header) {
        Some(caps) => caps[1].to_string(),
        None => header.to_string(),
    }
}

/// Role of a column in a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Year(i32),
    Metadata,
}

impl ColumnRole {
    pub fn of(header: &str) -> Self {
        parse_year(header).map_or(ColumnRole::Metadata, ColumnRole::Year)
    }
}

/// A table as read from disk: headers plus string records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a raw table; short rows are padded with empty cells
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Rename `Y1990`-style headers in place
    pub fn normalize_year_headers(&mut self) {
        for header in &mut self.headers {
            *header = normalize_year_header(header);
        }
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of a column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Distinct cells of a column
    pub fn unique_values(&self, name: &str) -> Option<BTreeSet<&str>> {
        Some(self.column_values(name)?.into_iter().collect())
    }

    /// Year columns as (index, year), sorted by year
    pub fn year_columns(&self) -> Vec<(usize, i32)> {
        let mut years: Vec<(usize, i32)> = self
            .headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| parse_year(h).map(|y| (i, y)))
            .collect();
        years.sort_by_key(|&(_, y)| y);
        years
    }

    /// Names of the non-year columns, in header order
    pub fn metadata_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| ColumnRole::of(h) == ColumnRole::Metadata)
            .map(|h| h.as_str())
            .collect()
    }

    /// Number of records
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}
