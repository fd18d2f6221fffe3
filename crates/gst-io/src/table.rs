//! Country x year tables
//!
//! Every dataset is reshaped into a [`YearTable`]: rows are countries (or
//! regions), columns are years in ascending order, and missing cells are
//! `NaN`. The variable name and unit travel with the table.

use crate::reader::{FormatError, IoError, IoResult};
use crate::schema::RawTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Column names required by [`verify_data_format`]
pub const REQUIRED_COLUMNS: [&str; 3] = ["variable", "unit", "country"];

/// Check that a dataset follows the common format
///
/// The data must contain exactly one variable and one unit, each country
/// at most once, and at least one year column.
pub fn verify_data_format(raw: &RawTable) -> Result<(), FormatError> {
    let result = check_format(raw);
    if let Err(e) = &result {
        tracing::warn!("Dataset failed format check: {}", e);
    }
    result
}

fn check_format(raw: &RawTable) -> Result<(), FormatError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !raw.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FormatError::MissingColumns(missing));
    }

    let variables = raw.unique_values("variable").unwrap_or_default();
    if variables.len() != 1 {
        return Err(FormatError::NonUniqueVariable(variables.len()));
    }

    let units = raw.unique_values("unit").unwrap_or_default();
    if units.len() != 1 {
        return Err(FormatError::NonUniqueUnit(units.len()));
    }

    let repeated = repeated_values(&raw.column_values("country").unwrap_or_default());
    if !repeated.is_empty() {
        return Err(FormatError::RepeatedCountries(repeated));
    }

    if raw.year_columns().is_empty() {
        return Err(FormatError::NoYearColumns);
    }

    Ok(())
}

fn repeated_values(values: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut repeated = BTreeSet::new();
    for v in values {
        if !seen.insert(*v) {
            repeated.insert(v.to_string());
        }
    }
    repeated.into_iter().collect()
}

fn parse_cell(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(f64::NAN)
}

/// The values of one year across countries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSeries {
    /// Display label, usually the year
    pub label: String,
    pub unit: Option<String>,
    pub countries: Vec<String>,
    pub values: Vec<f64>,
}

impl YearSeries {
    /// Value for a country
    pub fn get(&self, country: &str) -> Option<f64> {
        self.countries
            .iter()
            .position(|c| c == country)
            .map(|i| self.values[i])
    }

    /// (country, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.countries
            .iter()
            .map(|c| c.as_str())
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A dataset with one row per country and one column per year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTable {
    pub variable: Option<String>,
    pub unit: Option<String>,
    countries: Vec<String>,
    years: Vec<i32>,
    /// Row-major, `values[country][year]`
    values: Vec<Vec<f64>>,
}

impl YearTable {
    /// Create a table; `years` must be ascending and rows must match its length
    pub fn new(countries: Vec<String>, years: Vec<i32>, values: Vec<Vec<f64>>) -> IoResult<Self> {
        if countries.len() != values.len() {
            return Err(IoError::ShapeMismatch {
                expected: countries.len(),
                actual: values.len(),
            });
        }
        if let Some(row) = values.iter().find(|row| row.len() != years.len()) {
            return Err(IoError::ShapeMismatch {
                expected: years.len(),
                actual: row.len(),
            });
        }
        if years.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IoError::InvalidFormat(
                "year columns must be unique and ascending".to_string(),
            ));
        }

        Ok(Self {
            variable: None,
            unit: None,
            countries,
            years,
            values,
        })
    }

    /// Set the variable name
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Reshape a raw table, indexing rows by `index_column`
    ///
    /// `Y1990` headers are normalised, year columns are sorted and every
    /// other column except `variable` and `unit` is dropped.
    pub fn from_raw(raw: &RawTable, index_column: &str) -> IoResult<Self> {
        Self::from_raw_filtered(raw, index_column, &[])
    }

    /// Like [`YearTable::from_raw`], keeping only rows whose metadata
    /// columns equal the given values
    pub fn from_raw_filtered(
        raw: &RawTable,
        index_column: &str,
        filters: &[(&str, &str)],
    ) -> IoResult<Self> {
        let mut raw = raw.clone();
        raw.normalize_year_headers();

        let index = raw
            .column_index(index_column)
            .ok_or_else(|| IoError::ColumnNotFound(index_column.to_string()))?;

        let filter_indices = filters
            .iter()
            .map(|(column, value)| {
                raw.column_index(column)
                    .map(|i| (i, *value))
                    .ok_or_else(|| IoError::ColumnNotFound(column.to_string()))
            })
            .collect::<IoResult<Vec<_>>>()?;

        let rows: Vec<&Vec<String>> = raw
            .rows
            .iter()
            .filter(|row| filter_indices.iter().all(|(i, v)| row[*i] == *v))
            .collect();

        let year_columns = raw.year_columns();
        if year_columns.windows(2).any(|w| w[0].1 == w[1].1) {
            return Err(IoError::InvalidFormat("duplicate year columns".to_string()));
        }

        let countries: Vec<String> = rows.iter().map(|row| row[index].clone()).collect();
        let repeated = repeated_values(&countries.iter().map(|c| c.as_str()).collect::<Vec<_>>());
        if !repeated.is_empty() {
            return Err(FormatError::RepeatedCountries(repeated).into());
        }

        let values = rows
            .iter()
            .map(|row| year_columns.iter().map(|&(i, _)| parse_cell(&row[i])).collect())
            .collect();
        let years = year_columns.iter().map(|&(_, y)| y).collect();

        let unique = |column: &str| -> Option<String> {
            let i = raw.column_index(column)?;
            let set: BTreeSet<&str> = rows.iter().map(|row| row[i].as_str()).collect();
            if set.len() == 1 {
                set.into_iter().next().map(|s| s.to_string())
            } else {
                None
            }
        };

        let mut table = Self::new(countries, years, values)?;
        table.variable = unique("variable");
        table.unit = unique("unit");
        Ok(table)
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    pub fn num_countries(&self) -> usize {
        self.countries.len()
    }

    pub fn num_years(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() || self.years.is_empty()
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.year_index(year).is_some()
    }

    fn year_index(&self, year: i32) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    fn country_index(&self, country: &str) -> Option<usize> {
        self.countries.iter().position(|c| c == country)
    }

    /// All years for one country
    pub fn row(&self, country: &str) -> Option<&[f64]> {
        self.country_index(country).map(|i| self.values[i].as_slice())
    }

    /// Iterate over (country, row) pairs
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.countries
            .iter()
            .map(|c| c.as_str())
            .zip(self.values.iter().map(|r| r.as_slice()))
    }

    pub fn value(&self, country: &str, year: i32) -> Option<f64> {
        let row = self.country_index(country)?;
        let col = self.year_index(year)?;
        Some(self.values[row][col])
    }

    /// All countries for one year
    pub fn column(&self, year: i32) -> Option<Vec<f64>> {
        let col = self.year_index(year)?;
        Some(self.values.iter().map(|row| row[col]).collect())
    }

    /// One year as a labelled series
    pub fn series(&self, year: i32) -> IoResult<YearSeries> {
        let values = self.column(year).ok_or(IoError::YearNotFound(year))?;
        Ok(YearSeries {
            label: year.to_string(),
            unit: self.unit.clone(),
            countries: self.countries.clone(),
            values,
        })
    }

    /// Apply `f` to every row, producing a table with the same shape
    pub fn map_rows(&self, mut f: impl FnMut(&[f64]) -> Vec<f64>) -> Self {
        let values = self
            .values
            .iter()
            .map(|row| {
                let mapped = f(row);
                debug_assert_eq!(mapped.len(), row.len());
                mapped
            })
            .collect();
        Self {
            values,
            ..self.clone()
        }
    }

    /// Multiply every value by `factor` and relabel the unit
    pub fn scale(&self, factor: f64, unit: impl Into<String>) -> Self {
        let mut scaled = self.map_rows(|row| row.iter().map(|v| v * factor).collect());
        scaled.unit = Some(unit.into());
        scaled
    }

    /// Drop years before `new_start_year`
    ///
    /// If the data already starts later, it is returned unchanged.
    pub fn change_first_year(&self, new_start_year: i32) -> Self {
        let (Some(first), Some(last)) = (self.first_year(), self.last_year()) else {
            return self.clone();
        };

        if first > new_start_year {
            tracing::info!("First year of data available is {}", first);
            tracing::info!("Last year of data available is {}", last);
            return self.clone();
        }

        let keep: Vec<i32> = self
            .years
            .iter()
            .copied()
            .filter(|&y| y >= new_start_year)
            .collect();
        tracing::info!("First year of data available is now {}", new_start_year);
        tracing::info!("Last year of data available is {}", last);
        self.select_years(&keep)
    }

    /// Keep only the given years (which must exist in the table), in ascending order
    fn select_years(&self, years: &[i32]) -> Self {
        let cols: Vec<usize> = years.iter().filter_map(|&y| self.year_index(y)).collect();
        let values = self
            .values
            .iter()
            .map(|row| cols.iter().map(|&c| row[c]).collect())
            .collect();
        Self {
            years: cols.iter().map(|&c| self.years[c]).collect(),
            values,
            ..self.clone()
        }
    }

    /// Keep only countries in `keep`, preserving order
    pub fn retain_countries<S: AsRef<str>>(&self, keep: &[S]) -> Self {
        let keep: HashSet<&str> = keep.iter().map(|s| s.as_ref()).collect();
        let (countries, values) = self
            .countries
            .iter()
            .zip(&self.values)
            .filter(|(c, _)| keep.contains(c.as_str()))
            .map(|(c, v)| (c.clone(), v.clone()))
            .unzip();
        Self {
            countries,
            values,
            ..self.clone()
        }
    }
}

/// Remove any years that are not in both tables
pub fn ensure_common_years(a: &YearTable, b: &YearTable) -> (YearTable, YearTable) {
    let b_years: HashSet<i32> = b.years.iter().copied().collect();
    let common: Vec<i32> = a
        .years
        .iter()
        .copied()
        .filter(|y| b_years.contains(y))
        .collect();
    (a.select_years(&common), b.select_years(&common))
}

/// Remove any countries that are not in both tables
pub fn ensure_common_countries(a: &YearTable, b: &YearTable) -> (YearTable, YearTable) {
    let a_set: HashSet<&str> = a.countries.iter().map(|c| c.as_str()).collect();
    let b_set: HashSet<&str> = b.countries.iter().map(|c| c.as_str()).collect();
    let common: Vec<&str> = a_set.intersection(&b_set).copied().collect();

    let mut dropped: Vec<&str> = a_set.symmetric_difference(&b_set).copied().collect();
    dropped.sort_unstable();
    tracing::info!("{} common countries", common.len());
    if !dropped.is_empty() {
        tracing::info!("Countries not found in both datasets: {:?}", dropped);
    }

    (a.retain_countries(&common), b.retain_countries(&common))
}

/// Index of countries to their row in a table
pub fn country_lookup(table: &YearTable) -> HashMap<&str, usize> {
    table
        .countries
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect()
}
