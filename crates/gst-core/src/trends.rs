//! Derived indicators over country x year tables
//!
//! - Annual percentage change and its rolling average (trend)
//! - Absolute and percentage difference relative to a baseline year
//! - Year in which each country's value peaked
//! - Ratios of two datasets, e.g. emissions per capita

use gst_io::{country_lookup, ensure_common_countries, ensure_common_years, YearSeries, YearTable};
use serde::{Deserialize, Serialize};

use crate::error::{GstError, GstResult};

/// Unit label of percentage tables
pub const PERCENT: &str = "%";

/// Annual percentage change and its rolling average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendTables {
    pub percent_change: YearTable,
    pub rolling_average: YearTable,
    /// Number of years averaged
    pub window: usize,
}

/// Difference of every year from a baseline year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffTables {
    pub baseline_year: i32,
    /// Same unit as the input
    pub absolute: YearTable,
    /// Percent of the baseline value
    pub percent: YearTable,
}

/// Annual percentage change, `100 * (x[t] - x[t-1]) / x[t-1]`
///
/// Missing years are first filled with the last known value, so a gap
/// reads as no change and the year after it is compared with the last
/// value before it. The first year, and years before the first known
/// value, are `NaN`.
pub fn percentage_change(table: &YearTable) -> YearTable {
    let mut changed = table.map_rows(|row| {
        let filled = forward_fill(row);
        let mut out = vec![f64::NAN; row.len()];
        for t in 1..filled.len() {
            out[t] = 100.0 * (filled[t] - filled[t - 1]) / filled[t - 1];
        }
        out
    });
    changed.unit = Some(PERCENT.to_string());
    changed
}

/// Replace missing values with the last finite value before them
fn forward_fill(row: &[f64]) -> Vec<f64> {
    let mut last = f64::NAN;
    row.iter()
        .map(|&v| {
            if v.is_finite() {
                last = v;
            }
            last
        })
        .collect()
}

/// Trailing mean over `window` years
///
/// Years before the window is full, or whose window contains a missing
/// value, are `NaN`.
pub fn rolling_mean(table: &YearTable, window: usize) -> GstResult<YearTable> {
    if window == 0 {
        return Err(GstError::InvalidConfig(
            "rolling window must be at least 1 year".to_string(),
        ));
    }

    Ok(table.map_rows(|row| {
        (0..row.len())
            .map(|t| {
                if t + 1 < window {
                    return f64::NAN;
                }
                let span = &row[t + 1 - window..=t];
                span.iter().sum::<f64>() / window as f64
            })
            .collect()
    }))
}

/// Annual percentage change and its average over `window` years
pub fn calculate_trends(table: &YearTable, window: usize) -> GstResult<TrendTables> {
    tracing::info!("Averaging trend over {} years.", window);

    let percent_change = percentage_change(table);
    let rolling_average = rolling_mean(&percent_change, window)?;
    Ok(TrendTables {
        percent_change,
        rolling_average,
        window,
    })
}

/// Absolute and percentage difference of all years relative to `year`
pub fn diff_since_year(table: &YearTable, year: i32) -> GstResult<DiffTables> {
    tracing::info!("Calculating difference compared to {}", year);

    let base = table.column(year).ok_or_else(|| {
        tracing::warn!(
            "The year selected for relative calculations ({}) is not available",
            year
        );
        GstError::YearNotFound(year)
    })?;

    let mut base_iter = base.iter();
    let absolute = table.map_rows(|row| {
        let b = base_iter.next().copied().unwrap_or(f64::NAN);
        row.iter().map(|v| v - b).collect()
    });

    let mut base_iter = base.iter();
    let mut percent = absolute.map_rows(|row| {
        let b = base_iter.next().copied().unwrap_or(f64::NAN);
        row.iter().map(|d| 100.0 * d / b).collect()
    });
    percent.unit = Some(PERCENT.to_string());

    Ok(DiffTables {
        baseline_year: year,
        absolute,
        percent,
    })
}

/// Year of each country's maximum value from `since` onwards
///
/// Ties resolve to the earliest year; countries without data are `NaN`.
pub fn peaking_years(table: &YearTable, since: i32) -> YearSeries {
    let years = table.years();
    let mut countries = Vec::with_capacity(table.num_countries());
    let mut values = Vec::with_capacity(table.num_countries());

    for (country, row) in table.rows() {
        let peak = years
            .iter()
            .zip(row)
            .filter(|&(&y, v)| y >= since && v.is_finite())
            .fold(None, |best: Option<(i32, f64)>, (&y, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((y, v)),
            });

        countries.push(country.to_string());
        values.push(peak.map_or(f64::NAN, |(y, _)| f64::from(y)));
    }

    YearSeries {
        label: format!("since {}", since),
        unit: Some("year".to_string()),
        countries,
        values,
    }
}

/// `numerator / denominator` over the countries and years both tables share
///
/// Rows are matched by country code, so the two tables may list countries
/// in different orders. The unit becomes `"<numerator>/<denominator>"`.
pub fn intensity(numerator: &YearTable, denominator: &YearTable) -> GstResult<YearTable> {
    let (num, den) = ensure_common_years(numerator, denominator);
    let (num, den) = ensure_common_countries(&num, &den);
    if num.num_countries() == 0 || num.num_years() == 0 {
        return Err(GstError::NoCommonData(format!(
            "{} and {}",
            numerator.variable.as_deref().unwrap_or("numerator"),
            denominator.variable.as_deref().unwrap_or("denominator")
        )));
    }

    let lookup = country_lookup(&den);
    let den_rows: Vec<&[f64]> = den.rows().map(|(_, row)| row).collect();
    let mut countries = num.countries().iter();
    let mut ratio = num.map_rows(|row| {
        let divisor = countries
            .next()
            .and_then(|c| lookup.get(c.as_str()))
            .map(|&i| den_rows[i]);
        match divisor {
            Some(d) => row.iter().zip(d).map(|(n, d)| n / d).collect(),
            None => vec![f64::NAN; row.len()],
        }
    });

    ratio.unit = Some(format!(
        "{}/{}",
        num.unit.as_deref().unwrap_or_default(),
        den.unit.as_deref().unwrap_or_default()
    ));
    Ok(ratio)
}
