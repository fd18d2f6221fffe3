//! Facet-grid plans: one small line plot per country

use gst_io::YearTable;
use serde::{Deserialize, Serialize};

use crate::config::{FigureStyle, NameTables};
use crate::export::{ExportFormat, PlotPlan};

/// Panels per row
pub const COL_WRAP: usize = 4;

/// Maximum relative spread of per-country ranges for a shared y-axis
const SHARE_Y_THRESHOLD: f64 = 8.0;

/// Whether all panels can share one y-axis
///
/// Compares the smallest and largest per-country range (max - min over
/// the years). Tables with no finite ranges, or a zero smallest range, do
/// not share.
pub fn share_y_axis(table: &YearTable) -> bool {
    let ranges: Vec<f64> = table
        .rows()
        .filter_map(|(_, row)| {
            let finite = row.iter().copied().filter(|v| v.is_finite());
            let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            (lo <= hi).then_some(hi - lo)
        })
        .collect();

    let smallest = ranges.iter().copied().fold(f64::INFINITY, f64::min);
    let largest = ranges.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let check = (largest - smallest) / smallest;
    check.is_finite() && check.abs() < SHARE_Y_THRESHOLD
}

/// One point in long format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRecord {
    pub country: String,
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetGridPlan {
    pub title: String,
    /// Name of the plotted quantity, e.g. `"emissions"`
    pub value_name: String,
    pub share_y: bool,
    pub col_wrap: usize,
    /// Panel titles, in table order
    pub panels: Vec<String>,
    pub records: Vec<FacetRecord>,
    pub style: FigureStyle,
    pub file_name: String,
}

impl FacetGridPlan {
    pub fn build(
        table: &YearTable,
        value_name: &str,
        title: &str,
        plot_name: &str,
        names: &NameTables,
        format: ExportFormat,
    ) -> Self {
        let share_y = share_y_axis(table);
        tracing::debug!("facet grid for {} countries, share_y = {}", table.num_countries(), share_y);

        let mut panels = Vec::with_capacity(table.num_countries());
        let mut records = Vec::with_capacity(table.num_countries() * table.num_years());
        for (code, row) in table.rows() {
            let country = names.country_name(code).to_string();
            records.extend(table.years().iter().zip(row).map(|(&year, &value)| FacetRecord {
                country: country.clone(),
                year,
                value,
            }));
            panels.push(country);
        }

        Self {
            title: title.to_string(),
            value_name: value_name.to_string(),
            share_y,
            col_wrap: COL_WRAP,
            panels,
            records,
            style: FigureStyle::default(),
            file_name: format!("facetgrid-{}-{}.{}", plot_name, value_name, format.extension()),
        }
    }

    pub fn with_style(mut self, style: FigureStyle) -> Self {
        self.style = style;
        self
    }
}

impl PlotPlan for FacetGridPlan {
    fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<f64>>) -> YearTable {
        let countries = (0..rows.len()).map(|i| format!("C{}", i)).collect();
        YearTable::new(countries, vec![2000, 2001, 2002], rows).unwrap()
    }

    #[test]
    fn test_share_y_similar_ranges() {
        let t = table(vec![vec![0.0, 5.0, 10.0], vec![100.0, 120.0, 110.0]]);
        // ranges 10 and 20
        assert!(share_y_axis(&t));
    }

    #[test]
    fn test_share_y_spread_ranges() {
        let t = table(vec![vec![0.0, 1.0, 1.0], vec![0.0, 50.0, 10.0]]);
        // ranges 1 and 50
        assert!(!share_y_axis(&t));
    }

    #[test]
    fn test_share_y_flat_country() {
        let t = table(vec![vec![3.0, 3.0, 3.0], vec![0.0, 5.0, 10.0]]);
        assert!(!share_y_axis(&t));
    }

    #[test]
    fn test_build_long_format() {
        let t = table(vec![vec![1.0, 2.0, 3.0], vec![4.0, f64::NAN, 6.0]]);
        let plan = FacetGridPlan::build(
            &t,
            "emissions",
            "Emissions since 2000",
            "GHG",
            &NameTables::default(),
            ExportFormat::Pdf,
        );

        assert_eq!(plan.panels, vec!["C0", "C1"]);
        assert_eq!(plan.records.len(), 6);
        assert_eq!(
            plan.records[3],
            FacetRecord {
                country: "C1".to_string(),
                year: 2000,
                value: 4.0
            }
        );
        assert_eq!(plan.col_wrap, 4);
        assert_eq!(plan.file_name, "facetgrid-GHG-emissions.pdf");
    }
}
