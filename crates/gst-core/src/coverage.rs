//! NDC coverage overview: which gas/sector pairs each country's NDC covers

use gst_io::{CoverageMatrix, NdcCoverage};
use serde::{Deserialize, Serialize};

use crate::config::FigureStyle;
use crate::export::{ExportFormat, PlotPlan};

/// A gas by sector grid of coverage shares plus the per-country matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdcCoveragePlan {
    /// Whether missing information was counted as covered
    pub optimistic: bool,
    pub gases: Vec<String>,
    pub sectors: Vec<String>,
    /// `share[gas][sector]`, the fraction of countries covering the pair;
    /// `NaN` where the dataset has no such column
    pub share: Vec<Vec<f64>>,
    pub matrix: CoverageMatrix,
    pub title: String,
    pub style: FigureStyle,
    pub file_name: String,
}

impl NdcCoveragePlan {
    pub fn build(coverage: &NdcCoverage, optimistic: bool, format: ExportFormat) -> Self {
        let matrix = coverage.coverage_matrix(optimistic);
        let gases: Vec<String> = matrix.gases().into_iter().map(String::from).collect();
        let sectors: Vec<String> = matrix.sectors().into_iter().map(String::from).collect();

        let shares = matrix.share_covered();
        let mut share = vec![vec![f64::NAN; sectors.len()]; gases.len()];
        for (combination, value) in matrix.combinations.iter().zip(shares) {
            let g = gases.iter().position(|g| *g == combination.gas);
            let s = sectors.iter().position(|s| *s == combination.sector);
            if let (Some(g), Some(s)) = (g, s) {
                share[g][s] = value;
            }
        }

        let reading = if optimistic { "optimistic" } else { "pessimistic" };
        tracing::debug!(
            countries = matrix.countries.len(),
            reading,
            "NDC coverage plan"
        );

        Self {
            optimistic,
            title: format!(
                "NDC coverage by gas and sector (no information counted as {})",
                if optimistic { "covered" } else { "not covered" }
            ),
            file_name: format!("ndc_coverage-{}.{}", reading, format.extension()),
            gases,
            sectors,
            share,
            matrix,
            style: FigureStyle::default(),
        }
    }

    pub fn with_style(mut self, style: FigureStyle) -> Self {
        self.style = style;
        self
    }
}

impl PlotPlan for NdcCoveragePlan {
    fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gst_io::RawTable;

    fn coverage() -> NdcCoverage {
        let raw = RawTable::new(
            vec![
                "ISO3".to_string(),
                "CO2 Energy".to_string(),
                "CH4 Energy".to_string(),
                "CO2 Waste".to_string(),
            ],
            vec![
                vec!["EGY".into(), "Covered".into(), "NoInformation".into(), "Covered".into()],
                vec!["CHL".into(), "Covered".into(), "NotCovered".into(), "NoInformation".into()],
            ],
        );
        NdcCoverage::from_raw(&raw).unwrap()
    }

    #[test]
    fn test_share_grid() {
        let plan = NdcCoveragePlan::build(&coverage(), false, ExportFormat::Png);

        assert_eq!(plan.gases, vec!["CO2", "CH4"]);
        assert_eq!(plan.sectors, vec!["Energy", "Waste"]);
        assert_eq!(plan.share[0], vec![1.0, 0.5]);
        assert_eq!(plan.share[1][0], 0.0);
        // no CH4 Waste column
        assert!(plan.share[1][1].is_nan());
        assert_eq!(plan.file_name, "ndc_coverage-pessimistic.png");
    }

    #[test]
    fn test_optimistic_reading() {
        let plan = NdcCoveragePlan::build(&coverage(), true, ExportFormat::Svg);
        assert_eq!(plan.share[0], vec![1.0, 1.0]);
        assert_eq!(plan.share[1][0], 0.5);
        assert!(plan.title.ends_with("counted as covered)"));
        assert_eq!(plan.file_name, "ndc_coverage-optimistic.svg");
    }
}
