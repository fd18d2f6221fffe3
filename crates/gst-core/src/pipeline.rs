//! The standard stocktake plots driven by configuration
//!
//! `load` reads the configured dataset, optionally as an intensity. Each
//! plot type then starts from that country x year table, derives the
//! quantity to show and builds its plan. `export` writes a plan to the
//! configured plots folder.

use std::path::PathBuf;

use gst_io::{DataLoader, PrimapSelection, YearTable};
use serde::{Deserialize, Serialize};

use crate::config::{DataType, Dataset, GstConfig};
use crate::coverage::NdcCoveragePlan;
use crate::error::{GstError, GstResult};
use crate::export::{export_plan, plots_dir, PlotPlan};
use crate::facet::FacetGridPlan;
use crate::histogram::{HistogramPlan, HistogramRequest, PeakingPlan};
use crate::trends::{calculate_trends, diff_since_year, intensity, peaking_years, PERCENT};

/// The kind of figure to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    /// Values in the year of interest
    Distribution,
    /// Percentage change from the baseline year to the year of interest
    ChangeSinceBaseline,
    /// Rolling average of annual percentage change in the year of interest
    Trend,
    /// Year in which each country peaked
    Peaking,
}

/// A dataset ready for plotting
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table: YearTable,
    /// Variable label for titles, e.g. `"GHG per capita"`
    pub variable: String,
    /// Name for file names, e.g. `"Kyoto_GHGs_AR4_energy"`
    pub plot_name: String,
}

/// Builds plot plans from tables using one configuration
#[derive(Debug, Clone)]
pub struct Stocktake {
    config: GstConfig,
}

impl Stocktake {
    /// Create a pipeline; the configuration is validated first
    pub fn new(config: GstConfig) -> GstResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GstConfig {
        &self.config
    }

    fn loader(&self) -> DataLoader {
        DataLoader::new(self.config.data.clone())
    }

    /// Read the configured dataset and apply the configured data type
    pub fn load(&self) -> GstResult<LoadedTable> {
        let loader = self.loader();
        let names = &self.config.names;

        let mut loaded = match &self.config.dataset {
            Dataset::Table { path } => {
                let table = loader.load_table(path)?;
                let plot_name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "table".to_string());
                LoadedTable {
                    variable: table.variable.clone().unwrap_or_else(|| "value".to_string()),
                    table,
                    plot_name,
                }
            }
            Dataset::Primap {
                scenario,
                gas,
                sector,
            } => {
                let table = loader.load_primap(&PrimapSelection {
                    scenario: scenario.clone(),
                    entity: gas.clone(),
                    category: sector.clone(),
                })?;
                let plot_name = names.primap_file_stem(gas, sector).unwrap_or_else(|| {
                    tracing::warn!("No file name known for {} in sector {}", gas, sector);
                    format!("{}_{}", gas, sector)
                });
                LoadedTable {
                    table,
                    variable: names.variable_name(gas).to_string(),
                    plot_name,
                }
            }
            Dataset::Population => LoadedTable {
                table: loader.load_population()?,
                variable: "Population".to_string(),
                plot_name: "population".to_string(),
            },
            Dataset::Gdp => LoadedTable {
                table: loader.load_gdp()?,
                variable: "GDP".to_string(),
                plot_name: "GDP".to_string(),
            },
        };

        let data_type = self.config.analysis.data_type;
        let denominator = match data_type {
            DataType::Absolute => None,
            DataType::PerCapita => Some(loader.load_population()?),
            DataType::PerUsd => Some(loader.load_gdp()?),
        };
        if let Some(denominator) = denominator {
            tracing::info!("Converting {} to{}", loaded.variable, data_type.label_suffix());
            loaded.table = intensity(&loaded.table, &denominator)?;
            loaded.variable.push_str(data_type.label_suffix());
            loaded.plot_name.push_str(data_type.file_suffix());
        }
        Ok(loaded)
    }

    /// Restrict a table to the configured countries, if any
    pub fn select(&self, table: &YearTable) -> YearTable {
        match &self.config.analysis.countries {
            Some(countries) => {
                tracing::info!("Restricting to {} selected countries", countries.len());
                table.retain_countries(countries.as_slice())
            }
            None => table.clone(),
        }
    }

    fn request(&self, variable: String, unit: String) -> HistogramRequest {
        let mut request = HistogramRequest::new(variable, unit)
            .with_options(self.config.histogram.binning_options())
            .with_stats_policy(self.config.histogram.stats_policy)
            .with_format(self.config.plot.file_type)
            .with_style(self.config.plot.figure(false));
        if let Some(country) = &self.config.analysis.country_to_highlight {
            request = request.with_highlight(country.clone());
        }
        request
    }

    fn histogram(&self, table: &YearTable, variable: String, unit: String) -> GstResult<HistogramPlan> {
        let year = self.config.analysis.year_of_interest;
        let series = table.series(year).map_err(|_| GstError::YearNotFound(year))?;
        HistogramPlan::build(&series, &self.request(variable, unit), &self.config.names)
    }

    /// Distribution of `variable` across countries in the year of interest
    pub fn distribution_plan(&self, table: &YearTable, variable: &str) -> GstResult<HistogramPlan> {
        let table = self.select(table);
        let unit = table.unit.clone().unwrap_or_default();
        self.histogram(&table, variable.to_string(), unit)
    }

    /// Percentage change since the baseline year
    pub fn change_plan(&self, table: &YearTable, variable: &str) -> GstResult<HistogramPlan> {
        let baseline = self.config.analysis.baseline_year;
        let diff = diff_since_year(&self.select(table), baseline)?;
        self.histogram(
            &diff.percent,
            format!("Change in {} since {}", variable, baseline),
            PERCENT.to_string(),
        )
    }

    /// Average annual percentage change over the configured window
    pub fn trend_plan(&self, table: &YearTable, variable: &str) -> GstResult<HistogramPlan> {
        let window = self.config.analysis.trend_years;
        let trends = calculate_trends(&self.select(table), window)?;
        self.histogram(
            &trends.rolling_average,
            format!("{}-year average trend in {}", window, variable),
            PERCENT.to_string(),
        )
    }

    /// Year of peaking since the configured start year
    pub fn peaking_plan(&self, table: &YearTable, variable: &str) -> GstResult<PeakingPlan> {
        let table = self.select(table);
        let start = self.config.analysis.peaking_start_year;
        let end = table
            .last_year()
            .ok_or_else(|| GstError::InvalidConfig("table has no year columns".to_string()))?;

        let peaks = peaking_years(&table, start);
        Ok(
            PeakingPlan::build(&peaks, variable, start, end, self.config.plot.file_type)?
                .with_style(self.config.plot.figure(true)),
        )
    }

    /// One line plot per country
    pub fn facet_plan(&self, table: &YearTable, variable: &str, plot_name: &str) -> FacetGridPlan {
        let table = self.select(table);
        let title = match table.first_year() {
            Some(first) => format!("{} since {}", variable, first),
            None => variable.to_string(),
        };
        FacetGridPlan::build(
            &table,
            variable,
            &title,
            plot_name,
            &self.config.names,
            self.config.plot.file_type,
        )
        .with_style(self.config.plot.figure(false))
    }

    /// Gas by sector overview of NDC coverage
    pub fn ndc_plan(&self, optimistic: bool) -> GstResult<NdcCoveragePlan> {
        let coverage = self.loader().load_ndc_coverage()?;
        Ok(
            NdcCoveragePlan::build(&coverage, optimistic, self.config.plot.file_type)
                .with_style(self.config.plot.figure(false)),
        )
    }

    /// Build the histogram plan for one of the standard plot kinds and
    /// write it out
    pub fn run(&self, kind: PlotKind, table: &YearTable, variable: &str) -> GstResult<PathBuf> {
        tracing::info!(?kind, variable, "building plot plan");
        match kind {
            PlotKind::Distribution => self.export(&self.distribution_plan(table, variable)?),
            PlotKind::ChangeSinceBaseline => self.export(&self.change_plan(table, variable)?),
            PlotKind::Trend => self.export(&self.trend_plan(table, variable)?),
            PlotKind::Peaking => self.export(&self.peaking_plan(table, variable)?),
        }
    }

    /// Write a plan into the configured plots folder
    pub fn export<P: PlotPlan>(&self, plan: &P) -> GstResult<PathBuf> {
        export_plan(plan, &plots_dir(&self.config.data.output_folder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> YearTable {
        YearTable::new(
            vec!["AAA".into(), "BBB".into(), "CCC".into(), "DDD".into()],
            vec![1990, 2018, 2019],
            vec![
                vec![100.0, 90.0, 80.0],
                vec![100.0, 110.0, 120.0],
                vec![50.0, 60.0, 40.0],
                vec![10.0, 12.0, 15.0],
            ],
        )
        .unwrap()
        .with_unit("MtCO2eq")
    }

    fn stocktake() -> Stocktake {
        Stocktake::new(GstConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = GstConfig::default();
        config.histogram.tukey_k = 0.0;
        assert!(Stocktake::new(config).is_err());
    }

    #[test]
    fn test_distribution_plan() {
        let plan = stocktake().distribution_plan(&table(), "GHG").unwrap();
        assert_eq!(plan.title, "GHG in 2019");
        assert_eq!(plan.unit, "MtCO2eq");
        assert_eq!(plan.stats.count, 4);
    }

    #[test]
    fn test_change_plan() {
        let plan = stocktake().change_plan(&table(), "GHG").unwrap();
        assert_eq!(plan.variable, "Change in GHG since 1990");
        assert_eq!(plan.x_label, "Change in GHG since 1990 (%)");
        assert_eq!(plan.sign_counts.map(|c| c.below), Some(2));
        assert!(plan.bins.is_symmetric());
    }

    #[test]
    fn test_trend_plan_missing_year() {
        let mut config = GstConfig::default();
        config.analysis.year_of_interest = 2030;
        let err = Stocktake::new(config)
            .unwrap()
            .trend_plan(&table(), "GHG")
            .unwrap_err();
        assert!(matches!(err, GstError::YearNotFound(2030)));
    }

    #[test]
    fn test_country_selection() {
        let mut config = GstConfig::default();
        config.analysis.countries = Some(vec!["AAA".to_string(), "DDD".to_string()]);
        let plan = Stocktake::new(config)
            .unwrap()
            .facet_plan(&table(), "emissions", "GHG");
        assert_eq!(plan.panels, vec!["AAA", "DDD"]);
        assert_eq!(plan.title, "emissions since 1990");
    }

    #[test]
    fn test_plans_carry_style() {
        let mut config = GstConfig::default();
        config.plot.font = "Arial".to_string();
        let stocktake = Stocktake::new(config).unwrap();

        let plan = stocktake.distribution_plan(&table(), "GHG").unwrap();
        assert_eq!(plan.style.dpi, 600);
        assert_eq!(plan.style.font, "Arial");

        let peaking = stocktake.peaking_plan(&table(), "GHG").unwrap();
        assert_eq!(peaking.style.dpi, 450);
        assert_eq!(stocktake.facet_plan(&table(), "GHG", "x").style.font, "Arial");
    }

    #[test]
    fn test_run_exports_plan() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GstConfig::default();
        config.data.output_folder = dir.path().to_path_buf();

        let path = Stocktake::new(config)
            .unwrap()
            .run(PlotKind::Peaking, &table(), "GHG")
            .unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("plots")
                .join("basic_histogram-GHG-peaking-since1990.svg.json")
        );
        assert!(path.exists());
    }
}
