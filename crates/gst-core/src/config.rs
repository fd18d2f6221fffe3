//! Configuration for gst
//!
//! Dataset locations and the dataset to analyse, the name tables used to
//! build file names and variable labels, the analysis years, the histogram
//! settings and the plot style.
//!
//! ```toml
//! [dataset]
//! source = "primap"
//! gas = "CO2"
//! sector = "1"
//!
//! [analysis]
//! year_of_interest = 2019
//! baseline_year = 1990
//! country_to_highlight = "EGY"
//!
//! [histogram]
//! remove_outliers = true
//! tukey_k = 3.0
//! stats_policy = "filtered"
//!
//! [plot]
//! file_type = "svg"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gst_io::DataSources;
use gst_stats::{BinningOptions, StatsPolicy, DEFAULT_TUKEY_K};
use serde::{Deserialize, Serialize};

use crate::error::{GstError, GstResult};
use crate::export::ExportFormat;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GstConfig {
    /// Dataset folders and file names
    pub data: DataSources,
    /// The dataset to analyse
    pub dataset: Dataset,
    /// Lookup tables for file names and labels
    pub names: NameTables,
    /// Years and countries to analyse
    pub analysis: AnalysisConfig,
    /// Binning and summary statistics
    pub histogram: HistogramConfig,
    /// Figure style
    pub plot: PlotStyle,
}

impl GstConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> GstResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> GstResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> GstResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> GstResult<()> {
        let k = self.histogram.tukey_k;
        if !(k.is_finite() && k > 0.0) {
            return Err(GstError::InvalidConfig(format!(
                "tukey_k must be positive, got {}",
                k
            )));
        }

        if self.analysis.trend_years == 0 {
            return Err(GstError::InvalidConfig(
                "trend_years must be at least 1".to_string(),
            ));
        }

        if self.analysis.baseline_year >= self.analysis.year_of_interest {
            return Err(GstError::InvalidConfig(format!(
                "baseline_year ({}) must be before year_of_interest ({})",
                self.analysis.baseline_year, self.analysis.year_of_interest
            )));
        }

        if self.plot.dpi == 0 || self.plot.peaking_dpi == 0 {
            return Err(GstError::InvalidConfig("dpi must be positive".to_string()));
        }

        match (&self.dataset, self.analysis.data_type) {
            (Dataset::Population, DataType::PerCapita) | (Dataset::Gdp, DataType::PerUsd) => {
                return Err(GstError::InvalidConfig(format!(
                    "{:?} data cannot be divided by itself",
                    self.dataset
                )));
            }
            _ => {}
        }

        Ok(())
    }
}

/// PRIMAP-hist scenario used unless configured otherwise
pub const DEFAULT_SCENARIO: &str = "HISTCR";
/// PRIMAP-hist gas used unless configured otherwise
pub const DEFAULT_GAS: &str = "KYOTOGHG (AR4GWP100)";
/// PRIMAP-hist sector used unless configured otherwise
pub const DEFAULT_SECTOR: &str = "M.0.EL";

fn default_scenario() -> Option<String> {
    Some(DEFAULT_SCENARIO.to_string())
}

fn default_gas() -> String {
    DEFAULT_GAS.to_string()
}

fn default_sector() -> String {
    DEFAULT_SECTOR.to_string()
}

/// The dataset a run reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Dataset {
    /// A table in the common format
    Table { path: PathBuf },
    /// PRIMAP-hist emissions of one gas in one sector
    Primap {
        #[serde(default = "default_scenario")]
        scenario: Option<String>,
        #[serde(default = "default_gas")]
        gas: String,
        #[serde(default = "default_sector")]
        sector: String,
    },
    /// World Bank total population
    Population,
    /// World Bank GDP
    Gdp,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::Primap {
            scenario: default_scenario(),
            gas: default_gas(),
            sector: default_sector(),
        }
    }
}

/// Whether values are shown as they are or relative to population or GDP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Absolute,
    PerCapita,
    PerUsd,
}

impl DataType {
    /// Suffix for variable labels, e.g. `" per capita"`
    pub fn label_suffix(&self) -> &'static str {
        match self {
            DataType::Absolute => "",
            DataType::PerCapita => " per capita",
            DataType::PerUsd => " per USD",
        }
    }

    /// Suffix for file names
    pub fn file_suffix(&self) -> &'static str {
        match self {
            DataType::Absolute => "",
            DataType::PerCapita => "-per_capita",
            DataType::PerUsd => "-per_USD",
        }
    }
}

/// Years and countries to analyse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Year shown in distribution plots
    pub year_of_interest: i32,
    /// Reference year for "change since" plots
    pub baseline_year: i32,
    /// Window of the averaged trend, in years
    pub trend_years: usize,
    /// First year considered when finding peaking years
    pub peaking_start_year: i32,
    /// ISO3 code of a country to mark on distributions
    pub country_to_highlight: Option<String>,
    /// Restrict the analysis to these ISO3 codes
    pub countries: Option<Vec<String>>,
    /// Absolute values or intensities
    pub data_type: DataType,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            year_of_interest: 2019,
            baseline_year: 1990,
            trend_years: 5,
            peaking_start_year: 1990,
            country_to_highlight: None,
            countries: None,
            data_type: DataType::Absolute,
        }
    }
}

/// Binning and summary statistics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Remove values outside Tukey's fences before binning
    pub remove_outliers: bool,
    /// Tukey fence multiplier
    pub tukey_k: f64,
    /// Which values the annotated statistics describe
    pub stats_policy: StatsPolicy,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            remove_outliers: false,
            tukey_k: DEFAULT_TUKEY_K,
            stats_policy: StatsPolicy::default(),
        }
    }
}

impl HistogramConfig {
    pub fn binning_options(&self) -> BinningOptions {
        BinningOptions {
            remove_outliers: self.remove_outliers,
            k: self.tukey_k,
        }
    }
}

/// Figure style handed through to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    /// Resolution of distribution plots
    pub dpi: u32,
    /// Resolution of peaking-year plots
    pub peaking_dpi: u32,
    pub font: String,
    pub label_font_size: u32,
    pub title_font_size: u32,
    /// Font size of the statistics box and sign counts
    pub stats_font_size: u32,
    /// Output file type
    pub file_type: ExportFormat,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            dpi: 600,
            peaking_dpi: 450,
            font: "Cambria".to_string(),
            label_font_size: 16,
            title_font_size: 16,
            stats_font_size: 15,
            file_type: ExportFormat::Svg,
        }
    }
}

impl PlotStyle {
    /// Style of one figure; peaking-year plots use their own resolution
    pub fn figure(&self, peaking: bool) -> FigureStyle {
        FigureStyle {
            dpi: if peaking { self.peaking_dpi } else { self.dpi },
            font: self.font.clone(),
            label_font_size: self.label_font_size,
            title_font_size: self.title_font_size,
            stats_font_size: self.stats_font_size,
        }
    }
}

/// Style attached to a plot plan for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureStyle {
    pub dpi: u32,
    pub font: String,
    pub label_font_size: u32,
    pub title_font_size: u32,
    pub stats_font_size: u32,
}

impl Default for FigureStyle {
    fn default() -> Self {
        PlotStyle::default().figure(false)
    }
}

/// Lookup tables for file names and labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameTables {
    /// PRIMAP gas -> file name fragment
    pub gas_file_names: BTreeMap<String, String>,
    /// PRIMAP sector code -> file name fragment
    pub sector_file_names: BTreeMap<String, String>,
    /// PRIMAP gas -> variable label
    pub gas_variable_names: BTreeMap<String, String>,
    /// ISO3 code -> display name; codes are shown verbatim when absent
    pub country_names: BTreeMap<String, String>,
}

fn table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for NameTables {
    fn default() -> Self {
        Self {
            gas_file_names: table(&[
                ("CH4", "CH4"),
                ("CO2", "CO2"),
                ("N2O", "N2O"),
                ("HFCS (SARGWP100)", "HFCs_SAR"),
                ("HFCS (AR4GWP100)", "HFCs_AR4"),
                ("PFCS (SARGWP100)", "PFCs_SAR"),
                ("PFCS (AR4GWP100)", "PFCs_AR4"),
                ("SF6", "SF6"),
                ("NF3", "NF3"),
                ("FGASES (SARGWP100)", "F-gases_SAR"),
                ("FGASES (AR4GWP100)", "F-gases_AR4"),
                ("KYOTOGHG (SARGWP100)", "Kyoto_GHGs_SAR"),
                ("KYOTOGHG (AR4GWP100)", "Kyoto_GHGs_AR4"),
            ]),
            sector_file_names: table(&[
                ("M.0.EL", "total_excl_LULUCF"),
                ("1", "energy"),
                ("1.A", "fuel_combustion"),
                ("1.B", "energy_fugitive"),
                ("1.B.1", "energy_fugitive_solid_fuel"),
                ("1.B.2", "energy_fugitive_oil_and_gas"),
                ("1.B.3", "other_fugitive_from_energy_prod"),
                ("1.C", "energy_CO2_transport_and_storage"),
                ("2", "IPPU"),
                ("2.A", "mineral_industry"),
                ("2.B", "chemical_industry"),
                ("2.C", "metals_industry"),
                ("2.D", "industrial_non-energy_products_from_fuels_and_solvents"),
                ("2.E", "electronics_industry"),
                ("2.F", "product_use_substitutes_for_ozone_depl_subs"),
                ("2.G", "industrial_other_product_manufacture_and_use"),
                ("2.H", "other_IPPU"),
                ("M.AG", "agriculture"),
                ("3.A", "livestock"),
                ("M.AG.ELV", "agriculture_excl_livestock"),
                ("4", "waste"),
                ("5", "other"),
            ]),
            gas_variable_names: table(&[
                ("CH4", "CH4"),
                ("CO2", "CO2"),
                ("N2O", "N2O"),
                ("HFCS (SARGWP100)", "HFC"),
                ("HFCS (AR4GWP100)", "HFC"),
                ("PFCS (SARGWP100)", "PFC"),
                ("PFCS (AR4GWP100)", "PFC"),
                ("SF6", "SF6"),
                ("NF3", "NF3"),
                ("FGASES (SARGWP100)", "F-gas"),
                ("FGASES (AR4GWP100)", "F-gas"),
                ("KYOTOGHG (SARGWP100)", "GHG"),
                ("KYOTOGHG (AR4GWP100)", "GHG"),
            ]),
            country_names: BTreeMap::new(),
        }
    }
}

impl NameTables {
    /// Display name for a country code
    pub fn country_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.country_names
            .get(code)
            .map(|s| s.as_str())
            .unwrap_or(code)
    }

    /// Variable label for a PRIMAP gas, falling back to the gas itself
    pub fn variable_name<'a>(&'a self, gas: &'a str) -> &'a str {
        self.gas_variable_names
            .get(gas)
            .map(|s| s.as_str())
            .unwrap_or(gas)
    }

    /// File name stem for a PRIMAP gas and sector, e.g. `Kyoto_GHGs_AR4_energy`
    pub fn primap_file_stem(&self, gas: &str, sector: &str) -> Option<String> {
        let gas = self.gas_file_names.get(gas)?;
        let sector = self.sector_file_names.get(sector)?;
        Some(format!("{}_{}", gas, sector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GstConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_keeps_overrides() {
        let config = GstConfig::from_toml(
            r#"
            [analysis]
            year_of_interest = 2020
            country_to_highlight = "EGY"

            [histogram]
            remove_outliers = true
            stats_policy = "unfiltered"

            [plot]
            file_type = "pdf"

            [names.country_names]
            EGY = "Egypt"
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.year_of_interest, 2020);
        assert_eq!(config.analysis.baseline_year, 1990);
        assert!(config.histogram.remove_outliers);
        assert_eq!(config.histogram.stats_policy, StatsPolicy::Unfiltered);
        assert_eq!(config.plot.file_type, ExportFormat::Pdf);
        assert_eq!(config.names.country_name("EGY"), "Egypt");
        // overriding one name table leaves the defaults of the others
        assert_eq!(config.names.variable_name("KYOTOGHG (AR4GWP100)"), "GHG");

        let text = config.to_toml().unwrap();
        assert_eq!(GstConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GstConfig::default();
        config.histogram.tukey_k = 0.0;
        assert!(matches!(config.validate(), Err(GstError::InvalidConfig(_))));

        let mut config = GstConfig::default();
        config.analysis.trend_years = 0;
        assert!(config.validate().is_err());

        let mut config = GstConfig::default();
        config.analysis.baseline_year = 2019;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gst.toml");
        std::fs::write(&path, "[analysis]\ntrend_years = 10\n").unwrap();

        let config = GstConfig::from_file(&path).unwrap();
        assert_eq!(config.analysis.trend_years, 10);

        assert!(matches!(
            GstConfig::from_file(dir.path().join("missing.toml")),
            Err(GstError::FileSystem(_))
        ));
    }

    #[test]
    fn test_name_tables() {
        let names = NameTables::default();
        assert_eq!(
            names.primap_file_stem("KYOTOGHG (AR4GWP100)", "M.0.EL"),
            Some("Kyoto_GHGs_AR4_total_excl_LULUCF".to_string())
        );
        assert_eq!(names.primap_file_stem("XYZ", "1"), None);
        assert_eq!(names.country_name("COL"), "COL");
    }

    #[test]
    fn test_dataset_selection() {
        let config = GstConfig::from_toml(
            r#"
            [dataset]
            source = "primap"
            gas = "CO2"

            [analysis]
            data_type = "per_capita"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.dataset,
            Dataset::Primap {
                scenario: Some("HISTCR".to_string()),
                gas: "CO2".to_string(),
                sector: "M.0.EL".to_string(),
            }
        );
        assert_eq!(config.analysis.data_type, DataType::PerCapita);

        let config = GstConfig::from_toml("[dataset]\nsource = \"table\"\npath = \"x.csv\"\n").unwrap();
        assert_eq!(
            config.dataset,
            Dataset::Table {
                path: PathBuf::from("x.csv")
            }
        );
        assert_eq!(GstConfig::from_toml(&config.to_toml().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_self_intensity() {
        let mut config = GstConfig::default();
        config.dataset = Dataset::Gdp;
        config.analysis.data_type = DataType::PerUsd;
        assert!(config.validate().is_err());

        config.analysis.data_type = DataType::PerCapita;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_figure_style() {
        let style = PlotStyle::default();
        assert_eq!(style.figure(false).dpi, 600);
        assert_eq!(style.figure(true).dpi, 450);
        assert_eq!(style.figure(true).font, "Cambria");
        assert_eq!(FigureStyle::default().stats_font_size, 15);
    }

    #[test]
    fn test_binning_options_from_config() {
        let config = HistogramConfig {
            remove_outliers: true,
            tukey_k: 1.5,
            ..HistogramConfig::default()
        };
        let options = config.binning_options();
        assert!(options.remove_outliers);
        assert_eq!(options.k, 1.5);
    }
}
