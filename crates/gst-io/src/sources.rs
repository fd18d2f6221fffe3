//! Dataset locations and loaders
//!
//! [`DataSources`] names the folders and files of the raw datasets. A
//! [`DataLoader`] is built from it and knows how each dataset is laid out:
//!
//! - common-format tables (`country`, `variable`, `unit`, years)
//! - PRIMAP-hist emissions, selected by scenario, gas and sector
//! - World Bank indicators (population, GDP) with their preamble lines
//! - NDC gas and sector coverage

use crate::csv_reader::{CsvOptions, CsvReader};
use crate::ndc::NdcCoverage;
use crate::reader::{open_file, IoResult, TableReader};
use crate::schema::RawTable;
use crate::table::{verify_data_format, YearTable};
use crate::units::{convert_emissions, convert_population};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// PRIMAP-hist column holding the ISO3 country code
pub const PRIMAP_AREA_COLUMN: &str = "area (ISO3)";
/// PRIMAP-hist column holding the gas
pub const PRIMAP_ENTITY_COLUMN: &str = "entity";
/// PRIMAP-hist column holding the IPCC 2006 sector code
pub const PRIMAP_CATEGORY_COLUMN: &str = "category (IPCC2006_PRIMAP)";
/// PRIMAP-hist column holding the scenario (HISTCR / HISTTP)
pub const PRIMAP_SCENARIO_COLUMN: &str = "scenario (PRIMAP-hist)";

/// World Bank CSV exports carry four lines before the header
pub const WORLD_BANK_PREAMBLE_LINES: usize = 4;
/// World Bank column holding the ISO3 country code
pub const WORLD_BANK_COUNTRY_COLUMN: &str = "Country Code";

/// Folders and file names of the raw datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSources {
    /// Raw input data
    pub input_folder: PathBuf,
    /// Processed data
    pub proc_data_folder: PathBuf,
    /// Plots and plot plans
    pub output_folder: PathBuf,
    /// PRIMAP-hist emissions with extrapolation
    pub primap_file: String,
    /// World Bank total population
    pub wb_population_file: String,
    /// World Bank GDP (current USD)
    pub wb_gdp_file: String,
    /// NDC coverage per country and gas/sector pair
    pub ndc_coverage_file: String,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("input-data"),
            proc_data_folder: PathBuf::from("proc-data"),
            output_folder: PathBuf::from("output"),
            primap_file: "Guetschow-et-al-2023a-PRIMAP-hist_v2.4.2_final_09-Mar-2023.csv"
                .to_string(),
            wb_population_file: "API_SP.POP.TOTL_DS2_en_csv_v2_4218816.csv".to_string(),
            wb_gdp_file: "API_NY.GDP.MKTP.CD_DS2_en_csv_v2_4150784.csv".to_string(),
            ndc_coverage_file: "NDCCoverage_InfoPerSectorGasCombiAndCountry.csv".to_string(),
        }
    }
}

/// Which PRIMAP-hist rows to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimapSelection {
    /// e.g. `HISTCR` (country-reported) or `HISTTP` (third-party)
    pub scenario: Option<String>,
    /// e.g. `KYOTOGHG (AR4GWP100)`
    pub entity: String,
    /// e.g. `M.0.EL`
    pub category: String,
}

/// Read any supported file into a raw table
pub fn read_raw(path: impl AsRef<Path>) -> IoResult<RawTable> {
    let reader = open_file(path)?;
    tracing::debug!(
        "Reading {} as {}",
        reader.path().unwrap_or_default(),
        reader.format_name()
    );
    reader.read_raw()
}

/// Loads datasets from the configured locations
#[derive(Debug, Clone)]
pub struct DataLoader {
    sources: DataSources,
}

impl DataLoader {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &DataSources {
        &self.sources
    }

    /// Path of a raw input file
    pub fn input_path(&self, file: &str) -> PathBuf {
        self.sources.input_folder.join(file)
    }

    /// Load a common-format table, checking it first
    pub fn load_table(&self, path: impl AsRef<Path>) -> IoResult<YearTable> {
        let path = path.as_ref();
        tracing::info!("Reading {}", path.display());

        let mut raw = read_raw(path)?;
        raw.normalize_year_headers();
        verify_data_format(&raw)?;
        YearTable::from_raw(&raw, "country")
    }

    /// Load PRIMAP-hist emissions for one gas and sector, in MtCO2eq
    pub fn load_primap(&self, selection: &PrimapSelection) -> IoResult<YearTable> {
        let path = self.input_path(&self.sources.primap_file);
        tracing::info!("Reading emissions data from {}", path.display());

        let raw = read_raw(&path)?;
        let mut filters = vec![
            (PRIMAP_ENTITY_COLUMN, selection.entity.as_str()),
            (PRIMAP_CATEGORY_COLUMN, selection.category.as_str()),
        ];
        if let Some(scenario) = &selection.scenario {
            filters.push((PRIMAP_SCENARIO_COLUMN, scenario.as_str()));
        }

        let table = YearTable::from_raw_filtered(&raw, PRIMAP_AREA_COLUMN, &filters)?
            .with_variable(selection.entity.clone());
        tracing::info!(
            countries = table.num_countries(),
            years = table.num_years(),
            "emissions data reading complete"
        );
        Ok(convert_emissions(&table))
    }

    /// Load a World Bank indicator export
    pub fn load_world_bank(&self, file: &str, unit: &str) -> IoResult<YearTable> {
        let path = self.input_path(file);
        tracing::info!("Reading World Bank data from {}", path.display());

        let options = CsvOptions {
            skip_lines: WORLD_BANK_PREAMBLE_LINES,
            ..CsvOptions::default()
        };
        let raw = CsvReader::open_with_options(&path, options)?.read_raw()?;
        let variable = raw
            .unique_values("Indicator Name")
            .filter(|names| names.len() == 1)
            .and_then(|names| names.into_iter().next().map(|s| s.to_string()));

        let mut table = YearTable::from_raw(&raw, WORLD_BANK_COUNTRY_COLUMN)?.with_unit(unit);
        table.variable = variable;
        Ok(table)
    }

    /// Load total population in persons
    pub fn load_population(&self) -> IoResult<YearTable> {
        let table = self.load_world_bank(&self.sources.wb_population_file, "Pers")?;
        Ok(convert_population(&table))
    }

    /// Load GDP in current USD
    pub fn load_gdp(&self) -> IoResult<YearTable> {
        self.load_world_bank(&self.sources.wb_gdp_file, "USD")
    }

    /// Load NDC gas and sector coverage
    pub fn load_ndc_coverage(&self) -> IoResult<NdcCoverage> {
        let path = self.input_path(&self.sources.ndc_coverage_file);
        tracing::info!("Reading NDC coverage data from {}", path.display());

        let coverage = NdcCoverage::from_raw(&read_raw(&path)?)?;
        tracing::info!(
            countries = coverage.countries().len(),
            combinations = coverage.combinations().len(),
            "NDC coverage data reading complete"
        );
        Ok(coverage)
    }
}
