//! gst-io - Data I/O for Global Stocktake datasets
//!
//! This crate reads the CSV datasets used in the stocktake analysis
//! (emissions, population, GDP, NDC coverage) and reshapes them into a common
//! convention: one row per country, one column per year.
//!
//! - **CSV**: raw header + string records via the `csv` crate
//! - **Schema**: year column detection and `Y1990` header normalisation
//! - **Table**: the country x year [`YearTable`] and its set operations
//! - **Units**: emissions and population unit conversion
//! - **NDC**: gas and sector coverage of nationally determined contributions
//! - **Sources**: dataset locations and loaders built from configuration

pub mod csv_reader;
pub mod ndc;
pub mod reader;
pub mod schema;
pub mod sources;
pub mod table;
pub mod units;

pub use ndc::*;
pub use reader::*;
pub use schema::*;
pub use sources::*;
pub use table::*;
pub use units::*;
