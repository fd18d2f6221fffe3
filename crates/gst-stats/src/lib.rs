//! gst-stats - Statistics for Global Stocktake distribution plots
//!
//! This crate provides the numeric pieces behind the country histograms:
//!
//! - **Percentiles**: linear-interpolation percentiles and quartiles
//! - **Binning**: Tukey's-fences outlier filtering and bin edges that are
//!   symmetric about zero when a sample spans both signs
//! - **Summary**: headline statistics with an explicit filtering policy
//!
//! Everything here is a pure function of its inputs.

pub mod binning;
pub mod percentile;
pub mod summary;

pub use binning::*;
pub use percentile::*;
pub use summary::*;
