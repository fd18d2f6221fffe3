//! gst-core - Analysis and plot planning for Global Stocktake data
//!
//! This crate turns country x year tables into the figures used in the
//! stocktake overview. Rendering is left to a plotting backend; what this
//! crate produces is a *plan*: bin edges, axis limits, annotations, labels
//! and the output file name, serialisable as JSON.
//!
//! # Key Components
//!
//! - **Config**: dataset locations, name tables, analysis and plot settings
//! - **Trends**: annual % change, rolling averages, change since a baseline
//!   year, peaking years, per-capita and per-USD intensities
//! - **Histogram**: distribution plans with symmetric binning and outlier
//!   reporting
//! - **Facet**: per-country small-multiple line plots
//! - **Coverage**: gas by sector overview of NDC coverage
//! - **Pipeline**: dataset loading and the standard plot types driven by
//!   configuration

pub mod config;
pub mod coverage;
pub mod error;
pub mod export;
pub mod facet;
pub mod format;
pub mod histogram;
pub mod pipeline;
pub mod trends;

pub use config::*;
pub use coverage::*;
pub use error::*;
pub use export::*;
pub use facet::*;
pub use histogram::*;
pub use pipeline::*;
pub use trends::*;
