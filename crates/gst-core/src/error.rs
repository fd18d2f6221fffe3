//! Error types for gst-core

use gst_io::IoError;
use gst_stats::BinningError;
use thiserror::Error;

/// Main error type for gst operations
#[derive(Error, Debug)]
pub enum GstError {
    /// Binning errors, including degenerate samples
    #[error("Binning failed for {variable}: {source}")]
    Binning {
        variable: String,
        #[source]
        source: BinningError,
    },

    /// Dataset loading errors
    #[error("Failed to load dataset: {0}")]
    Io(#[from] IoError),

    /// Requested year is not in the data
    #[error("The year {0} is not available in the data")]
    YearNotFound(i32),

    /// Two datasets share no countries or years
    #[error("No countries and years in common between {0}")]
    NoCommonData(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be written
    #[error("Failed to write configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Plan serialisation errors
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File system errors
    #[error("I/O error: {0}")]
    FileSystem(#[from] std::io::Error),
}

impl GstError {
    /// Attach the variable name to a binning error
    pub fn binning(variable: impl Into<String>, source: BinningError) -> Self {
        GstError::Binning {
            variable: variable.into(),
            source,
        }
    }

    /// Whether the plot should be skipped because the data has no spread
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            GstError::Binning {
                source: BinningError::DegenerateSample { .. },
                ..
            }
        )
    }
}

/// Result type for gst operations
pub type GstResult<T> = Result<T, GstError>;
