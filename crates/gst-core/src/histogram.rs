//! Histogram plot plans
//!
//! A plan holds every decision made before drawing a country histogram:
//! bin edges, axis limits, annotations, labels and the output file name.
//! Rendering itself is left to whatever consumes the exported JSON.

use gst_io::YearSeries;
use gst_stats::{
    annual_edges, compute_bins, BinningError, BinningOptions, BinningResult, Sample, StatsPolicy,
    SummaryStats,
};
use serde::{Deserialize, Serialize};

use crate::config::{FigureStyle, NameTables};
use crate::error::{GstError, GstResult};
use crate::export::{ExportFormat, PlotPlan};
use crate::format::format_general;

/// Label of the y-axis for all histograms
pub const COUNT_LABEL: &str = "Number of countries";

/// Inputs for a histogram of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramRequest {
    /// Variable name used in titles and file names
    pub variable: String,
    pub unit: String,
    pub options: BinningOptions,
    pub stats_policy: StatsPolicy,
    /// Country code to mark on the plot
    pub highlight: Option<String>,
    pub format: ExportFormat,
    pub style: FigureStyle,
}

impl HistogramRequest {
    pub fn new(variable: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            unit: unit.into(),
            options: BinningOptions::default(),
            stats_policy: StatsPolicy::default(),
            highlight: None,
            format: ExportFormat::default(),
            style: FigureStyle::default(),
        }
    }

    pub fn with_options(mut self, options: BinningOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_stats_policy(mut self, policy: StatsPolicy) -> Self {
        self.stats_policy = policy;
        self
    }

    pub fn with_highlight(mut self, country: impl Into<String>) -> Self {
        self.highlight = Some(country.into());
        self
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_style(mut self, style: FigureStyle) -> Self {
        self.style = style;
        self
    }
}

/// Number of binned countries on either side of zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignCounts {
    pub below: usize,
    pub above: usize,
}

impl SignCounts {
    fn from_values(values: &[f64]) -> Self {
        Self {
            below: values.iter().filter(|&&v| v < 0.0).count(),
            above: values.iter().filter(|&&v| v > 0.0).count(),
        }
    }
}

/// A highlighted country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub country: String,
    pub display_name: String,
    /// Value before outlier removal
    pub value: f64,
    pub label: String,
    /// Whether the value falls strictly inside the outer bin edges; a
    /// marker line is drawn only then, otherwise the label sits in a corner
    pub within_limits: bool,
}

/// Everything needed to draw a distribution across countries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramPlan {
    pub variable: String,
    pub unit: String,
    pub bins: BinningResult,
    pub stats: SummaryStats,
    pub x_limits: (f64, f64),
    /// Draw a vertical line at zero
    pub zero_line: bool,
    pub sign_counts: Option<SignCounts>,
    pub highlight: Option<Highlight>,
    pub outlier_note: Option<String>,
    pub stats_text: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub style: FigureStyle,
    pub file_name: String,
}

impl HistogramPlan {
    /// Bin a series and lay out the annotations
    ///
    /// A series whose values are all equal yields a degenerate binning
    /// error; the caller is expected to skip that plot.
    pub fn build(
        series: &YearSeries,
        request: &HistogramRequest,
        names: &NameTables,
    ) -> GstResult<Self> {
        let variable = request.variable.as_str();
        let sample = Sample::new(series.values.iter().copied(), request.unit.as_str())
            .with_name(series.label.as_str());

        if sample.missing() > 0 {
            tracing::debug!("{} countries without data for {}", sample.missing(), variable);
        }

        let bins = compute_bins(&sample, &request.options).map_err(|e| {
            let err = GstError::binning(variable, e);
            if err.is_degenerate() {
                tracing::warn!(
                    "All values in the series are the same! Skipping plot for {}",
                    variable
                );
            }
            err
        })?;
        tracing::debug!("bins set to {:?}", bins.edges);

        // captured from the full series so removed outliers can still be shown
        let highlighted = request
            .highlight
            .as_deref()
            .and_then(|c| series.get(c).filter(|v| v.is_finite()).map(|v| (c, v)));

        let stats = SummaryStats::for_binning(&sample, &bins, request.stats_policy);

        let edge_span = edge_limits(&bins);
        let mut x_limits = edge_span;
        let mut zero_line = false;
        let mut sign_counts = None;
        if bins.minimum < 0.0 {
            x_limits = symmetric_limits(x_limits);
            zero_line = true;
            sign_counts = Some(SignCounts::from_values(&bins.kept));
        }

        let highlight = highlighted.map(|(country, value)| {
            let display_name = names.country_name(country).to_string();
            Highlight {
                country: country.to_string(),
                label: format!(
                    "{} \n{}{}",
                    display_name,
                    format_general(value, 2),
                    request.unit
                ),
                display_name,
                value,
                within_limits: value > edge_span.0 && value < edge_span.1,
            }
        });
        if request.highlight.is_some() && highlight.is_none() {
            tracing::warn!(
                "No {} value for the selected country {:?}",
                variable,
                request.highlight
            );
        }

        let outlier_note = bins
            .outliers
            .as_ref()
            .map(|report| format!("{} outliers not shown.", report.count()));

        let stats_text = format!(
            " max = {:.2}\n min = {:.2}\n mean = {:.2}\n median = {:.2}\n n = {}",
            stats.max, stats.min, stats.mean, stats.median, stats.count
        );

        let mut file_stem = format!("basic_histogram-{}", variable);
        if let Some(h) = &highlight {
            file_stem.push('-');
            file_stem.push_str(&h.display_name);
        }

        Ok(Self {
            variable: variable.to_string(),
            unit: request.unit.clone(),
            title: format!("{} in {}", variable, series.label),
            x_label: format!("{} ({})", variable, request.unit),
            y_label: COUNT_LABEL.to_string(),
            file_name: format!("{}.{}", file_stem, request.format.extension()),
            style: request.style.clone(),
            bins,
            stats,
            x_limits,
            zero_line,
            sign_counts,
            highlight,
            outlier_note,
            stats_text,
        })
    }
}

impl PlotPlan for HistogramPlan {
    fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Distribution of the years in which countries peaked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakingPlan {
    pub variable: String,
    pub start_year: i32,
    pub end_year: i32,
    /// One bin per year, from `start_year - 1` to `end_year + 1`
    pub edges: Vec<f64>,
    pub years: Vec<f64>,
    pub stats: SummaryStats,
    pub stats_text: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub style: FigureStyle,
    pub file_name: String,
}

impl PeakingPlan {
    pub fn build(
        series: &YearSeries,
        variable: &str,
        start_year: i32,
        end_year: i32,
        format: ExportFormat,
    ) -> GstResult<Self> {
        let sample = Sample::new(series.values.iter().copied(), "year");
        if sample.distinct_count() < 2 {
            tracing::warn!(
                "All values in the series are the same! Skipping plot for {}",
                variable
            );
            return Err(GstError::binning(
                variable,
                BinningError::DegenerateSample {
                    distinct: sample.distinct_count(),
                },
            ));
        }

        let stats = SummaryStats::from_data(sample.values());
        let stats_text = format!(
            " max = {:.0}\n min = {:.0}\n mean = {:.2}\n median = {:.0}",
            stats.max.trunc(),
            stats.min.trunc(),
            stats.mean,
            stats.median
        );

        Ok(Self {
            variable: variable.to_string(),
            start_year,
            end_year,
            edges: annual_edges(start_year, end_year),
            years: sample.values().to_vec(),
            stats,
            stats_text,
            title: format!("Peaking year of {} since {}", variable, start_year),
            x_label: "Year".to_string(),
            y_label: COUNT_LABEL.to_string(),
            style: FigureStyle::default(),
            file_name: format!(
                "basic_histogram-{}-peaking-since{}.{}",
                variable,
                start_year,
                format.extension()
            ),
        })
    }

    pub fn with_style(mut self, style: FigureStyle) -> Self {
        self.style = style;
        self
    }
}

impl PlotPlan for PeakingPlan {
    fn file_name(&self) -> &str {
        &self.file_name
    }
}

fn edge_limits(bins: &BinningResult) -> (f64, f64) {
    match (bins.edges.first(), bins.edges.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => (bins.minimum, bins.maximum),
    }
}

/// Widen limits so they are symmetric about zero
fn symmetric_limits((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi.abs() > lo.abs() {
        (-hi, hi)
    } else {
        (lo, -lo)
    }
}
