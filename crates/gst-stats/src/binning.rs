//! Histogram binning for country distributions
//!
//! Distributions of trends and changes usually contain both positive and
//! negative values, and the sign is what the reader cares about. When a
//! sample straddles zero the bins are made symmetric about zero with an
//! integer Freedman-Diaconis width, so that zero always falls on a bin edge.
//! One-sided samples use the plain Freedman-Diaconis rule over their range.
//!
//! Extreme values can optionally be removed first using Tukey's fences
//! `[Q1 - k*IQR, Q3 + k*IQR]`; k = 1.5 marks outliers, k = 3 "far out"
//! values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::percentile::{sorted_finite, Quartiles};

/// Default Tukey fence multiplier
pub const DEFAULT_TUKEY_K: f64 = 3.0;

/// Upper bound on the number of bins a sample may produce
pub const MAX_BINS: usize = 100_000;

/// Errors raised while binning a sample
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BinningError {
    /// Fewer than two distinct values, before or after outlier removal
    #[error("sample has {distinct} distinct value(s), at least 2 are required")]
    DegenerateSample { distinct: usize },

    #[error("Tukey fence multiplier must be positive, got {0}")]
    InvalidFenceMultiplier(f64),

    /// The sample's spread needs more bins than [`MAX_BINS`]
    #[error("{requested} bins requested, at most {} are supported", MAX_BINS)]
    TooManyBins { requested: f64 },
}

/// Result type for binning operations
pub type BinResult<T> = Result<T, BinningError>;

/// A numeric sample, one value per country or entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    values: Vec<f64>,
    unit: String,
    name: Option<String>,
    missing: usize,
}

impl Sample {
    /// Build a sample; non-finite values are dropped and counted as missing
    pub fn new(values: impl IntoIterator<Item = f64>, unit: impl Into<String>) -> Self {
        let mut missing = 0;
        let values = values
            .into_iter()
            .filter(|x| {
                let keep = x.is_finite();
                if !keep {
                    missing += 1;
                }
                keep
            })
            .collect();

        Self {
            values,
            unit: unit.into(),
            name: None,
            missing,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of non-finite values dropped at construction
    pub fn missing(&self) -> usize {
        self.missing
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct values
    pub fn distinct_count(&self) -> usize {
        distinct_count(&sorted_finite(&self.values))
    }
}

/// Options for [`compute_bins`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinningOptions {
    /// Drop values outside Tukey's fences before binning
    pub remove_outliers: bool,
    /// Tukey fence multiplier
    pub k: f64,
}

impl Default for BinningOptions {
    fn default() -> Self {
        Self {
            remove_outliers: false,
            k: DEFAULT_TUKEY_K,
        }
    }
}

impl BinningOptions {
    /// Options with outlier removal enabled at the default multiplier
    pub fn with_outlier_removal() -> Self {
        Self {
            remove_outliers: true,
            ..Self::default()
        }
    }

    pub fn with_k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }
}

/// Tukey's fences around the interquartile range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TukeyFences {
    pub low: f64,
    pub high: f64,
}

impl TukeyFences {
    /// Fences for a sorted slice with multiplier `k`
    pub fn from_sorted(sorted: &[f64], k: f64) -> Option<Self> {
        let q = Quartiles::from_sorted(sorted)?;
        let iqr = q.iqr();
        Some(Self {
            low: q.q25 - k * iqr,
            high: q.q75 + k * iqr,
        })
    }

    /// Whether a value lies strictly between the fences
    pub fn contains(&self, x: f64) -> bool {
        x > self.low && x < self.high
    }
}

/// Values removed by Tukey's fences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub fences: TukeyFences,
    /// Values at or below the lower fence, in sample order
    pub lower: Vec<f64>,
    /// Values at or above the upper fence, in sample order
    pub upper: Vec<f64>,
}

impl OutlierReport {
    pub fn count(&self) -> usize {
        self.lower.len() + self.upper.len()
    }
}

/// How the bin edges were chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum BinStrategy {
    /// Integer-width bins symmetric about zero
    SymmetricAboutZero { bin_width: f64, half_span: u64 },
    /// Freedman-Diaconis bins over `[minimum, maximum]`
    FreedmanDiaconis { bin_width: f64, num_bins: usize },
}

/// Bin edges for a (possibly outlier-filtered) sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinningResult {
    /// Ascending, evenly spaced bin edges
    pub edges: Vec<f64>,
    /// Number of values removed as outliers (0 if removal was off)
    pub outlier_count: usize,
    pub strategy: BinStrategy,
    /// Minimum of the binned values
    pub minimum: f64,
    /// Maximum of the binned values
    pub maximum: f64,
    /// Present when outlier removal was requested
    pub outliers: Option<OutlierReport>,
    /// The values the bins were computed from, in sample order
    pub kept: Vec<f64>,
}

impl BinningResult {
    pub fn num_bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn bin_width(&self) -> f64 {
        match self.strategy {
            BinStrategy::SymmetricAboutZero { bin_width, .. } => bin_width,
            BinStrategy::FreedmanDiaconis { bin_width, .. } => bin_width,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self.strategy, BinStrategy::SymmetricAboutZero { .. })
    }
}

/// Compute histogram bin edges for a sample
///
/// With `remove_outliers`, values outside Tukey's fences are excluded from
/// the binning; the sample itself is left untouched.
pub fn compute_bins(sample: &Sample, options: &BinningOptions) -> BinResult<BinningResult> {
    if !(options.k.is_finite() && options.k > 0.0) {
        return Err(BinningError::InvalidFenceMultiplier(options.k));
    }

    let sorted = sorted_finite(sample.values());
    let distinct = distinct_count(&sorted);
    if distinct < 2 {
        return Err(BinningError::DegenerateSample { distinct });
    }

    let (kept, outliers) = if options.remove_outliers {
        let fences = TukeyFences::from_sorted(&sorted, options.k)
            .ok_or(BinningError::DegenerateSample { distinct })?;
        let (kept, report) = remove_outliers(sample.values(), fences);
        (kept, Some(report))
    } else {
        (sample.values().to_vec(), None)
    };
    let outlier_count = outliers.as_ref().map_or(0, OutlierReport::count);

    let sorted_kept = if outliers.is_some() {
        sorted_finite(&kept)
    } else {
        sorted
    };
    let distinct = distinct_count(&sorted_kept);
    if distinct < 2 {
        return Err(BinningError::DegenerateSample { distinct });
    }

    let minimum = sorted_kept[0];
    let maximum = sorted_kept[sorted_kept.len() - 1];
    // two distinct values guarantee quartiles exist
    let iqr = Quartiles::from_sorted(&sorted_kept).map_or(0.0, |q| q.iqr());
    let n = sorted_kept.len() as f64;

    let (edges, strategy) = if minimum < 0.0 && maximum > 0.0 {
        symmetric_edges(minimum, maximum, iqr, n)?
    } else {
        freedman_diaconis_edges(minimum, maximum, iqr, n)?
    };

    tracing::debug!(
        ?strategy,
        num_edges = edges.len(),
        outlier_count,
        "computed histogram bins"
    );

    Ok(BinningResult {
        edges,
        outlier_count,
        strategy,
        minimum,
        maximum,
        outliers,
        kept,
    })
}

/// Split values into those inside Tukey's fences and a report of the rest
fn remove_outliers(values: &[f64], fences: TukeyFences) -> (Vec<f64>, OutlierReport) {
    let mut kept = Vec::with_capacity(values.len());
    let mut lower = Vec::new();
    let mut upper = Vec::new();
    for &x in values {
        if fences.contains(x) {
            kept.push(x);
        } else if x <= fences.low {
            lower.push(x);
        } else {
            upper.push(x);
        }
    }

    tracing::info!(
        low = fences.low,
        high = fences.high,
        lower = ?lower,
        upper = ?upper,
        "removing outliers outside Tukey's fences"
    );

    (kept, OutlierReport { fences, lower, upper })
}

/// Reject bin counts that are not finite or exceed [`MAX_BINS`]
fn check_bin_count(requested: f64) -> BinResult<usize> {
    if requested.is_finite() && requested <= MAX_BINS as f64 {
        Ok(requested as usize)
    } else {
        Err(BinningError::TooManyBins { requested })
    }
}

/// Symmetric integer-width bins; zero is always an edge
fn symmetric_edges(
    minimum: f64,
    maximum: f64,
    iqr: f64,
    n: f64,
) -> BinResult<(Vec<f64>, BinStrategy)> {
    let mut bin_width = (2.0 * iqr / n.cbrt()).floor();
    if bin_width <= 0.0 || !bin_width.is_finite() {
        bin_width = 1.0;
    }

    // counted in f64 so extreme extents cannot overflow
    let extent = minimum.abs().max(maximum.abs());
    let mut half_span = (2.0 * extent / bin_width).ceil();
    if half_span % 2.0 != 0.0 {
        half_span += 1.0;
    }
    // half_span bins plus one on each side
    check_bin_count(half_span + 2.0)?;

    let half_span = half_span as u64;
    let outer = 1 + (half_span / 2) as i64;
    let edges = (-outer..=outer).map(|i| i as f64 * bin_width).collect();

    Ok((
        edges,
        BinStrategy::SymmetricAboutZero {
            bin_width,
            half_span,
        },
    ))
}

/// Freedman-Diaconis bins spanning exactly `[minimum, maximum]`
fn freedman_diaconis_edges(
    minimum: f64,
    maximum: f64,
    iqr: f64,
    n: f64,
) -> BinResult<(Vec<f64>, BinStrategy)> {
    let range = maximum - minimum;
    let width = 2.0 * iqr / n.cbrt();

    let num_bins = if width > 0.0 && width.is_finite() {
        check_bin_count((range / width).ceil())?.max(1)
    } else {
        1
    };

    let edges = (0..=num_bins)
        .map(|i| {
            if i == num_bins {
                maximum
            } else {
                minimum + range * i as f64 / num_bins as f64
            }
        })
        .collect();

    Ok((
        edges,
        BinStrategy::FreedmanDiaconis {
            bin_width: range / num_bins as f64,
            num_bins,
        },
    ))
}

/// Annual bins for year-valued samples: one bin per year from
/// `start_year - 1` to `end_year + 1`
pub fn annual_edges(start_year: i32, end_year: i32) -> Vec<f64> {
    (start_year - 1..=end_year + 1).map(f64::from).collect()
}

fn distinct_count(sorted: &[f64]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0] != w[1]).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample(values: &[f64]) -> Sample {
        Sample::new(values.iter().copied(), "%")
    }

    fn assert_covers(result: &BinningResult, min: f64, max: f64) {
        assert!(!result.edges.is_empty());
        assert!(result.edges.windows(2).all(|w| w[0] < w[1]));
        assert!(result.edges[0] <= min);
        assert!(*result.edges.last().unwrap() >= max);
    }

    #[test]
    fn test_symmetric_worked_example() {
        let result = compute_bins(
            &sample(&[-10.0, -2.0, 0.0, 3.0, 8.0]),
            &BinningOptions::default(),
        )
        .unwrap();

        assert_eq!(result.minimum, -10.0);
        assert_eq!(result.maximum, 8.0);
        assert_eq!(
            result.strategy,
            BinStrategy::SymmetricAboutZero {
                bin_width: 5.0,
                half_span: 4
            }
        );
        assert_eq!(
            result.edges,
            vec![-15.0, -10.0, -5.0, 0.0, 5.0, 10.0, 15.0]
        );
        assert_eq!(result.outlier_count, 0);
        assert!(result.outliers.is_none());
    }

    #[test]
    fn test_half_span_rounded_up_to_even() {
        // iqr = 2, n = 5 -> width floor(4 / 1.71) = 2; 2 * 5 / 2 = 5 -> 6
        let result = compute_bins(
            &sample(&[-5.0, -1.0, 0.0, 1.0, 4.0]),
            &BinningOptions::default(),
        )
        .unwrap();

        assert_eq!(
            result.strategy,
            BinStrategy::SymmetricAboutZero {
                bin_width: 2.0,
                half_span: 6
            }
        );
        assert_eq!(result.edges.first(), Some(&-8.0));
        assert_eq!(result.edges.last(), Some(&8.0));
        assert!(result.edges.contains(&0.0));
    }

    #[test]
    fn test_zero_width_falls_back_to_one() {
        // iqr = 0 in a straddling sample
        let result = compute_bins(
            &sample(&[-0.4, 0.0, 0.0, 0.0, 0.3]),
            &BinningOptions::default(),
        )
        .unwrap();

        assert_eq!(result.bin_width(), 1.0);
        assert_eq!(result.edges, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
    }

    #[rstest]
    #[case(&[-30.0, -12.5, -1.0, 0.5, 2.0, 7.0, 44.0])]
    #[case(&[-0.2, 0.1, 0.15, 0.9])]
    #[case(&[-1000.0, -3.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0])]
    fn test_straddling_sample_is_symmetric(#[case] values: &[f64]) {
        let result = compute_bins(&sample(values), &BinningOptions::default()).unwrap();

        assert!(result.is_symmetric());
        for e in &result.edges {
            assert!(result.edges.iter().any(|f| (f + e).abs() < 1e-9));
        }
        assert_covers(&result, result.minimum, result.maximum);
    }

    #[rstest]
    #[case(&[0.0, 1.0, 2.0, 3.0, 10.0])]
    #[case(&[-9.0, -4.0, -4.0, -1.0, 0.0])]
    #[case(&[0.5, 0.5, 0.75])]
    #[case(&[120.0, 130.0, 500.0, 1200.0, 1500.0, 2000.0])]
    fn test_one_sided_sample_uses_freedman_diaconis(#[case] values: &[f64]) {
        let result = compute_bins(&sample(values), &BinningOptions::default()).unwrap();

        assert!(!result.is_symmetric());
        assert_eq!(result.edges[0], result.minimum);
        assert_eq!(*result.edges.last().unwrap(), result.maximum);
        assert_covers(&result, result.minimum, result.maximum);
    }

    #[test]
    fn test_freedman_diaconis_bin_count() {
        // iqr = 4.5, n = 10 -> width 4.177..., range 9 -> 3 bins
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let result = compute_bins(&sample(&values), &BinningOptions::default()).unwrap();

        assert_eq!(result.num_bins(), 3);
        assert_eq!(result.edges, vec![1.0, 4.0, 7.0, 10.0]);
    }

    #[rstest]
    #[case(&[-1e300, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1e300])]
    #[case(&[-5e18, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5e18])]
    #[case(&[-1e10, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1e10])]
    fn test_huge_symmetric_span_rejected(#[case] values: &[f64]) {
        let err = compute_bins(&sample(values), &BinningOptions::default()).unwrap_err();
        assert!(matches!(err, BinningError::TooManyBins { .. }));
    }

    #[test]
    fn test_huge_one_sided_range_rejected() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 1e12];
        let err = compute_bins(&sample(&values), &BinningOptions::default()).unwrap_err();
        assert!(matches!(err, BinningError::TooManyBins { requested } if requested > 1e11));

        // the same spread is fine once the far-out value is fenced off
        let options = BinningOptions {
            remove_outliers: true,
            ..BinningOptions::default()
        };
        let result = compute_bins(&sample(&values), &options).unwrap();
        assert_eq!(result.outlier_count, 1);
        assert!(result.num_bins() <= MAX_BINS);
    }

    #[test]
    fn test_bin_count_at_limit() {
        assert_eq!(check_bin_count(MAX_BINS as f64), Ok(MAX_BINS));
        assert!(check_bin_count(MAX_BINS as f64 + 1.0).is_err());
        assert!(check_bin_count(f64::INFINITY).is_err());
        assert!(check_bin_count(f64::NAN).is_err());
    }

    #[test]
    fn test_degenerate_sample_rejected() {
        let err = compute_bins(&sample(&[5.0, 5.0, 5.0]), &BinningOptions::default()).unwrap_err();
        assert_eq!(err, BinningError::DegenerateSample { distinct: 1 });

        let err = compute_bins(&sample(&[]), &BinningOptions::default()).unwrap_err();
        assert_eq!(err, BinningError::DegenerateSample { distinct: 0 });
    }

    #[test]
    fn test_outlier_removal_example() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0, 100.0];
        let result = compute_bins(&sample(&values), &BinningOptions::with_outlier_removal()).unwrap();

        assert_eq!(result.outlier_count, 1);
        assert_eq!(result.kept.len(), 9);
        assert_eq!(result.maximum, 5.0);

        let report = result.outliers.unwrap();
        assert!(report.lower.is_empty());
        assert_eq!(report.upper, vec![100.0]);
        assert!((report.fences.low - -3.0).abs() < 1e-12);
        assert!((report.fences.high - 9.25).abs() < 1e-12);
    }

    #[test]
    fn test_outlier_removal_leaves_sample_untouched() {
        let s = sample(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0, 100.0]);
        let _ = compute_bins(&s, &BinningOptions::with_outlier_removal()).unwrap();
        assert_eq!(s.len(), 10);
    }

    #[test]
    fn test_degenerate_after_filtering() {
        // q25 = q75 = 1 -> fences collapse to (1, 1); nothing is strictly inside
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0];
        let err = compute_bins(&sample(&values), &BinningOptions::with_outlier_removal()).unwrap_err();
        assert_eq!(err, BinningError::DegenerateSample { distinct: 0 });
    }

    #[test]
    fn test_outlier_count_zero_without_removal() {
        let values = [1.0, 2.0, 3.0, 1000.0];
        let result = compute_bins(&sample(&values), &BinningOptions::default()).unwrap();
        assert_eq!(result.outlier_count, 0);
        assert_eq!(result.kept.len(), 4);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.5)]
    #[case(f64::NAN)]
    fn test_invalid_k_rejected(#[case] k: f64) {
        let options = BinningOptions::with_outlier_removal().with_k(k);
        let err = compute_bins(&sample(&[1.0, 2.0, 3.0]), &options).unwrap_err();
        assert!(matches!(err, BinningError::InvalidFenceMultiplier(_)));
    }

    #[test]
    fn test_compute_bins_is_idempotent() {
        let s = sample(&[-7.0, -3.5, 0.0, 2.0, 2.5, 11.0]);
        let a = compute_bins(&s, &BinningOptions::default()).unwrap();
        let b = compute_bins(&s, &BinningOptions::default()).unwrap();
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn test_sample_drops_non_finite() {
        let s = Sample::new(vec![1.0, f64::NAN, 2.0, f64::INFINITY], "Mt").with_name("2019");
        assert_eq!(s.len(), 2);
        assert_eq!(s.missing(), 2);
        assert_eq!(s.name(), Some("2019"));
        assert_eq!(s.distinct_count(), 2);
    }

    #[test]
    fn test_annual_edges() {
        assert_eq!(
            annual_edges(2000, 2003),
            vec![1999.0, 2000.0, 2001.0, 2002.0, 2003.0, 2004.0]
        );
    }
}
