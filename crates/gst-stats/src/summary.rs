//! Summary statistics for plot annotations
//!
//! Provides the headline numbers printed next to a distribution:
//! - Max, min
//! - Mean, median
//! - Number of countries
//!
//! When outliers are removed before binning, the caller decides whether
//! these numbers describe the full sample or only the binned values via
//! [`StatsPolicy`].

use serde::{Deserialize, Serialize};

use crate::binning::{BinningResult, Sample};
use crate::percentile::{percentile_sorted, sorted_finite};

/// Which values the summary statistics are computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPolicy {
    /// Every value in the sample, including removed outliers
    Unfiltered,
    /// Only the values that were binned
    #[default]
    Filtered,
}

/// The numbers printed in a histogram's stats box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of countries
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Linear-interpolation median
    pub median: f64,
}

impl SummaryStats {
    /// Non-finite values are skipped
    pub fn from_data(data: &[f64]) -> Self {
        let sorted = sorted_finite(data);
        if sorted.is_empty() {
            return Self::empty();
        }

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            median: percentile_sorted(&sorted, 50.0).unwrap_or(f64::NAN),
        }
    }

    /// Statistics for a binned sample under the given policy
    pub fn for_binning(sample: &Sample, bins: &BinningResult, policy: StatsPolicy) -> Self {
        match policy {
            StatsPolicy::Unfiltered => Self::from_data(sample.values()),
            StatsPolicy::Filtered => Self::from_data(&bins.kept),
        }
    }

    fn empty() -> Self {
        Self {
            count: 0,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            median: f64::NAN,
        }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::{compute_bins, BinningOptions};

    #[test]
    fn test_summary_stats_basic() {
        let data: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!((stats.mean - 5.5).abs() < 1e-10);
        assert!((stats.median - 5.5).abs() < 1e-10);
        assert_eq!(stats.range(), 9.0);
    }

    #[test]
    fn test_summary_stats_with_nan() {
        let data = vec![1.0, 2.0, f64::NAN, 4.0, 5.0];
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.median, 3.0);
    }

    #[test]
    fn test_summary_stats_empty() {
        let stats = SummaryStats::from_data(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
    }

    #[test]
    fn test_stats_policy() {
        let sample = Sample::new(
            vec![1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0, 100.0],
            "%",
        );
        let bins = compute_bins(&sample, &BinningOptions::with_outlier_removal()).unwrap();

        let filtered = SummaryStats::for_binning(&sample, &bins, StatsPolicy::Filtered);
        assert_eq!(filtered.count, 9);
        assert_eq!(filtered.max, 5.0);

        let unfiltered = SummaryStats::for_binning(&sample, &bins, StatsPolicy::Unfiltered);
        assert_eq!(unfiltered.count, 10);
        assert_eq!(unfiltered.max, 100.0);
    }

    #[test]
    fn test_default_policy_is_filtered() {
        assert_eq!(StatsPolicy::default(), StatsPolicy::Filtered);
    }
}
