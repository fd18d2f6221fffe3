//! Percentiles with linear interpolation
//!
//! For a sorted sample of n values the p-th percentile sits at rank
//! `p/100 * (n - 1)`, interpolating linearly between the two closest
//! order statistics.

use serde::{Deserialize, Serialize};

/// Copy the finite values of `data` and sort them ascending
pub fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile of an already sorted slice, `p` in [0, 100]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Percentile of unsorted data; non-finite values are ignored
pub fn percentile(data: &[f64], p: f64) -> Option<f64> {
    percentile_sorted(&sorted_finite(data), p)
}

/// Lower and upper quartiles of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    /// 25th percentile
    pub q25: f64,
    /// 75th percentile
    pub q75: f64,
}

impl Quartiles {
    /// Quartiles of unsorted data
    pub fn from_data(data: &[f64]) -> Option<Self> {
        Self::from_sorted(&sorted_finite(data))
    }

    /// Quartiles of an already sorted slice
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        Some(Self {
            q25: percentile_sorted(sorted, 25.0)?,
            q75: percentile_sorted(sorted, 75.0)?,
        })
    }

    /// Interquartile range
    pub fn iqr(&self) -> f64 {
        self.q75 - self.q25
    }
}
