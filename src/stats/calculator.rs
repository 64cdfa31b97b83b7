//! Statistics Calculator Module
//! Descriptive statistics for the value column of a selection.

use crate::data::Dataset;
use polars::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Confidence level used for the interval around the mean.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Summary of the numeric values in a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p95: f64,
    /// Two-sided t-interval of the mean; `None` below two values.
    pub mean_ci: Option<(f64, f64)>,
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Summarize `value_col`, ignoring nulls and NaN. `None` when the column
    /// is absent or holds no numeric values.
    pub fn summarize(dataset: &Dataset, value_col: &str) -> Option<ValueSummary> {
        if !dataset.has_column(value_col) {
            return None;
        }
        let values = Self::numeric_values(dataset.frame(), value_col);
        Self::compute_descriptive_stats(&values)
    }

    /// Non-null, non-NaN values of a column as f64.
    pub fn numeric_values(df: &DataFrame, column: &str) -> Vec<f64> {
        df.column(column)
            .and_then(|c| c.cast(&DataType::Float64))
            .ok()
            .map(|c| {
                c.f64()
                    .ok()
                    .map(|ca| ca.into_iter().flatten().filter(|v| !v.is_nan()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> Option<ValueSummary> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std = variance.sqrt();

        Some(ValueSummary {
            count: n,
            mean,
            median,
            std,
            min: sorted[0],
            max: sorted[n - 1],
            p05: Self::percentile(&sorted, 5.0),
            p95: Self::percentile(&sorted, 95.0),
            mean_ci: Self::mean_confidence_interval(mean, std, n),
        })
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Student's t interval around the sample mean.
    fn mean_confidence_interval(mean: f64, std: f64, n: usize) -> Option<(f64, f64)> {
        if n < 2 {
            return None;
        }
        let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64).ok()?;
        let t = dist.inverse_cdf(1.0 - (1.0 - CONFIDENCE_LEVEL) / 2.0);
        let half_width = t * std / (n as f64).sqrt();
        Some((mean - half_width, mean + half_width))
    }
}
