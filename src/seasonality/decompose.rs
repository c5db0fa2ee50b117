//! Classical additive seasonal decomposition.
//!
//! Splits a series into:
//! - Trend: centered moving average over one period
//! - Seasonal: per-position average of the detrended series, centred on zero
//! - Residual: what remains after removing trend and seasonal

use serde::Serialize;

use crate::core::TimeSeries;

/// Result of a classical decomposition.
///
/// `trend` and `residual` are undefined (NaN, serialized as `null`) for the
/// `period / 2` points at each end of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionResult {
    pub period: usize,
    pub observed: TimeSeries,
    pub trend: TimeSeries,
    pub seasonal: TimeSeries,
    pub residual: TimeSeries,
}

impl DecompositionResult {
    /// Seasonal indices for one full period, starting at the first date.
    pub fn seasonal_indices(&self) -> &[f64] {
        &self.seasonal.values()[..self.period]
    }
}

/// Classical decomposer for a fixed seasonal period.
///
/// # Example
/// ```
/// use restock_forecast::core::TimeSeries;
/// use restock_forecast::seasonality::Decomposer;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let values: Vec<f64> = (0..28).map(|i| if i % 7 == 5 { 20.0 } else { 10.0 }).collect();
/// let ts = TimeSeries::new(start, values);
///
/// let result = Decomposer::new(7).decompose(&ts).unwrap();
/// assert_eq!(result.trend.len(), 28);
/// assert!(result.trend.values()[0].is_nan());
/// ```
#[derive(Debug, Clone)]
pub struct Decomposer {
    period: usize,
}

impl Decomposer {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose `series`; `None` when it holds fewer than two full periods.
    pub fn decompose(&self, series: &TimeSeries) -> Option<DecompositionResult> {
        let m = self.period;
        if m == 0 || series.len() < m.saturating_mul(2) {
            return None;
        }
        let values = series.values();

        let trend = centered_moving_average(values, m);

        let mut sums = vec![0.0; m];
        let mut counts = vec![0usize; m];
        for (i, (y, t)) in values.iter().zip(&trend).enumerate() {
            let detrended = y - t;
            if detrended.is_finite() {
                sums[i % m] += detrended;
                counts[i % m] += 1;
            }
        }
        let averages: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();
        let centre = averages.iter().sum::<f64>() / m as f64;
        let indices: Vec<f64> = averages.iter().map(|a| a - centre).collect();

        let seasonal: Vec<f64> = (0..values.len()).map(|i| indices[i % m]).collect();
        let residual: Vec<f64> = values
            .iter()
            .zip(&trend)
            .zip(&seasonal)
            .map(|((y, t), s)| y - t - s)
            .collect();

        tracing::debug!(period = m, n = values.len(), "series decomposed");

        Some(DecompositionResult {
            period: m,
            observed: series.clone(),
            trend: series.with_values(trend),
            seasonal: series.with_values(seasonal),
            residual: series.with_values(residual),
        })
    }
}

/// Centered moving average of length `period`; even periods use the 2×m
/// filter with half weights on both ends. Ends without a full window are NaN.
fn centered_moving_average(values: &[f64], period: usize) -> Vec<f64> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] /= 2.0;
        w[period] /= 2.0;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;

    (0..values.len())
        .map(|i| {
            if i < half || i + half >= values.len() {
                return f64::NAN;
            }
            values[i - half..=i + half]
                .iter()
                .zip(&weights)
                .map(|(v, w)| v * w)
                .sum()
        })
        .collect()
}
