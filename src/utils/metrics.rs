//! Accuracy metrics for forecast evaluation.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::utils::stats::round_to;
use serde::Serialize;

/// Guards MAPE against zero-demand days.
const MAPE_EPSILON: f64 = 1e-9;

/// Accuracy of fitted or forecast values against actuals, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
    /// Number of points the metrics were computed over
    pub points: usize,
}

/// Compare `actual` against `fitted` on the dates both cover.
///
/// Only dates where both values are defined (finite) count; the two series
/// may start on different days.
///
/// # Errors
/// `EmptyEvaluation` if no such date exists.
pub fn evaluate(actual: &TimeSeries, fitted: &TimeSeries) -> Result<EvaluationMetrics> {
    let (a, f): (Vec<f64>, Vec<f64>) = fitted
        .iter()
        .filter(|(_, f)| f.is_finite())
        .filter_map(|(date, f)| actual.get(date).filter(|a| a.is_finite()).map(|a| (a, f)))
        .unzip();

    calculate_metrics(&a, &f)
}

/// Calculate metrics between two aligned slices.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "expected {} predictions, got {}",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(ForecastError::EmptyEvaluation);
    }

    Ok(EvaluationMetrics {
        mae: round_to(mae(actual, predicted), 2),
        rmse: round_to(rmse(actual, predicted), 2),
        mape: round_to(mape(actual, predicted), 2),
        points: actual.len(),
    })
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Calculate MAPE (percent), with a small epsilon in the denominator.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs() / (a + MAPE_EPSILON))
        .sum();
    100.0 * sum / actual.len() as f64
}
