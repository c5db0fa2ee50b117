//! Simple Exponential Smoothing (SES) forecasting model.
//!
//! SES is suitable for demand with no clear trend or seasonality.

use std::time::{Duration, Instant};

use crate::core::{Diagnostic, ForecastResult, Method, ModelDetails, TimeSeries, Z_95};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_inputs, Forecaster};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{aic, mean, residual_std, round_to};

const ALPHA_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Coarse alpha grid searched before Nelder-Mead refinement.
const ALPHA_GRID_STEPS: usize = 19;

/// Points averaged for the initial level guess.
const INIT_POINTS: usize = 10;

/// Simple Exponential Smoothing forecaster.
///
/// The model equation is:
/// `level_t = α × y_t + (1-α) × level_{t-1}`
///
/// where α (alpha) is the smoothing parameter (0 < α < 1). The initial
/// level is always estimated by minimizing the one-step-ahead sum of
/// squared errors; alpha is estimated jointly unless fixed.
///
/// # Example
/// ```
/// use restock_forecast::core::TimeSeries;
/// use restock_forecast::models::exponential::SimpleExponentialSmoothing;
/// use restock_forecast::models::Forecaster;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let values = vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0, 14.0, 16.0];
/// let ts = TimeSeries::new(start, values);
///
/// let result = SimpleExponentialSmoothing::new(0.3).forecast(&ts, 3).unwrap();
/// assert_eq!(result.horizon(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleExponentialSmoothing {
    /// Fixed smoothing parameter; `None` means optimize.
    alpha: Option<f64>,
    /// Optimizer time budget per fit.
    timeout: Option<Duration>,
}

/// Smoothing pass over a series for given parameters.
#[derive(Debug, Clone)]
struct SmoothingPass {
    fitted: Vec<f64>,
    final_level: f64,
    sse: f64,
}

impl SimpleExponentialSmoothing {
    /// Create a new SES model with a fixed smoothing parameter.
    ///
    /// # Arguments
    /// * `alpha` - Smoothing parameter, clamped into (0, 1)
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: Some(alpha.clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1)),
            timeout: None,
        }
    }

    /// Create a new SES model with automatic alpha optimization.
    pub fn auto() -> Self {
        Self {
            alpha: None,
            timeout: None,
        }
    }

    /// Create from an optional caller-supplied alpha.
    pub fn with_alpha(alpha: Option<f64>) -> Self {
        alpha.map_or_else(Self::auto, Self::new)
    }

    /// Abort the fit with a `Fitting` error once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the fixed smoothing parameter, if any.
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    fn smooth(values: &[f64], alpha: f64, initial_level: f64) -> SmoothingPass {
        let mut level = initial_level;
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for &y in values {
            fitted.push(level);
            let error = y - level;
            sse += error * error;
            level = alpha * y + (1.0 - alpha) * level;
        }

        SmoothingPass {
            fitted,
            final_level: level,
            sse,
        }
    }

    fn calculate_sse(values: &[f64], alpha: f64, initial_level: f64) -> f64 {
        Self::smooth(values, alpha, initial_level).sse
    }

    /// Best alpha on a coarse grid, used to seed the simplex.
    fn grid_alpha(values: &[f64], initial_level: f64) -> f64 {
        (1..=ALPHA_GRID_STEPS)
            .map(|i| i as f64 / (ALPHA_GRID_STEPS + 1) as f64)
            .map(|alpha| (alpha, Self::calculate_sse(values, alpha, initial_level)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(alpha, _)| alpha)
            .unwrap_or(0.5)
    }

    /// Estimate `(alpha, initial_level)`.
    fn optimize(
        &self,
        values: &[f64],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(f64, f64)> {
        let level_guess = mean(&values[..values.len().min(INIT_POINTS)]);
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let config = NelderMeadConfig {
            max_iter: 500,
            deadline: self.timeout.map(|t| Instant::now() + t),
            ..Default::default()
        };

        let (alpha, level, result) = match self.alpha {
            Some(alpha) => {
                let result = nelder_mead(
                    |p| Self::calculate_sse(values, alpha, p[0]),
                    &[level_guess],
                    Some(&[(lo, hi)]),
                    config,
                );
                (alpha, result.optimal_point[0], result)
            }
            None => {
                let seed = Self::grid_alpha(values, level_guess);
                let result = nelder_mead(
                    |p| Self::calculate_sse(values, p[0], p[1]),
                    &[seed, level_guess],
                    Some(&[ALPHA_BOUNDS, (lo, hi)]),
                    config,
                );
                let alpha = result.optimal_point[0].clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1);
                (alpha, result.optimal_point[1], result)
            }
        };

        if result.timed_out {
            return Err(ForecastError::Fitting(format!(
                "SES optimizer exceeded its time budget after {} iterations",
                result.iterations
            )));
        }
        if !result.optimal_value.is_finite() || !alpha.is_finite() || !level.is_finite() {
            return Err(ForecastError::Fitting(format!(
                "SES optimizer produced non-finite parameters (alpha={alpha}, level={level})"
            )));
        }
        if !result.converged {
            diagnostics.push(Diagnostic::OptimizerNotConverged {
                iterations: result.iterations,
                sse: result.optimal_value,
            });
        }
        if self.alpha.is_none() && (alpha <= ALPHA_BOUNDS.0 || alpha >= ALPHA_BOUNDS.1) {
            diagnostics.push(Diagnostic::ParameterAtBound {
                name: "alpha",
                value: alpha,
            });
        }

        Ok((alpha, level))
    }
}

impl Default for SimpleExponentialSmoothing {
    fn default() -> Self {
        Self::auto()
    }
}

impl Forecaster for SimpleExponentialSmoothing {
    fn forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastResult> {
        check_inputs(series, horizon, 2)?;
        let values = series.values();

        let mut diagnostics = Vec::new();
        let (alpha, initial_level) = self.optimize(values, &mut diagnostics)?;
        let pass = Self::smooth(values, alpha, initial_level);

        let residuals: Vec<f64> = values
            .iter()
            .zip(&pass.fitted)
            .map(|(y, f)| y - f)
            .collect();
        let sigma = residual_std(&residuals);

        // alpha (when estimated) plus the initial level
        let k = usize::from(self.alpha.is_none()) + 1;
        let aic = aic(pass.sse, values.len(), k);

        for d in &diagnostics {
            tracing::warn!(model = "ses", diagnostic = ?d, "fit diagnostic");
        }
        tracing::debug!(
            alpha,
            initial_level,
            final_level = pass.final_level,
            sse = pass.sse,
            aic,
            "ses fitted"
        );

        Ok(ForecastResult::from_band(
            series,
            pass.fitted,
            vec![pass.final_level; horizon],
            &vec![Z_95 * sigma; horizon],
            ModelDetails::Ses {
                alpha: round_to(alpha, 4),
                optimized: self.alpha.is_none(),
                initial_level,
                final_level: pass.final_level,
                aic,
            },
            diagnostics,
        ))
    }

    fn method(&self) -> Method {
        Method::Ses
    }

    fn name(&self) -> &str {
        "SimpleExponentialSmoothing"
    }
}
