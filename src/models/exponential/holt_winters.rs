//! Holt-Winters forecasting model.
//!
//! Also known as triple exponential smoothing, this model handles
//! daily demand with both trend and weekly (or other) seasonality.

use std::time::{Duration, Instant};

use crate::core::{Diagnostic, ForecastResult, Method, ModelDetails, TimeSeries, Z_95};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_inputs, Forecaster};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{aic, mean, residual_std, round_to};

const SMOOTHING_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Holt-Winters forecaster with additive trend and additive seasonality.
///
/// The model equations:
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`
///
/// Seasonality needs at least two full periods of history; shorter series
/// fall back to the trend-only recursion (γ and `s` dropped). Smoothing
/// parameters and initial states are estimated together by minimizing
/// the one-step-ahead sum of squared errors.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Seasonal period.
    seasonal_period: usize,
    /// Optimizer time budget per fit.
    timeout: Option<Duration>,
}

/// Initial states and smoothing parameters for one recursion run.
#[derive(Debug, Clone, PartialEq)]
struct Params {
    alpha: f64,
    beta: f64,
    /// `None` in the trend-only regime.
    gamma: Option<f64>,
    level: f64,
    trend: f64,
    /// One offset per position in the period; empty when non-seasonal.
    seasonals: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Pass {
    fitted: Vec<f64>,
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    sse: f64,
}

impl HoltWinters {
    /// Create a Holt-Winters model for the given seasonal period.
    pub fn new(seasonal_period: usize) -> Self {
        Self {
            seasonal_period,
            timeout: None,
        }
    }

    /// Abort the fit with a `Fitting` error once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the seasonal period.
    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Whether a series of `n` points is fitted with the seasonal component.
    pub fn is_seasonal_for(&self, n: usize) -> bool {
        n >= self.seasonal_period.saturating_mul(2)
    }

    /// Run the recursion from the given initial state.
    fn run(values: &[f64], params: &Params) -> Pass {
        let m = params.seasonals.len();
        let mut level = params.level;
        let mut trend = params.trend;
        let mut seasonals = params.seasonals.clone();
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let season = if m > 0 { seasonals[t % m] } else { 0.0 };
            let prediction = level + trend + season;
            fitted.push(prediction);
            sse += (y - prediction).powi(2);

            let prev_level = level;
            level = params.alpha * (y - season) + (1.0 - params.alpha) * (level + trend);
            trend = params.beta * (level - prev_level) + (1.0 - params.beta) * trend;
            if let Some(gamma) = params.gamma {
                seasonals[t % m] = gamma * (y - level) + (1.0 - gamma) * season;
            }
        }

        Pass {
            fitted,
            level,
            trend,
            seasonals,
            sse,
        }
    }

    /// Classical starting states: first-season mean, average
    /// season-over-season slope and first-season deviations.
    fn initial_params(values: &[f64], period: usize, seasonal: bool) -> Params {
        if seasonal {
            let first = &values[..period];
            let second = &values[period..2 * period];
            let level = mean(first);
            let trend = (mean(second) - level) / period as f64;
            Params {
                alpha: 0.3,
                beta: 0.1,
                gamma: Some(0.1),
                level,
                trend,
                seasonals: first.iter().map(|y| y - level).collect(),
            }
        } else {
            Params {
                alpha: 0.3,
                beta: 0.1,
                gamma: None,
                level: values[0],
                trend: values[1] - values[0],
                seasonals: Vec::new(),
            }
        }
    }

    /// Flatten to optimizer coordinates. The last seasonal offset is
    /// implied by the zero-sum constraint and is not a free coordinate.
    fn encode(params: &Params) -> Vec<f64> {
        let mut x = vec![params.alpha, params.beta];
        if let Some(gamma) = params.gamma {
            x.push(gamma);
        }
        x.push(params.level);
        x.push(params.trend);
        if let Some((_, free)) = params.seasonals.split_last() {
            x.extend_from_slice(free);
        }
        x
    }

    fn decode(x: &[f64], seasonal: bool) -> Params {
        if seasonal {
            let mut seasonals = x[5..].to_vec();
            seasonals.push(-seasonals.iter().sum::<f64>());
            Params {
                alpha: x[0],
                beta: x[1],
                gamma: Some(x[2]),
                level: x[3],
                trend: x[4],
                seasonals,
            }
        } else {
            Params {
                alpha: x[0],
                beta: x[1],
                gamma: None,
                level: x[2],
                trend: x[3],
                seasonals: Vec::new(),
            }
        }
    }

    fn bounds(values: &[f64], period: usize, seasonal: bool) -> Vec<(f64, f64)> {
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = (hi - lo).max(1.0);

        let mut bounds = vec![SMOOTHING_BOUNDS, SMOOTHING_BOUNDS];
        if seasonal {
            bounds.push(SMOOTHING_BOUNDS);
        }
        bounds.push((lo - span, hi + span));
        bounds.push((-span, span));
        if seasonal {
            bounds.extend(std::iter::repeat((-2.0 * span, 2.0 * span)).take(period - 1));
        }
        bounds
    }

    fn optimize(
        &self,
        values: &[f64],
        seasonal: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Params> {
        let initial = Self::initial_params(values, self.seasonal_period, seasonal);
        let start = Self::encode(&initial);
        let bounds = Self::bounds(values, self.seasonal_period, seasonal);

        let config = NelderMeadConfig {
            max_iter: 2000,
            restarts: 2,
            deadline: self.timeout.map(|t| Instant::now() + t),
            ..Default::default()
        };

        let result = nelder_mead(
            |x| Self::run(values, &Self::decode(x, seasonal)).sse,
            &start,
            Some(&bounds),
            config,
        );

        if result.timed_out {
            return Err(ForecastError::Fitting(format!(
                "Holt-Winters optimizer exceeded its time budget after {} iterations",
                result.iterations
            )));
        }
        if !result.optimal_value.is_finite() || result.optimal_point.iter().any(|p| !p.is_finite())
        {
            return Err(ForecastError::Fitting(format!(
                "Holt-Winters optimizer produced a non-finite SSE ({})",
                result.optimal_value
            )));
        }
        if !result.converged {
            diagnostics.push(Diagnostic::OptimizerNotConverged {
                iterations: result.iterations,
                sse: result.optimal_value,
            });
        }

        let params = Self::decode(&result.optimal_point, seasonal);
        let smoothing = [
            ("alpha", Some(params.alpha)),
            ("beta", Some(params.beta)),
            ("gamma", params.gamma),
        ];
        for (name, value) in smoothing {
            if let Some(value) = value {
                if value <= SMOOTHING_BOUNDS.0 || value >= SMOOTHING_BOUNDS.1 {
                    diagnostics.push(Diagnostic::ParameterAtBound { name, value });
                }
            }
        }

        Ok(params)
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self::new(7)
    }
}

impl Forecaster for HoltWinters {
    fn forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastResult> {
        if self.seasonal_period == 0 {
            return Err(ForecastError::InvalidParameter(
                "seasonal_period must be positive".to_string(),
            ));
        }
        check_inputs(series, horizon, 2)?;

        let values = series.values();
        let seasonal = self.is_seasonal_for(values.len());

        let mut diagnostics = Vec::new();
        let params = self.optimize(values, seasonal, &mut diagnostics)?;
        let pass = Self::run(values, &params);

        let n = values.len();
        let m = pass.seasonals.len();
        let point: Vec<f64> = (1..=horizon)
            .map(|h| {
                let season = if m > 0 {
                    pass.seasonals[(n + h - 1) % m]
                } else {
                    0.0
                };
                pass.level + h as f64 * pass.trend + season
            })
            .collect();

        let residuals: Vec<f64> = values
            .iter()
            .zip(&pass.fitted)
            .map(|(y, f)| y - f)
            .collect();
        let sigma = residual_std(&residuals);

        // alpha, beta, level, trend; plus gamma and m - 1 free seasonals
        let k = if seasonal { 5 + m - 1 } else { 4 };
        let aic = aic(pass.sse, n, k);

        for d in &diagnostics {
            tracing::warn!(model = "holt_winters", diagnostic = ?d, "fit diagnostic");
        }
        tracing::debug!(
            seasonal,
            alpha = params.alpha,
            beta = params.beta,
            gamma = ?params.gamma,
            sse = pass.sse,
            aic,
            "holt-winters fitted"
        );

        Ok(ForecastResult::from_band(
            series,
            pass.fitted,
            point,
            &vec![Z_95 * sigma; horizon],
            ModelDetails::HoltWinters {
                seasonal,
                seasonal_period: self.seasonal_period,
                alpha: round_to(params.alpha, 4),
                beta: round_to(params.beta, 4),
                gamma: params.gamma.map(|g| round_to(g, 4)),
                final_level: pass.level,
                final_trend: pass.trend,
                aic,
            },
            diagnostics,
        ))
    }

    fn method(&self) -> Method {
        Method::HoltWinters
    }

    fn name(&self) -> &str {
        "HoltWinters"
    }
}
