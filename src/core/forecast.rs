//! Forecast result structure shared by all models.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// z-score of the two-sided 95% normal interval.
pub const Z_95: f64 = 1.96;

/// Forecasting method selector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    MovingAverage,
    Ses,
    #[default]
    HoltWinters,
}

impl Method {
    /// All methods, in reporting order.
    pub const ALL: [Method; 3] = [Method::MovingAverage, Method::Ses, Method::HoltWinters];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::MovingAverage => "moving_average",
            Method::Ses => "ses",
            Method::HoltWinters => "holt_winters",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "moving_average" | "ma" => Ok(Method::MovingAverage),
            "ses" | "exponential_smoothing" => Ok(Method::Ses),
            "holt_winters" | "hw" => Ok(Method::HoltWinters),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown method \"{other}\", expected moving_average, ses or holt_winters"
            ))),
        }
    }
}

/// Model-specific metadata, one variant per method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ModelDetails {
    MovingAverage {
        window: usize,
        /// Rolling standard deviation of the last window.
        last_std: f64,
    },
    Ses {
        /// Smoothing coefficient, rounded to 4 decimals.
        alpha: f64,
        /// Whether alpha was optimized rather than supplied.
        optimized: bool,
        initial_level: f64,
        /// Smoothed level after the last observation.
        final_level: f64,
        aic: f64,
    },
    HoltWinters {
        seasonal: bool,
        seasonal_period: usize,
        alpha: f64,
        beta: f64,
        /// Seasonal smoothing coefficient; `None` in the trend-only regime.
        gamma: Option<f64>,
        final_level: f64,
        final_trend: f64,
        aic: f64,
    },
}

impl ModelDetails {
    pub fn method(&self) -> Method {
        match self {
            ModelDetails::MovingAverage { .. } => Method::MovingAverage,
            ModelDetails::Ses { .. } => Method::Ses,
            ModelDetails::HoltWinters { .. } => Method::HoltWinters,
        }
    }

    pub fn aic(&self) -> Option<f64> {
        match self {
            ModelDetails::MovingAverage { .. } => None,
            ModelDetails::Ses { aic, .. } | ModelDetails::HoltWinters { aic, .. } => Some(*aic),
        }
    }
}

/// Numerical warnings raised while fitting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The optimizer hit its iteration cap before meeting tolerance.
    OptimizerNotConverged { iterations: usize, sse: f64 },
    /// A parameter settled on its bound.
    ParameterAtBound { name: &'static str, value: f64 },
    /// The model extrapolated below zero demand on `count` horizon steps.
    NegativeForecast { count: usize },
}

/// An immutable forecast produced by one model.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    method: Method,
    fitted: TimeSeries,
    forecast: TimeSeries,
    ci_lower: TimeSeries,
    ci_upper: TimeSeries,
    details: ModelDetails,
    diagnostics: Vec<Diagnostic>,
}

impl ForecastResult {
    /// Assemble a result from point forecasts and a symmetric band.
    ///
    /// Lower bounds are clamped at zero; point forecasts are kept as the
    /// model produced them. `half_width` holds one band half-width per
    /// horizon step.
    pub(crate) fn from_band(
        series: &TimeSeries,
        fitted: Vec<f64>,
        point: Vec<f64>,
        half_width: &[f64],
        details: ModelDetails,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Self {
        debug_assert_eq!(fitted.len(), series.len());
        debug_assert_eq!(point.len(), half_width.len());

        let negative = point.iter().filter(|&&p| p < 0.0).count();
        if negative > 0 {
            diagnostics.push(Diagnostic::NegativeForecast { count: negative });
        }

        let lower: Vec<f64> = point
            .iter()
            .zip(half_width)
            .map(|(p, w)| (p - w).max(0.0))
            .collect();
        // The upper bound never drops below the clamped lower bound.
        let upper = point
            .iter()
            .zip(half_width)
            .zip(&lower)
            .map(|((p, w), lo)| (p + w).max(*lo))
            .collect();

        Self {
            method: details.method(),
            fitted: series.with_values(fitted),
            ci_lower: series.continuation(lower),
            ci_upper: series.continuation(upper),
            forecast: series.continuation(point),
            details,
            diagnostics,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// In-sample fitted values aligned to the input series.
    pub fn fitted(&self) -> &TimeSeries {
        &self.fitted
    }

    /// Point forecasts for the days following the input series.
    pub fn forecast(&self) -> &TimeSeries {
        &self.forecast
    }

    pub fn ci_lower(&self) -> &TimeSeries {
        &self.ci_lower
    }

    pub fn ci_upper(&self) -> &TimeSeries {
        &self.ci_upper
    }

    pub fn details(&self) -> &ModelDetails {
        &self.details
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Forecast horizon (number of future days).
    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }

    pub fn aic(&self) -> Option<f64> {
        self.details.aic()
    }
}
