//! Trailing moving-average forecaster.

use crate::core::{ForecastResult, Method, ModelDetails, TimeSeries, Z_95};
use crate::error::{ForecastError, Result};
use crate::models::traits::{check_inputs, Forecaster};
use crate::utils::stats::{rolling_mean, rolling_std};

/// Moving-average forecaster.
///
/// Fitted values are the trailing rolling mean over `window` days, using
/// however many points are available at the start of the series. The
/// forecast is flat at the last rolling mean, with a band of
/// `1.96 × last rolling standard deviation`.
///
/// # Example
/// ```
/// use restock_forecast::core::TimeSeries;
/// use restock_forecast::models::{Forecaster, MovingAverage};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let ts = TimeSeries::new(start, vec![10.0; 20]);
///
/// let result = MovingAverage::new(7).forecast(&ts, 5).unwrap();
/// assert_eq!(result.forecast().values(), &[10.0; 5]);
/// ```
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
}

impl MovingAverage {
    /// Create a moving average over `window` trailing days.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Get the window size.
    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(7)
    }
}

impl Forecaster for MovingAverage {
    fn forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastResult> {
        if self.window == 0 {
            return Err(ForecastError::InvalidParameter(
                "window must be positive".to_string(),
            ));
        }
        check_inputs(series, horizon, 1)?;

        let values = series.values();
        let means = rolling_mean(values, self.window);
        let stds = rolling_std(values, self.window);

        // Non-empty series guarantees a last element.
        let last_mean = means[means.len() - 1];
        let last_std = stds[stds.len() - 1];

        tracing::debug!(
            window = self.window,
            n = values.len(),
            last_mean,
            last_std,
            "moving average fitted"
        );

        Ok(ForecastResult::from_band(
            series,
            means,
            vec![last_mean; horizon],
            &vec![Z_95 * last_std; horizon],
            ModelDetails::MovingAverage {
                window: self.window,
                last_std,
            },
            Vec::new(),
        ))
    }

    fn method(&self) -> Method {
        Method::MovingAverage
    }

    fn name(&self) -> &str {
        "MovingAverage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values)
    }

    #[test]
    fn constant_series_has_zero_width_band() {
        let ts = make_series(vec![10.0; 20]);
        let result = MovingAverage::new(7).forecast(&ts, 5).unwrap();

        assert_eq!(result.forecast().values(), &[10.0; 5]);
        assert_eq!(result.ci_lower().values(), &[10.0; 5]);
        assert_eq!(result.ci_upper().values(), &[10.0; 5]);
    }

    #[test]
    fn forecast_is_last_window_mean() {
        let ts = make_series((1..=10).map(|i| i as f64).collect());
        let result = MovingAverage::new(3).forecast(&ts, 4).unwrap();

        // mean(8, 9, 10) = 9, sample std = 1
        for &v in result.forecast().values() {
            assert_relative_eq!(v, 9.0, epsilon = 1e-12);
        }
        for &v in result.ci_upper().values() {
            assert_relative_eq!(v, 9.0 + 1.96, epsilon = 1e-12);
        }
        match result.details() {
            ModelDetails::MovingAverage { window, last_std } => {
                assert_eq!(*window, 3);
                assert_relative_eq!(*last_std, 1.0, epsilon = 1e-12);
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn fitted_uses_partial_windows_at_start() {
        let ts = make_series(vec![2.0, 4.0, 6.0, 8.0]);
        let result = MovingAverage::new(3).forecast(&ts, 1).unwrap();
        let fitted = result.fitted().values();

        assert_relative_eq!(fitted[0], 2.0);
        assert_relative_eq!(fitted[1], 3.0);
        assert_relative_eq!(fitted[2], 4.0);
        assert_relative_eq!(fitted[3], 6.0);
    }

    #[test]
    fn lower_band_is_clamped() {
        let ts = make_series(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 9.0]);
        let result = MovingAverage::new(7).forecast(&ts, 3).unwrap();

        assert!(result.ci_lower().values().iter().all(|&v| v == 0.0));
        assert!(result.ci_upper().values()[0] > result.forecast().values()[0]);
    }

    #[test]
    fn single_point_series_forecasts_that_point() {
        let ts = make_series(vec![4.0]);
        let result = MovingAverage::new(7).forecast(&ts, 2).unwrap();
        assert_eq!(result.forecast().values(), &[4.0, 4.0]);
        assert_eq!(result.ci_upper().values(), &[4.0, 4.0]);
    }

    #[test]
    fn zero_window_is_invalid() {
        let ts = make_series(vec![1.0; 5]);
        assert!(matches!(
            MovingAverage::new(0).forecast(&ts, 3),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn empty_series_is_insufficient() {
        let ts = make_series(vec![]);
        assert!(matches!(
            MovingAverage::new(7).forecast(&ts, 3),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
