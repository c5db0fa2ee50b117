//! Forecaster trait defining the common interface for all models.

use crate::core::{ForecastResult, Method, TimeSeries};
use crate::error::{ForecastError, Result};

/// Common interface for all forecasting models.
///
/// Models hold configuration only: every call fits from scratch on the
/// given series and returns an immutable [`ForecastResult`]. The trait is
/// object-safe and thread-safe so the orchestrator can fan fits out to a
/// worker pool.
pub trait Forecaster: Send + Sync {
    /// Fit on `series` and forecast `horizon` days past its end.
    fn forecast(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastResult>;

    /// The method this model implements.
    fn method(&self) -> Method;

    /// Get the model name.
    fn name(&self) -> &str;
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use restock_forecast::models::{BoxedForecaster, Forecaster, MovingAverage};
///
/// let model: BoxedForecaster = Box::new(MovingAverage::new(7));
/// assert_eq!(model.name(), "MovingAverage");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// Shared argument checks for every model.
pub(crate) fn check_inputs(series: &TimeSeries, horizon: usize, min_len: usize) -> Result<()> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "horizon must be positive".to_string(),
        ));
    }
    if series.len() < min_len {
        return Err(ForecastError::InsufficientData {
            needed: min_len,
            got: series.len(),
        });
    }
    if let Some((date, value)) = series.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "series value on {date} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exponential::{HoltWinters, SimpleExponentialSmoothing};
    use crate::models::MovingAverage;
    use chrono::NaiveDate;

    fn make_test_series(n: usize) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        TimeSeries::new(start, (1..=n).map(|i| i as f64).collect())
    }

    #[test]
    fn boxed_forecasters_share_one_interface() {
        let models: Vec<BoxedForecaster> = vec![
            Box::new(MovingAverage::new(7)),
            Box::new(SimpleExponentialSmoothing::auto()),
            Box::new(HoltWinters::new(7)),
        ];
        let ts = make_test_series(30);

        for model in &models {
            let result = model.forecast(&ts, 5).unwrap();
            assert_eq!(result.horizon(), 5);
            assert_eq!(result.method(), model.method());
            assert_eq!(result.fitted().len(), ts.len());
        }
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let ts = make_test_series(20);
        let err = check_inputs(&ts, 0, 1).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn negative_values_are_rejected() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let ts = TimeSeries::new(start, vec![1.0, -2.0, 3.0]);
        let err = check_inputs(&ts, 3, 1).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn short_series_is_insufficient() {
        let ts = make_test_series(1);
        assert_eq!(
            check_inputs(&ts, 3, 2),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        );
    }
}
