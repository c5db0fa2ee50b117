//! Forecasting models.

mod traits;

pub mod baseline;
pub mod exponential;

pub use baseline::MovingAverage;
pub use exponential::{HoltWinters, SimpleExponentialSmoothing};
pub use traits::{BoxedForecaster, Forecaster};
