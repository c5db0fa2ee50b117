//! Core data structures for demand forecasting.

mod forecast;
mod time_series;

pub use forecast::{Diagnostic, ForecastResult, Method, ModelDetails, Z_95};
pub use time_series::TimeSeries;
