//! # restock-forecast
//!
//! Per-SKU demand forecasting and inventory restocking recommendations.
//!
//! Provides moving-average, simple exponential smoothing and Holt-Winters
//! forecasters over daily sales series, classical seasonal decomposition,
//! accuracy metrics and a reorder calculator, composed by
//! [`orchestrator::ForecastOrchestrator`].

pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod models;
pub mod orchestrator;
pub mod preparation;
pub mod restock;
pub mod seasonality;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{ForecastResult, Method, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{Forecaster, HoltWinters, MovingAverage, SimpleExponentialSmoothing};
    pub use crate::orchestrator::{ForecastOrchestrator, ForecastReport, ForecastRequest};
    pub use crate::preparation::{prepare, Observation};
    pub use crate::restock::{recommend, RestockRecommendation};
    pub use crate::utils::{evaluate, EvaluationMetrics};
}
