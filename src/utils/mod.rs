//! Utility functions for forecasting models.

pub mod metrics;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, evaluate, EvaluationMetrics};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
