//! Exponential smoothing models.
//!
//! This module provides exponential smoothing forecasting methods:
//! - Simple Exponential Smoothing (SES)
//! - Holt-Winters (additive trend, additive seasonality)

mod holt_winters;
mod ses;

pub use holt_winters::HoltWinters;
pub use ses::SimpleExponentialSmoothing;
