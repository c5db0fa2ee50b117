//! Baseline forecasting models.
//!
//! Simple methods that serve as benchmarks for more complex models.

mod sma;

pub use sma::MovingAverage;
