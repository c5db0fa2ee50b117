//! Seasonality decomposition.
//!
//! Classical additive decomposition of a daily series into trend, seasonal
//! and residual components.

mod decompose;

pub use decompose::{DecompositionResult, Decomposer};
