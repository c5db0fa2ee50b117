//! Error types for the restock-forecast library.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during forecasting operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Series shorter than the operation's minimum.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Numerical optimization failed or produced non-finite parameters.
    #[error("fitting failed: {0}")]
    Fitting(String),

    /// No overlapping defined points between actual and fitted values.
    #[error("no overlapping defined points to evaluate")]
    EmptyEvaluation,

    /// Out-of-range scalar input.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be loaded or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// Serializing a result failed.
    #[error("export error: {0}")]
    Export(String),
}

/// Coarse error category, stable across releases.
///
/// Service layers map these to client-facing messages instead of echoing
/// the numerical detail carried by [`ForecastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    Fitting,
    EmptyEvaluation,
    InvalidParameter,
    Config,
    Export,
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::InsufficientData { .. } => ErrorKind::InsufficientData,
            ForecastError::Fitting(_) => ErrorKind::Fitting,
            ForecastError::EmptyEvaluation => ErrorKind::EmptyEvaluation,
            ForecastError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            ForecastError::Config(_) => ErrorKind::Config,
            ForecastError::Export(_) => ErrorKind::Export,
        }
    }

    /// Message suitable for showing to an end user.
    pub fn client_message(&self) -> String {
        match self {
            ForecastError::InsufficientData { needed, got } => {
                format!("insufficient data: need at least {needed} days, got {got}")
            }
            ForecastError::InvalidParameter(msg) => format!("invalid request: {msg}"),
            ForecastError::EmptyEvaluation => "accuracy metrics unavailable".to_string(),
            ForecastError::Fitting(_) | ForecastError::Config(_) | ForecastError::Export(_) => {
                "internal computation failure".to_string()
            }
        }
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Export(err.to_string())
    }
}
