//! TOML-based engine configuration and request defaults.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::Method;
use crate::error::{ForecastError, Result};

/// Top-level engine configuration parsed from TOML.
///
/// Every field has a default, so an empty document is a valid
/// configuration. Load with [`EngineConfig::load`] to parse and validate
/// in one step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Defaults for forecast requests.
    #[serde(default)]
    pub forecast: ForecastDefaults,
    /// Defaults for restock recommendations.
    #[serde(default)]
    pub restock: RestockDefaults,
    /// Train/test split and minimum history.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Worker pool and optimizer budget.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Defaults for forecast requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastDefaults {
    /// Days to forecast (must be > 0).
    pub horizon: usize,
    /// Seasonal period in days (must be > 0).
    pub seasonal_period: usize,
    /// Moving-average window in days (must be > 0).
    pub window: usize,
    /// Method whose forecast drives the restock recommendation.
    pub method: Method,
}

impl Default for ForecastDefaults {
    fn default() -> Self {
        Self {
            horizon: 30,
            seasonal_period: 7,
            window: 7,
            method: Method::HoltWinters,
        }
    }
}

/// Defaults for restock recommendations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestockDefaults {
    /// Units on hand when the caller does not supply a count.
    pub current_stock: f64,
    /// Supplier lead time in days.
    pub lead_time_days: u32,
    /// Multiplier on forecast demand (must be >= 1.0).
    pub safety_factor: f64,
}

impl Default for RestockDefaults {
    fn default() -> Self {
        Self {
            current_stock: 300.0,
            lead_time_days: 7,
            safety_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Upper bound on the held-out tail length in days.
    pub test_split_days: usize,
    /// Shortest history accepted for a forecast.
    pub min_observations: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_split_days: 30,
            min_observations: 14,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Per-fit optimizer budget in milliseconds; unlimited when absent.
    pub fit_timeout_ms: Option<u64>,
    /// Store sweep worker threads; CPU count when absent.
    pub workers: Option<usize>,
}

impl RuntimeConfig {
    pub fn fit_timeout(&self) -> Option<Duration> {
        self.fit_timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.horizon"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl EngineConfig {
    /// Parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::Config` listing every problem found.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::from_toml_file(path).map_err(|e| ForecastError::Config(e.to_string()))?;
        config.validated()
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: usize| {
            if value == 0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be > 0".into(),
                });
            }
        };

        let f = &self.forecast;
        positive("forecast.horizon", f.horizon);
        positive("forecast.seasonal_period", f.seasonal_period);
        positive("forecast.window", f.window);
        positive("evaluation.min_observations", self.evaluation.min_observations);
        if let Some(workers) = self.runtime.workers {
            positive("runtime.workers", workers);
        }

        let r = &self.restock;
        if !r.current_stock.is_finite() || r.current_stock < 0.0 {
            errors.push(ConfigError {
                field: "restock.current_stock".into(),
                message: "must be >= 0".into(),
            });
        }
        if !r.safety_factor.is_finite() || r.safety_factor < 1.0 {
            errors.push(ConfigError {
                field: "restock.safety_factor".into(),
                message: "must be >= 1.0".into(),
            });
        }

        if self.runtime.fit_timeout_ms == Some(0) {
            errors.push(ConfigError {
                field: "runtime.fit_timeout_ms".into(),
                message: "must be > 0 when set".into(),
            });
        }

        errors
    }

    /// Returns `self` if valid, otherwise every validation error joined.
    pub fn validated(self) -> Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(self);
        }
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        Err(ForecastError::Config(joined.join("; ")))
    }
}
