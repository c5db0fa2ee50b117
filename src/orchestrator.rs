//! Per-SKU forecast pipeline and the store-wide restock sweep.
//!
//! [`ForecastOrchestrator::run`] fits every model twice: once on a training
//! head of the history (for accuracy metrics) and once on the full history
//! (for the production forecast). A model that fails is reported in
//! [`ForecastReport::failures`] without affecting the others.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::config::EngineConfig;
use crate::core::{ForecastResult, Method, ModelDetails, TimeSeries};
use crate::error::{ErrorKind, ForecastError, Result};
use crate::models::{BoxedForecaster, HoltWinters, MovingAverage, SimpleExponentialSmoothing};
use crate::preparation::{prepare, Observation};
use crate::restock::{recommend, RestockRecommendation};
use crate::seasonality::{DecompositionResult, Decomposer};
use crate::utils::metrics::{evaluate, EvaluationMetrics};

/// Parameters for one SKU forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRequest {
    pub horizon: usize,
    /// Method whose forecast drives the restock recommendation.
    pub method: Method,
    pub window: usize,
    pub seasonal_period: usize,
    pub current_stock: f64,
    pub lead_time_days: u32,
    pub safety_factor: f64,
    /// Fixed SES coefficient; optimized when `None`.
    pub ses_alpha: Option<f64>,
}

impl ForecastRequest {
    /// Request populated from configured defaults.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            horizon: config.forecast.horizon,
            method: config.forecast.method,
            window: config.forecast.window,
            seasonal_period: config.forecast.seasonal_period,
            current_stock: config.restock.current_stock,
            lead_time_days: config.restock.lead_time_days,
            safety_factor: config.restock.safety_factor,
            ses_alpha: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_stock(mut self, current_stock: f64, lead_time_days: u32) -> Self {
        self.current_stock = current_stock;
        self.lead_time_days = lead_time_days;
        self
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("horizon", self.horizon),
            ("window", self.window),
            ("seasonal_period", self.seasonal_period),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ForecastError::InvalidParameter(format!(
                "{name} must be positive"
            )));
        }
        if !self.current_stock.is_finite() || self.current_stock < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "current_stock must be a non-negative number, got {}",
                self.current_stock
            )));
        }
        if !self.safety_factor.is_finite() || self.safety_factor < 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "safety_factor must be at least 1.0, got {}",
                self.safety_factor
            )));
        }
        if let Some(alpha) = self.ses_alpha {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "ses_alpha must lie in (0, 1), got {alpha}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Which series a failed fit was run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStage {
    /// Training head, used for metrics.
    Train,
    /// Full history, used for the forecast.
    Full,
}

/// A model that failed within an otherwise successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodFailure {
    pub method: Method,
    pub stage: FitStage,
    pub kind: ErrorKind,
    /// Client-safe description; the underlying error stays in [`error`](Self::error).
    pub message: String,
    #[serde(skip)]
    error: ForecastError,
}

impl MethodFailure {
    fn new(method: Method, stage: FitStage, error: ForecastError) -> Self {
        Self {
            method,
            stage,
            kind: error.kind(),
            message: error.client_message(),
            error,
        }
    }

    pub fn error(&self) -> &ForecastError {
        &self.error
    }
}

/// Everything produced for one SKU.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub request: ForecastRequest,
    pub historical: TimeSeries,
    /// Forecast of the requested method; `None` when it failed.
    pub forecast: Option<TimeSeries>,
    pub ci_lower: Option<TimeSeries>,
    pub ci_upper: Option<TimeSeries>,
    /// Full-history forecast of every method that fitted.
    pub all_forecasts: BTreeMap<Method, TimeSeries>,
    /// Full history against training-fit values, for SES and Holt-Winters.
    pub metrics: BTreeMap<Method, EvaluationMetrics>,
    /// Held-out tail against each training forecast.
    pub holdout_metrics: BTreeMap<Method, EvaluationMetrics>,
    pub restock: Option<RestockRecommendation>,
    pub failures: Vec<MethodFailure>,
    /// SES smoothing coefficient of the full-history fit.
    pub alpha: Option<f64>,
    /// Whether the full-history Holt-Winters fit used seasonality.
    pub seasonal: Option<bool>,
    pub train_size: usize,
    pub test_size: usize,
    #[serde(skip)]
    results: BTreeMap<Method, ForecastResult>,
}

impl ForecastReport {
    /// Full-history result of `method`, if it fitted.
    pub fn result(&self, method: Method) -> Option<&ForecastResult> {
        self.results.get(&method)
    }

    /// Result of the requested method, if it fitted.
    pub fn selected(&self) -> Option<&ForecastResult> {
        self.result(self.request.method)
    }

    pub fn failed(&self, method: Method) -> bool {
        self.failures.iter().any(|f| f.method == method)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One SKU in a store sweep.
#[derive(Debug, Clone)]
pub struct SweepItem {
    pub sku: String,
    pub series: TimeSeries,
    /// Falls back to the configured default when `None`.
    pub current_stock: Option<f64>,
    /// Falls back to the configured default when `None`.
    pub lead_time_days: Option<u32>,
}

impl SweepItem {
    pub fn new(sku: impl Into<String>, series: TimeSeries) -> Self {
        Self {
            sku: sku.into(),
            series,
            current_stock: None,
            lead_time_days: None,
        }
    }

    pub fn with_stock(mut self, current_stock: f64, lead_time_days: u32) -> Self {
        self.current_stock = Some(current_stock);
        self.lead_time_days = Some(lead_time_days);
        self
    }
}

/// Restock advice for one SKU of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuRecommendation {
    pub sku: String,
    #[serde(flatten)]
    pub recommendation: RestockRecommendation,
}

/// A SKU that produced no recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSku {
    pub sku: String,
    pub reason: String,
}

/// Store-wide restock summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// In input order.
    pub recommendations: Vec<SkuRecommendation>,
    pub low_stock_count: usize,
    pub low_stock_skus: Vec<String>,
    pub skipped: Vec<SkippedSku>,
}

impl SweepReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

enum SweepOutcome {
    Recommended(SkuRecommendation),
    Skipped(SkippedSku),
}

type Fits = BTreeMap<Method, Result<ForecastResult>>;

/// Composes preparation, models, evaluation and restock advice.
#[derive(Debug, Clone, Default)]
pub struct ForecastOrchestrator {
    config: EngineConfig,
}

impl ForecastOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A request carrying this orchestrator's configured defaults.
    pub fn default_request(&self) -> ForecastRequest {
        ForecastRequest::from_config(&self.config)
    }

    fn model(&self, method: Method, request: &ForecastRequest) -> BoxedForecaster {
        let timeout = self.config.runtime.fit_timeout();
        match method {
            Method::MovingAverage => Box::new(MovingAverage::new(request.window)),
            Method::Ses => Box::new(
                SimpleExponentialSmoothing::with_alpha(request.ses_alpha).with_timeout(timeout),
            ),
            Method::HoltWinters => {
                Box::new(HoltWinters::new(request.seasonal_period).with_timeout(timeout))
            }
        }
    }

    fn fit(
        &self,
        method: Method,
        series: &TimeSeries,
        request: &ForecastRequest,
    ) -> Result<ForecastResult> {
        self.model(method, request).forecast(series, request.horizon)
    }

    /// Fit all three models on `series`, in parallel.
    fn fit_all(&self, series: &TimeSeries, request: &ForecastRequest) -> Fits {
        let (ma, (ses, hw)) = rayon::join(
            || self.fit(Method::MovingAverage, series, request),
            || {
                rayon::join(
                    || self.fit(Method::Ses, series, request),
                    || self.fit(Method::HoltWinters, series, request),
                )
            },
        );
        BTreeMap::from([
            (Method::MovingAverage, ma),
            (Method::Ses, ses),
            (Method::HoltWinters, hw),
        ])
    }

    /// Forecast one SKU from its daily history.
    ///
    /// # Errors
    /// `InvalidParameter` for a malformed request and `InsufficientData`
    /// for a history shorter than `min_observations`. Individual model
    /// failures are reported in the returned report instead.
    #[instrument(skip_all, fields(n = series.len(), method = %request.method))]
    pub fn run(&self, series: &TimeSeries, request: &ForecastRequest) -> Result<ForecastReport> {
        request.validate()?;
        let min_obs = self.config.evaluation.min_observations;
        if series.len() < min_obs {
            return Err(ForecastError::InsufficientData {
                needed: min_obs,
                got: series.len(),
            });
        }

        let test_days = self.config.evaluation.test_split_days.min(series.len() / 4);
        let (train, test) = series.split_at(series.len() - test_days);

        let (train_fits, full_fits) = rayon::join(
            || self.fit_all(&train, request),
            || self.fit_all(series, request),
        );

        let mut failures = Vec::new();
        let mut train_results = BTreeMap::new();
        for (method, fit) in train_fits {
            match fit {
                Ok(result) => {
                    train_results.insert(method, result);
                }
                Err(e) => failures.push(MethodFailure::new(method, FitStage::Train, e)),
            }
        }
        let mut results = BTreeMap::new();
        for (method, fit) in full_fits {
            match fit {
                Ok(result) => {
                    results.insert(method, result);
                }
                Err(e) => failures.push(MethodFailure::new(method, FitStage::Full, e)),
            }
        }
        for failure in &failures {
            tracing::warn!(
                method = %failure.method,
                stage = ?failure.stage,
                error = %failure.error,
                "model fit failed"
            );
        }

        let mut metrics = BTreeMap::new();
        let mut holdout_metrics = BTreeMap::new();
        for (method, result) in &train_results {
            if matches!(method, Method::Ses | Method::HoltWinters) {
                match evaluate(series, result.fitted()) {
                    Ok(m) => {
                        metrics.insert(*method, m);
                    }
                    Err(e) => {
                        tracing::warn!(method = %method, error = %e, "in-sample evaluation skipped")
                    }
                }
            }
            if !test.is_empty() {
                if let Ok(m) = evaluate(&test, result.forecast()) {
                    holdout_metrics.insert(*method, m);
                }
            }
        }

        let selected = results.get(&request.method);
        let restock = selected
            .map(|r| {
                recommend(
                    r.forecast(),
                    request.current_stock,
                    request.lead_time_days,
                    request.safety_factor,
                )
            })
            .transpose()?;

        let alpha = results.get(&Method::Ses).and_then(|r| match r.details() {
            ModelDetails::Ses { alpha, .. } => Some(*alpha),
            _ => None,
        });
        let seasonal = results
            .get(&Method::HoltWinters)
            .and_then(|r| match r.details() {
                ModelDetails::HoltWinters { seasonal, .. } => Some(*seasonal),
                _ => None,
            });

        tracing::info!(
            train_size = train.len(),
            test_size = test.len(),
            failed = failures.len(),
            reorder_alert = restock.as_ref().map(|r| r.reorder_alert),
            "forecast complete"
        );

        Ok(ForecastReport {
            request: request.clone(),
            historical: series.clone(),
            forecast: selected.map(|r| r.forecast().clone()),
            ci_lower: selected.map(|r| r.ci_lower().clone()),
            ci_upper: selected.map(|r| r.ci_upper().clone()),
            all_forecasts: results
                .iter()
                .map(|(m, r)| (*m, r.forecast().clone()))
                .collect(),
            metrics,
            holdout_metrics,
            restock,
            failures,
            alpha,
            seasonal,
            train_size: train.len(),
            test_size: test.len(),
            results,
        })
    }

    /// Prepare raw observations into a daily series, then [`run`](Self::run).
    pub fn run_observations(
        &self,
        observations: &[Observation],
        request: &ForecastRequest,
    ) -> Result<ForecastReport> {
        let series = prepare(observations)?;
        self.run(&series, request)
    }

    /// Classical decomposition; `None` when the series is shorter than two periods.
    pub fn decompose(&self, series: &TimeSeries, period: usize) -> Option<DecompositionResult> {
        Decomposer::new(period).decompose(series)
    }

    /// Restock recommendations for many SKUs on a bounded worker pool.
    ///
    /// Each SKU is forecast with Holt-Winters and the configured defaults.
    /// SKUs with too little history, or whose forecast fails, are listed
    /// in `skipped` and never abort the sweep.
    ///
    /// # Errors
    /// `Config` if the worker pool cannot be built.
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn restock_sweep(&self, items: &[SweepItem]) -> Result<SweepReport> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.config.runtime.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .map_err(|e| ForecastError::Config(format!("cannot build worker pool: {e}")))?;

        let base = self.default_request().with_method(Method::HoltWinters);
        let outcomes: Vec<SweepOutcome> =
            pool.install(|| items.par_iter().map(|item| self.sweep_one(item, &base)).collect());

        let mut report = SweepReport::default();
        for outcome in outcomes {
            match outcome {
                SweepOutcome::Recommended(rec) => {
                    if rec.recommendation.reorder_alert {
                        report.low_stock_skus.push(rec.sku.clone());
                    }
                    report.recommendations.push(rec);
                }
                SweepOutcome::Skipped(skipped) => report.skipped.push(skipped),
            }
        }
        report.low_stock_count = report.low_stock_skus.len();

        tracing::info!(
            recommended = report.recommendations.len(),
            low_stock = report.low_stock_count,
            skipped = report.skipped.len(),
            "restock sweep complete"
        );
        Ok(report)
    }

    fn sweep_one(&self, item: &SweepItem, base: &ForecastRequest) -> SweepOutcome {
        let skip = |reason: String| {
            tracing::debug!(sku = %item.sku, %reason, "sku skipped");
            SweepOutcome::Skipped(SkippedSku {
                sku: item.sku.clone(),
                reason,
            })
        };

        let min_obs = self.config.evaluation.min_observations;
        if item.series.len() < min_obs {
            return skip(format!(
                "{} days of history, need at least {min_obs}",
                item.series.len()
            ));
        }

        let request = base.clone().with_stock(
            item.current_stock.unwrap_or(base.current_stock),
            item.lead_time_days.unwrap_or(base.lead_time_days),
        );
        match self.run(&item.series, &request) {
            Ok(ForecastReport {
                restock: Some(recommendation),
                ..
            }) => SweepOutcome::Recommended(SkuRecommendation {
                sku: item.sku.clone(),
                recommendation,
            }),
            Ok(report) => {
                let reason = report
                    .failures
                    .iter()
                    .find(|f| f.method == request.method && f.stage == FitStage::Full)
                    .map_or_else(
                        || "no forecast produced".to_string(),
                        |f| format!("{} forecast failed: {}", f.method, f.message),
                    );
                skip(reason)
            }
            Err(e) => skip(e.client_message()),
        }
    }
}
