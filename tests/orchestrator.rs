//! Integration tests for the forecast pipeline and store sweep.

use chrono::{Duration, NaiveDate};
use restock_forecast::config::EngineConfig;
use restock_forecast::core::{Method, TimeSeries};
use restock_forecast::error::{ErrorKind, ForecastError};
use restock_forecast::orchestrator::{
    FitStage, ForecastOrchestrator, ForecastRequest, SweepItem,
};
use restock_forecast::preparation::Observation;
use restock_forecast::restock::recommend;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn weekly_series(days: usize) -> TimeSeries {
    let pattern = [12.0, 10.0, 11.0, 13.0, 15.0, 22.0, 25.0];
    let values = (0..days)
        .map(|i| pattern[i % 7] + 0.05 * i as f64)
        .collect();
    TimeSeries::new(start(), values)
}

#[test]
fn full_run_reports_every_method() {
    init_tracing();
    let orchestrator = ForecastOrchestrator::default();
    let series = weekly_series(60);
    let report = orchestrator
        .run(&series, &orchestrator.default_request())
        .unwrap();

    // min(30, 60 / 4)
    assert_eq!(report.test_size, 15);
    assert_eq!(report.train_size, 45);
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    let forecast = report.forecast.as_ref().unwrap();
    assert_eq!(forecast.len(), 30);
    assert_eq!(forecast.start(), series.end().unwrap() + Duration::days(1));
    assert_eq!(report.ci_lower.as_ref().unwrap().len(), 30);
    assert_eq!(report.ci_upper.as_ref().unwrap().len(), 30);

    assert_eq!(report.all_forecasts.len(), 3);
    let metric_methods: Vec<Method> = report.metrics.keys().copied().collect();
    assert_eq!(metric_methods, vec![Method::Ses, Method::HoltWinters]);
    assert_eq!(report.holdout_metrics.len(), 3);

    assert_eq!(report.seasonal, Some(true));
    let alpha = report.alpha.unwrap();
    assert!(alpha > 0.0 && alpha < 1.0);
    assert!(report.restock.is_some());
}

#[test]
fn restock_follows_selected_full_history_forecast() {
    let orchestrator = ForecastOrchestrator::default();
    let series = weekly_series(40);
    let request = orchestrator
        .default_request()
        .with_method(Method::MovingAverage)
        .with_horizon(14)
        .with_stock(50.0, 5);
    let report = orchestrator.run(&series, &request).unwrap();

    let selected = report.selected().unwrap();
    assert_eq!(selected.method(), Method::MovingAverage);
    // Forecast starts after the full history, not after the training head.
    assert_eq!(selected.forecast().start(), series.end().unwrap() + Duration::days(1));

    let expected = recommend(selected.forecast(), 50.0, 5, 1.2).unwrap();
    assert_eq!(report.restock, Some(expected));
}

#[test]
fn short_history_is_rejected() {
    let orchestrator = ForecastOrchestrator::default();
    let err = orchestrator
        .run(&weekly_series(13), &ForecastRequest::default())
        .unwrap_err();
    assert_eq!(err, ForecastError::InsufficientData { needed: 14, got: 13 });
}

#[test]
fn invalid_request_is_rejected() {
    let orchestrator = ForecastOrchestrator::default();
    let series = weekly_series(30);

    let zero_horizon = ForecastRequest::default().with_horizon(0);
    assert!(matches!(
        orchestrator.run(&series, &zero_horizon),
        Err(ForecastError::InvalidParameter(_))
    ));

    let mut low_safety = ForecastRequest::default();
    low_safety.safety_factor = 0.5;
    assert!(matches!(
        orchestrator.run(&series, &low_safety),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn failed_models_do_not_abort_siblings() {
    init_tracing();
    // A zero budget stops both optimizers before their first iteration.
    let mut config = EngineConfig::default();
    config.runtime.fit_timeout_ms = Some(0);
    let orchestrator = ForecastOrchestrator::new(config);

    let report = orchestrator
        .run(&weekly_series(30), &ForecastRequest::default())
        .unwrap();

    assert_eq!(report.failures.len(), 4);
    assert!(report
        .failures
        .iter()
        .all(|f| f.kind == ErrorKind::Fitting && f.method != Method::MovingAverage));
    assert!(report
        .failures
        .iter()
        .any(|f| f.method == Method::HoltWinters && f.stage == FitStage::Full));

    // Holt-Winters was selected, so nothing drives a restock.
    assert!(report.forecast.is_none());
    assert!(report.restock.is_none());
    assert!(report.failed(Method::HoltWinters));

    // The wire form carries only the client message.
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    let failures = json["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 4);
    for failure in failures {
        assert_eq!(failure["message"], "internal computation failure");
        assert!(failure.get("error").is_none());
    }
    assert!(!report.to_json().unwrap().contains("time budget"));
    assert!(report.failures[0].error().to_string().contains("time budget"));

    // The moving average still comes back.
    assert!(report.all_forecasts.contains_key(&Method::MovingAverage));
    assert!(report.holdout_metrics.contains_key(&Method::MovingAverage));
    assert!(report.metrics.is_empty());
}

#[test]
fn observations_are_prepared_first() {
    let orchestrator = ForecastOrchestrator::default();
    // Every other day, with a duplicate entry on the first date.
    let mut observations: Vec<Observation> = (0..20)
        .map(|i| Observation::new(start() + Duration::days(2 * i), 6.0))
        .collect();
    observations.push(Observation::new(start(), 4.0));

    let report = orchestrator
        .run_observations(&observations, &ForecastRequest::default())
        .unwrap();

    assert_eq!(report.historical.len(), 39);
    assert_eq!(report.historical.values()[0], 10.0);
    assert_eq!(report.historical.values()[1], 0.0);
}

#[test]
fn decomposition_needs_two_periods() {
    let orchestrator = ForecastOrchestrator::default();
    assert!(orchestrator.decompose(&weekly_series(13), 7).is_none());

    let result = orchestrator.decompose(&weekly_series(28), 7).unwrap();
    assert_eq!(result.trend.len(), 28);
    assert_eq!(result.seasonal.len(), 28);
}

#[test]
fn report_serializes_to_json() {
    let orchestrator = ForecastOrchestrator::default();
    let report = orchestrator
        .run(&weekly_series(30), &ForecastRequest::default())
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["request"]["method"], "holt_winters");
    assert!(json["all_forecasts"]["holt_winters"].is_array());
    assert!(json["all_forecasts"]["moving_average"][0]["date"].is_string());
    assert!(json["metrics"]["ses"]["mae"].is_number());
    assert!(json["restock"]["reorder_alert"].is_boolean());
}

#[test]
fn repeated_runs_are_identical() {
    let orchestrator = ForecastOrchestrator::default();
    let series = weekly_series(45);
    let request = ForecastRequest::default();

    let a = orchestrator.run(&series, &request).unwrap();
    let b = orchestrator.run(&series, &request).unwrap();
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
}

#[test]
fn sweep_skips_short_histories_and_flags_low_stock() {
    init_tracing();
    let mut config = EngineConfig::default();
    config.runtime.workers = Some(2);
    let orchestrator = ForecastOrchestrator::new(config);

    let items = vec![
        SweepItem::new("SKU-A", weekly_series(42)).with_stock(5000.0, 7),
        SweepItem::new("SKU-B", weekly_series(10)),
        SweepItem::new("SKU-C", weekly_series(42)).with_stock(0.0, 7),
        SweepItem::new("SKU-D", weekly_series(42)),
    ];
    let report = orchestrator.restock_sweep(&items).unwrap();

    let skus: Vec<&str> = report
        .recommendations
        .iter()
        .map(|r| r.sku.as_str())
        .collect();
    assert_eq!(skus, vec!["SKU-A", "SKU-C", "SKU-D"]);

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].sku, "SKU-B");

    assert!(report.low_stock_skus.contains(&"SKU-C".to_string()));
    assert!(!report.low_stock_skus.contains(&"SKU-A".to_string()));
    assert_eq!(report.low_stock_count, report.low_stock_skus.len());

    // Default stock applies when none is given.
    assert_eq!(report.recommendations[2].recommendation.current_stock, 300.0);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["recommendations"][0]["sku"], "SKU-A");
    assert!(json["recommendations"][0]["recommended_order_qty"].is_number());
}

#[test]
fn sweep_records_failures_as_skips() {
    let mut config = EngineConfig::default();
    config.runtime.fit_timeout_ms = Some(0);
    let orchestrator = ForecastOrchestrator::new(config);

    let report = orchestrator
        .restock_sweep(&[SweepItem::new("SKU-X", weekly_series(30))])
        .unwrap();

    assert!(report.recommendations.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("internal computation failure"));
}
