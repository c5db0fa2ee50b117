//! Store-wide restock sweep over synthetic sales history.
//!
//! Run with `cargo run --example store_sweep [engine.toml]`; set `RUST_LOG`
//! (e.g. `RUST_LOG=restock_forecast=debug`) to see per-model fit logs.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use restock_forecast::config::EngineConfig;
use restock_forecast::export::forecast_csv_string;
use restock_forecast::orchestrator::{ForecastOrchestrator, SweepItem};
use restock_forecast::preparation::{prepare_by_sku, SalesRecord};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn synthetic_sales() -> Vec<SalesRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let skus = [
        ("ESPRESSO-250G", 18.0, 90),
        ("FILTER-PAPERS", 6.0, 75),
        ("GRINDER-X", 1.5, 60),
        ("NEW-MUG", 3.0, 10),
    ];

    skus.iter()
        .flat_map(|&(sku, base, days)| {
            (0..days).map(move |i: i64| {
                let weekend = if i % 7 >= 5 { 1.6 } else { 1.0 };
                let noise = ((i * 31 + sku.len() as i64) % 7) as f64 * 0.1 * base;
                SalesRecord {
                    sku: sku.to_string(),
                    date: start + Duration::days(i),
                    quantity: (base * weekend + noise).round(),
                }
            })
        })
        .collect()
}

fn main() -> restock_forecast::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restock_forecast=info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig::default(),
    };
    let orchestrator = ForecastOrchestrator::new(config);

    let by_sku = prepare_by_sku(&synthetic_sales())?;
    let items: Vec<SweepItem> = by_sku
        .iter()
        .map(|(sku, series)| {
            let stock = if sku.starts_with("ESPRESSO") { 40.0 } else { 300.0 };
            SweepItem::new(sku.clone(), series.clone()).with_stock(stock, 7)
        })
        .collect();

    let sweep = orchestrator.restock_sweep(&items)?;
    println!("{}", serde_json::to_string_pretty(&sweep)?);

    if let Some(series) = by_sku.get("ESPRESSO-250G") {
        let report = orchestrator.run(series, &orchestrator.default_request())?;
        if let Some(result) = report.selected() {
            println!("\n{}", forecast_csv_string(result)?);
        }
    }

    Ok(())
}
