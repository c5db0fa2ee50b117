//! Benchmarks for model fits and the full per-SKU pipeline.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use restock_forecast::core::TimeSeries;
use restock_forecast::models::{Forecaster, HoltWinters, MovingAverage, SimpleExponentialSmoothing};
use restock_forecast::orchestrator::{ForecastOrchestrator, SweepItem};

fn generate_weekly(n: usize) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let values = (0..n)
        .map(|i| {
            20.0 + 0.02 * i as f64
                + 6.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
                + ((i * 37) % 11) as f64 * 0.3
        })
        .collect();
    TimeSeries::new(start, values)
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_fits");

    for size in [30, 90, 365, 730].iter() {
        let series = generate_weekly(*size);

        group.bench_with_input(BenchmarkId::new("MovingAverage", size), size, |b, _| {
            let model = MovingAverage::new(7);
            b.iter(|| model.forecast(black_box(&series), 30))
        });

        group.bench_with_input(BenchmarkId::new("SES", size), size, |b, _| {
            let model = SimpleExponentialSmoothing::auto();
            b.iter(|| model.forecast(black_box(&series), 30))
        });

        group.bench_with_input(BenchmarkId::new("HoltWinters", size), size, |b, _| {
            let model = HoltWinters::new(7);
            b.iter(|| model.forecast(black_box(&series), 30))
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let orchestrator = ForecastOrchestrator::default();
    let series = generate_weekly(180);
    let request = orchestrator.default_request();
    group.bench_function("run_180_days", |b| {
        b.iter(|| orchestrator.run(black_box(&series), &request))
    });

    let items: Vec<SweepItem> = (0..16)
        .map(|i| SweepItem::new(format!("SKU-{i:03}"), generate_weekly(120 + i)))
        .collect();
    group.bench_function("sweep_16_skus", |b| {
        b.iter(|| orchestrator.restock_sweep(black_box(&items)))
    });

    group.finish();
}

criterion_group!(benches, bench_models, bench_pipeline);
criterion_main!(benches);
