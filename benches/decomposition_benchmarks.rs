//! Benchmarks for the decomposition kernel
//!
//! Covers:
//! - Full A-F runs at several series lengths
//! - Automatic seasonal filter selection via the MSR
//! - Extreme-value analysis on its own
//! - The batch entry point over many series

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use x11_core::{
    decompose_all, DecompositionMode, Domain, ExtremeValueCorrector, Frequency, Period,
    SeasonalFilterOption, SigmaLimits, SigmaPolicy, TimeSeries, X11Kernel, X11Spec,
};

const PATTERN: [f64; 12] = [
    1.10, 0.95, 1.04, 0.89, 1.12, 0.96, 1.01, 0.93, 1.08, 0.90, 1.06, 0.96,
];

fn synthetic_monthly(years: usize) -> TimeSeries {
    let domain = Domain::new(Period::new(2000, 0), years * 12, Frequency::Monthly);
    let values = (0..years * 12)
        .map(|i| {
            let wobble = ((i * 37 + 11) % 23) as f64 / 23.0 - 0.478;
            (100.0 + 0.5 * i as f64) * PATTERN[i % 12] * (1.0 + 0.005 * wobble)
        })
        .collect();
    TimeSeries::new(domain, values)
}

fn spec() -> X11Spec {
    X11Spec {
        mode: DecompositionMode::Multiplicative,
        seasonal_filters: vec![SeasonalFilterOption::S3x3],
        ..X11Spec::default()
    }
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    for years in [10, 20, 40] {
        let series = synthetic_monthly(years);
        let kernel = X11Kernel::new(spec()).unwrap();
        group.bench_function(format!("monthly_{}y", years), |b| {
            b.iter(|| kernel.process(black_box(&series)).unwrap())
        });
    }
    group.finish();
}

fn bench_msr_selection(c: &mut Criterion) {
    let series = synthetic_monthly(25);
    let config = X11Spec {
        seasonal_filters: vec![SeasonalFilterOption::Msr],
        ..spec()
    };
    let kernel = X11Kernel::new(config).unwrap();
    c.bench_function("process_monthly_25y_msr", |b| {
        b.iter(|| kernel.process(black_box(&series)).unwrap())
    });
}

fn bench_extreme_analysis(c: &mut Criterion) {
    let series = synthetic_monthly(30);
    let ctx = spec().context();
    c.bench_function("extreme_analyse_30y", |b| {
        b.iter(|| {
            let mut corrector =
                ExtremeValueCorrector::new(SigmaLimits::default(), SigmaPolicy::PerPeriod);
            corrector.analyse(&ctx, black_box(&series)).unwrap()
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    let batch: Vec<TimeSeries> = (0..32).map(|k| synthetic_monthly(10 + k % 5)).collect();
    let config = spec();
    c.bench_function("decompose_all_32_series", |b| {
        b.iter(|| decompose_all(black_box(&config), black_box(&batch)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_process,
    bench_msr_selection,
    bench_extreme_analysis,
    bench_batch
);
criterion_main!(benches);
