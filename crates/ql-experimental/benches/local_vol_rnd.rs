use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ql_experimental::{
    BsmRndCalculator, LocalVolRndCalculator, LocalVolRndConfig, RiskNeutralDensityCalculator,
};
use ql_methods::TimeGrid;
use ql_termstructures::{FlatForward, LocalConstantVol};

fn solve(x_grid: usize) -> LocalVolRndCalculator {
    LocalVolRndCalculator::new(
        100.0,
        Arc::new(FlatForward::new(0.015)),
        Arc::new(FlatForward::new(0.025)),
        Arc::new(LocalConstantVol::new(0.25).unwrap()),
        TimeGrid::uniform(1.0, 100).unwrap(),
        LocalVolRndConfig::default().with_x_grid(x_grid),
    )
    .unwrap()
}

fn construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_vol_rnd/solve");
    for x_grid in [101, 201, 401] {
        group.bench_with_input(BenchmarkId::from_parameter(x_grid), &x_grid, |b, &n| {
            b.iter(|| solve(black_box(n)))
        });
    }
    group.finish();
}

fn queries(c: &mut Criterion) {
    let rnd = solve(201);
    let bsm = BsmRndCalculator::new(
        100.0,
        Arc::new(FlatForward::new(0.015)),
        Arc::new(FlatForward::new(0.025)),
        0.25,
    )
    .unwrap();
    let x = 100.0_f64.ln();

    c.bench_function("local_vol_rnd/pdf", |b| b.iter(|| rnd.pdf(black_box(x), black_box(0.537))));
    c.bench_function("local_vol_rnd/cdf", |b| b.iter(|| rnd.cdf(black_box(x), black_box(0.537))));
    c.bench_function("local_vol_rnd/invcdf", |b| {
        b.iter(|| rnd.invcdf(black_box(0.3), black_box(0.537)))
    });
    c.bench_function("bsm_rnd/invcdf", |b| b.iter(|| bsm.invcdf(black_box(0.3), black_box(0.537))));
}

criterion_group!(benches, construction, queries);
criterion_main!(benches);
