use antline::prelude::*;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

fn build_calculator(grid_count: usize) -> LineCalculator {
    let grid = GridSettings {
        antenna_length_m: 0.1,
        grid_count,
    };
    let model = AntennaModel::from_settings(&LineSettings::default(), &grid)
        .with_element(AntennaElement::feed(grid_count / 2, "S(50o)"))
        .with_element(AntennaElement::element(grid_count / 4, "S(2p+3n)+P((3p+1n+50o)/3p)"));
    LineCalculator::new(model)
}

fn bench_frequency_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("frequency_sweep");
    let freqs = FrequencySettings {
        start_hz: 1.0e9,
        stop_hz: 7.0e9,
        count: 61,
    }
    .frequencies();

    for grid_count in [201, 2001] {
        group.bench_function(BenchmarkId::new("grid", grid_count), |b| {
            b.iter_batched(
                || build_calculator(grid_count),
                |mut calc| {
                    let _ = calc.run_frequency_sweep(&freqs);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frequency_sweep);
criterion_main!(benches);
