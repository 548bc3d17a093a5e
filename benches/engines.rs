use bitlife::{hardware_parallelism, AcceleratorEngine, BitGrid, ParallelEngine, SequentialEngine, StepEngine};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const N: usize = 512;
const SEED: u64 = 42;
const FILL_RATE: f64 = 0.3;
const STEPS: u64 = 16;

fn field() -> BitGrid {
    BitGrid::random(N, N, FILL_RATE, Some(SEED)).unwrap()
}

fn sequential(c: &mut Criterion) {
    let initial = field();
    c.bench_function("sequential", |b| {
        b.iter_batched(
            || initial.clone(),
            |mut grid| SequentialEngine.simulate(&mut grid, STEPS).unwrap(),
            criterion::BatchSize::LargeInput,
        )
    });
}

fn parallel(c: &mut Criterion) {
    let initial = field();
    let mut group = c.benchmark_group("parallel");
    let mut threads = 1;
    while threads <= hardware_parallelism() {
        let mut engine = ParallelEngine::new(threads);
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            b.iter_batched(
                || initial.clone(),
                |mut grid| engine.simulate(&mut grid, STEPS).unwrap(),
                criterion::BatchSize::LargeInput,
            )
        });
        threads *= 2;
    }
    group.finish();
}

fn gpu(c: &mut Criterion) {
    let initial = field();
    let Ok(mut engine) = AcceleratorEngine::new(N, N) else {
        eprintln!("no gpu, skipping");
        return;
    };
    c.bench_function("gpu", |b| {
        b.iter_batched(
            || initial.clone(),
            |mut grid| engine.simulate(&mut grid, STEPS).unwrap(),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, sequential, parallel, gpu);
criterion_main!(benches);
