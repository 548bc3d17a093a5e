use bitlife::{
    hardware_parallelism, AcceleratorEngine, BitGrid, EngineKind, LifeError, ParallelEngine,
    SequentialEngine, StepEngine,
};

const SEED: u64 = 42;

fn assert_grids_equal(expected: &BitGrid, actual: &BitGrid, name: &str) {
    if expected == actual {
        return;
    }
    let (w, h) = expected.size();
    for row in 0..h as isize {
        for col in 0..w as isize {
            if expected.get(row, col) != actual.get(row, col) {
                panic!(
                    "{} differs from the sequential engine at ({}, {}):\n{}\nvs\n{}",
                    name, row, col, expected, actual
                );
            }
        }
    }
    panic!("{}: grids differ in size", name);
}

#[test]
fn test_engines_agree_on_random_fields() {
    for (size, fill_rate) in [(64, 0.5), (150, 0.2), (333, 0.05)] {
        let initial = BitGrid::random(size, size * 3 / 4, fill_rate, Some(SEED)).unwrap();
        let mut reference = initial.clone();
        SequentialEngine.simulate(&mut reference, 20).unwrap();

        for threads in [1, 2, 3, hardware_parallelism()] {
            let mut engine = ParallelEngine::new(threads);
            let mut grid = initial.clone();
            engine.simulate(&mut grid, 20).unwrap();
            assert_grids_equal(&reference, &grid, &format!("parallel-{}", threads));
            engine.shutdown();
        }

        match AcceleratorEngine::new(initial.width(), initial.height()) {
            Ok(mut engine) => {
                let mut grid = initial.clone();
                engine.simulate(&mut grid, 20).unwrap();
                assert_grids_equal(&reference, &grid, "gpu");
            }
            Err(LifeError::DeviceUnavailable(msg)) => eprintln!("skipping gpu: {}", msg),
            Err(err) => panic!("{}", err),
        }
    }
}

#[test]
fn test_engine_reused_across_grids() {
    let mut engine = EngineKind::Parallel.build(&BitGrid::new(1, 1).unwrap(), 4).unwrap();
    for seed in 0..4 {
        let initial = BitGrid::random(90, 70, 0.3, Some(seed)).unwrap();
        let (mut expected, mut actual) = (initial.clone(), initial);
        SequentialEngine.simulate(&mut expected, 5).unwrap();
        engine.simulate(&mut actual, 5).unwrap();
        assert_grids_equal(&expected, &actual, "reused parallel");
    }
}

#[test]
fn test_population_of_dying_field() {
    // a lone cell and a domino both die in one generation
    let mut grid = BitGrid::new(12, 12).unwrap();
    grid.set(0, 0, true);
    grid.set(6, 6, true);
    grid.set(6, 7, true);
    for kind in [EngineKind::Sequential, EngineKind::Parallel] {
        let mut engine = kind.build(&grid, 2).unwrap();
        let mut g = grid.clone();
        engine.step(&mut g).unwrap();
        assert_eq!(g.popcount(), 0, "{}", kind);
        assert_eq!(g.dead_count(), 144);
    }
}
