#![warn(clippy::all)]

use anyhow::Context;
use bitlife::{
    census, efficiency, hardware_parallelism, load_rle, measure, run_viewer, system_info, BitGrid,
    Config, EngineKind, NiceInt, ParallelEngine, RunRecord, SequentialEngine, StatsLogger,
    StatsSchema, StepEngine,
};
use clap::Parser;
use std::{path::PathBuf, time::Duration};

/// Conway's Game of Life on a bounded grid with sequential, parallel and GPU engines
#[derive(Parser, Debug)]
#[command(name = "bitlife", version)]
struct Args {
    /// Engine for a single run or the viewer
    #[arg(value_enum)]
    mode: EngineKind,
    /// Number of generations
    steps: u64,
    /// Path to an RLE pattern
    pattern: PathBuf,
    /// Worker threads of the parallel engine
    #[arg(short = 't', long, default_value_t = hardware_parallelism())]
    threads: usize,
    /// Run all engines one after another and compare their timings
    #[arg(short = 'c', long)]
    compare: bool,
    /// Open the viewer instead of running in the terminal (`-gui` also works)
    #[arg(long)]
    gui: bool,
    /// Columns of the statistics file
    #[arg(long, value_enum, default_value_t = StatsSchema::Timing)]
    schema: StatsSchema,
    /// Statistics file rows are appended to
    #[arg(long, default_value = Config::STATS_FILE)]
    stats_file: PathBuf,
}

impl Args {
    fn pattern_name(&self) -> String {
        self.pattern
            .file_name()
            .map_or_else(|| self.pattern.display().to_string(), |name| {
                name.to_string_lossy().into_owned()
            })
    }

    fn load(&self) -> anyhow::Result<BitGrid> {
        let (grid, _) = load_rle(&self.pattern)
            .with_context(|| format!("failed to load pattern {}", self.pattern.display()))?;
        println!(
            "Grid size: {}x{}, live cells: {}",
            grid.width(),
            grid.height(),
            NiceInt::from_usize(grid.popcount())
        );
        Ok(grid)
    }
}

fn record<'a>(
    method: &'a str,
    pattern: &'a str,
    grid: &BitGrid,
    elapsed: Duration,
    threads: usize,
    steps: u64,
) -> RunRecord<'a> {
    RunRecord {
        method,
        pattern,
        elapsed,
        live_cells: grid.popcount(),
        dead_cells: grid.dead_count(),
        live_percentage: grid.live_percentage(),
        threads,
        steps,
    }
}

fn timed_simulate(
    engine: &mut dyn StepEngine,
    grid: &mut BitGrid,
    steps: u64,
) -> anyhow::Result<Duration> {
    let (result, elapsed) = measure(|| engine.simulate(grid, steps));
    result.with_context(|| format!("{} engine failed", engine.name()))?;
    engine.shutdown();
    Ok(elapsed)
}

fn print_run(method: &str, elapsed: Duration, speedup: f64) {
    println!("Method: {}", method);
    println!("Execution time: {} ms", NiceInt::from(elapsed.as_millis() as u64));
    if speedup != 0. {
        println!("Speedup: {:.2}x", speedup);
    }
}

fn print_census(grid: &BitGrid) {
    println!("\nDetected patterns:");
    let found = census(grid);
    if found.is_empty() {
        println!("none");
    }
    for (name, count) in found {
        println!("{}: {}", name, count);
    }
}

fn run_single(args: &Args) -> anyhow::Result<()> {
    println!("\nLoading pattern from: {}", args.pattern.display());
    let mut grid = args.load()?;
    println!("Running {} generations in {} mode", args.steps, args.mode);

    let mut engine = args
        .mode
        .build(&grid, args.threads)
        .with_context(|| format!("cannot start the {} engine", args.mode))?;
    let threads = match args.mode {
        EngineKind::Parallel => {
            let threads = args.threads.clamp(1, hardware_parallelism());
            println!("Using {} threads", threads);
            threads
        }
        _ => 1,
    };
    let elapsed = timed_simulate(engine.as_mut(), &mut grid, args.steps)?;

    let pattern = args.pattern_name();
    let method = args.mode.to_string();
    let mut stats = StatsLogger::from_config();
    let speedup = stats.log_run(&record(&method, &pattern, &grid, elapsed, threads, args.steps));
    print_run(&method, elapsed, speedup);
    print_census(&grid);
    Ok(())
}

fn run_comparison(args: &Args) -> anyhow::Result<()> {
    println!("\nLoading pattern from: {}", args.pattern.display());
    let initial = args.load()?;
    let pattern = args.pattern_name();
    let mut stats = StatsLogger::from_config();

    println!("\nRunning sequential mode...");
    let mut reference = initial.clone();
    let elapsed = timed_simulate(&mut SequentialEngine, &mut reference, args.steps)?;
    let speedup = stats.log_run(&record("sequential", &pattern, &reference, elapsed, 1, args.steps));
    print_run("sequential", elapsed, speedup);

    println!("\nRunning parallel mode with varying thread counts...");
    let max_threads = args.threads.clamp(1, hardware_parallelism());
    let mut threads = 1;
    while threads <= max_threads {
        let mut grid = initial.clone();
        let elapsed = timed_simulate(&mut ParallelEngine::new(threads), &mut grid, args.steps)?;
        if grid != reference {
            log::error!("parallel run with {} threads diverged from the sequential one", threads);
        }
        let method = format!("parallel-{}", threads);
        let speedup = stats.log_run(&record(&method, &pattern, &grid, elapsed, threads, args.steps));
        print_run(&method, elapsed, speedup);
        println!("Efficiency: {:.2}%", efficiency(speedup, threads));
        threads *= 2;
    }

    println!("\nRunning GPU mode...");
    let mut grid = initial.clone();
    let gpu_run = EngineKind::Gpu
        .build(&grid, 1)
        .context("cannot start the gpu engine")
        .and_then(|mut engine| timed_simulate(engine.as_mut(), &mut grid, args.steps));
    match gpu_run {
        Ok(elapsed) => {
            let speedup = stats.log_run(&record("gpu", &pattern, &grid, elapsed, 1, args.steps));
            print_run("gpu", elapsed, speedup);
        }
        Err(err) => log::warn!("GPU simulation failed, skipping it: {:#}", err),
    }

    print_census(&reference);
    println!(
        "\nComparison complete. Results written to {}",
        stats.path().display()
    );
    Ok(())
}

fn run_gui(args: &Args) -> anyhow::Result<()> {
    let grid = args.load()?;
    let engine = args
        .mode
        .build(&grid, args.threads)
        .with_context(|| format!("cannot start the {} engine", args.mode))?;
    println!("GUI launched. Close the window to exit.");
    run_viewer(grid, engine, args.mode).map_err(|err| anyhow::anyhow!("viewer failed: {}", err))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse_from(std::env::args_os().map(|arg| {
        if arg == "-gui" {
            "--gui".into()
        } else {
            arg
        }
    }));
    Config::set_stats_file(&args.stats_file);
    Config::set_stats_schema(args.schema);

    println!("{}", system_info());
    if args.compare {
        run_comparison(&args)
    } else if args.gui {
        run_gui(&args)
    } else {
        run_single(&args)
    }
}
