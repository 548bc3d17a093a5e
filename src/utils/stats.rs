use crate::{hardware_parallelism, Config};
use chrono::{DateTime, Local, TimeZone};
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

/// Column layout of the statistics file, fixed for one process run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StatsSchema {
    /// `Date,Time,Method,ExecutionTime(ms),Speedup`
    #[default]
    Timing,
    /// `Method, PatternName, ExecutionTime(ms), LiveCells, ...`
    Population,
}

impl StatsSchema {
    pub fn header(self) -> &'static str {
        match self {
            Self::Timing => "Date,Time,Method,ExecutionTime(ms),Speedup",
            Self::Population => "Method, PatternName, ExecutionTime(ms), LiveCells, DeadCells, LiveCellPercentage, Threads, Steps",
        }
    }
}

/// One finished simulation run.
#[derive(Clone, Debug)]
pub struct RunRecord<'a> {
    pub method: &'a str,
    pub pattern: &'a str,
    pub elapsed: Duration,
    pub live_cells: usize,
    pub dead_cells: usize,
    pub live_percentage: f64,
    pub threads: usize,
    pub steps: u64,
}

static HEADER_WRITTEN: AtomicBool = AtomicBool::new(false);

/// Appends run statistics to a CSV file.
///
/// The first `sequential` run becomes the baseline for the speedup of later
/// runs. I/O failures are logged and otherwise ignored.
pub struct StatsLogger {
    path: PathBuf,
    schema: StatsSchema,
    baseline: Option<Duration>,
}

impl StatsLogger {
    pub fn new(path: impl Into<PathBuf>, schema: StatsSchema) -> Self {
        Self {
            path: path.into(),
            schema,
            baseline: None,
        }
    }

    /// Logger for the file and schema currently set in [`Config`].
    pub fn from_config() -> Self {
        Self::new(Config::stats_file(), Config::stats_schema())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> StatsSchema {
        self.schema
    }

    /// Records `record` and returns its speedup over the sequential baseline,
    /// 0 when there is no baseline yet.
    pub fn log_run(&mut self, record: &RunRecord<'_>) -> f64 {
        let speedup = self.speedup(record.method, record.elapsed);
        let row = match self.schema {
            StatsSchema::Timing => timing_row(
                &Local::now(),
                record.method,
                record.elapsed.as_millis(),
                speedup,
            ),
            StatsSchema::Population => population_row(record),
        };
        if let Err(err) = self.append(&row) {
            log::error!("failed to write {}: {}", self.path.display(), err);
        }
        speedup
    }

    fn speedup(&mut self, method: &str, elapsed: Duration) -> f64 {
        if method == "sequential" && self.baseline.is_none() {
            self.baseline = Some(elapsed);
            return 1.;
        }
        match self.baseline {
            Some(base) if !elapsed.is_zero() => base.as_secs_f64() / elapsed.as_secs_f64(),
            _ => 0.,
        }
    }

    fn append(&self, row: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write_row(&mut file, &HEADER_WRITTEN, self.schema.header(), row)
    }
}

/// Writes `header` first unless `header_written` says it already went out.
/// The flag is set only once the header write succeeded.
fn write_row(
    out: &mut impl Write,
    header_written: &AtomicBool,
    header: &str,
    row: &str,
) -> std::io::Result<()> {
    if !header_written.load(Ordering::Acquire) {
        writeln!(out, "{}", header)?;
        header_written.store(true, Ordering::Release);
    }
    writeln!(out, "{}", row)
}

pub fn timing_row<Tz: TimeZone>(
    at: &DateTime<Tz>,
    method: &str,
    millis: u128,
    speedup: f64,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{},{},{},{:.2}",
        at.format("%Y-%m-%d,%H:%M:%S"),
        method,
        millis,
        speedup
    )
}

pub fn population_row(record: &RunRecord<'_>) -> String {
    format!(
        "{}, {}, {}, {}, {}, {:.2}, {}, {}",
        record.method,
        record.pattern,
        record.elapsed.as_millis(),
        record.live_cells,
        record.dead_cells,
        record.live_percentage,
        record.threads,
        record.steps
    )
}

/// Parallel efficiency in percent.
pub fn efficiency(speedup: f64, units: usize) -> f64 {
    speedup / units as f64 * 100.
}

/// Runs `f` and returns its result together with the wall time it took.
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

pub fn system_info() -> String {
    format!(
        "System information:\n  available parallelism: {}\n  os: {} ({})\n  arch: {}",
        hardware_parallelism(),
        std::env::consts::OS,
        std::env::consts::FAMILY,
        std::env::consts::ARCH
    )
}
