use crate::StatsSchema;
use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock, PoisonError},
};

/// Process-wide settings that the driver may override at startup.
pub struct Config {
    stats_file: PathBuf,
    stats_schema: StatsSchema,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stats_file: PathBuf::from(Self::STATS_FILE),
            stats_schema: StatsSchema::default(),
        }
    }
}

impl Config {
    /// Upper bound for each side of a decoded pattern and of its padded grid.
    pub const MAX_DIMENSION: usize = 10_000;
    /// Smallest side of the padded grid a pattern is centered in.
    pub const MIN_PADDED_SIDE: usize = 100;
    /// A parallel worker is never handed fewer candidate cells than this.
    pub const MIN_CELLS_PER_WORKER: usize = 1000;
    /// Side of the 2-D workgroup of the device kernel.
    pub const WORKGROUP_SIDE: u32 = 16;
    pub const STATS_FILE: &'static str = "performance_stats.csv";
    /// Cell indices must stay addressable as signed 32-bit integers.
    pub const MAX_SAFE_CELLS: usize = (1 << 31) - 11;

    fn get() -> MutexGuard<'static, Config> {
        static CONFIG: OnceLock<Mutex<Config>> = OnceLock::new();
        CONFIG
            .get_or_init(|| Mutex::new(Config::default()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats_file() -> PathBuf {
        Self::get().stats_file.clone()
    }

    pub fn set_stats_file(path: impl Into<PathBuf>) {
        Self::get().stats_file = path.into();
    }

    pub fn stats_schema() -> StatsSchema {
        Self::get().stats_schema
    }

    pub fn set_stats_schema(schema: StatsSchema) {
        Self::get().stats_schema = schema;
    }
}
