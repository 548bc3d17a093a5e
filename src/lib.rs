#![warn(clippy::all, clippy::cargo)]

mod engines;
mod error;
mod grid;
mod gui;
mod utils;

pub use engines::{
    hardware_parallelism, AcceleratorEngine, EngineKind, ParallelEngine, SequentialEngine,
    StepEngine,
};
pub use error::{LifeError, Result};
pub use grid::{next_state, BitGrid, BitSet, CellView, NeighborhoodSet, Ones};
pub use gui::{run_viewer, Viewer};
pub use utils::{
    census, efficiency, encode_rle, load_rle, measure, parse_rle, population_row, system_info,
    timing_row, Config, NiceInt, RleReport, RunRecord, StatsLogger, StatsSchema,
};
