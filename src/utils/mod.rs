mod census;
mod config;
mod format_int;
mod parse_rle;
mod stats;

pub use census::census;
pub use config::Config;
pub use format_int::NiceInt;
pub use parse_rle::{encode_rle, load_rle, parse_rle, RleReport};
pub use stats::{
    efficiency, measure, population_row, system_info, timing_row, RunRecord, StatsLogger,
    StatsSchema,
};
