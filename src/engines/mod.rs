mod accelerator;
mod parallel;
mod sequential;

pub use accelerator::AcceleratorEngine;
pub use parallel::{hardware_parallelism, ParallelEngine};
pub use sequential::SequentialEngine;

use crate::{BitGrid, Result};
use std::fmt;

/// Step engine for Conway's Game of Life on a bounded [`BitGrid`].
///
/// Every engine reads only `current`, writes only `next` and swaps exactly
/// once per generation, so all of them produce bit-identical successors.
pub trait StepEngine {
    /// Name used in reports and statistics
    fn name(&self) -> String;

    /// Advances the grid by one generation.
    ///
    /// On failure `current` still holds the last completed generation.
    fn step(&mut self, grid: &mut BitGrid) -> Result<()>;

    /// Advances the grid by `steps` generations.
    fn simulate(&mut self, grid: &mut BitGrid, steps: u64) -> Result<()> {
        for _ in 0..steps {
            self.step(grid)?;
        }
        Ok(())
    }

    /// Releases pools and device resources; the engine may rebuild them lazily.
    fn shutdown(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineKind {
    #[value(name = "sequential")]
    Sequential,
    #[value(name = "parallel")]
    Parallel,
    #[value(name = "gpu")]
    Gpu,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [Self::Sequential, Self::Parallel, Self::Gpu];

    /// `threads` is only used by the parallel engine, `grid` fixes the device
    /// buffer sizes of the accelerator.
    pub fn build(self, grid: &BitGrid, threads: usize) -> Result<Box<dyn StepEngine>> {
        Ok(match self {
            Self::Sequential => Box::new(SequentialEngine),
            Self::Parallel => Box::new(ParallelEngine::new(threads)),
            Self::Gpu => Box::new(AcceleratorEngine::new(grid.width(), grid.height())?),
        })
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Gpu => "gpu",
        })
    }
}
