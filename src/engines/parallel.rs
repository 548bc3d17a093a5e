use super::StepEngine;
use crate::{BitGrid, BitSet, CellView, Config, LifeError, NeighborhoodSet, Result};
use std::{
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::{Mutex, PoisonError},
};

pub fn hardware_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

struct WorkerPool {
    size: usize,
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    fn build(size: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("life-worker-{}", i))
            .build()?;
        log::info!("created worker pool with {} threads", size);
        Ok(Self { size, pool })
    }
}

/// Shared-memory engine: splits the neighborhood set into contiguous slices,
/// each worker fills a private successor set that is OR-merged into `next`.
///
/// The pool belongs to the engine, is created on first use and rebuilt
/// whenever the effective worker count changes.
pub struct ParallelEngine {
    worker_hint: usize,
    pool: Mutex<Option<WorkerPool>>,
}

impl ParallelEngine {
    pub fn new(worker_hint: usize) -> Self {
        let hardware = hardware_parallelism();
        if worker_hint > hardware {
            log::warn!(
                "requested {} threads, but only using {} (system maximum)",
                worker_hint,
                hardware
            );
        }
        Self {
            worker_hint: worker_hint.clamp(1, hardware),
            pool: Mutex::new(None),
        }
    }

    pub fn worker_hint(&self) -> usize {
        self.worker_hint
    }

    /// Threads in the live pool, 0 if none has been built yet.
    pub fn pool_size(&self) -> usize {
        match self.pool.lock() {
            Ok(slot) => slot.as_ref().map_or(0, |p| p.size),
            Err(_) => 0,
        }
    }

    /// Workers used for `candidates` cells; slices smaller than
    /// [`Config::MIN_CELLS_PER_WORKER`] are never handed out.
    pub fn effective_workers(&self, candidates: usize) -> usize {
        self.worker_hint
            .min(hardware_parallelism())
            .min((candidates / Config::MIN_CELLS_PER_WORKER).max(1))
    }

    fn run_workers(
        &self,
        view: CellView<'_>,
        next: &mut BitSet,
        indices: &[usize],
        workers: usize,
    ) -> Result<()> {
        let mut slot = self
            .pool
            .lock()
            .map_err(|_| LifeError::WorkerInterrupted("worker pool lock poisoned".to_string()))?;
        let pool = match slot.take() {
            Some(p) if p.size == workers => p,
            _ => WorkerPool::build(workers)?,
        };
        let pool = slot.insert(pool);

        let cells = view.width() * view.height();
        let slice_len = indices.len().div_ceil(workers).max(1);
        let slices = indices.chunks(slice_len).collect::<Vec<_>>();
        let merged = Mutex::new(next);

        // the scope returns only after every spawned worker has finished
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.pool.scope(|s| {
                for &slice in &slices {
                    let merged = &merged;
                    s.spawn(move |_| {
                        let mut local_next = BitSet::new(cells);
                        for &k in slice {
                            if view.next_state(k) {
                                local_next.insert(k);
                            }
                        }
                        merged
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .union_with(&local_next);
                    });
                }
            })
        }));

        outcome.map_err(|_| {
            LifeError::WorkerInterrupted("a worker panicked during the step".to_string())
        })
    }
}

impl StepEngine for ParallelEngine {
    fn name(&self) -> String {
        "parallel".to_string()
    }

    fn step(&mut self, grid: &mut BitGrid) -> Result<()> {
        let (view, next) = grid.split();
        next.clear();
        let candidates = NeighborhoodSet::build(view);
        if candidates.is_empty() {
            grid.swap();
            return Ok(());
        }

        let indices = candidates.to_indices();
        let workers = self.effective_workers(indices.len());
        log::debug!(
            "parallel step over {} candidate cells with {} workers",
            indices.len(),
            workers
        );
        self.run_workers(view, next, &indices, workers)?;
        grid.swap();
        Ok(())
    }

    fn shutdown(&mut self) {
        let slot = match self.pool.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(p) = slot.take() {
            log::info!("shutting down worker pool with {} threads", p.size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{hardware_parallelism, ParallelEngine};
    use crate::{BitGrid, LifeError, StepEngine};

    #[test]
    fn test_worker_count_respects_chunk_floor() {
        let engine = ParallelEngine::new(usize::MAX);
        assert_eq!(engine.worker_hint(), hardware_parallelism());
        assert_eq!(engine.effective_workers(0), 1);
        assert_eq!(engine.effective_workers(999), 1);
        assert_eq!(engine.effective_workers(2000), 2usize.min(hardware_parallelism()));
        assert_eq!(ParallelEngine::new(0).worker_hint(), 1);
    }

    #[test]
    fn test_pool_is_lazy_and_rebuilt() {
        let mut engine = ParallelEngine::new(4);
        assert_eq!(engine.pool_size(), 0);

        let mut small = BitGrid::new(8, 8).unwrap();
        small.set(3, 3, true);
        engine.step(&mut small).unwrap();
        // nine candidates are far below one worker's share
        assert_eq!(engine.pool_size(), 1);

        let mut large = BitGrid::random(200, 200, 0.3, Some(42)).unwrap();
        engine.step(&mut large).unwrap();
        assert_eq!(engine.pool_size(), 4usize.min(hardware_parallelism()));

        engine.shutdown();
        assert_eq!(engine.pool_size(), 0);
        engine.step(&mut large).unwrap();
        assert!(engine.pool_size() >= 1);
    }

    #[test]
    fn test_empty_grid_skips_pool() {
        let mut engine = ParallelEngine::new(2);
        let mut grid = BitGrid::new(16, 16).unwrap();
        engine.step(&mut grid).unwrap();
        assert_eq!(grid.popcount(), 0);
        assert_eq!(engine.pool_size(), 0);
    }

    #[test]
    fn test_worker_panic_leaves_grid_unchanged() {
        let engine = ParallelEngine::new(1);
        let mut grid = BitGrid::new(8, 8).unwrap();
        for col in 2..5 {
            grid.set(3, col, true);
        }
        let before = grid.clone();

        let (view, next) = grid.split();
        // index 10_000 lies outside the 8x8 grid
        let result = engine.run_workers(view, next, &[0, 1, 10_000], 1);
        assert!(matches!(result, Err(LifeError::WorkerInterrupted(_))));
        assert_eq!(grid, before);
        assert_eq!(grid.popcount(), 3);
    }
}
