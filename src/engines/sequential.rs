use super::StepEngine;
use crate::{BitGrid, NeighborhoodSet, Result};

/// Reference engine: visits the neighborhood set in ascending order on the
/// calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEngine;

impl StepEngine for SequentialEngine {
    fn name(&self) -> String {
        "sequential".to_string()
    }

    fn step(&mut self, grid: &mut BitGrid) -> Result<()> {
        let (view, next) = grid.split();
        next.clear();
        let candidates = NeighborhoodSet::build(view);
        log::debug!("sequential step over {} candidate cells", candidates.len());
        for k in candidates.iter() {
            if view.next_state(k) {
                next.insert(k);
            }
        }
        grid.swap();
        Ok(())
    }
}
