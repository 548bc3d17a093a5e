mod bitset;
mod neighborhood;

pub use bitset::{BitSet, Ones};
pub use neighborhood::NeighborhoodSet;

use crate::{Config, LifeError, Result};
use std::fmt;

/// Conway's B3/S23 transition.
#[inline]
pub fn next_state(alive: bool, neighbors: u32) -> bool {
    matches!((alive, neighbors), (true, 2) | (_, 3))
}

/// Bounded `width x height` field with a double buffer.
///
/// Engines read `current`, write `next` and finish every generation with
/// [`BitGrid::swap`]. Cells outside the rectangle are permanently dead.
#[derive(Clone, Debug)]
pub struct BitGrid {
    width: usize,
    height: usize,
    current: BitSet,
    next: BitSet,
}

impl BitGrid {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let cells = width
            .checked_mul(height)
            .filter(|&n| n > 0 && n <= Config::MAX_SAFE_CELLS)
            .ok_or(LifeError::OutOfRange { width, height })?;
        Ok(Self {
            width,
            height,
            current: BitSet::new(cells),
            next: BitSet::new(cells),
        })
    }

    /// Creates a field with random cells
    ///
    /// `fill_rate` - probability of cell being alive
    /// `seed` - random seed (if `None`, then random seed is generated)
    pub fn random(width: usize, height: usize, fill_rate: f64, seed: Option<u64>) -> Result<Self> {
        use rand::{Rng, SeedableRng};

        let mut rng = if let Some(x) = seed {
            rand_chacha::ChaCha8Rng::seed_from_u64(x)
        } else {
            rand_chacha::ChaCha8Rng::from_entropy()
        };
        let mut grid = Self::new(width, height)?;
        for k in 0..width * height {
            if rng.gen_bool(fill_rate) {
                grid.current.insert(k);
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    fn contains(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    pub fn index(&self, row: isize, col: isize) -> Result<usize> {
        if !self.contains(row, col) {
            return Err(LifeError::IndexOutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(row as usize * self.width + col as usize)
    }

    /// Out-of-range cells read as dead.
    pub fn get(&self, row: isize, col: isize) -> bool {
        self.view().get(row, col)
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, row: isize, col: isize, value: bool) {
        if let Ok(k) = self.index(row, col) {
            self.current.set(k, value);
        }
    }

    /// Exchanges `current` and `next` without copying cells.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    pub fn popcount(&self) -> usize {
        self.current.count_ones()
    }

    pub fn dead_count(&self) -> usize {
        self.cell_count() - self.popcount()
    }

    pub fn live_percentage(&self) -> f64 {
        self.popcount() as f64 * 100. / self.cell_count() as f64
    }

    /// Indices of live cells in ascending order.
    pub fn iter_live(&self) -> Ones<'_> {
        self.current.iter_ones()
    }

    /// `(row, col)` of live cells in row-major order.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width;
        self.iter_live().map(move |k| (k / w, k % w))
    }

    /// Dense row-major copy of the current generation.
    pub fn snapshot(&self) -> Vec<Vec<bool>> {
        let mut rows = vec![vec![false; self.width]; self.height];
        for (row, col) in self.live_cells() {
            rows[row][col] = true;
        }
        rows
    }

    pub fn view(&self) -> CellView<'_> {
        CellView {
            bits: &self.current,
            width: self.width,
            height: self.height,
        }
    }

    /// Read-only view of `current` together with writable `next`.
    pub fn split(&mut self) -> (CellView<'_>, &mut BitSet) {
        (
            CellView {
                bits: &self.current,
                width: self.width,
                height: self.height,
            },
            &mut self.next,
        )
    }

    pub fn current(&self) -> &BitSet {
        &self.current
    }

    pub fn current_words(&self) -> &[u32] {
        self.current.words()
    }

    /// Unpacks a successor image produced elsewhere (the device) into `next`.
    pub fn load_next_words(&mut self, words: &[u32]) {
        self.next.load_words(words);
    }
}

impl PartialEq for BitGrid {
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size() && self.current == other.current
    }
}

impl Eq for BitGrid {}

impl fmt::Display for BitGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let c = if self.current.get(row * self.width + col) { '#' } else { '.' };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Borrowed read-only view of a generation, shared by workers.
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    bits: &'a BitSet,
    width: usize,
    height: usize,
}

impl CellView<'_> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bits(&self) -> &BitSet {
        self.bits
    }

    pub fn get(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 || row as usize >= self.height || col as usize >= self.width {
            return false;
        }
        self.bits.get(row as usize * self.width + col as usize)
    }

    /// Live cells among the eight neighbors of cell `k`, border cells count as dead.
    pub fn live_neighbors(&self, k: usize) -> u32 {
        let (row, col) = (k / self.width, k % self.width);
        let (r1, r2) = (row.saturating_sub(1), (row + 1).min(self.height - 1));
        let (c1, c2) = (col.saturating_sub(1), (col + 1).min(self.width - 1));
        let mut count = 0;
        for r in r1..=r2 {
            for c in c1..=c2 {
                if (r, c) != (row, col) && self.bits.get(r * self.width + c) {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn next_state(&self, k: usize) -> bool {
        next_state(self.bits.get(k), self.live_neighbors(k))
    }
}
