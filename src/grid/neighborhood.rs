use super::{BitSet, CellView, Ones};

/// Cells that may change during the next step: the live set dilated by the
/// 3x3 neighborhood and clipped to the grid.
///
/// Built from live cells only, so the cost follows the population rather than
/// the area of the grid.
pub struct NeighborhoodSet {
    cells: BitSet,
    len: usize,
}

impl NeighborhoodSet {
    pub fn build(view: CellView<'_>) -> Self {
        let (w, h) = (view.width(), view.height());
        let mut cells = BitSet::new(w * h);
        for k in view.bits().iter_ones() {
            let (row, col) = (k / w, k % w);
            let (c1, c2) = (col.saturating_sub(1), (col + 1).min(w - 1));
            for r in row.saturating_sub(1)..=(row + 1).min(h - 1) {
                for c in c1..=c2 {
                    cells.insert(r * w + c);
                }
            }
        }
        let len = cells.count_ones();
        Self { cells, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, k: usize) -> bool {
        self.cells.get(k)
    }

    /// Candidate indices in ascending order.
    pub fn iter(&self) -> Ones<'_> {
        self.cells.iter_ones()
    }

    pub fn to_indices(&self) -> Vec<usize> {
        let mut indices = Vec::with_capacity(self.len);
        indices.extend(self.iter());
        indices
    }
}
