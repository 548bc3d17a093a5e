use crate::BitGrid;

/// Small pattern compared cell-for-cell, `O` alive and `.` dead.
struct Template {
    name: &'static str,
    rows: &'static [&'static str],
}

impl Template {
    fn width(&self) -> usize {
        self.rows[0].len()
    }

    fn height(&self) -> usize {
        self.rows.len()
    }

    /// First live cell in row-major order.
    fn anchor(&self) -> (usize, usize) {
        self.cells()
            .find(|&(_, _, alive)| alive)
            .map_or((0, 0), |(r, c, _)| (r, c))
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.bytes().enumerate().map(move |(c, b)| (r, c, b == b'O'))
        })
    }

    fn matches_at(&self, grid: &BitGrid, top: usize, left: usize) -> bool {
        top + self.height() <= grid.height()
            && left + self.width() <= grid.width()
            && self
                .cells()
                .all(|(r, c, alive)| grid.get((top + r) as isize, (left + c) as isize) == alive)
    }
}

const TEMPLATES: &[Template] = &[
    Template { name: "Block", rows: &["OO", "OO"] },
    Template { name: "Blinker", rows: &["OOO"] },
    Template { name: "Blinker", rows: &["O", "O", "O"] },
    Template { name: "Glider", rows: &[".O.", "..O", "OOO"] },
    Template { name: "Glider", rows: &["O.O", ".OO", ".O."] },
    Template { name: "Glider", rows: &["..O", "O.O", ".OO"] },
    Template { name: "Glider", rows: &["O..", ".OO", "OO."] },
    Template { name: "Beehive", rows: &[".OO.", "O..O", ".OO."] },
    Template { name: "Loaf", rows: &[".OO.", "O..O", ".O.O", "..O."] },
];

/// Counts exact occurrences of common still lifes, oscillators and gliders.
///
/// Only non-zero counts are returned, ordered block, blinker, glider, beehive,
/// loaf. Windows are compared cell-for-cell including their dead cells;
/// cells around a window are not looked at.
pub fn census(grid: &BitGrid) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for template in TEMPLATES {
        let (ar, ac) = template.anchor();
        // every match has exactly one live cell sitting on the template's anchor
        let found = grid
            .live_cells()
            .filter(|&(row, col)| {
                row >= ar && col >= ac && template.matches_at(grid, row - ar, col - ac)
            })
            .count();
        match counts.last_mut() {
            Some((name, n)) if *name == template.name => *n += found,
            _ => counts.push((template.name, found)),
        }
    }
    counts.retain(|&(_, n)| n > 0);
    counts
}
