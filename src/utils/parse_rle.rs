use crate::{BitGrid, Config, LifeError, Result};
use regex::Regex;
use std::{path::Path, sync::OnceLock};

/// What the decoder did with a pattern besides placing its cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RleReport {
    /// Width from the `x = ..` line, after clamping
    pub declared_width: usize,
    /// Height from the `y = ..` line, after clamping
    pub declared_height: usize,
    /// The declared size exceeded [`Config::MAX_DIMENSION`]
    pub clamped: bool,
    /// Some cells fell outside the padded grid and were discarded
    pub truncated: bool,
    pub live_cells: usize,
}

pub fn load_rle(path: impl AsRef<Path>) -> Result<(BitGrid, RleReport)> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)?;
    let (grid, report) = parse_rle(&data)?;
    log::info!(
        "loaded {} ({}x{} pattern) into a {}x{} grid with {} live cells",
        path.display(),
        report.declared_width,
        report.declared_height,
        grid.width(),
        grid.height(),
        report.live_cells
    );
    Ok((grid, report))
}

/// Matches `x = <w>, y = <h>`, compiled once per process.
fn dimension_line() -> &'static Regex {
    static DIMENSION_LINE: OnceLock<Regex> = OnceLock::new();
    DIMENSION_LINE.get_or_init(|| {
        Regex::new(r"x\s*=\s*(\d+)\s*,\s*y\s*=\s*(\d+)").expect("dimension pattern is valid")
    })
}

/// Decodes an RLE pattern and centers it in a padded grid of
/// `max(2 * declared, MIN_PADDED_SIDE)` cells per side.
///
/// Oversized patterns are clamped to [`Config::MAX_DIMENSION`] and cells that
/// do not fit are dropped with a warning.
pub fn parse_rle(data: &str) -> Result<(BitGrid, RleReport)> {
    let dimension_line = dimension_line();

    let mut lines = data.lines();
    let (width, height) = lines
        .by_ref()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let caps = dimension_line.captures(line)?;
            Some((caps[1].parse::<usize>(), caps[2].parse::<usize>()))
        })
        .ok_or_else(|| LifeError::InvalidInput("no `x = .., y = ..` line found".to_string()))?;
    let (width, height) = match (width, height) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        (Ok(_), Ok(_)) => {
            return Err(LifeError::InvalidInput(
                "pattern dimensions must be positive".to_string(),
            ))
        }
        (Err(err), _) | (_, Err(err)) => {
            return Err(LifeError::InvalidInput(format!(
                "bad pattern dimension: {}",
                err
            )))
        }
    };

    let clamped = width > Config::MAX_DIMENSION || height > Config::MAX_DIMENSION;
    let (width, height) = if clamped {
        log::warn!(
            "pattern is {}x{}, limiting to {}x{}",
            width,
            height,
            Config::MAX_DIMENSION,
            Config::MAX_DIMENSION
        );
        (
            width.min(Config::MAX_DIMENSION),
            height.min(Config::MAX_DIMENSION),
        )
    } else {
        (width, height)
    };

    let mut body = String::new();
    for line in lines {
        if line.starts_with('#') || line.contains("rule") || line.contains('=') {
            continue;
        }
        body.push_str(line.trim());
        if line.contains('!') {
            break;
        }
    }

    let padded = |side: usize| (side * 2).max(Config::MIN_PADDED_SIDE).min(Config::MAX_DIMENSION);
    let (padded_w, padded_h) = (padded(width), padded(height));
    let mut grid = BitGrid::new(padded_w, padded_h)?;
    let (ox, oy) = ((padded_w - width) / 2, (padded_h - height) / 2);

    let (mut row, mut col, mut count) = (0usize, 0usize, 0usize);
    let mut truncated = false;
    for c in body.chars() {
        match c {
            '0'..='9' => {
                let digit = c as usize - '0' as usize;
                count = count.saturating_mul(10).saturating_add(digit);
            }
            'b' => {
                col = col.saturating_add(count.max(1));
                count = 0;
            }
            'o' => {
                let run = count.max(1);
                let (y, x) = (oy + row, ox.saturating_add(col));
                let end = x.saturating_add(run).min(padded_w);
                if y < padded_h {
                    for x in x..end {
                        grid.set(y as isize, x as isize, true);
                    }
                }
                truncated |= y >= padded_h || x.saturating_add(run) > padded_w;
                col = col.saturating_add(run);
                count = 0;
            }
            '$' => {
                row = row.saturating_add(count.max(1));
                col = 0;
                count = 0;
                if oy.saturating_add(row) >= padded_h {
                    truncated = true;
                    break;
                }
            }
            '!' => break,
            _ => {}
        }
    }
    if truncated {
        log::warn!(
            "pattern exceeds the {}x{} grid, extra cells were dropped",
            padded_w,
            padded_h
        );
    }

    let report = RleReport {
        declared_width: width,
        declared_height: height,
        clamped,
        truncated,
        live_cells: grid.popcount(),
    };
    Ok((grid, report))
}

const MAX_LINE_LEN: usize = 70;

/// Encodes the bounding box of the live cells as an RLE pattern.
///
/// Trailing dead cells of every row are left out and lines are wrapped at
/// 70 characters.
pub fn encode_rle(grid: &BitGrid) -> String {
    let (mut r0, mut r1, mut c0, mut c1) = (usize::MAX, 0, usize::MAX, 0);
    for (row, col) in grid.live_cells() {
        (r0, r1) = (r0.min(row), r1.max(row));
        (c0, c1) = (c0.min(col), c1.max(col));
    }
    if r0 == usize::MAX {
        return "x = 0, y = 0, rule = B3/S23\n!\n".to_string();
    }

    let mut tokens = Vec::new();
    let push_run = |tokens: &mut Vec<String>, n: usize, tag: char| match n {
        0 => {}
        1 => tokens.push(tag.to_string()),
        _ => tokens.push(format!("{}{}", n, tag)),
    };
    let mut pending_rows = 0;
    for row in r0..=r1 {
        let mut runs: Vec<(bool, usize)> = Vec::new();
        for col in c0..=c1 {
            let alive = grid.get(row as isize, col as isize);
            match runs.last_mut() {
                Some((state, n)) if *state == alive => *n += 1,
                _ => runs.push((alive, 1)),
            }
        }
        if let Some((false, _)) = runs.last() {
            runs.pop();
        }
        if runs.is_empty() {
            pending_rows += 1;
            continue;
        }
        push_run(&mut tokens, pending_rows, '$');
        pending_rows = 1;
        for (alive, n) in runs {
            push_run(&mut tokens, n, if alive { 'o' } else { 'b' });
        }
    }
    tokens.push("!".to_string());

    let mut result = format!("x = {}, y = {}, rule = B3/S23\n", c1 - c0 + 1, r1 - r0 + 1);
    let mut line_len = 0;
    for token in tokens {
        if line_len + token.len() > MAX_LINE_LEN {
            result.push('\n');
            line_len = 0;
        }
        line_len += token.len();
        result.push_str(&token);
    }
    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::{dimension_line, encode_rle, parse_rle};
    use crate::{BitGrid, Config, LifeError};

    const GLIDER: &str = "#N Glider\n#C comment with bo$ tokens\nx = 3, y = 3, rule = B3/S23\nbob$2bo$3o!\n";

    #[test]
    fn test_glider_is_centered() {
        let (grid, report) = parse_rle(GLIDER).unwrap();
        assert_eq!(grid.size(), (100, 100));
        assert_eq!(grid.popcount(), 5);
        assert_eq!(report.live_cells, 5);
        assert_eq!((report.declared_width, report.declared_height), (3, 3));
        assert!(!report.clamped && !report.truncated);
        assert_eq!(
            grid.live_cells().collect::<Vec<_>>(),
            vec![(48, 49), (49, 50), (50, 48), (50, 49), (50, 50)]
        );
    }

    #[test]
    fn test_missing_or_zero_dimensions() {
        assert!(matches!(
            parse_rle("#C nothing here\nbo$2bo!"),
            Err(LifeError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_rle("x = 0, y = 3\nbo!"),
            Err(LifeError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_rle("x = 99999999999999999999999, y = 3\nbo!"),
            Err(LifeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_padding_and_runs() {
        let (grid, _) = parse_rle("x=80,y=2\n3o76bo$\n80o!").unwrap();
        assert_eq!(grid.size(), (160, 100));
        assert_eq!(grid.popcount(), 84);
        // ox = 40, oy = 49
        assert!(grid.get(49, 40) && grid.get(49, 42) && !grid.get(49, 43));
        assert!(grid.get(49, 119) && !grid.get(49, 120));
        assert!(grid.get(50, 40) && grid.get(50, 119));
    }

    #[test]
    fn test_multiline_body_and_blank_rows() {
        let data = "x = 4, y = 5\n2o$\n\n3$\n  bobo!\nignored o o o\n";
        let (grid, report) = parse_rle(data).unwrap();
        assert_eq!(report.live_cells, 4);
        // ox = 48, oy = 47
        assert!(grid.get(47, 48) && grid.get(47, 49));
        assert!(grid.get(51, 49) && grid.get(51, 51));
    }

    #[test]
    fn test_oversized_body_is_truncated() {
        let (grid, report) = parse_rle("x = 2, y = 1\n200o$60$o!").unwrap();
        assert!(report.truncated);
        assert!(!report.clamped);
        // the run is cut at the right border, the rows below the bottom border
        assert_eq!(grid.popcount(), 100 - 49);
        assert_eq!(report.live_cells, grid.popcount());
    }

    #[test]
    fn test_dimensions_are_clamped() {
        let data = format!("x = {}, y = 1\n3o!", Config::MAX_DIMENSION + 5);
        let (grid, report) = parse_rle(&data).unwrap();
        assert!(report.clamped);
        assert_eq!(report.declared_width, Config::MAX_DIMENSION);
        assert_eq!(grid.width(), Config::MAX_DIMENSION);
        assert_eq!(grid.popcount(), 3);
        assert!(grid.get(49, 0) && grid.get(49, 2));
    }

    #[test]
    fn test_encode() {
        let (grid, _) = parse_rle(GLIDER).unwrap();
        assert_eq!(encode_rle(&grid), "x = 3, y = 3, rule = B3/S23\nbo$2bo$3o!\n");

        let mut sparse = BitGrid::new(10, 10).unwrap();
        sparse.set(1, 1, true);
        sparse.set(4, 3, true);
        sparse.set(4, 4, true);
        assert_eq!(encode_rle(&sparse), "x = 4, y = 4, rule = B3/S23\no3$2b2o!\n");

        let empty = BitGrid::new(5, 5).unwrap();
        assert_eq!(encode_rle(&empty), "x = 0, y = 0, rule = B3/S23\n!\n");
    }

    #[test]
    fn test_round_trip_keeps_shape() {
        let pattern = BitGrid::random(30, 20, 0.4, Some(42)).unwrap();
        let encoded = encode_rle(&pattern);
        assert!(encoded.lines().all(|line| line.len() <= 70));

        let (decoded, report) = parse_rle(&encoded).unwrap();
        assert_eq!(report.live_cells, pattern.popcount());
        assert_eq!(encode_rle(&decoded), encoded);
    }

    #[test]
    fn test_dimension_line_is_shared() {
        assert!(std::ptr::eq(dimension_line(), dimension_line()));
        let caps = dimension_line().captures("x = 36, y = 9, rule = B3/S23").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("36", "9"));
    }

    #[test]
    fn test_comment_lines_in_body_are_skipped() {
        let (grid, report) = parse_rle("x = 3, y = 1\n#C bo$\n3o!\n").unwrap();
        assert_eq!(report.live_cells, 3);
        let rows = grid.live_cells().map(|(row, _)| row).collect::<Vec<_>>();
        assert!(rows.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
