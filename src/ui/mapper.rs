//! Maps smoothed bins to grid cells.
//!
//! Column `c` samples bin `round(N·c/cols)`, its height grows with the
//! natural log of the magnitude, and the whole picture is rotated by half
//! the width so bin 0 sits in the middle of the screen.

use rand::Rng;

use super::grid::TerminalGrid;

/// Rows per unit of `ln(magnitude)`.
pub const Y_SCALE: f32 = 4.0;

/// Printable glyph range, `[33, 122)`.
const GLYPH_RANGE: std::ops::Range<u8> = 33..122;

/// Bin sampled for terminal column `col`.
pub fn bin_for_column(col: usize, cols: usize, bins: usize) -> usize {
    let idx = (bins as f64 * col as f64 / cols as f64).round() as usize;
    idx.min(bins.saturating_sub(1))
}

/// Display column for spectrum column `col`.
pub fn rotate_column(col: usize, cols: usize) -> usize {
    (col + cols / 2) % cols
}

/// Row above the filled part of a column; rows strictly below it get marked.
pub fn top_row(magnitude: f32, rows: usize) -> f32 {
    rows as f32 - Y_SCALE * magnitude.max(1.0).ln()
}

/// Draw `magnitudes` into `grid` with glyphs drawn from `rng`.
///
/// The grid must be non-empty; zero-sized terminals are rejected at startup.
pub fn plot<R: Rng + ?Sized>(magnitudes: &[f32], grid: &mut TerminalGrid, rng: &mut R) {
    let (rows, cols) = (grid.rows(), grid.cols());
    if magnitudes.is_empty() || rows == 0 || cols == 0 {
        return;
    }

    for col in 0..cols {
        let idx = bin_for_column(col, cols, magnitudes.len());
        let top = top_row(magnitudes[idx], rows);
        let x = rotate_column(col, cols) as i64;

        let mut y = rows as i64 - 1;
        while y as f32 > top && y >= 0 {
            let glyph = rng.gen_range(GLYPH_RANGE) as char;
            grid.write(x, y, glyph);
            y -= 1;
        }
    }
}
