//! Fixed-size character grid and its serialization to the terminal.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};

/// `rows`×`cols` matrix of display characters, stored row-major.
#[derive(Debug, Clone)]
pub struct TerminalGrid {
    rows: usize,
    cols: usize,
    cells: Vec<char>,
}

impl TerminalGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![' '; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Reset every cell to a space.
    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    /// Set cell `(x, y)`; out-of-range coordinates are ignored.
    pub fn write(&mut self, x: i64, y: i64, ch: char) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.cols || y >= self.rows {
            return;
        }
        self.cells[y * self.cols + x] = ch;
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        (x < self.cols && y < self.rows).then(|| self.cells[y * self.cols + x])
    }

    /// Number of non-space cells (used in tests)
    #[cfg(test)]
    pub fn marked(&self) -> usize {
        self.cells.iter().filter(|&&c| c != ' ').count()
    }

    /// Rows joined by `\n`, no trailing line break.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for (i, row) in self.cells.chunks(self.cols.max(1)).take(self.rows).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(row);
        }
        out
    }

    /// Emit one frame: clear screen and home the cursor, the rows, then a
    /// carriage return to park the cursor at the left margin.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        out.write_all(self.serialize().as_bytes())?;
        out.write_all(b"\r")?;
        out.flush()
    }
}
