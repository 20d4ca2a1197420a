//! Win detection
//!
//! Pure scan of a mark grid for completed lines. A line is reported as the
//! flattened cell indices (`row * size + col`) it covers.

use crate::board::MarkGrid;

/// One completed line as flattened cell indices.
pub type Line = Vec<usize>;

/// Return every fully marked line of `marks`.
///
/// Order is fixed: rows top to bottom, columns left to right, the main
/// diagonal, then the anti-diagonal. Each line appears at most once.
pub fn completed_lines(marks: &MarkGrid, size: usize) -> Vec<Line> {
    let marked = |row: usize, col: usize| {
        marks
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    };
    let mut lines = Vec::new();
    if size == 0 {
        return lines;
    }

    for row in 0..size {
        if (0..size).all(|col| marked(row, col)) {
            lines.push((0..size).map(|col| row * size + col).collect());
        }
    }

    for col in 0..size {
        if (0..size).all(|row| marked(row, col)) {
            lines.push((0..size).map(|row| row * size + col).collect());
        }
    }

    if (0..size).all(|i| marked(i, i)) {
        lines.push((0..size).map(|i| i * size + i).collect());
    }

    if (0..size).all(|i| marked(i, size - 1 - i)) {
        lines.push((0..size).map(|i| i * size + (size - 1 - i)).collect());
    }

    lines
}
