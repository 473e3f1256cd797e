//! Chain detection: horizontal and vertical runs of three or more equal beans.

use crate::grid::{Cell, ColorId, GridMatrix, Position};
use std::collections::BTreeSet;

/// Shortest run that counts as a chain.
pub const MIN_CHAIN_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Collinear, contiguous run of equal beans, ordered left-to-right or top-to-bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub color: ColorId,
    pub orientation: Orientation,
    pub positions: Vec<Position>,
}

impl Chain {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// All chains on the grid: every row left to right, then every column top to bottom.
/// A bean in both a horizontal and a vertical run shows up in both chains.
pub fn find_all_chains(grid: &GridMatrix) -> Vec<Chain> {
    let mut chains = Vec::new();
    for row in 0..grid.rows() {
        let line = (0..grid.cols()).map(|col| Position::new(row, col));
        scan_line(grid, line, Orientation::Horizontal, &mut chains);
    }
    for col in 0..grid.cols() {
        let line = (0..grid.rows()).map(|row| Position::new(row, col));
        scan_line(grid, line, Orientation::Vertical, &mut chains);
    }
    chains
}

/// Union of all chain positions; this is what gets cleared.
pub fn clear_set(chains: &[Chain]) -> BTreeSet<Position> {
    chains.iter().flat_map(|c| c.positions.iter().copied()).collect()
}

fn scan_line(
    grid: &GridMatrix,
    line: impl Iterator<Item = Position>,
    orientation: Orientation,
    out: &mut Vec<Chain>,
) {
    let mut run: Vec<Position> = Vec::new();
    let mut run_color: Option<ColorId> = None;
    for pos in line {
        let color = grid.get(pos).ok().and_then(Cell::color);
        if color.is_some() && color == run_color {
            run.push(pos);
            continue;
        }
        flush_run(&mut run, run_color, orientation, out);
        run_color = color;
        if color.is_some() {
            run.push(pos);
        }
    }
    flush_run(&mut run, run_color, orientation, out);
}

fn flush_run(
    run: &mut Vec<Position>,
    color: Option<ColorId>,
    orientation: Orientation,
    out: &mut Vec<Chain>,
) {
    match color {
        Some(color) if run.len() >= MIN_CHAIN_LEN => out.push(Chain {
            color,
            orientation,
            positions: std::mem::take(run),
        }),
        _ => run.clear(),
    }
}
