//! Grid data model: positions, cells and the bean matrix.

use crate::colors::ColorSource;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Colour index into the palette (0..palette_size).
pub type ColorId = u8;

/// Characters used by the text form, indexed by colour id.
const COLOR_GLYPHS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Largest palette the text form can represent.
pub const MAX_TEXT_PALETTE: u8 = COLOR_GLYPHS.len() as u8;

/// Grid cell address. `row` 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Single cell: either empty or a bean of a given colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Bean(ColorId),
}

impl Cell {
    #[inline]
    pub fn color(self) -> Option<ColorId> {
        match self {
            Self::Empty => None,
            Self::Bean(c) => Some(c),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("position ({row}, {col}) outside {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("invalid grid text: {0}")]
    Parse(String),
}

/// How the initial board is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    /// Uniform random colours; the board may start with runs on it.
    #[default]
    Unconstrained,
    /// Re-pick any colour that would complete a run to the left or above.
    NoInitialMatches,
}

/// Bean matrix. grid[row][col]; dimensions never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl GridMatrix {
    /// All-empty grid.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![vec![Cell::Empty; cols]; rows],
        }
    }

    /// Grid filled row-major from `colors` according to `policy`.
    pub fn filled(
        rows: usize,
        cols: usize,
        palette_size: u8,
        policy: FillPolicy,
        colors: &mut dyn ColorSource,
    ) -> Self {
        let mut grid = Self::empty(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let drawn = colors.next_color(palette_size);
                let color = match policy {
                    FillPolicy::Unconstrained => drawn,
                    FillPolicy::NoInitialMatches => {
                        grid.first_non_matching(row, col, drawn, palette_size)
                    }
                };
                grid.cells[row][col] = Cell::Bean(color);
            }
        }
        grid
    }

    /// Build from explicit rows. Fails on empty or ragged input.
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let rows = cells.len();
        let cols = cells.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(GridError::Parse("grid has no cells".to_string()));
        }
        if let Some(bad) = cells.iter().position(|r| r.len() != cols) {
            return Err(GridError::Parse(format!(
                "row {} has {} cells, expected {}",
                bad,
                cells[bad].len(),
                cols
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn check(&self, pos: Position) -> Result<(), GridError> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    pub fn get(&self, pos: Position) -> Result<Cell, GridError> {
        self.check(pos)?;
        Ok(self.cells[pos.row][pos.col])
    }

    pub fn set(&mut self, pos: Position, cell: Cell) -> Result<(), GridError> {
        self.check(pos)?;
        self.cells[pos.row][pos.col] = cell;
        Ok(())
    }

    pub fn is_empty(&self, pos: Position) -> Result<bool, GridError> {
        self.get(pos).map(Cell::is_empty)
    }

    /// Exchange two cells in place. No adjacency check; used for both commit and revert.
    pub fn swap_values(&mut self, a: Position, b: Position) -> Result<(), GridError> {
        self.check(a)?;
        self.check(b)?;
        let tmp = self.cells[a.row][a.col];
        self.cells[a.row][a.col] = self.cells[b.row][b.col];
        self.cells[b.row][b.col] = tmp;
        Ok(())
    }

    /// One column, top to bottom.
    pub fn column(&self, col: usize) -> Option<Vec<Cell>> {
        (col < self.cols).then(|| self.cells.iter().map(|r| r[col]).collect())
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Position::new(row, col)))
    }

    /// Colour that does not complete a 3-run with the two cells left of or above (row, col).
    /// Tries `drawn` first, then the following colours in order.
    fn first_non_matching(
        &self,
        row: usize,
        col: usize,
        drawn: ColorId,
        palette_size: u8,
    ) -> ColorId {
        let left = (col >= 2)
            .then(|| self.cells[row][col - 1])
            .filter(|&c| c == self.cells[row][col - 2])
            .and_then(Cell::color);
        let above = (row >= 2)
            .then(|| self.cells[row - 1][col])
            .filter(|&c| c == self.cells[row - 2][col])
            .and_then(Cell::color);
        let palette = palette_size.max(1);
        (0..palette)
            .map(|k| ((u16::from(drawn) + u16::from(k)) % u16::from(palette)) as ColorId)
            .find(|&c| Some(c) != left && Some(c) != above)
            .unwrap_or(drawn)
    }
}

impl fmt::Display for GridMatrix {
    /// One line per row: colour glyphs and `.` for empty cells.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                let ch = match cell {
                    Cell::Empty => '.',
                    Cell::Bean(c) => COLOR_GLYPHS.get(*c as usize).map_or('?', |&b| b as char),
                };
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

impl FromStr for GridMatrix {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for (r, line) in s.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
            let row = line
                .chars()
                .enumerate()
                .map(|(c, ch)| match ch {
                    '.' => Ok(Cell::Empty),
                    _ => COLOR_GLYPHS
                        .iter()
                        .position(|&g| g as char == ch)
                        .map(|i| Cell::Bean(i as ColorId))
                        .ok_or_else(|| {
                            GridError::Parse(format!("unknown cell '{}' at ({}, {})", ch, r, c))
                        }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }
}
