//! Board controller: selection state machine and the swap-commit/revert protocol.
//!
//! The presentation layer talks to the board through [`BoardController::handle_pick`],
//! reads cells with [`BoardController::cell_at`] and follows piece movement by
//! registering drop/spawn listeners. It never gets a mutable handle on the grid.

use crate::cascade::{self, CascadeReport, DropEvent, SpawnEvent};
use crate::colors::ColorSource;
use crate::grid::{Cell, FillPolicy, GridError, GridMatrix, MAX_TEXT_PALETTE, Position};
use crate::matcher::find_all_chains;
use crate::swap::{self, AdjacencyMode, SwapResult};
use thiserror::Error;
use tracing::{debug, trace};

pub const DEFAULT_ROWS: usize = 8;
pub const DEFAULT_COLS: usize = 8;
pub const DEFAULT_PALETTE_SIZE: u8 = 6;

/// Below two colours every refill would match forever.
pub const MIN_PALETTE_SIZE: u8 = 2;

/// Fixed board parameters, supplied at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub palette_size: u8,
    pub adjacency: AdjacencyMode,
    pub fill: FillPolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            palette_size: DEFAULT_PALETTE_SIZE,
            adjacency: AdjacencyMode::Orthogonal,
            fill: FillPolicy::Unconstrained,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board must have at least one row and one column (got {rows}x{cols})")]
    EmptyBoard { rows: usize, cols: usize },
    #[error("palette size {0} outside 2..=36")]
    PaletteSize(u8),
    #[error("no-initial-matches fill needs at least 3 colours (got {0})")]
    PaletteTooSmallForFill(u8),
    #[error("grid is {got_rows}x{got_cols}, config says {rows}x{cols}")]
    GridMismatch {
        rows: usize,
        cols: usize,
        got_rows: usize,
        got_cols: usize,
    },
    #[error("bean at {pos} has colour {color}, palette size is {palette_size}")]
    ColorOutOfPalette {
        pos: Position,
        color: u8,
        palette_size: u8,
    },
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyBoard {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(MIN_PALETTE_SIZE..=MAX_TEXT_PALETTE).contains(&self.palette_size) {
            return Err(ConfigError::PaletteSize(self.palette_size));
        }
        if self.fill == FillPolicy::NoInitialMatches && self.palette_size < 3 {
            return Err(ConfigError::PaletteTooSmallForFill(self.palette_size));
        }
        Ok(())
    }
}

/// Selection state. `Resolving` and `Reverting` only exist while `handle_pick` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    OneSelected(Position),
    Resolving,
    Reverting,
}

/// Why a pick did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Locked,
    OutOfBounds,
}

/// Which branch of the protocol a pick took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Ignored(IgnoreReason),
    /// First pick recorded; no board change.
    Selected(Position),
    /// Same cell picked twice.
    Deselected,
    /// Second pick not adjacent to the first; no swap attempted.
    SelectionDiscarded,
    /// Swap made no chain and was undone.
    Reverted { a: Position, b: Position },
    /// Swap made at least one chain and the board cascaded to a stable state.
    Committed(CascadeReport),
}

type DropListener = Box<dyn FnMut(&DropEvent)>;
type SpawnListener = Box<dyn FnMut(&SpawnEvent)>;

pub struct BoardController {
    config: BoardConfig,
    grid: GridMatrix,
    state: SelectionState,
    locked: bool,
    colors: Box<dyn ColorSource>,
    drop_listeners: Vec<DropListener>,
    spawn_listeners: Vec<SpawnListener>,
}

impl std::fmt::Debug for BoardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardController")
            .field("config", &self.config)
            .field("grid", &self.grid)
            .field("state", &self.state)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

impl BoardController {
    /// New board filled from `colors` per `config.fill`.
    pub fn new(config: BoardConfig, mut colors: Box<dyn ColorSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = GridMatrix::filled(
            config.rows,
            config.cols,
            config.palette_size,
            config.fill,
            colors.as_mut(),
        );
        Ok(Self::assemble(config, grid, colors))
    }

    /// Board over an explicit grid. `colors` is used for refills only.
    pub fn with_grid(
        config: BoardConfig,
        grid: GridMatrix,
        colors: Box<dyn ColorSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if grid.rows() != config.rows || grid.cols() != config.cols {
            return Err(ConfigError::GridMismatch {
                rows: config.rows,
                cols: config.cols,
                got_rows: grid.rows(),
                got_cols: grid.cols(),
            });
        }
        let stray = grid.positions().find_map(|pos| match grid.get(pos) {
            Ok(Cell::Bean(color)) if color >= config.palette_size => Some((pos, color)),
            _ => None,
        });
        if let Some((pos, color)) = stray {
            return Err(ConfigError::ColorOutOfPalette {
                pos,
                color,
                palette_size: config.palette_size,
            });
        }
        Ok(Self::assemble(config, grid, colors))
    }

    fn assemble(config: BoardConfig, grid: GridMatrix, colors: Box<dyn ColorSource>) -> Self {
        Self {
            config,
            grid,
            state: SelectionState::Idle,
            locked: false,
            colors,
            drop_listeners: Vec::new(),
            spawn_listeners: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[inline]
    pub fn grid(&self) -> &GridMatrix {
        &self.grid
    }

    #[inline]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The pending first pick, if any.
    pub fn selection(&self) -> Option<Position> {
        match self.state {
            SelectionState::OneSelected(p) => Some(p),
            _ => None,
        }
    }

    pub fn cell_at(&self, pos: Position) -> Result<Cell, GridError> {
        self.grid.get(pos)
    }

    pub fn on_drop_event(&mut self, listener: impl FnMut(&DropEvent) + 'static) {
        self.drop_listeners.push(Box::new(listener));
    }

    pub fn on_spawn_event(&mut self, listener: impl FnMut(&SpawnEvent) + 'static) {
        self.spawn_listeners.push(Box::new(listener));
    }

    /// Refill the whole board with the same configuration. Listeners stay registered.
    pub fn reset(&mut self) {
        self.grid = GridMatrix::filled(
            self.config.rows,
            self.config.cols,
            self.config.palette_size,
            self.config.fill,
            self.colors.as_mut(),
        );
        self.state = SelectionState::Idle;
        self.locked = false;
        debug!(rows = self.config.rows, cols = self.config.cols, "board reset");
    }

    /// Entry point for one player pick. Runs the whole protocol before returning;
    /// afterwards the board is `Idle` or holds a single first pick.
    pub fn handle_pick(&mut self, pos: Position) -> Result<PickOutcome, GridError> {
        if self.locked {
            return Ok(PickOutcome::Ignored(IgnoreReason::Locked));
        }
        if !self.grid.contains(pos) {
            return Ok(PickOutcome::Ignored(IgnoreReason::OutOfBounds));
        }
        let outcome = match self.state {
            SelectionState::OneSelected(first) if first == pos => {
                self.state = SelectionState::Idle;
                PickOutcome::Deselected
            }
            SelectionState::OneSelected(first) => self.try_swap(first, pos)?,
            _ => {
                self.state = SelectionState::OneSelected(pos);
                PickOutcome::Selected(pos)
            }
        };
        debug!(%pos, ?outcome, "pick");
        Ok(outcome)
    }

    fn try_swap(&mut self, a: Position, b: Position) -> Result<PickOutcome, GridError> {
        self.locked = true;
        self.state = SelectionState::Resolving;
        let result = self.resolve_swap(a, b);
        self.locked = false;
        self.state = SelectionState::Idle;
        result
    }

    fn resolve_swap(&mut self, a: Position, b: Position) -> Result<PickOutcome, GridError> {
        let adjacency = self.config.adjacency;
        match swap::swap(&mut self.grid, a, b, adjacency)? {
            SwapResult::Swapped => {}
            SwapResult::NotAdjacent => return Ok(PickOutcome::SelectionDiscarded),
        }

        if find_all_chains(&self.grid).is_empty() {
            self.state = SelectionState::Reverting;
            swap::swap(&mut self.grid, a, b, adjacency)?;
            return Ok(PickOutcome::Reverted { a, b });
        }

        let report =
            cascade::resolve(&mut self.grid, self.config.palette_size, self.colors.as_mut())?;
        trace!(grid = %self.grid, "stable after {} passes", report.passes);
        self.notify(&report);
        Ok(PickOutcome::Committed(report))
    }

    /// Replay the report pass by pass: every drop of a pass, then its spawns.
    fn notify(&mut self, report: &CascadeReport) {
        for (drops, spawns) in report.per_pass() {
            for listener in &mut self.drop_listeners {
                for ev in drops {
                    listener(ev);
                }
            }
            for listener in &mut self.spawn_listeners {
                for ev in spawns {
                    listener(ev);
                }
            }
        }
    }
}
