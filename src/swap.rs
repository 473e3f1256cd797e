//! Swap validation: adjacency rules and the value exchange.

use crate::grid::{GridError, GridMatrix, Position};

/// Which neighbours count as adjacent for a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjacencyMode {
    /// Up, down, left, right only.
    #[default]
    Orthogonal,
    /// Orthogonal plus the four diagonal neighbours.
    WithDiagonals,
}

/// Result of a swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapResult {
    Swapped,
    NotAdjacent,
}

/// True if `a` and `b` are distinct neighbours under `mode`.
pub fn are_adjacent(a: Position, b: Position, mode: AdjacencyMode) -> bool {
    let dr = a.row.abs_diff(b.row);
    let dc = a.col.abs_diff(b.col);
    match mode {
        AdjacencyMode::Orthogonal => dr + dc == 1,
        AdjacencyMode::WithDiagonals => dr.max(dc) == 1,
    }
}

/// Exchange `a` and `b` if they are adjacent. Non-adjacent pairs leave the grid untouched.
pub fn swap(
    grid: &mut GridMatrix,
    a: Position,
    b: Position,
    mode: AdjacencyMode,
) -> Result<SwapResult, GridError> {
    if !are_adjacent(a, b, mode) {
        return Ok(SwapResult::NotAdjacent);
    }
    grid.swap_values(a, b)?;
    Ok(SwapResult::Swapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [AdjacencyMode; 2] = [AdjacencyMode::Orthogonal, AdjacencyMode::WithDiagonals];

    #[test]
    fn test_orthogonal_neighbours() {
        let p = Position::new(3, 3);
        let o = AdjacencyMode::Orthogonal;
        assert!(are_adjacent(p, Position::new(2, 3), o));
        assert!(are_adjacent(p, Position::new(4, 3), o));
        assert!(are_adjacent(p, Position::new(3, 2), o));
        assert!(are_adjacent(p, Position::new(3, 4), o));
        assert!(!are_adjacent(p, Position::new(2, 2), o));
        assert!(!are_adjacent(p, Position::new(4, 4), o));
        assert!(!are_adjacent(p, Position::new(3, 5), o));
        assert!(!are_adjacent(p, Position::new(1, 3), o));
    }

    #[test]
    fn test_diagonal_mode_accepts_corners() {
        let p = Position::new(1, 1);
        let d = AdjacencyMode::WithDiagonals;
        assert!(are_adjacent(p, Position::new(0, 0), d));
        assert!(are_adjacent(p, Position::new(2, 2), d));
        assert!(are_adjacent(p, Position::new(1, 2), d));
        assert!(!are_adjacent(p, Position::new(3, 1), d));
    }

    #[test]
    fn test_adjacency_irreflexive_and_symmetric() {
        for mode in MODES {
            for r1 in 0..4 {
                for c1 in 0..4 {
                    let a = Position::new(r1, c1);
                    assert!(!are_adjacent(a, a, mode));
                    for r2 in 0..4 {
                        for c2 in 0..4 {
                            let b = Position::new(r2, c2);
                            assert_eq!(are_adjacent(a, b, mode), are_adjacent(b, a, mode));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_swap_is_its_own_inverse() {
        let mut g: GridMatrix = "012\n345\n012".parse().unwrap();
        let before = g.clone();
        let (a, b) = (Position::new(1, 1), Position::new(1, 2));
        let o = AdjacencyMode::Orthogonal;
        assert_eq!(swap(&mut g, a, b, o), Ok(SwapResult::Swapped));
        assert_ne!(g, before);
        assert_eq!(swap(&mut g, a, b, o), Ok(SwapResult::Swapped));
        assert_eq!(g, before);
    }

    #[test]
    fn test_swap_rejects_non_adjacent() {
        let mut g: GridMatrix = "012\n345".parse().unwrap();
        let before = g.clone();
        let r = swap(&mut g, Position::new(0, 0), Position::new(1, 1), AdjacencyMode::Orthogonal);
        assert_eq!(r, Ok(SwapResult::NotAdjacent));
        assert_eq!(g, before);
    }

    #[test]
    fn test_swap_out_of_bounds_is_error() {
        let mut g: GridMatrix = "01\n23".parse().unwrap();
        let r = swap(&mut g, Position::new(1, 1), Position::new(1, 2), AdjacencyMode::Orthogonal);
        assert!(matches!(r, Err(GridError::OutOfBounds { .. })));
    }
}
