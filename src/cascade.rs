//! Cascade resolution: clear chains, collapse columns, refill, repeat until stable.

use crate::colors::ColorSource;
use crate::grid::{Cell, ColorId, GridError, GridMatrix, Position};
use crate::matcher::{clear_set, find_all_chains};
use std::ops::Range;
use tracing::{debug, trace};

/// A bean that slid down its column during a collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropEvent {
    pub source_row: usize,
    pub target_row: usize,
    pub col: usize,
}

/// A new bean placed in a cell left empty after a collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnEvent {
    pub row: usize,
    pub col: usize,
    pub color: ColorId,
}

/// What a resolution did, in the order it happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Clear/collapse/refill cycles run. 0 means the grid was already stable.
    pub passes: usize,
    /// Total cells cleared across all passes.
    pub cleared: usize,
    pub drops: Vec<DropEvent>,
    pub spawns: Vec<SpawnEvent>,
    /// One span per pass into `drops` and `spawns`.
    pub pass_spans: Vec<PassSpan>,
}

/// Index ranges of the drops and spawns one pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSpan {
    pub drops: Range<usize>,
    pub spawns: Range<usize>,
}

impl CascadeReport {
    /// Drops and spawns grouped by pass, in pass order. A drop in pass k+1 may move
    /// a bean spawned in pass k, so consumers replaying the board must go pass by pass.
    pub fn per_pass(&self) -> impl Iterator<Item = (&[DropEvent], &[SpawnEvent])> + '_ {
        self.pass_spans.iter().map(|span| {
            (
                &self.drops[span.drops.clone()],
                &self.spawns[span.spawns.clone()],
            )
        })
    }
}

/// Resolve `grid` to a chain-free state. Loops until no chain is left; there is no depth limit.
pub fn resolve(
    grid: &mut GridMatrix,
    palette_size: u8,
    colors: &mut dyn ColorSource,
) -> Result<CascadeReport, GridError> {
    let mut report = CascadeReport::default();
    loop {
        let chains = find_all_chains(grid);
        if chains.is_empty() {
            break;
        }
        let to_clear = clear_set(&chains);
        for &pos in &to_clear {
            grid.set(pos, Cell::Empty)?;
        }
        report.passes += 1;
        report.cleared += to_clear.len();
        debug!(
            pass = report.passes,
            chains = chains.len(),
            cleared = to_clear.len(),
            "cascade pass"
        );

        let (drops_start, spawns_start) = (report.drops.len(), report.spawns.len());
        for col in 0..grid.cols() {
            collapse_column(grid, col, &mut report.drops)?;
            refill_column(grid, col, palette_size, colors, &mut report.spawns)?;
        }
        report.pass_spans.push(PassSpan {
            drops: drops_start..report.drops.len(),
            spawns: spawns_start..report.spawns.len(),
        });
        trace!(grid = %grid, "after pass {}", report.passes);
    }
    Ok(report)
}

/// Slide beans down over empty cells, keeping their order. Empty cells end up on top.
/// Records one drop per bean that changed row, bottom-up.
pub fn collapse_column(
    grid: &mut GridMatrix,
    col: usize,
    drops: &mut Vec<DropEvent>,
) -> Result<(), GridError> {
    let mut target = grid.rows();
    for source in (0..grid.rows()).rev() {
        let cell = grid.get(Position::new(source, col))?;
        if cell.is_empty() {
            continue;
        }
        target -= 1;
        if target != source {
            grid.set(Position::new(target, col), cell)?;
            grid.set(Position::new(source, col), Cell::Empty)?;
            drops.push(DropEvent {
                source_row: source,
                target_row: target,
                col,
            });
        }
    }
    Ok(())
}

/// Give every empty cell in the column a fresh colour, top-down.
pub fn refill_column(
    grid: &mut GridMatrix,
    col: usize,
    palette_size: u8,
    colors: &mut dyn ColorSource,
    spawns: &mut Vec<SpawnEvent>,
) -> Result<(), GridError> {
    for row in 0..grid.rows() {
        let pos = Position::new(row, col);
        if grid.is_empty(pos)? {
            let color = colors.next_color(palette_size);
            grid.set(pos, Cell::Bean(color))?;
            spawns.push(SpawnEvent { row, col, color });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{RandomColors, ScriptedColors};
    use std::collections::HashMap;

    fn grid(s: &str) -> GridMatrix {
        s.parse().unwrap()
    }

    fn column_counts(g: &GridMatrix, col: usize) -> HashMap<ColorId, usize> {
        let mut m = HashMap::new();
        for cell in g.column(col).unwrap() {
            if let Cell::Bean(c) = cell {
                *m.entry(c).or_insert(0) += 1;
            }
        }
        m
    }

    #[test]
    fn test_stable_grid_is_untouched() {
        let mut g = grid("010\n101\n010");
        let before = g.clone();
        let report = resolve(&mut g, 2, &mut ScriptedColors::new(vec![0])).unwrap();
        assert_eq!(report, CascadeReport::default());
        assert_eq!(g, before);
    }

    #[test]
    fn test_collapse_keeps_order_and_empties_top() {
        let mut g = grid("1\n.\n2\n.\n3");
        let mut drops = Vec::new();
        collapse_column(&mut g, 0, &mut drops).unwrap();
        assert_eq!(g.to_string(), ".\n.\n1\n2\n3");
        assert_eq!(
            drops,
            vec![
                DropEvent {
                    source_row: 2,
                    target_row: 3,
                    col: 0,
                },
                DropEvent {
                    source_row: 0,
                    target_row: 2,
                    col: 0,
                },
            ]
        );
    }

    #[test]
    fn test_collapse_preserves_column_multiset() {
        let mut g = grid("01.2\n.1.0\n2.33\n..10\n3.0.");
        let before: Vec<_> = (0..g.cols()).map(|c| column_counts(&g, c)).collect();
        let mut drops = Vec::new();
        for col in 0..g.cols() {
            collapse_column(&mut g, col, &mut drops).unwrap();
        }
        let after: Vec<_> = (0..g.cols()).map(|c| column_counts(&g, c)).collect();
        assert_eq!(before, after);
        for col in 0..g.cols() {
            let column = g.column(col).unwrap();
            let first_bean = column.iter().position(|c| !c.is_empty()).unwrap_or(column.len());
            assert!(column[first_bean..].iter().all(|c| !c.is_empty()));
        }
    }

    #[test]
    fn test_vertical_clear_in_tall_column() {
        // Column 0: five beans above a 3-run at rows 5..8.
        let mut g = grid(
            "01\n\
             12\n\
             01\n\
             12\n\
             01\n\
             32\n\
             31\n\
             32",
        );
        let mut colors = ScriptedColors::new(vec![4, 5, 4]);
        let report = resolve(&mut g, 6, &mut colors).unwrap();
        assert_eq!(report.passes, 1);
        assert_eq!(report.cleared, 3);
        assert_eq!(report.drops.len(), 5);
        assert!(report.drops.iter().all(|d| d.col == 0 && d.target_row == d.source_row + 3));
        assert_eq!(
            report.spawns,
            vec![
                SpawnEvent {
                    row: 0,
                    col: 0,
                    color: 4,
                },
                SpawnEvent {
                    row: 1,
                    col: 0,
                    color: 5,
                },
                SpawnEvent {
                    row: 2,
                    col: 0,
                    color: 4,
                },
            ]
        );
        let mut rows: Vec<usize> = report.drops.iter().map(|d| d.target_row).collect();
        rows.extend(report.spawns.iter().map(|s| s.row));
        rows.sort_unstable();
        assert_eq!(rows, (0..8).collect::<Vec<_>>());
        assert_eq!(g.to_string(), "41\n52\n41\n02\n11\n02\n11\n02");
    }

    #[test]
    fn test_chained_cascade_runs_second_pass() {
        // Clearing row 2 drops two 4s onto the 4 at the bottom of column 0.
        let mut g = grid(
            "405\n\
             450\n\
             111\n\
             405",
        );
        let mut colors = ScriptedColors::new(vec![2, 3]);
        let report = resolve(&mut g, 6, &mut colors).unwrap();
        assert_eq!(report.passes, 2);
        assert_eq!(report.cleared, 6);
        assert_eq!(report.drops.len(), 7);
        assert_eq!(
            report.drops.last(),
            Some(&DropEvent {
                source_row: 0,
                target_row: 3,
                col: 0,
            })
        );
        assert_eq!(report.spawns.len(), 6);
        assert_eq!(
            report.pass_spans,
            vec![
                PassSpan {
                    drops: 0..6,
                    spawns: 0..3,
                },
                PassSpan {
                    drops: 6..7,
                    spawns: 3..6,
                },
            ]
        );
        let (second_drops, _) = report.per_pass().nth(1).unwrap();
        assert_eq!(
            second_drops,
            &[DropEvent {
                source_row: 0,
                target_row: 3,
                col: 0,
            }]
        );
        assert_eq!(g.to_string(), "332\n205\n350\n205");
        assert!(find_all_chains(&g).is_empty());
    }

    #[test]
    fn test_resolve_reaches_fixed_point_random() {
        for seed in 0..50 {
            let mut colors = RandomColors::from_seed(Some(seed));
            let mut g = GridMatrix::filled(8, 8, 4, Default::default(), &mut colors);
            resolve(&mut g, 4, &mut colors).unwrap();
            assert!(find_all_chains(&g).is_empty(), "seed {}:\n{}", seed, g);
            assert!(g.positions().all(|p| !g.is_empty(p).unwrap()));
        }
    }

    #[test]
    fn test_refill_only_touches_empty_cells() {
        let mut g = grid(".\n.\n2");
        let mut spawns = Vec::new();
        refill_column(&mut g, 0, 6, &mut ScriptedColors::new(vec![5]), &mut spawns).unwrap();
        assert_eq!(g.to_string(), "5\n5\n2");
        assert_eq!(spawns.len(), 2);
    }
}
