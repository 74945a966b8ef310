//! Queue-driven relaxation of an unstable grid.
//!
//! A drop that pushes a cell to the toppling threshold starts an avalanche:
//! the cell discharges four grains per topple, one to each orthogonal
//! neighbor, and neighbors that reach the threshold in turn are enqueued
//! until the whole grid is stable again. Grains sent across the grid edge
//! leave the system (open boundary).
//!
//! The loop is iterative on purpose: deep avalanches on large grids would
//! overflow the stack if topples recursed into their neighbors.

use crate::grid::Grid;
use crate::types::{AvalancheSize, TOPPLE_THRESHOLD};
use crate::worklist::Worklist;

/// Offsets to the four orthogonal neighbors (north, south, east, west).
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, 1), (0, -1)];

/// Relaxes the grid starting from one possibly-unstable cell.
///
/// Each visit topples a cell in one batch: `times = height / 4` topples are
/// performed at once, removing `times * 4` grains and sending `times` to
/// every in-bounds neighbor. Batching changes nothing about the final state
/// (the model is abelian); it only saves queue churn when a cell has
/// accumulated several threshold multiples.
///
/// ### Parameters
/// - `grid` - The height field to relax; mutated in place.
/// - `row`, `col` - The cell that just received a grain.
/// - `work` - Reusable work-list; resized and cleared on entry.
///
/// ### Returns
/// The avalanche size: the total number of toppling events performed, which
/// is zero when the starting cell is below the threshold.
///
/// On return every cell in the grid is below [`TOPPLE_THRESHOLD`].
///
/// ### Panics
/// Panics if `(row, col)` is outside the grid.
pub fn relax(grid: &mut Grid, row: usize, col: usize, work: &mut Worklist) -> AvalancheSize {
    let n = grid.size();
    work.ensure_len(n * n);
    work.push(row * n + col);

    let mut topplings: AvalancheSize = 0;

    while let Some(cell) = work.pop() {
        let (r, c) = (cell / n, cell % n);

        // A queued cell cannot lose grains before it is popped, so this
        // check only skips cells that were enqueued while already stable.
        let height = grid.height(r, c);
        if height < TOPPLE_THRESHOLD {
            continue;
        }

        // Discharge every complete batch of four grains in one visit.
        let times = height / TOPPLE_THRESHOLD;
        grid.remove_grains(r, c, times * TOPPLE_THRESHOLD);
        topplings += AvalancheSize::from(times);

        for (dr, dc) in NEIGHBOR_OFFSETS {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            if nr < 0 || nr >= n as isize || nc < 0 || nc >= n as isize {
                // Open boundary: these grains leave the system.
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if grid.add_grains(nr, nc, times) >= TOPPLE_THRESHOLD {
                work.push(nr * n + nc);
            }
        }
    }

    topplings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relax_at(grid: &mut Grid, row: usize, col: usize) -> AvalancheSize {
        let mut work = Worklist::with_len(grid.size() * grid.size());
        relax(grid, row, col, &mut work)
    }

    #[test]
    fn stable_start_cell_is_a_no_op() {
        let mut g = Grid::new(3);
        g.add_grains(1, 1, 3);

        assert_eq!(relax_at(&mut g, 1, 1), 0);
        assert_eq!(g.height(1, 1), 3);
        assert_eq!(g.total_grains(), 3);
    }

    #[test]
    fn interior_topple_feeds_all_four_neighbors() {
        let mut g = Grid::new(3);
        g.add_grains(1, 1, 4);

        assert_eq!(relax_at(&mut g, 1, 1), 1);

        assert_eq!(g.height(1, 1), 0);
        assert_eq!(g.height(0, 1), 1);
        assert_eq!(g.height(2, 1), 1);
        assert_eq!(g.height(1, 0), 1);
        assert_eq!(g.height(1, 2), 1);
        // Interior topple: nothing crossed the boundary.
        assert_eq!(g.total_grains(), 4);
        assert!(g.is_stable());
    }

    #[test]
    fn edge_topple_loses_one_grain() {
        let mut g = Grid::new(3);
        // (0, 1) sits on the north edge: 3 in-bounds neighbors.
        g.add_grains(0, 1, 4);

        assert_eq!(relax_at(&mut g, 0, 1), 1);

        assert_eq!(g.height(0, 1), 0);
        assert_eq!(g.height(0, 0), 1);
        assert_eq!(g.height(0, 2), 1);
        assert_eq!(g.height(1, 1), 1);
        assert_eq!(g.total_grains(), 3);
    }

    #[test]
    fn corner_topple_loses_two_grains() {
        let mut g = Grid::new(2);
        // A 2x2 corner has exactly 2 in-bounds neighbors.
        g.add_grains(0, 0, 4);

        assert_eq!(relax_at(&mut g, 0, 0), 1);

        assert_eq!(g.height(0, 0), 0);
        assert_eq!(g.height(0, 1), 1);
        assert_eq!(g.height(1, 0), 1);
        assert_eq!(g.height(1, 1), 0);
        assert_eq!(g.total_grains(), 2);
    }

    #[test]
    fn one_cell_grid_loses_everything() {
        let mut g = Grid::new(1);
        g.add_grains(0, 0, 4);

        // All 4 neighbor directions are out of bounds: one topple, and the
        // whole batch leaves over the boundary.
        assert_eq!(relax_at(&mut g, 0, 0), 1);
        assert_eq!(g.height(0, 0), 0);
        assert_eq!(g.total_grains(), 0);
    }

    #[test]
    fn multiple_threshold_batches_topple_in_one_visit() {
        let mut g = Grid::new(3);
        // Height 9 = two complete batches with one grain left behind.
        g.add_grains(1, 1, 9);

        assert_eq!(relax_at(&mut g, 1, 1), 2);

        assert_eq!(g.height(1, 1), 1);
        for (r, c) in [(0, 1), (2, 1), (1, 0), (1, 2)] {
            assert_eq!(g.height(r, c), 2);
        }
        assert_eq!(g.total_grains(), 9);
        assert!(g.is_stable());
    }

    #[test]
    fn chain_reaction_counts_every_topple() {
        let mut g = Grid::new(3);
        // Prime the center's neighbors so the first topple cascades.
        for (r, c) in [(0, 1), (2, 1), (1, 0), (1, 2)] {
            g.add_grains(r, c, 3);
        }
        g.add_grains(1, 1, 4);

        // Center topples once, raising all four neighbors to 4. Each edge
        // cell topples in turn, returning one grain to the center, which
        // reaches 4 again and topples a second time: 6 events total.
        let topplings = relax_at(&mut g, 1, 1);
        assert_eq!(topplings, 6);
        assert!(g.is_stable());

        // 16 grains total; each edge-cell topple loses exactly one grain
        // over the boundary.
        assert_eq!(g.total_grains(), 12);
        // Second center topple put one grain back on every edge cell.
        for (r, c) in [(0, 1), (2, 1), (1, 0), (1, 2)] {
            assert_eq!(g.height(r, c), 1);
        }
        for (r, c) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_eq!(g.height(r, c), 2);
        }
    }

    #[test]
    fn grid_is_stable_after_any_relaxation() {
        let mut g = Grid::new(4);
        // A pathological pile-up in one corner.
        g.add_grains(0, 0, 64);

        let topplings = relax_at(&mut g, 0, 0);
        assert!(topplings > 0);
        assert!(g.is_stable());
    }
}
