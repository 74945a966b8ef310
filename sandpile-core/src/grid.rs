use crate::types::{Height, TOPPLE_THRESHOLD};

/// An `n x n` field of grain heights stored as one contiguous row-major
/// buffer.
///
/// The grid knows nothing about toppling; it provides bounds-checked cell
/// access, bulk reset, and fully independent snapshots. Ownership is
/// exclusive to the [`crate::sandpile::Sandpile`] aggregate, so a snapshot
/// taken between pile operations can never observe a half-relaxed state.
///
/// Internally, cell `(row, col)` lives at index `row * size + col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Height>,
}

impl Grid {
    /// Creates an all-zero grid with the given edge length.
    ///
    /// `size` is assumed positive; [`crate::config::Config::validate`] is
    /// the public gate for that constraint.
    ///
    /// ### Parameters
    /// - `size` - Edge length of the square grid.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Edge length of the grid.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Flat index of `(row, col)`.
    ///
    /// ### Panics
    /// Panics if either coordinate is outside `[0, size)`. Checking both
    /// coordinates matters: an overlarge column would otherwise alias into
    /// the next row.
    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.size && col < self.size,
            "cell ({row}, {col}) out of bounds for {n}x{n} grid",
            n = self.size
        );
        row * self.size + col
    }

    /// Current height of one cell.
    ///
    /// ### Panics
    /// Panics if `(row, col)` is out of bounds.
    #[inline]
    pub fn height(&self, row: usize, col: usize) -> Height {
        self.cells[self.idx(row, col)]
    }

    /// Adds a single grain to one cell and returns the new height.
    #[inline]
    pub fn add_grain(&mut self, row: usize, col: usize) -> Height {
        self.add_grains(row, col, 1)
    }

    /// Adds `count` grains to one cell and returns the new height.
    ///
    /// ### Panics
    /// Panics if `(row, col)` is out of bounds.
    #[inline]
    pub fn add_grains(&mut self, row: usize, col: usize, count: Height) -> Height {
        let i = self.idx(row, col);
        self.cells[i] += count;
        self.cells[i]
    }

    /// Removes `count` grains from one cell and returns the new height.
    ///
    /// ### Panics
    /// Panics if `(row, col)` is out of bounds or the cell holds fewer than
    /// `count` grains.
    #[inline]
    pub fn remove_grains(&mut self, row: usize, col: usize, count: Height) -> Height {
        let i = self.idx(row, col);
        assert!(
            self.cells[i] >= count,
            "cell ({row}, {col}) holds {} grains, cannot remove {count}",
            self.cells[i]
        );
        self.cells[i] -= count;
        self.cells[i]
    }

    /// Sets every height back to zero. The length is unchanged.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    /// Returns an independent deep copy of the height matrix.
    ///
    /// The returned rows share no storage with the live grid, so a caller
    /// can inspect them freely while the pile keeps mutating.
    ///
    /// ### Returns
    /// A `size`-element vector of `size`-element rows.
    pub fn snapshot(&self) -> Vec<Vec<Height>> {
        self.cells.chunks(self.size).map(|row| row.to_vec()).collect()
    }

    /// Sum of all heights currently in the grid.
    pub fn total_grains(&self) -> u64 {
        self.cells.iter().map(|&h| u64::from(h)).sum()
    }

    /// `true` if every cell is below the toppling threshold.
    pub fn is_stable(&self) -> bool {
        self.cells.iter().all(|&h| h < TOPPLE_THRESHOLD)
    }
}
