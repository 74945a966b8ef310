//! The owning aggregate: one grid, one cell picker, one reusable work-list.

use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::grid::Grid;
use crate::relax::relax;
use crate::rng::CellPicker;
use crate::types::{AvalancheSize, Height, TOPPLE_THRESHOLD};
use crate::worklist::Worklist;

/// An Abelian sandpile on an `n x n` grid with open boundaries.
///
/// The pile owns its [`Grid`] and [`CellPicker`] for its whole lifetime;
/// state is mutated only by [`Sandpile::drop_grain_and_relax`] (directly or
/// via [`Sandpile::run_drops`]) and [`Sandpile::reset`]. Every public
/// operation returns with the grid fully stable, so a snapshot taken
/// between calls always shows a post-relaxation state.
///
/// The pile is single-threaded and not re-entrant; concurrent use of one
/// instance requires external mutual exclusion (the `&mut self` receivers
/// make the compiler enforce exactly that).
#[derive(Debug)]
pub struct Sandpile {
    grid: Grid,
    picker: CellPicker,
    work: Worklist,
}

impl Sandpile {
    /// Creates an all-zero pile.
    ///
    /// ### Parameters
    /// - `size` - Grid edge length; must be positive.
    /// - `seed` - Seed for the random cell picker.
    ///
    /// ### Returns
    /// The pile, or [`ConfigError::ZeroGridSize`] for an empty grid.
    pub fn new(size: usize, seed: u64) -> Result<Self, ConfigError> {
        Self::from_config(&Config { size, seed })
    }

    /// Creates an all-zero pile from a validated [`Config`].
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        debug!(size = cfg.size, seed = cfg.seed, "building sandpile");
        Ok(Self {
            grid: Grid::new(cfg.size),
            picker: CellPicker::new(cfg.seed, cfg.size),
            work: Worklist::with_len(cfg.size * cfg.size),
        })
    }

    /// Grid edge length.
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Drops one grain on a random cell and relaxes the grid to stability.
    ///
    /// If the target cell stays below the toppling threshold the grid was
    /// stable already and no relaxation work happens at all.
    ///
    /// ### Returns
    /// The avalanche size: the total number of toppling events triggered by
    /// this drop (zero for most drops on a sparse grid).
    pub fn drop_grain_and_relax(&mut self) -> AvalancheSize {
        let (row, col) = self.picker.pick();
        if self.grid.add_grain(row, col) < TOPPLE_THRESHOLD {
            return 0;
        }
        relax(&mut self.grid, row, col, &mut self.work)
    }

    /// Performs `drops` sequential drop-and-relax calls.
    ///
    /// Each drop observes the fully relaxed state left by the previous one.
    ///
    /// ### Returns
    /// The avalanche sizes in drop order; empty for `drops == 0`.
    pub fn run_drops(&mut self, drops: usize) -> Vec<AvalancheSize> {
        let mut sizes = Vec::with_capacity(drops);
        for _ in 0..drops {
            sizes.push(self.drop_grain_and_relax());
        }
        sizes
    }

    /// Returns an independent deep copy of the current height matrix.
    pub fn snapshot(&self) -> Vec<Vec<Height>> {
        self.grid.snapshot()
    }

    /// Sum of all heights currently on the grid.
    pub fn total_grains(&self) -> u64 {
        self.grid.total_grains()
    }

    /// `true` if every cell is below the toppling threshold.
    pub fn is_stable(&self) -> bool {
        self.grid.is_stable()
    }

    /// Zeroes all heights. The cell picker keeps its state: the sequence of
    /// targets after a reset continues where it left off.
    pub fn reset(&mut self) {
        debug!(size = self.grid.size(), "resetting sandpile");
        self.grid.reset();
    }
}
