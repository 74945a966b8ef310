/// Number of grains stacked on a single cell.
///
/// Heights only reach 4 or more transiently, while a relaxation is in
/// progress; every public pile operation returns with all heights strictly
/// below [`TOPPLE_THRESHOLD`].
pub type Height = u32;

/// Total number of toppling events triggered by a single grain drop.
pub type AvalancheSize = u64;

/// `(row, col)` address of a cell.
///
/// Only meaningful for a given grid size; both components are in `[0, n)`.
pub type Coord = (usize, usize);

/// A cell holding this many grains (or more) topples.
pub const TOPPLE_THRESHOLD: Height = 4;
