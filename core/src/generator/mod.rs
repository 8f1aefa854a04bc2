use crate::*;
pub use fixed::*;
pub use random::*;

mod fixed;
mod random;

/// Strategy for the deferred mine placement that happens on the first reveal.
pub trait MineGenerator {
    /// Places exactly `grid.mine_count()` mines and numbers the board, never putting a mine on `exclude`.
    fn place_mines(&mut self, grid: &mut Grid, exclude: &[Coord2]) -> Result<()>;
}
