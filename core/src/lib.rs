//! Engine for a single-player mine-deduction puzzle: board storage, the rules operating on it, the session state
//! machine of one play-through, and a persisted leaderboard of winning times.

use serde::{Deserialize, Serialize};

pub use engine::{MarkOutcome, RevealOutcome};
pub use error::*;
pub use generator::*;
pub use grid::*;
pub use leaderboard::*;
pub use session::*;
pub use tile::*;
pub use types::*;

pub mod engine;
mod error;
mod generator;
mod grid;
mod leaderboard;
mod session;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    /// Cells kept free of mines around the first reveal, the clicked cell and its neighbors.
    pub const OPENING_BLOCK: CellCount = 9;

    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Validates that the board is not empty and that the mines fit outside a full opening block.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        let total = mult(size.0, size.1);
        if total == 0 || mines.saturating_add(Self::OPENING_BLOCK) > total {
            return Err(GameError::InvalidConfiguration { size, mines });
        }
        Ok(Self::new_unchecked(size, mines))
    }

    pub fn validate(self) -> Result<Self> {
        Self::new(self.size, self.mines)
    }

    pub const fn beginner() -> Self {
        Self::new_unchecked((9, 9), 10)
    }

    pub const fn intermediate() -> Self {
        Self::new_unchecked((16, 16), 40)
    }

    pub const fn expert() -> Self {
        Self::new_unchecked((30, 16), 99)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn board_key(&self) -> BoardKey {
        BoardKey::new(self.size.0, self.size.1, self.mines)
    }
}
