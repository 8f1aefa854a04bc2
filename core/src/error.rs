use thiserror::Error;

use crate::{CellCount, Coord2};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error(
        "Invalid configuration: {mines} mines do not fit a {}x{} board with a safe opening",
        .size.0,
        .size.1
    )]
    InvalidConfiguration { size: Coord2, mines: CellCount },
    #[error("Coordinates {coords:?} are outside the board")]
    OutOfBounds { coords: Coord2 },
    #[error("Mine layout does not match the board")]
    InvalidLayout,
}

pub type Result<T> = core::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("Leaderboard storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Only won sessions can be recorded")]
    SessionNotWon,
    #[error("Could not export leaderboard: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = core::result::Result<T, LeaderboardError>;
