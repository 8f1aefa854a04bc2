//! Board rules operating on a [`Grid`]: mine seeding, numbering, flood reveal, chording and marking.
//!
//! Every function here expects in-bounds coordinates and panics otherwise, [`GameSession`] validates player input
//! before calling in.

use core::ops::BitOr;
use std::collections::VecDeque;
use hashbrown::HashSet;
use rand::Rng;
use smallvec::SmallVec;

use crate::*;

/// Result of a reveal or chord.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    /// Safe cells newly revealed, in reveal order.
    Revealed(Vec<Coord2>),
    /// A mine was revealed; `revealed` holds safe cells revealed before it by the same action.
    Detonated { mine: Coord2, revealed: Vec<Coord2> },
}

impl RevealOutcome {
    pub fn has_update(&self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub fn is_detonated(&self) -> bool {
        matches!(self, Self::Detonated { .. })
    }

    /// Safe cells revealed by this outcome.
    pub fn revealed(&self) -> &[Coord2] {
        match self {
            Self::NoChange => &[],
            Self::Revealed(cells) => cells,
            Self::Detonated { revealed, .. } => revealed,
        }
    }
}

/// Used to merge outcomes when chording
impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (NoChange, other) | (other, NoChange) => other,
            (Revealed(mut lhs), Revealed(rhs)) => {
                lhs.extend(rhs);
                Revealed(lhs)
            }
            // the first detonation wins
            (Detonated { mine, mut revealed }, rhs) => {
                revealed.extend_from_slice(rhs.revealed());
                Detonated { mine, revealed }
            }
            (Revealed(mut lhs), Detonated { mine, revealed }) => {
                lhs.extend(revealed);
                Detonated { mine, revealed: lhs }
            }
        }
    }
}

/// Result of cycling a mark on a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    /// Hidden -> Flagged
    Flagged,
    /// Flagged -> Questioned
    Questioned,
    /// Questioned -> Hidden
    Cleared,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Change to the running flag count caused by this mark.
    pub const fn flag_delta(self) -> i8 {
        match self {
            Self::Flagged => 1,
            Self::Questioned => -1,
            Self::NoChange | Self::Cleared => 0,
        }
    }
}

/// The first revealed cell together with its neighbors, these never receive a mine.
pub fn opening_block(grid: &Grid, coords: Coord2) -> SmallVec<[Coord2; 9]> {
    let mut block = SmallVec::new();
    block.push(coords);
    block.extend(grid.iter_neighbors(coords));
    block
}

/// Places `grid.mine_count()` mines uniformly at random among the cells not in `exclude`, then numbers the board.
pub fn seed_mines<R: Rng + ?Sized>(grid: &mut Grid, exclude: &[Coord2], rng: &mut R) -> Result<()> {
    let excluded: HashSet<Coord2> = exclude.iter().copied().collect();
    let eligible: Vec<Coord2> = grid.coords().filter(|pos| !excluded.contains(pos)).collect();
    let mine_count = usize::from(grid.mine_count());

    if mine_count > eligible.len() {
        return Err(GameError::InvalidConfiguration {
            size: grid.size(),
            mines: grid.mine_count(),
        });
    }

    let mines: Vec<Coord2> = rand::seq::index::sample(rng, eligible.len(), mine_count)
        .into_iter()
        .map(|index| eligible[index])
        .collect();
    log::debug!(
        "seeding {} mines among {} eligible cells",
        mine_count,
        eligible.len()
    );
    place_mines(grid, &mines, exclude)
}

/// Places mines at exactly `mines`, then numbers the board.
///
/// Fails with [`GameError::InvalidLayout`] when the grid is already seeded, the count differs from the grid's mine
/// count, a coordinate repeats or is out of bounds, or a mine lands in `exclude`.
pub fn place_mines(grid: &mut Grid, mines: &[Coord2], exclude: &[Coord2]) -> Result<()> {
    if grid.is_seeded() || mines.len() != usize::from(grid.mine_count()) {
        return Err(GameError::InvalidLayout);
    }

    let mut seen = HashSet::with_capacity(mines.len());
    for &coords in mines {
        if !grid.contains(coords) || exclude.contains(&coords) || !seen.insert(coords) {
            log::warn!("rejecting mine layout at {:?}", coords);
            return Err(GameError::InvalidLayout);
        }
    }

    for &coords in mines {
        grid[coords].content = Content::Mine;
    }
    compute_numbers(grid);
    grid.mark_seeded();
    Ok(())
}

/// Sets every safe cell to the count of its mine neighbors.
pub fn compute_numbers(grid: &mut Grid) {
    for coords in grid.coords() {
        if grid[coords].content.is_mine() {
            continue;
        }
        let count = grid.count_neighbors(coords, |cell| cell.content.is_mine());
        grid[coords].content = Content::from_count(count);
    }
}

/// Reveals a hidden cell, flooding through connected empty cells.
///
/// Flagged, questioned and already revealed cells are left alone.
pub fn reveal(grid: &mut Grid, coords: Coord2) -> RevealOutcome {
    let cell = grid[coords];
    if cell.visibility != Visibility::Hidden {
        return RevealOutcome::NoChange;
    }

    grid.set_visibility(coords, Visibility::Revealed);
    match cell.content {
        Content::Mine => {
            log::debug!("mine revealed at {:?}", coords);
            RevealOutcome::Detonated {
                mine: coords,
                revealed: Vec::new(),
            }
        }
        Content::Number(count) => {
            log::debug!("revealed {:?}, adjacent mines: {}", coords, count);
            RevealOutcome::Revealed(vec![coords])
        }
        Content::Empty => RevealOutcome::Revealed(flood_from(grid, coords)),
    }
}

/// Breadth-first expansion from an already revealed empty cell.
fn flood_from(grid: &mut Grid, start: Coord2) -> Vec<Coord2> {
    let mut revealed = vec![start];
    let mut frontier = VecDeque::from([start]);

    while let Some(pos) = frontier.pop_front() {
        for neighbor in grid.iter_neighbors(pos) {
            let cell = grid[neighbor];
            if cell.visibility != Visibility::Hidden || cell.content.is_mine() {
                continue;
            }

            grid.set_visibility(neighbor, Visibility::Revealed);
            revealed.push(neighbor);
            log::trace!("flood revealed {:?} from {:?}", neighbor, pos);

            if cell.content == Content::Empty {
                frontier.push_back(neighbor);
            }
        }
    }

    log::debug!("flood from {:?} revealed {} cells", start, revealed.len());
    revealed
}

/// Whether [`chord`] on `coords` would reveal anything.
pub fn can_chord(grid: &Grid, coords: Coord2) -> bool {
    chord_count(grid, coords).is_some()
        && grid
            .iter_neighbors(coords)
            .any(|pos| grid[pos].visibility == Visibility::Hidden)
}

/// The mine count of a revealed number whose flagged neighbors match it, unless a neighbor is questioned.
fn chord_count(grid: &Grid, coords: Coord2) -> Option<u8> {
    let Cell {
        content: Content::Number(count),
        visibility: Visibility::Revealed,
    } = grid[coords]
    else {
        return None;
    };

    let mut flags = 0;
    for pos in grid.iter_neighbors(coords) {
        match grid[pos].visibility {
            Visibility::Flagged => flags += 1,
            // a single question mark blocks the whole chord
            Visibility::Questioned => return None,
            Visibility::Hidden | Visibility::Revealed => {}
        }
    }

    (flags == count).then_some(count)
}

/// Reveals every hidden neighbor of a revealed number once its flag count matches.
///
/// Stops at the first mine hit.
pub fn chord(grid: &mut Grid, coords: Coord2) -> RevealOutcome {
    if chord_count(grid, coords).is_none() {
        return RevealOutcome::NoChange;
    }

    let mut outcome = RevealOutcome::NoChange;
    for neighbor in grid.iter_neighbors(coords) {
        outcome = outcome | reveal(grid, neighbor);
        if outcome.is_detonated() {
            break;
        }
    }
    log::debug!("chord at {:?}: {:?}", coords, outcome);
    outcome
}

/// Cycles Hidden -> Flagged -> Questioned -> Hidden, revealed cells are left alone.
pub fn toggle_mark(grid: &mut Grid, coords: Coord2) -> MarkOutcome {
    let (next, outcome) = match grid[coords].visibility {
        Visibility::Hidden => (Visibility::Flagged, MarkOutcome::Flagged),
        Visibility::Flagged => (Visibility::Questioned, MarkOutcome::Questioned),
        Visibility::Questioned => (Visibility::Hidden, MarkOutcome::Cleared),
        Visibility::Revealed => return MarkOutcome::NoChange,
    };
    grid.set_visibility(coords, next);
    outcome
}

/// Marks every cell revealed, without cascading. Used to show the whole board after a loss.
pub fn expose_all(grid: &mut Grid) {
    for coords in grid.coords() {
        grid.set_visibility(coords, Visibility::Revealed);
    }
}

/// Flags every mine that is still unrevealed and unflagged, returning how many flags were added.
pub fn flag_remaining_mines(grid: &mut Grid) -> CellCount {
    let mut added = 0;
    for coords in grid.coords() {
        let cell = grid[coords];
        if cell.content.is_mine()
            && matches!(cell.visibility, Visibility::Hidden | Visibility::Questioned)
        {
            grid.set_visibility(coords, Visibility::Flagged);
            added += 1;
        }
    }
    added
}
