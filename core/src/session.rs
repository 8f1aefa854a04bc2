use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use crate::*;

/// Valid transitions:
/// - Setup -> Active, on the first reveal, which also seeds the mines
/// - Active -> Won
/// - Active -> Lost
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Board created, mines not placed yet
    #[default]
    Setup,
    /// Clock running
    Active,
    /// Every safe cell revealed
    Won,
    /// A mine was revealed
    Lost,
}

impl SessionState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// What a player action did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    NoChange,
    Revealed(Vec<Coord2>),
    /// The move revealed the last safe cells
    Won(Vec<Coord2>),
    Lost {
        mine: Coord2,
        revealed: Vec<Coord2>,
    },
}

impl MoveOutcome {
    pub fn has_update(&self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won(_) | Self::Lost { .. })
    }

    /// Safe cells newly revealed by the move.
    pub fn revealed(&self) -> &[Coord2] {
        match self {
            Self::NoChange => &[],
            Self::Revealed(cells) | Self::Won(cells) => cells,
            Self::Lost { revealed, .. } => revealed,
        }
    }
}

/// One play-through, from creating the board to winning or losing it.
#[derive(Clone, Debug)]
pub struct GameSession<G = RandomMineGenerator> {
    config: GameConfig,
    grid: Grid,
    generator: G,
    state: SessionState,
    revealed_count: CellCount,
    flag_count: CellCount,
    triggered_mine: Option<Coord2>,
    started_at: Option<Instant>,
    elapsed: Option<Duration>,
}

impl GameSession<RandomMineGenerator> {
    /// New session with randomly placed mines.
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_generator(config, RandomMineGenerator::from_entropy())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self> {
        Self::with_generator(config, RandomMineGenerator::new(seed))
    }
}

impl<G: MineGenerator> GameSession<G> {
    pub fn with_generator(config: GameConfig, generator: G) -> Result<Self> {
        let config = config.validate()?;
        let grid = Grid::new(config.size, config.mines)?;
        log::debug!(
            "new session {}x{} with {} mines",
            config.size.0,
            config.size.1,
            config.mines
        );
        Ok(Self {
            config,
            grid,
            generator,
            state: SessionState::default(),
            revealed_count: 0,
            flag_count: 0,
            triggered_mine: None,
            started_at: None,
            elapsed: None,
        })
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn board_key(&self) -> BoardKey {
        self.config.board_key()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count
    }

    /// How many mines have not been flagged yet, negative when over-flagged
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flag_count as isize)
    }

    pub fn is_over_flagged(&self) -> bool {
        self.flag_count > self.config.mines
    }

    /// The mine that ended a lost game.
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn cell_view(&self, coords: Coord2) -> Result<CellView> {
        let coords = self.grid.validate_coords(coords)?;
        Ok(self.grid[coords].view())
    }

    /// Time between the first reveal and the end of the game, set once the game ends.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Final time once ended, the running time while active, zero before the first reveal.
    pub fn elapsed_now(&self) -> Duration {
        match (self.elapsed, self.started_at) {
            (Some(elapsed), _) => elapsed,
            (None, Some(started_at)) => started_at.elapsed(),
            (None, None) => Duration::ZERO,
        }
    }

    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    /// Reveal a hidden cell. The first reveal places the mines around it and starts the clock.
    pub fn reveal(&mut self, coords: Coord2) -> Result<MoveOutcome> {
        let coords = self.grid.validate_coords(coords)?;

        match self.state {
            SessionState::Won | SessionState::Lost => return Ok(MoveOutcome::NoChange),
            SessionState::Setup if self.grid[coords].visibility == Visibility::Hidden => {
                self.begin(coords)?;
            }
            SessionState::Setup | SessionState::Active => {}
        }

        let outcome = engine::reveal(&mut self.grid, coords);
        Ok(self.apply(outcome))
    }

    /// Reveal the hidden neighbors of a revealed number whose flags are all placed.
    pub fn chord(&mut self, coords: Coord2) -> Result<MoveOutcome> {
        let coords = self.grid.validate_coords(coords)?;

        if self.state != SessionState::Active {
            return Ok(MoveOutcome::NoChange);
        }

        let outcome = engine::chord(&mut self.grid, coords);
        Ok(self.apply(outcome))
    }

    /// Single-gesture open: chords on a revealed cell, reveals otherwise.
    pub fn open(&mut self, coords: Coord2) -> Result<MoveOutcome> {
        let coords = self.grid.validate_coords(coords)?;

        if self.grid[coords].is_revealed() {
            self.chord(coords)
        } else {
            self.reveal(coords)
        }
    }

    /// Cycle Hidden -> Flagged -> Questioned -> Hidden.
    pub fn toggle_mark(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.grid.validate_coords(coords)?;

        if self.state.is_finished() {
            return Ok(MarkOutcome::NoChange);
        }

        let outcome = engine::toggle_mark(&mut self.grid, coords);
        self.flag_count = self
            .flag_count
            .saturating_add_signed(outcome.flag_delta().into());
        if outcome == MarkOutcome::Flagged && self.is_over_flagged() {
            log::warn!(
                "{} flags placed for {} mines",
                self.flag_count,
                self.config.mines
            );
        }
        Ok(outcome)
    }

    /// Records the final time of a won session on the leaderboard, returning the rank it landed at.
    pub fn report_win<S: Storage>(
        &self,
        store: &mut LeaderboardStore<S>,
        username: &str,
    ) -> StoreResult<Option<usize>> {
        match (self.state, self.elapsed_ms()) {
            (SessionState::Won, Some(elapsed_ms)) => {
                store.add_score(self.board_key(), username, elapsed_ms)
            }
            _ => Err(LeaderboardError::SessionNotWon),
        }
    }

    fn begin(&mut self, coords: Coord2) -> Result<()> {
        let exclude = engine::opening_block(&self.grid, coords);
        self.generator.place_mines(&mut self.grid, &exclude)?;

        self.state = SessionState::Active;
        self.started_at = Some(Instant::now());
        log::debug!("session started at {:?}", coords);
        Ok(())
    }

    fn apply(&mut self, outcome: RevealOutcome) -> MoveOutcome {
        match outcome {
            RevealOutcome::NoChange => MoveOutcome::NoChange,
            RevealOutcome::Revealed(cells) => {
                self.add_revealed(cells.len());
                if self.revealed_count == self.grid.safe_cell_count() {
                    self.finish(true);
                    MoveOutcome::Won(cells)
                } else {
                    MoveOutcome::Revealed(cells)
                }
            }
            RevealOutcome::Detonated { mine, revealed } => {
                self.add_revealed(revealed.len());
                self.triggered_mine = Some(mine);
                self.finish(false);
                MoveOutcome::Lost { mine, revealed }
            }
        }
    }

    fn add_revealed(&mut self, count: usize) {
        // bounded by the cell count, which fits `CellCount`
        self.revealed_count += count as CellCount;
    }

    fn finish(&mut self, won: bool) {
        self.state = if won {
            SessionState::Won
        } else {
            SessionState::Lost
        };
        self.elapsed = Some(self.elapsed_now());

        if won {
            self.flag_count += engine::flag_remaining_mines(&mut self.grid);
        } else {
            engine::expose_all(&mut self.grid);
        }
        log::debug!("session {:?} after {:?}", self.state, self.elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(size: Coord2, mines: &[Coord2]) -> GameSession<FixedMineGenerator> {
        let config = GameConfig::new_unchecked(size, mines.len() as CellCount);
        GameSession::with_generator(config, FixedMineGenerator::new(mines)).unwrap()
    }

    #[test]
    fn new_rejects_crowded_board() {
        let config = GameConfig::new_unchecked((4, 4), 8);
        assert!(matches!(
            GameSession::new(config),
            Err(GameError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn first_reveal_starts_session() {
        let mut session = fixed((4, 4), &[(3, 0), (3, 3)]);
        assert_eq!(session.state(), SessionState::Setup);
        assert!(!session.grid().is_seeded());

        let outcome = session.reveal((0, 3)).unwrap();

        assert!(session.grid().is_seeded());
        assert_eq!(session.state(), SessionState::Active);
        assert!(!outcome.is_terminal());
        assert_eq!(outcome.revealed().len(), 12);
        assert_eq!(session.revealed_count(), 12);
        assert!(session.elapsed().is_none());
    }

    #[test]
    fn zero_mine_board_is_won_on_first_reveal() {
        let mut session = GameSession::with_seed(GameConfig::new((3, 3), 0).unwrap(), 1).unwrap();

        let outcome = session.reveal((1, 1)).unwrap();

        assert_eq!(outcome.revealed().len(), 9);
        assert!(matches!(outcome, MoveOutcome::Won(_)));
        assert_eq!(session.revealed_count(), 9);
        assert_eq!(session.state(), SessionState::Won);
        assert!(session.elapsed().is_some());
    }

    #[test]
    fn revealing_a_mine_loses_and_exposes_board() {
        let mut session = fixed((4, 4), &[(3, 0), (3, 3)]);
        session.reveal((0, 0)).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        let revealed_before = session.revealed_count();

        let outcome = session.reveal((3, 3)).unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Lost {
                mine: (3, 3),
                revealed: vec![]
            }
        );
        assert!(outcome.is_terminal());
        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(session.triggered_mine(), Some((3, 3)));
        assert_eq!(session.revealed_count(), revealed_before);
        assert!(session.grid().iter().all(|(_, cell)| cell.is_revealed()));
    }

    #[test]
    fn finished_session_ignores_actions() {
        let mut session = fixed((4, 4), &[(3, 0), (3, 3)]);
        session.reveal((0, 0)).unwrap();
        session.reveal((3, 3)).unwrap();
        let elapsed = session.elapsed();
        let grid = session.grid().clone();

        assert_eq!(session.reveal((3, 0)).unwrap(), MoveOutcome::NoChange);
        assert_eq!(session.chord((2, 0)).unwrap(), MoveOutcome::NoChange);
        assert_eq!(session.toggle_mark((3, 0)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(session.grid(), &grid);
        assert_eq!(session.elapsed(), elapsed);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut session = fixed((4, 4), &[(3, 3)]);

        assert_eq!(
            session.reveal((4, 0)),
            Err(GameError::OutOfBounds { coords: (4, 0) })
        );
        assert_eq!(
            session.toggle_mark((0, 9)),
            Err(GameError::OutOfBounds { coords: (0, 9) })
        );
        assert!(session.chord((9, 9)).is_err());
        assert_eq!(session.state(), SessionState::Setup);
    }

    #[test]
    fn marks_track_flag_budget() {
        let mut session = fixed((4, 4), &[(3, 3)]);

        assert_eq!(session.toggle_mark((0, 0)).unwrap(), MarkOutcome::Flagged);
        assert_eq!(session.toggle_mark((1, 0)).unwrap(), MarkOutcome::Flagged);
        assert_eq!(session.flag_count(), 2);
        assert_eq!(session.mines_left(), -1);
        assert!(session.is_over_flagged());

        assert_eq!(session.toggle_mark((1, 0)).unwrap(), MarkOutcome::Questioned);
        assert_eq!(session.flag_count(), 1);
        assert_eq!(session.toggle_mark((1, 0)).unwrap(), MarkOutcome::Cleared);
        assert_eq!(session.flag_count(), 1);
        assert!(!session.is_over_flagged());
    }

    #[test]
    fn marked_first_click_does_not_seed() {
        let mut session = fixed((4, 4), &[(3, 3)]);
        session.toggle_mark((0, 0)).unwrap();

        assert_eq!(session.reveal((0, 0)).unwrap(), MoveOutcome::NoChange);
        assert_eq!(session.state(), SessionState::Setup);
        assert!(!session.grid().is_seeded());
    }

    #[test]
    fn bad_layout_keeps_session_in_setup() {
        let mut session = fixed((4, 4), &[(0, 0)]);

        assert_eq!(session.reveal((1, 1)), Err(GameError::InvalidLayout));
        assert_eq!(session.state(), SessionState::Setup);
    }

    #[test]
    fn open_chords_revealed_numbers() {
        let mut session = fixed((5, 5), &[(4, 0), (4, 2)]);
        session.reveal((0, 4)).unwrap();
        assert_eq!(session.cell_view((3, 0)).unwrap(), CellView::Number(1));
        assert_eq!(session.cell_view((4, 1)).unwrap(), CellView::Hidden);

        // one flag short, nothing to chord yet
        assert_eq!(session.open((3, 0)).unwrap(), MoveOutcome::NoChange);
        session.toggle_mark((4, 0)).unwrap();

        let outcome = session.open((3, 0)).unwrap();

        assert_eq!(outcome, MoveOutcome::Won(vec![(4, 1)]));
        assert_eq!(session.cell_view((4, 1)).unwrap(), CellView::Number(2));
        assert_eq!(session.cell_view((4, 2)).unwrap(), CellView::Flagged);
    }

    #[test]
    fn win_flags_remaining_mines() {
        let mut session = fixed((4, 4), &[(3, 3)]);

        let outcome = session.reveal((0, 0)).unwrap();

        assert!(matches!(outcome, MoveOutcome::Won(_)));
        assert_eq!(session.cell_view((3, 3)).unwrap(), CellView::Flagged);
        assert_eq!(session.mines_left(), 0);
    }

    #[test]
    fn report_win_requires_won_session() {
        let mut store = LeaderboardStore::open(MemoryStorage::default()).unwrap();
        let mut session = fixed((4, 4), &[(3, 3)]);

        assert!(matches!(
            session.report_win(&mut store, "early"),
            Err(LeaderboardError::SessionNotWon)
        ));

        session.reveal((0, 0)).unwrap();
        let rank = session.report_win(&mut store, "ada").unwrap();

        assert_eq!(rank, Some(0));
        let entries = store.entries_for(session.board_key());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "ada");
        assert_eq!(Some(entries[0].elapsed_ms), session.elapsed_ms());
    }
}
