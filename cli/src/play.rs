use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use sweeper_core::*;

use crate::render;

const HELP: &str =
    "r X Y: reveal, f X Y: cycle flag/question mark, c X Y: chord, o X Y: open, h: help, q: quit";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Reveal(Coord2),
    Mark(Coord2),
    Chord(Coord2),
    /// Reveal or chord, depending on the cell
    Open(Coord2),
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or_else(|| anyhow!("Empty command, h for help"))?;

        let mut coord = |name: &str| -> Result<Coord> {
            let word = words.next().ok_or_else(|| anyhow!("Missing {name} coordinate"))?;
            word.parse()
                .with_context(|| format!("Invalid {name} coordinate {word:?}"))
        };

        let action = match command {
            "h" | "help" => return Ok(Self::Help),
            "q" | "quit" => return Ok(Self::Quit),
            "r" | "reveal" => Self::Reveal((coord("x")?, coord("y")?)),
            "f" | "flag" => Self::Mark((coord("x")?, coord("y")?)),
            "c" | "chord" => Self::Chord((coord("x")?, coord("y")?)),
            "o" | "open" => Self::Open((coord("x")?, coord("y")?)),
            other => bail!("Unknown command {other:?}, h for help"),
        };
        Ok(action)
    }
}

/// Reads commands until the game ends, the player quits or input runs out.
pub fn run<G: MineGenerator>(
    session: &mut GameSession<G>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "{HELP}")?;
    loop {
        render::write_board(out, session)?;
        match session.state() {
            SessionState::Won => {
                let elapsed_ms = session.elapsed_ms().unwrap_or_default();
                writeln!(out, "Cleared in {}!", format_elapsed(elapsed_ms))?;
                return Ok(());
            }
            SessionState::Lost => {
                if let Some((x, y)) = session.triggered_mine() {
                    writeln!(out, "Boom! Mine at {x} {y}")?;
                }
                return Ok(());
            }
            SessionState::Setup | SessionState::Active => render::write_status(out, session)?,
        }

        write!(out, "> ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let action = match line.parse::<Action>() {
            Ok(action) => action,
            Err(err) => {
                writeln!(out, "{err:#}")?;
                continue;
            }
        };
        log::debug!("{:?}", action);

        let changed = match action {
            Action::Quit => return Ok(()),
            Action::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Action::Reveal(coords) => session.reveal(coords).map(played),
            Action::Chord(coords) => session.chord(coords).map(played),
            Action::Open(coords) => session.open(coords).map(played),
            Action::Mark(coords) => session.toggle_mark(coords).map(|outcome| outcome.has_update()),
        };
        match changed {
            Ok(true) => {}
            Ok(false) => writeln!(out, "Nothing to do there")?,
            Err(err) => writeln!(out, "{err}")?,
        }
    }
}

/// Whether a move changed the board, logging the one that ends the game.
fn played(outcome: MoveOutcome) -> bool {
    if outcome.is_terminal() {
        log::info!("Game over, last move revealed {} cells", outcome.revealed().len());
    }
    outcome.has_update()
}

/// Asks for a name and records the time when it makes the leaderboard.
pub fn record_win<G: MineGenerator, S: Storage>(
    session: &GameSession<G>,
    store: &mut LeaderboardStore<S>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let key = session.board_key();
    let Some(elapsed_ms) = session.elapsed_ms() else {
        return Ok(());
    };
    if !store.qualifies(key, elapsed_ms) {
        writeln!(out, "Not fast enough for the {key} leaderboard")?;
        return Ok(());
    }

    write!(out, "New best time! Name: ")?;
    out.flush()?;
    let mut name = String::new();
    input.read_line(&mut name)?;
    let name = match name.trim() {
        "" => "anonymous",
        name => name,
    };

    if let Some(rank) = session.report_win(store, name)? {
        writeln!(out, "{name} is #{} on {key}", rank + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn session() -> GameSession<FixedMineGenerator> {
        let config = GameConfig::new((5, 5), 2).unwrap();
        GameSession::with_generator(config, FixedMineGenerator::new([(4, 0), (4, 2)])).unwrap()
    }

    fn play(session: &mut GameSession<FixedMineGenerator>, script: &str) -> String {
        let mut out = Vec::new();
        run(session, &mut Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("r 1 2".parse::<Action>().unwrap(), Action::Reveal((1, 2)));
        assert_eq!("  flag 0 7\n".parse::<Action>().unwrap(), Action::Mark((0, 7)));
        assert_eq!("c 3 3".parse::<Action>().unwrap(), Action::Chord((3, 3)));
        assert_eq!("o 4 1".parse::<Action>().unwrap(), Action::Open((4, 1)));
        assert_eq!("q".parse::<Action>().unwrap(), Action::Quit);
        assert_eq!("h".parse::<Action>().unwrap(), Action::Help);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!("".parse::<Action>().is_err());
        assert!("r 1".parse::<Action>().is_err());
        assert!("r 1 -2".parse::<Action>().is_err());
        assert!("r 1 300".parse::<Action>().is_err());
        assert!("x 1 1".parse::<Action>().is_err());
    }

    #[test]
    fn scripted_game_is_won() {
        let mut session = session();

        let text = play(&mut session, "r 0 4\nr 9 9\nbogus\nf 4 0\no 3 0\n");

        assert_eq!(session.state(), SessionState::Won);
        assert!(text.contains("outside the board"));
        assert!(text.contains("Unknown command"));
        assert!(text.contains("Cleared in"));
    }

    #[test]
    fn played_reports_board_changes() {
        assert!(!played(MoveOutcome::NoChange));
        assert!(played(MoveOutcome::Revealed(vec![(0, 0)])));
        assert!(played(MoveOutcome::Lost {
            mine: (1, 1),
            revealed: vec![]
        }));
    }

    #[test]
    fn scripted_game_is_lost() {
        let mut session = session();

        let text = play(&mut session, "r 0 4\nr 4 2\n");

        assert_eq!(session.state(), SessionState::Lost);
        assert!(text.contains("Boom! Mine at 4 2"));
    }

    #[test]
    fn quitting_or_running_out_of_input_stops() {
        let mut session = session();
        play(&mut session, "r 0 4\nq\nr 4 1\n");
        assert_eq!(session.state(), SessionState::Active);

        let mut session = self::session();
        play(&mut session, "");
        assert_eq!(session.state(), SessionState::Setup);
    }

    #[test]
    fn win_is_recorded_under_given_name() {
        let mut session = session();
        play(&mut session, "r 0 4\nf 4 0\no 3 0\n");
        let mut store = LeaderboardStore::open(MemoryStorage::default()).unwrap();
        let mut out = Vec::new();

        record_win(&session, &mut store, &mut Cursor::new("  ada \n"), &mut out).unwrap();

        let entries = store.entries_for(BoardKey::new(5, 5, 2));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "ada");
        assert!(String::from_utf8(out).unwrap().contains("ada is #1 on 5x5 2"));
    }
}
