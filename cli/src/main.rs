use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sweeper_core::*;

mod play;
mod render;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Board preset, individual dimensions below override it
    #[arg(short, long, value_enum, default_value_t = Preset::Beginner)]
    preset: Preset,

    #[arg(long)]
    width: Option<Coord>,

    #[arg(long)]
    height: Option<Coord>,

    #[arg(short, long)]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where leaderboard records are kept
    #[arg(long, default_value = ".sweeper")]
    scores_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a game in the terminal (default)
    Play,
    /// Print the leaderboard of every board played so far
    Scores {
        /// Print as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum Preset {
    Beginner,
    Intermediate,
    Expert,
}

impl Preset {
    fn config(self) -> GameConfig {
        match self {
            Self::Beginner => GameConfig::beginner(),
            Self::Intermediate => GameConfig::intermediate(),
            Self::Expert => GameConfig::expert(),
        }
    }
}

impl Args {
    fn game_config(&self) -> Result<GameConfig> {
        let preset = self.preset.config();
        let size = (
            self.width.unwrap_or(preset.size.0),
            self.height.unwrap_or(preset.size.1),
        );
        let mines = self.mines.unwrap_or(preset.mines);
        Ok(GameConfig::new(size, mines)?)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();
    log::debug!("{:?}", args);

    let storage = FileStorage::new(&args.scores_dir)
        .with_context(|| format!("Could not open {}", args.scores_dir.display()))?;
    let mut store = LeaderboardStore::open(storage)?;

    match args.command {
        None | Some(Command::Play) => {
            let config = args.game_config()?;
            let mut session = match args.seed {
                Some(seed) => GameSession::with_seed(config, seed)?,
                None => GameSession::new(config)?,
            };
            let mut input = io::stdin().lock();
            let mut out = io::stdout().lock();
            play::run(&mut session, &mut input, &mut out)?;
            if session.state() == SessionState::Won {
                play::record_win(&session, &mut store, &mut input, &mut out)?;
            }
        }
        Some(Command::Scores { json: true }) => println!("{}", store.to_json()?),
        Some(Command::Scores { json: false }) => {
            render::write_scores(&mut io::stdout().lock(), &store)?;
        }
    }
    Ok(())
}
