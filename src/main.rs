use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chess_rules::GameState;
use clap::{Parser, Subcommand};
use stockfish_uci::{GameAnalyzer, SearchLimit, UciEngine};
use tracing::info;

use xfchess_trainer::config::user_config_path;
use xfchess_trainer::orchestrator::{
    spawn_evaluation, spawn_training, Session, SessionEvent, SessionSummary,
};
use xfchess_trainer::{logging, FileCheckpoint, TrainerConfig};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(author, version, about = "Self-play trainer for the XFChess move predictor")]
struct Cli {
    /// Configuration file, defaults to the per-user trainer.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run self-play, training and checkpointing iterations
    Train {
        #[arg(long)]
        iterations: Option<usize>,
        /// Games per iteration
        #[arg(long)]
        games: Option<usize>,
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        lr: Option<f64>,
        /// Engine depth while it stands in for the untrained predictor
        #[arg(long)]
        depth: Option<u32>,
    },
    /// Play the checkpointed predictor against the engine without training
    Evaluate {
        #[arg(long)]
        games: Option<usize>,
    },
    /// Print the engine evaluation after every move of a game
    Analyze {
        /// Moves from the initial position in UCI notation, e.g. e2e4 e7e5
        #[arg(required = true)]
        moves: Vec<String>,
        #[arg(long)]
        depth: Option<u32>,
    },
    /// Print the effective configuration
    Config {
        /// Persist it to the per-user configuration file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = TrainerConfig::load(cli.config.as_deref())?;

    let log_dir = match cli.command {
        Command::Train { .. } | Command::Evaluate { .. } => Some(config.log_dir.clone()),
        _ => None,
    };
    logging::init(cli.verbose, log_dir.as_deref())?;

    match cli.command {
        Command::Train {
            iterations,
            games,
            epochs,
            batch_size,
            lr,
            depth,
        } => {
            if let Some(v) = iterations {
                config.iterations = v;
            }
            if let Some(v) = games {
                config.games_per_iteration = v;
            }
            if let Some(v) = epochs {
                config.epochs = v;
            }
            if let Some(v) = batch_size {
                config.batch_size = v;
            }
            if let Some(v) = lr {
                config.learning_rate = v;
            }
            if let Some(v) = depth {
                config.search_depth = v;
            }
            config.validate(true)?;
            train(config)
        }
        Command::Evaluate { games } => {
            if let Some(v) = games {
                config.eval_games = v;
            }
            config.validate(false)?;
            evaluate(config)
        }
        Command::Analyze { moves, depth } => {
            analyze(&config, &moves, depth.unwrap_or(config.search_depth))
        }
        Command::Config { write } => {
            println!("{}", config.to_json()?);
            if write {
                let path = config.save_user()?;
                println!("Wrote {}", path.display());
            } else if let Some(path) = user_config_path() {
                println!("(config file: {})", path.display());
            }
            Ok(())
        }
    }
}

fn train(config: TrainerConfig) -> Result<()> {
    info!(
        "[MAIN] Training {} iterations of {} games against {:?}",
        config.iterations, config.games_per_iteration, config.engine_path
    );
    let engine_path = config.engine_path.clone();
    let store = FileCheckpoint::new(config.checkpoint_path.clone());
    let session = spawn_training(config, move || UciEngine::start(engine_path), store)
        .context("Failed to start training thread")?;

    let (report, summary) = drive(session)?;
    println!(
        "Trained {} iterations: {} games (+{} ={} -{}), {} records, rating {:.0}",
        report.iterations,
        report.games_played,
        report.white_wins,
        report.draws,
        report.black_wins,
        report.records,
        report.final_rating
    );
    if let Some(loss) = report.final_loss {
        println!("Final loss {:.4} after {} epochs", loss, summary.epochs);
    }
    Ok(())
}

fn evaluate(config: TrainerConfig) -> Result<()> {
    let engine_path = config.engine_path.clone();
    let store = FileCheckpoint::new(config.checkpoint_path.clone());
    let session = spawn_evaluation(config, move || UciEngine::start(engine_path), store)
        .context("Failed to start evaluation thread")?;

    let (report, _) = drive(session)?;
    println!(
        "Predictor: {} wins, {} draws, {} losses over {} games",
        report.predictor_wins, report.draws, report.engine_wins, report.games
    );
    if let Some(rate) = report.score_rate() {
        println!("Score {:.1}%, rating {:.0}", rate * 100.0, report.rating);
    }
    Ok(())
}

/// Poll the session until the worker returns, printing a line per game
fn drive<T>(mut session: Session<T>) -> Result<(T, SessionSummary)> {
    while !session.is_finished() {
        print_games(session.poll());
        thread::sleep(POLL_INTERVAL);
    }
    // Events sent just before the worker returned
    print_games(session.poll());
    Ok(session.wait()?)
}

fn print_games(events: Vec<SessionEvent>) {
    for event in events {
        if let SessionEvent::GameFinished {
            iteration,
            game,
            outcome,
            plies,
            rating,
        } = event
        {
            match rating {
                Some(rating) => println!(
                    "[{}:{}] {:?} in {} plies, rating {:.0}",
                    iteration, game, outcome, plies, rating
                ),
                None => println!("[{}:{}] {:?} in {} plies", iteration, game, outcome, plies),
            }
        }
    }
}

fn analyze(config: &TrainerConfig, moves: &[String], depth: u32) -> Result<()> {
    let mut game = GameState::new();
    for text in moves {
        let Some(m) = game.parse_uci(text) else {
            bail!("'{}' is not a legal move after {} plies", text, game.ply());
        };
        game.push(m)?;
    }

    let mut engine = UciEngine::start(&config.engine_path)
        .with_context(|| format!("Failed to start engine {:?}", config.engine_path))?;
    let evaluations = GameAnalyzer::new(&mut engine, SearchLimit::Depth(depth)).analyze(&game)?;

    for (ply, eval) in evaluations.iter().enumerate() {
        let number = ply / 2 + 1;
        let dots = if ply % 2 == 0 { "." } else { "..." };
        println!(
            "{}{} {:<8} {:>7}",
            number, dots, eval.san, eval.white_centipawns
        );
    }
    engine.quit()?;
    Ok(())
}
