//! Stockfish process and the [`SearchEngine`] seam
//!
//! [`UciEngine`] owns a [`stockfish::Stockfish`] client. The client speaks the
//! protocol; this type adds what the training loop needs on top of it:
//!
//! - positions are described with the full move list of the [`GameState`],
//!   so the engine sees the same repetition history as the rules crate
//! - every `bestmove` is checked for legality before it leaves this module
//! - a dead or garbled process surfaces as [`EngineError::Terminated`]
//!   instead of a panic, and the engine is unusable afterwards

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use chess_rules::{GameState, Move};
use stockfish::{EngineOutput, Stockfish};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::limit::SearchLimit;
use crate::score::Score;

/// Anything that can pick and evaluate moves like a reference engine
pub trait SearchEngine {
    /// Reset per-game engine state before a new game
    fn new_game(&mut self) -> EngineResult<()>;

    /// Best move for the side to move in `state`
    ///
    /// The returned move is always legal in `state`; anything else is an error.
    fn best_move(&mut self, state: &GameState, limit: SearchLimit) -> EngineResult<Move>;

    /// Evaluation of `state` from White's point of view
    fn analyse(&mut self, state: &GameState, limit: SearchLimit) -> EngineResult<Score>;

    /// Engine playing strength, 0 (weakest) to 20 for Stockfish
    fn set_skill_level(&mut self, level: u8) -> EngineResult<()>;
}

/// A running Stockfish process
pub struct UciEngine {
    label: String,
    inner: Stockfish,
    closed: bool,
}

impl std::fmt::Debug for UciEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UciEngine")
            .field("label", &self.label)
            .field("version", self.inner.get_version())
            .field("closed", &self.closed)
            .finish()
    }
}

impl UciEngine {
    /// Launch the engine binary at `path` and wait until it is ready
    pub fn start(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let Some(program) = path.to_str() else {
            return Err(EngineError::Spawn {
                path: label,
                source: io::Error::new(io::ErrorKind::InvalidInput, "path is not valid UTF-8"),
            });
        };

        let inner = match panic::catch_unwind(|| Stockfish::new(program)) {
            Ok(Ok(inner)) => inner,
            Ok(Err(source)) => return Err(EngineError::Spawn { path: label, source }),
            Err(_) => {
                warn!("[ENGINE] {} exited before printing its banner", label);
                return Err(EngineError::Terminated);
            }
        };

        let mut engine = Self {
            label,
            inner,
            closed: false,
        };
        engine.call(|sf| sf.ensure_ready())?;

        info!(
            "[ENGINE] Started {} (version {})",
            engine.label,
            engine.inner.get_version().as_deref().unwrap_or("unknown")
        );
        Ok(engine)
    }

    /// Ask the engine to exit
    pub fn quit(mut self) -> EngineResult<()> {
        self.shutdown()
    }

    /// Run one client call, turning a client panic into [`EngineError::Terminated`]
    ///
    /// The client panics when the process closes its output or prints a
    /// search result it cannot read. Either way the conversation is lost.
    fn call<T>(&mut self, op: impl FnOnce(&mut Stockfish) -> io::Result<T>) -> EngineResult<T> {
        if self.closed {
            return Err(EngineError::Terminated);
        }
        let inner = &mut self.inner;
        let error = match panic::catch_unwind(AssertUnwindSafe(|| op(inner))) {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => EngineError::from(e),
            Err(_) => EngineError::Terminated,
        };
        if matches!(error, EngineError::Terminated) {
            self.closed = true;
            warn!("[ENGINE] {} stopped answering", self.label);
        }
        Err(error)
    }

    /// Send the position and run one search within `limit`
    fn search(&mut self, state: &GameState, limit: SearchLimit) -> EngineResult<EngineOutput> {
        if state.is_game_over() {
            return Err(EngineError::GameOver);
        }
        let position = state.uci_position_command();
        debug!("[ENGINE] >> {} ({})", position, limit);

        let output = self.call(|sf| {
            sf.uci_send(&position)?;
            match limit.clamped() {
                SearchLimit::Depth(depth) => {
                    sf.set_depth(depth);
                    sf.go()
                }
                SearchLimit::MoveTime(time) => sf.go_for(time),
            }
        })?;
        debug!("[ENGINE] << {}", output);
        Ok(output)
    }

    fn shutdown(&mut self) -> EngineResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.quit()?;
        info!("[ENGINE] {} asked to quit", self.label);
        Ok(())
    }
}

impl SearchEngine for UciEngine {
    fn new_game(&mut self) -> EngineResult<()> {
        self.call(|sf| {
            sf.setup_for_new_game()?;
            sf.ensure_ready()
        })
    }

    fn best_move(&mut self, state: &GameState, limit: SearchLimit) -> EngineResult<Move> {
        let output = self.search(state, limit)?;
        let reply = output.best_move().as_str();
        if reply == "(none)" || reply == "0000" {
            return Err(EngineError::NoMove);
        }
        state
            .parse_uci(reply)
            .ok_or_else(|| EngineError::IllegalBestMove {
                uci: reply.to_owned(),
            })
    }

    fn analyse(&mut self, state: &GameState, limit: SearchLimit) -> EngineResult<Score> {
        Ok(self.search(state, limit)?.eval().into())
    }

    fn set_skill_level(&mut self, level: u8) -> EngineResult<()> {
        self.call(|sf| {
            sf.set_skill_level(u32::from(level))?;
            sf.ensure_ready()
        })
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("[ENGINE] Failed to stop {}: {}", self.label, e);
        }
    }
}
