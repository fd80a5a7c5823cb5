//! Error types for the reference engine client

use std::io;

use thiserror::Error;

/// Errors talking to the reference engine
///
/// Every variant is fatal for the game in progress. Nothing is retried
/// here; the caller drops the engine and may start a new process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine executable could not be launched
    #[error("Failed to start engine at {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Reading from or writing to the engine pipes failed
    #[error("Engine I/O error: {0}")]
    Io(#[source] io::Error),

    /// The engine closed its pipes, exited or printed output that could not be read
    #[error("Engine process terminated unexpectedly")]
    Terminated,

    /// The engine answered `bestmove (none)` for a position that has moves
    #[error("Engine returned no move for a non-terminal position")]
    NoMove,

    /// The engine proposed a move that is not legal in the position sent
    #[error("Engine returned illegal move {uci}")]
    IllegalBestMove { uci: String },

    /// A search was requested for a finished game
    #[error("Cannot search a finished game")]
    GameOver,
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => EngineError::Terminated,
            _ => EngineError::Io(err),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
