//! Error types for the rules adapter

use thiserror::Error;

/// Errors raised while building or mutating a [`crate::GameState`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// The move is not in the legal move set of the current position
    #[error("Illegal move {uci} in position after {ply} plies")]
    IllegalMove { uci: String, ply: usize },

    /// FEN text could not be parsed or describes an impossible position
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
}

/// Result type alias for rules operations
pub type RulesResult<T> = Result<T, RulesError>;
