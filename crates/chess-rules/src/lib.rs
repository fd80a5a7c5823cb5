//! Chess rules for XFChess self-play training
//!
//! Thin, owned wrapper around [`shakmaty`] that exposes exactly what the
//! training pipeline consumes from a rules engine:
//!
//! - legal move generation and legality checks
//! - push/pop of moves on an explicitly owned [`GameState`]
//! - terminal detection and outcome (checkmate, stalemate, insufficient
//!   material, seventy-five-move rule, fivefold repetition)
//! - move notation (SAN for logs, UCI for engine communication)
//!
//! There is no global board: every caller owns its `GameState` and threads
//! it through explicitly.

pub mod error;
pub mod notation;
pub mod state;

pub use error::{RulesError, RulesResult};
pub use notation::{move_squares, square_name, uci};
pub use state::{CastlingRights, GameOutcome, GameState, Termination};

pub use shakmaty::{Color, Move, Piece, Role, Square};
