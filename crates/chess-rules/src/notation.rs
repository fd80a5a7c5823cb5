//! Move notation helpers
//!
//! shakmaty represents castling as "king takes own rook". Everything in this
//! crate reports castling the standard way instead (`e1g1`, `e1c1`), because
//! that is what UCI engines speak and what the move codec indexes. The
//! conversion goes through [`UciMove`] in [`CastlingMode::Standard`].

use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Move, Square};

/// Origin and destination squares of a move, castling as king origin/destination
pub fn move_squares(m: &Move) -> (Square, Square) {
    match m.to_uci(CastlingMode::Standard) {
        UciMove::Normal { from, to, .. } => (from, to),
        // Drops and null moves never come out of standard chess
        _ => (m.from().unwrap_or_else(|| m.to()), m.to()),
    }
}

/// Algebraic name of a square, e.g. `e4`
pub fn square_name(square: Square) -> String {
    square.to_string()
}

/// Standard UCI notation for a move (`e2e4`, `e7e8q`, `e1g1`)
pub fn uci(m: &Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}
