//! Move ↔ action index codec
//!
//! A move is indexed as `from * 73 + to`, with squares numbered a1 = 0 to
//! h8 = 63 and castling written as the king's own move (`e1g1`). The stride
//! of 73 leaves room for a per-square move-type action space, so the policy
//! vector has `64 * 73` entries even though only destinations 0-63 are ever
//! produced.
//!
//! # Promotions
//!
//! The index carries no promotion piece: `e7e8q` and `e7e8n` share one
//! index. Decoding resolves the promotion by taking the first legal move with
//! matching squares in legal-move order, so only the squares round-trip.

use std::fmt;

use chess_rules::{move_squares, GameState, Move};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Per-square stride of the action space
pub const MOVE_STRIDE: usize = 73;
/// Size of the policy vector
pub const ACTION_SPACE: usize = 64 * MOVE_STRIDE;

/// Policy index of a move, in `[0, ACTION_SPACE)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveIndex(usize);

impl MoveIndex {
    /// Index of `m`
    pub fn encode(m: &Move) -> Self {
        let (from, to) = move_squares(m);
        MoveIndex(from as usize * MOVE_STRIDE + to as usize)
    }

    /// Wrap a raw policy index; `None` outside the action space
    pub fn new(index: usize) -> Option<Self> {
        (index < ACTION_SPACE).then_some(MoveIndex(index))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// First legal move of `state` with this index's squares
    pub fn resolve(self, state: &GameState) -> Option<Move> {
        self.resolve_in(&state.legal_moves()).cloned()
    }

    /// First move of an already generated legal move list with this index's squares
    pub fn resolve_in(self, legal: &[Move]) -> Option<&Move> {
        legal.iter().find(|m| MoveIndex::encode(m) == self)
    }

    /// Move for this index in `state`, or a random legal move when nothing matches
    ///
    /// Returns `None` only when `state` has no legal moves at all.
    pub fn decode<R: Rng + ?Sized>(self, state: &GameState, rng: &mut R) -> Option<Move> {
        let legal = state.legal_moves();
        self.resolve_in(&legal).or_else(|| legal.choose(rng)).cloned()
    }
}

impl fmt::Display for MoveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
