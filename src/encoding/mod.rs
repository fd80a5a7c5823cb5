//! Fixed numeric forms of positions and moves
//!
//! - [`position`]: game state → `[17, 8, 8]` tensor
//! - [`moves`]: legal move ↔ policy index
//!
//! Neither side ever fails on a well-formed game state. Ambiguity in move
//! decoding is resolved against the legal moves of the position.

pub mod moves;
pub mod position;

pub use moves::{MoveIndex, ACTION_SPACE, MOVE_STRIDE};
pub use position::{encode, PositionTensor, BOARD_SIZE, PIECE_PLANES, PLANES};
