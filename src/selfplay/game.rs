//! One self-play game
//!
//! # State machine
//!
//! ```text
//! ToMove(side) --push legal move--> ToMove(!side)
//!              \--game over------> Terminal
//! ```
//!
//! The game state is owned by the loop and moved back to the caller inside
//! the [`GameRecord`]. One record is appended per half-move; nothing is ever
//! taken back.

use chess_rules::{Color, GameOutcome, GameState, Termination};
use tracing::debug;

use super::experience::ExperienceRecord;
use super::mover::{MoveContext, Mover};
use crate::encoding::{self, MoveIndex};
use crate::error::{SelfPlayError, SelfPlayResult};

/// Everything a finished game produced
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub final_state: GameState,
    pub outcome: GameOutcome,
    pub termination: Termination,
    /// One record per half-move, outcomes still pending
    pub records: Vec<ExperienceRecord>,
    /// Moves in standard algebraic notation
    pub san_moves: Vec<String>,
}

impl GameRecord {
    pub fn plies(&self) -> usize {
        self.records.len()
    }
}

/// Play `start` to the end with `white` and `black` choosing the moves
pub fn play_game(
    start: GameState,
    white: &Mover,
    black: &Mover,
    ctx: &mut MoveContext<'_>,
) -> SelfPlayResult<GameRecord> {
    ctx.engine.new_game()?;

    let mut state = start;
    let mut records = Vec::new();
    let mut san_moves = Vec::new();

    while !state.is_game_over() {
        let side = state.turn();
        let mover = match side {
            Color::White => white,
            Color::Black => black,
        };

        let position = encoding::encode(&state);
        let (m, quality) = mover.produce_move(&state, ctx)?;
        let san = state.san(&m);
        let move_index = MoveIndex::encode(&m);
        state.push(m)?;

        debug!("[SELFPLAY] ply {} {:?} ({}) played {}", records.len() + 1, side, mover, san);
        records.push(ExperienceRecord::pending(position, move_index, side, quality));
        san_moves.push(san);
    }

    let ply = state.ply();
    let (outcome, termination) = match (state.outcome(), state.termination()) {
        (Some(outcome), Some(termination)) => (outcome, termination),
        _ => return Err(SelfPlayError::NoLegalMove { ply }),
    };

    Ok(GameRecord {
        final_state: state,
        outcome,
        termination,
        records,
        san_moves,
    })
}
