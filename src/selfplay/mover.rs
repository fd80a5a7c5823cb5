//! The two ways a side can choose its moves
//!
//! A [`Mover`] is fixed per side for a whole game. Both variants answer the
//! same question through [`Mover::produce_move`] and both guarantee a legal
//! move for any position that still has one.

use std::fmt;

use chess_rules::{GameState, Move};
use rand::RngCore;
use stockfish_uci::{SearchEngine, SearchLimit};

use super::selector::{self, DEFAULT_TOP_K};
use crate::encoding;
use crate::error::{SelfPlayError, SelfPlayResult};
use crate::predictor::{Predictor, QualityLabel};

/// Self-play tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfPlayConfig {
    /// Policy entries the move selector tries before a random move
    pub top_k: usize,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Collaborators a mover may consult
pub struct MoveContext<'a> {
    pub engine: &'a mut dyn SearchEngine,
    pub predictor: &'a dyn Predictor,
    pub rng: &'a mut dyn RngCore,
    pub config: SelfPlayConfig,
}

/// Strategy choosing the moves of one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    /// Encode the position, query the predictor, select from its policy
    Predictor,
    /// Ask the reference engine under the given search bound
    Engine(SearchLimit),
}

impl Mover {
    /// Choose a move for the side to move in `state`, with its quality label
    ///
    /// Engine moves carry no quality judgement and are labelled Average Step.
    pub fn produce_move(
        &self,
        state: &GameState,
        ctx: &mut MoveContext<'_>,
    ) -> SelfPlayResult<(Move, QualityLabel)> {
        if state.is_game_over() {
            return Err(SelfPlayError::NoLegalMove { ply: state.ply() });
        }
        match self {
            Mover::Predictor => {
                let prediction = ctx.predictor.predict(&encoding::encode(state))?;
                let m = selector::select(&prediction.policy, state, ctx.config.top_k, ctx.rng)
                    .ok_or(SelfPlayError::NoLegalMove { ply: state.ply() })?;
                Ok((m, prediction.quality_label()))
            }
            Mover::Engine(limit) => {
                let m = ctx.engine.best_move(state, *limit)?;
                Ok((m, QualityLabel::AverageStep))
            }
        }
    }
}

impl fmt::Display for Mover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mover::Predictor => f.write_str("predictor"),
            Mover::Engine(limit) => write!(f, "engine ({limit})"),
        }
    }
}
