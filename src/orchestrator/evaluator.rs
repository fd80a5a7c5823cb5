//! Predictor strength measurement without training
//!
//! Plays the predictor as White against the engine for a fixed number of
//! games. Weights are never touched; only the tally and the rating move.

use chess_rules::{Color, GameState};
use rand::RngCore;
use stockfish_uci::{SearchEngine, SearchLimit};
use tracing::info;

use super::session::SessionEvent;
use crate::error::OrchestratorResult;
use crate::predictor::Predictor;
use crate::rating::RatingTracker;
use crate::selfplay::{play_game, MoveContext, Mover, SelfPlayConfig};

/// Tally of an evaluation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub games: usize,
    pub predictor_wins: usize,
    pub engine_wins: usize,
    pub draws: usize,
    /// Predictor rating after the last game
    pub rating: f64,
}

impl EvaluationReport {
    /// Points per game from the predictor's side, `None` before any game
    pub fn score_rate(&self) -> Option<f64> {
        (self.games > 0)
            .then(|| (self.predictor_wins as f64 + 0.5 * self.draws as f64) / self.games as f64)
    }
}

/// Plays evaluation games and keeps the rating
pub struct Evaluator {
    games: usize,
    opponent_limit: SearchLimit,
    opponent_rating: f64,
    self_play: SelfPlayConfig,
    rating: RatingTracker,
}

impl Evaluator {
    pub fn new(
        games: usize,
        opponent_limit: SearchLimit,
        opponent_rating: f64,
        self_play: SelfPlayConfig,
        rating: RatingTracker,
    ) -> Self {
        Self {
            games,
            opponent_limit,
            opponent_rating,
            self_play,
            rating,
        }
    }

    /// Play every evaluation game
    pub fn run(
        &mut self,
        engine: &mut dyn SearchEngine,
        predictor: &dyn Predictor,
        rng: &mut dyn RngCore,
        observer: &mut dyn FnMut(SessionEvent),
    ) -> OrchestratorResult<EvaluationReport> {
        let mut report = EvaluationReport {
            games: 0,
            predictor_wins: 0,
            engine_wins: 0,
            draws: 0,
            rating: self.rating.rating(),
        };
        let white = Mover::Predictor;
        let black = Mover::Engine(self.opponent_limit);

        for game in 1..=self.games {
            let mut ctx = MoveContext {
                engine: &mut *engine,
                predictor,
                rng: &mut *rng,
                config: self.self_play,
            };
            let record = play_game(GameState::new(), &white, &black, &mut ctx)?;
            let score = record.outcome.score_for(Color::White);
            report.rating = self.rating.update(self.opponent_rating, f64::from(score));

            match record.outcome.winner() {
                Some(Color::White) => report.predictor_wins += 1,
                Some(Color::Black) => report.engine_wins += 1,
                None => report.draws += 1,
            }
            report.games += 1;

            info!(
                "[EVAL] Game {}/{}: {:?} after {} plies ({:?}), rating {:.0}",
                game,
                self.games,
                record.outcome,
                record.plies(),
                record.termination,
                report.rating
            );
            observer(SessionEvent::GameFinished {
                iteration: 0,
                game,
                outcome: record.outcome,
                plies: record.plies(),
                rating: Some(report.rating),
            });
        }

        info!(
            "[EVAL] Predictor {} wins, {} draws, {} losses over {} games, rating {:.0}",
            report.predictor_wins, report.draws, report.engine_wins, report.games, report.rating
        );
        Ok(report)
    }
}
