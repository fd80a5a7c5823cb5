//! Post-game analysis
//!
//! Replays a finished game from its starting position and asks the engine to
//! evaluate the position reached after every move. A failed evaluation of a
//! single position is logged and recorded as 0 so one bad reply does not
//! throw away the rest of the analysis; a dead engine process still aborts.

use chess_rules::{uci, GameState};
use tracing::{info, warn};

use crate::engine::SearchEngine;
use crate::error::{EngineError, EngineResult};
use crate::limit::SearchLimit;

/// Evaluation of the position after one move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvaluation {
    pub uci: String,
    pub san: String,
    /// Engine score after the move, from White's point of view
    pub white_centipawns: i32,
}

/// Per-move evaluation of whole games
pub struct GameAnalyzer<'a, E: SearchEngine> {
    engine: &'a mut E,
    limit: SearchLimit,
}

impl<'a, E: SearchEngine> GameAnalyzer<'a, E> {
    pub fn new(engine: &'a mut E, limit: SearchLimit) -> Self {
        Self { engine, limit }
    }

    /// Evaluate every move of `game`, oldest first
    pub fn analyze(&mut self, game: &GameState) -> EngineResult<Vec<MoveEvaluation>> {
        let mut replay = game.initial_state();
        let mut evaluations = Vec::with_capacity(game.moves().len());

        for m in game.moves() {
            let san = replay.san(m);
            let notation = uci(m);
            replay
                .push(m.clone())
                .map_err(|_| EngineError::IllegalBestMove {
                    uci: notation.clone(),
                })?;

            let white_centipawns = if replay.is_game_over() {
                terminal_score(&replay)
            } else {
                match self.engine.analyse(&replay, self.limit) {
                    Ok(score) => score.white_centipawns(),
                    Err(EngineError::Terminated) => return Err(EngineError::Terminated),
                    Err(e) => {
                        warn!("[ANALYSIS] Could not evaluate after {}: {}", san, e);
                        0
                    }
                }
            };
            evaluations.push(MoveEvaluation {
                uci: notation,
                san,
                white_centipawns,
            });
        }

        info!("[ANALYSIS] Evaluated {} moves", evaluations.len());
        Ok(evaluations)
    }
}

/// Score of a finished position without asking the engine
fn terminal_score(state: &GameState) -> i32 {
    match state.outcome().and_then(|o| o.winner()) {
        Some(chess_rules::Color::White) => crate::MATE_SCORE,
        Some(chess_rules::Color::Black) => -crate::MATE_SCORE,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Score;
    use std::io;
    use chess_rules::Move;

    /// Answers every analysis with a fixed score, failing on chosen plies
    struct FixedScore {
        score: i32,
        fail_at: Vec<usize>,
        calls: usize,
    }

    impl SearchEngine for FixedScore {
        fn new_game(&mut self) -> EngineResult<()> {
            Ok(())
        }

        fn best_move(&mut self, _: &GameState, _: SearchLimit) -> EngineResult<Move> {
            Err(EngineError::NoMove)
        }

        fn analyse(&mut self, _: &GameState, _: SearchLimit) -> EngineResult<Score> {
            self.calls += 1;
            if self.fail_at.contains(&self.calls) {
                return Err(EngineError::Io(io::Error::other("garbled reply")));
            }
            Ok(Score::Centipawns(self.score))
        }

        fn set_skill_level(&mut self, _: u8) -> EngineResult<()> {
            Ok(())
        }
    }

    fn play(moves: &[&str]) -> GameState {
        let mut state = GameState::new();
        for text in moves {
            let m = state.parse_uci(text).unwrap();
            state.push(m).unwrap();
        }
        state
    }

    #[test]
    fn test_scores_stored_from_white_view() {
        //! The engine already reports for White, whoever is to move
        let game = play(&["e2e4", "e7e5"]);
        let mut engine = FixedScore {
            score: 30,
            fail_at: vec![],
            calls: 0,
        };
        let evaluations = GameAnalyzer::new(&mut engine, SearchLimit::Depth(1))
            .analyze(&game)
            .unwrap();

        assert_eq!(evaluations.len(), 2);
        assert_eq!(evaluations[0].san, "e4");
        assert_eq!(evaluations[0].white_centipawns, 30);
        assert_eq!(evaluations[1].uci, "e7e5");
        assert_eq!(evaluations[1].white_centipawns, 30);
    }

    #[test]
    fn test_failed_analysis_recorded_as_zero() {
        let game = play(&["d2d4", "d7d5", "c2c4"]);
        let mut engine = FixedScore {
            score: 10,
            fail_at: vec![2],
            calls: 0,
        };
        let evaluations = GameAnalyzer::new(&mut engine, SearchLimit::Depth(1))
            .analyze(&game)
            .unwrap();

        assert_eq!(evaluations.len(), 3);
        assert_eq!(evaluations[1].white_centipawns, 0);
        assert_eq!(evaluations[0].white_centipawns, 10);
        assert_eq!(evaluations[2].white_centipawns, 10);
    }

    #[test]
    fn test_mate_scored_without_engine() {
        let game = play(&["f2f3", "e7e5", "g2g4", "d8h4"]);
        let mut engine = FixedScore {
            score: 0,
            fail_at: vec![],
            calls: 0,
        };
        let evaluations = GameAnalyzer::new(&mut engine, SearchLimit::Depth(1))
            .analyze(&game)
            .unwrap();

        assert_eq!(evaluations[3].san, "Qh4#");
        assert_eq!(evaluations[3].white_centipawns, -crate::MATE_SCORE);
        assert_eq!(engine.calls, 3);
    }
}
