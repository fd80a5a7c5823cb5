//! Engine evaluations as the trainer stores them

use stockfish::{EngineEval, EvalType};

/// Centipawn value used for forced mates
pub const MATE_SCORE: i32 = 100_000;

/// Engine evaluation from White's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Material/positional evaluation in hundredths of a pawn
    Centipawns(i32),
    /// Mate in N moves; negative when White is getting mated
    Mate(i32),
}

impl Score {
    /// Centipawns for White, mates clamped to +/- [`MATE_SCORE`]
    pub fn white_centipawns(self) -> i32 {
        match self {
            Score::Centipawns(cp) => cp,
            Score::Mate(moves) if moves > 0 => MATE_SCORE,
            Score::Mate(_) => -MATE_SCORE,
        }
    }
}

impl From<EngineEval> for Score {
    fn from(eval: EngineEval) -> Self {
        match eval.eval_type() {
            EvalType::Centipawn => Score::Centipawns(eval.value()),
            EvalType::Mate => Score::Mate(eval.value()),
        }
    }
}
