//! Outcome labelling
//!
//! Every record is labelled from the point of view of the side that made
//! the recorded move: 1.0 if that side went on to win, 0.0 if it lost and
//! 0.5 for a draw. Both colours' records of one game therefore carry
//! opposite labels after a decisive result.

use chess_rules::GameOutcome;

use super::experience::ExperienceRecord;

/// Fill in the outcome of every record of a finished game
pub fn label_outcomes(records: &mut [ExperienceRecord], outcome: GameOutcome) {
    for record in records {
        record.outcome = outcome.score_for(record.mover);
    }
}
