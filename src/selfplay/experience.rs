//! Recorded self-play decisions

use chess_rules::Color;

use crate::encoding::{MoveIndex, PositionTensor};
use crate::predictor::QualityLabel;

/// Outcome value recorded before the game result is known
pub const PENDING_OUTCOME: f32 = 0.0;

/// One training sample: the position a side faced and the move it chose
#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceRecord {
    pub position: PositionTensor,
    pub move_index: MoveIndex,
    /// Final score from `mover`'s point of view once labelled, 0.0 / 0.5 / 1.0
    pub outcome: f32,
    pub quality: QualityLabel,
    /// Side that made the move
    pub mover: Color,
}

impl ExperienceRecord {
    /// A record whose outcome is filled in after the game ends
    pub fn pending(
        position: PositionTensor,
        move_index: MoveIndex,
        mover: Color,
        quality: QualityLabel,
    ) -> Self {
        Self {
            position,
            move_index,
            outcome: PENDING_OUTCOME,
            quality,
            mover,
        }
    }
}

/// Append-only store of labelled records across iterations
#[derive(Debug, Clone, Default)]
pub struct ExperienceBuffer {
    records: Vec<ExperienceRecord>,
}

impl ExperienceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the records of one finished game
    pub fn extend(&mut self, records: impl IntoIterator<Item = ExperienceRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[ExperienceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
