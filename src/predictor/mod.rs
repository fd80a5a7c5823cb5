//! The move predictor
//!
//! The pipeline only relies on the [`Predictor`] contract: one encoded
//! position in, a move distribution, a scalar value and a move-quality
//! distribution out. [`PolicyNet`] is the trainable implementation and
//! [`checkpoint`] persists its weights.
//!
//! # Output heads
//!
//! | Head    | Size      | Meaning                                           |
//! |---------|-----------|---------------------------------------------------|
//! | policy  | 64 * 73   | Probability of each [`MoveIndex`](crate::encoding::MoveIndex) |
//! | value   | 1         | Expected score for the side to move, in [0, 1]    |
//! | quality | 5         | Probability of each [`QualityLabel`]              |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encoding::PositionTensor;
use crate::error::PredictorResult;

pub mod checkpoint;
pub mod network;

pub use checkpoint::{CheckpointStore, FileCheckpoint};
pub use network::{NetOutput, NetworkConfig, PolicyNet};

/// Number of move-quality classes
pub const QUALITY_CLASSES: usize = 5;

/// Judgement of a single move, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityLabel {
    Blunder,
    BadStep,
    AverageStep,
    GoodStep,
    GreatStep,
}

impl Default for QualityLabel {
    fn default() -> Self {
        QualityLabel::AverageStep
    }
}

impl QualityLabel {
    pub const ALL: [QualityLabel; QUALITY_CLASSES] = [
        QualityLabel::Blunder,
        QualityLabel::BadStep,
        QualityLabel::AverageStep,
        QualityLabel::GoodStep,
        QualityLabel::GreatStep,
    ];

    /// Ordinal class used as the training target, 0 (blunder) to 4
    pub fn class(self) -> usize {
        self as usize
    }

    pub fn from_class(class: usize) -> Option<Self> {
        Self::ALL.get(class).copied()
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityLabel::Blunder => "Blunder",
            QualityLabel::BadStep => "Bad Step",
            QualityLabel::AverageStep => "Average Step",
            QualityLabel::GoodStep => "Good Step",
            QualityLabel::GreatStep => "Great Step",
        };
        f.write_str(name)
    }
}

/// Output of one predictor call
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Probability per policy index, `ACTION_SPACE` entries
    pub policy: Vec<f32>,
    /// Expected score for the side to move
    pub value: f32,
    /// Probability per quality class
    pub quality: Vec<f32>,
}

impl Prediction {
    /// Most likely quality class, Average Step when the head is empty
    pub fn quality_label(&self) -> QualityLabel {
        self.quality
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (class, &p)| match best {
                Some((_, top)) if top >= p => best,
                _ => Some((class, p)),
            })
            .and_then(|(class, _)| QualityLabel::from_class(class))
            .unwrap_or_default()
    }
}

/// Anything that maps an encoded position to a [`Prediction`]
pub trait Predictor {
    fn predict(&self, position: &PositionTensor) -> PredictorResult<Prediction>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_classes_ordered() {
        assert_eq!(QualityLabel::Blunder.class(), 0);
        assert_eq!(QualityLabel::AverageStep.class(), 2);
        assert_eq!(QualityLabel::GreatStep.class(), 4);
        assert_eq!(QualityLabel::from_class(3), Some(QualityLabel::GoodStep));
        assert_eq!(QualityLabel::from_class(5), None);
        assert!(QualityLabel::Blunder < QualityLabel::GreatStep);
    }

    #[test]
    fn test_quality_label_is_argmax() {
        let prediction = Prediction {
            policy: vec![],
            value: 0.5,
            quality: vec![0.1, 0.05, 0.2, 0.6, 0.05],
        };
        assert_eq!(prediction.quality_label(), QualityLabel::GoodStep);
    }

    #[test]
    fn test_quality_label_defaults_to_average() {
        let prediction = Prediction {
            policy: vec![],
            value: 0.5,
            quality: vec![],
        };
        assert_eq!(prediction.quality_label(), QualityLabel::AverageStep);
        assert_eq!(QualityLabel::default().to_string(), "Average Step");
    }
}
