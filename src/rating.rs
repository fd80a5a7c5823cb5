//! Elo rating of the predictor
//!
//! ```text
//! expected   = 1 / (1 + 10^((opponent - rating) / 400))
//! new rating = rating + K * (score - expected)
//! ```
//!
//! The reference engine is treated as a fixed-strength opponent with a
//! nominal rating, so only the predictor's rating moves.

use serde::{Deserialize, Serialize};

/// Starting rating of a fresh predictor
pub const INITIAL_RATING: f64 = 1800.0;
/// Default update step
pub const DEFAULT_K_FACTOR: f64 = 32.0;
/// Nominal rating of the reference engine
pub const REFERENCE_ENGINE_RATING: f64 = 1500.0;

/// Running Elo estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingTracker {
    rating: f64,
    k_factor: f64,
}

impl Default for RatingTracker {
    fn default() -> Self {
        Self::new(INITIAL_RATING, DEFAULT_K_FACTOR)
    }
}

impl RatingTracker {
    pub fn new(rating: f64, k_factor: f64) -> Self {
        Self { rating, k_factor }
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    /// Expected score against an opponent of `opponent_rating`
    pub fn expected_score(&self, opponent_rating: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((opponent_rating - self.rating) / 400.0))
    }

    /// Apply one game result (1.0 win, 0.5 draw, 0.0 loss) and return the new rating
    pub fn update(&mut self, opponent_rating: f64, score: f64) -> f64 {
        let expected = self.expected_score(opponent_rating);
        self.rating += self.k_factor * (score - expected);
        self.rating
    }
}
