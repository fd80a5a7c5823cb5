//! Training the predictor on self-play experience
//!
//! - [`trainer`]: Adam over shuffled mini-batches with step learning-rate decay
//! - [`history`]: per-epoch loss log persisted as JSON

pub mod history;
pub mod trainer;

pub use history::{HistoryEntry, TrainingHistory, HISTORY_FILENAME};
pub use trainer::{EpochStats, Trainer, TrainingConfig};
