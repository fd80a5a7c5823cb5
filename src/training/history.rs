//! Training history persistence
//!
//! Every finished epoch is appended to a [`TrainingHistory`] and the whole
//! history is rewritten as pretty-printed JSON, so external dashboards can
//! follow a run while it is still going.
//!
//! # File Format
//!
//! ```json
//! {
//!   "entries": [
//!     {
//!       "iteration": 1,
//!       "epoch": 1,
//!       "total_loss": 9.12,
//!       "policy_loss": 8.43,
//!       "value_loss": 0.25,
//!       "quality_loss": 0.44,
//!       "learning_rate": 0.0003,
//!       "skipped_batches": 0,
//!       "rating": 1784.0,
//!       "timestamp": "2026-01-01T12:00:00Z"
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::trainer::EpochStats;
use crate::error::{TrainError, TrainResult};

/// Default file name of the history inside the log directory
pub const HISTORY_FILENAME: &str = "training_history.json";

/// One finished epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// One-based training iteration
    pub iteration: usize,
    /// One-based epoch within the iteration
    pub epoch: usize,
    pub total_loss: f64,
    pub policy_loss: f64,
    pub value_loss: f64,
    pub quality_loss: f64,
    pub learning_rate: f64,
    #[serde(default)]
    pub skipped_batches: usize,
    /// Predictor rating when the epoch finished
    pub rating: f64,
    pub timestamp: DateTime<Utc>,
}

/// All epochs of a run, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub entries: Vec<HistoryEntry>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a history written by [`TrainingHistory::save`]
    ///
    /// A missing or unreadable file yields an empty history.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(history) => history,
                Err(e) => {
                    warn!(
                        "[HISTORY] Failed to parse history at {:?}: {}. Starting fresh.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!(
                    "[HISTORY] Failed to read history at {:?}: {}. Starting fresh.",
                    path, e
                );
                Self::default()
            }
        }
    }

    /// Append the stats of a finished epoch
    pub fn record(&mut self, iteration: usize, stats: &EpochStats, rating: f64) {
        self.entries.push(HistoryEntry {
            iteration,
            epoch: stats.epoch + 1,
            total_loss: stats.total_loss,
            policy_loss: stats.policy_loss,
            value_loss: stats.value_loss,
            quality_loss: stats.quality_loss,
            learning_rate: stats.learning_rate,
            skipped_batches: stats.skipped_batches,
            rating,
            timestamp: Utc::now(),
        });
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Rewrite the history file at `path`
    pub fn save(&self, path: &Path) -> TrainResult<()> {
        let history_error = |reason: String| TrainError::History {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| history_error(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| history_error(e.to_string()))?;
        fs::write(path, json).map_err(|e| history_error(e.to_string()))?;
        debug!("[HISTORY] Saved {} entries to {:?}", self.entries.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(epoch: usize, loss: f64) -> EpochStats {
        EpochStats {
            epoch,
            learning_rate: 3e-4,
            total_loss: loss,
            policy_loss: loss - 1.0,
            value_loss: 0.5,
            quality_loss: 0.5,
            batches: 4,
            skipped_batches: 0,
        }
    }

    #[test]
    fn test_record_uses_one_based_epochs() {
        let mut history = TrainingHistory::new();
        history.record(2, &stats(0, 3.0), 1790.0);
        let entry = history.latest().unwrap();
        assert_eq!(entry.iteration, 2);
        assert_eq!(entry.epoch, 1);
        assert_eq!(entry.rating, 1790.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join(HISTORY_FILENAME);

        let mut history = TrainingHistory::new();
        history.record(1, &stats(0, 4.0), 1800.0);
        history.record(1, &stats(1, 3.5), 1810.0);
        history.save(&path).unwrap();

        let loaded = TrainingHistory::load(&path);
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILENAME);
        fs::write(&path, "not json").unwrap();
        assert!(TrainingHistory::load(&path).entries.is_empty());
        assert!(TrainingHistory::load(&dir.path().join("missing.json"))
            .entries
            .is_empty());
    }
}
