//! Trainer configuration
//!
//! [`TrainerConfig`] is a plain serde struct with a default for every field,
//! so a configuration file only needs the values it changes.
//!
//! # File Location
//!
//! Resolution order:
//! 1. An explicit `--config` path (must exist and parse)
//! 2. `trainer.json` in the per-user configuration directory, e.g.
//!    `~/.config/xfchess/trainer.json` on Linux
//! 3. Built-in defaults
//!
//! A broken per-user file is logged and ignored, the same way a missing one
//! is. Command-line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use stockfish_uci::SearchLimit;
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::predictor::NetworkConfig;
use crate::rating::{RatingTracker, DEFAULT_K_FACTOR, INITIAL_RATING, REFERENCE_ENGINE_RATING};
use crate::selfplay::{SelfPlayConfig, DEFAULT_TOP_K};
use crate::training::{TrainingConfig, HISTORY_FILENAME};

/// Config filename inside the per-user configuration directory
const CONFIG_FILENAME: &str = "trainer.json";

/// Everything the training loop and the evaluator need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Weights file, overwritten after every training pass
    pub checkpoint_path: PathBuf,
    /// Reference engine executable
    pub engine_path: PathBuf,
    /// Directory for the log file and the training history
    pub log_dir: PathBuf,
    pub iterations: usize,
    pub games_per_iteration: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub lr_step_epochs: usize,
    pub lr_gamma: f64,
    /// Search depth of the engine when it plays White for an untrained predictor
    pub search_depth: u32,
    /// Thinking time of the engine playing Black
    pub opponent_move_time_ms: u64,
    /// Engine skill level (0-20), engine default when unset
    pub skill_level: Option<u8>,
    pub initial_rating: f64,
    pub k_factor: f64,
    /// Nominal rating of the reference engine
    pub opponent_rating: f64,
    pub eval_games: usize,
    pub top_k: usize,
    /// Seed for move selection, shuffling and weight initialisation
    pub seed: Option<u64>,
    pub network: NetworkConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from("chess_model.ot"),
            engine_path: PathBuf::from("stockfish"),
            log_dir: PathBuf::from("logs"),
            iterations: 5,
            games_per_iteration: 100,
            epochs: 10,
            batch_size: 64,
            learning_rate: 3e-4,
            lr_step_epochs: 5,
            lr_gamma: 0.1,
            search_depth: 3,
            opponent_move_time_ms: 100,
            skill_level: None,
            initial_rating: INITIAL_RATING,
            k_factor: DEFAULT_K_FACTOR,
            opponent_rating: REFERENCE_ENGINE_RATING,
            eval_games: 10,
            top_k: DEFAULT_TOP_K,
            seed: None,
            network: NetworkConfig::default(),
        }
    }
}

/// Path of the per-user config file, `None` when the platform has no config dir
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "trilltino", "XFChess")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

impl TrainerConfig {
    /// Resolve the configuration as described in the module docs
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let Some(path) = user_config_path() else {
            info!("[CONFIG] No user config directory, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            info!("[CONFIG] No config file found at {:?}. Using defaults.", path);
            return Ok(Self::default());
        }
        match Self::load_from(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("[CONFIG] {}. Using defaults.", e);
                Ok(Self::default())
            }
        }
    }

    /// Read and parse one config file
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("[CONFIG] Loaded config from {:?}", path);
        Ok(config)
    }

    /// Pretty-printed JSON form
    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(path, self.to_json()?).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("[CONFIG] Saved config to {:?}", path);
        Ok(())
    }

    /// Write the config to the per-user location and return that path
    pub fn save_user(&self) -> ConfigResult<PathBuf> {
        let path = user_config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Reject values the pipeline cannot run with
    ///
    /// Training-only fields are checked when `training` is set.
    pub fn validate(&self, training: bool) -> ConfigResult<()> {
        let invalid = |field: &'static str, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if self.top_k == 0 {
            return invalid("top_k", "must be at least 1");
        }
        if !self.k_factor.is_finite() || !self.initial_rating.is_finite() {
            return invalid("k_factor", "ratings must be finite");
        }
        if self.network.channels <= 0 {
            return invalid("network.channels", "must be at least 1");
        }
        if !(0.0..1.0).contains(&self.network.dropout) {
            return invalid("network.dropout", "must be in [0, 1)");
        }
        if let Some(level) = self.skill_level {
            if level > 20 {
                return invalid("skill_level", "must be between 0 and 20");
            }
        }
        if !training {
            return Ok(());
        }

        if self.batch_size == 0 {
            return invalid("batch_size", "must be at least 1");
        }
        if self.epochs == 0 {
            return invalid("epochs", "must be at least 1 when training");
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return invalid("learning_rate", "must be a finite non-negative number");
        }
        if self.lr_step_epochs == 0 {
            return invalid("lr_step_epochs", "must be at least 1");
        }
        if !self.lr_gamma.is_finite() || self.lr_gamma <= 0.0 {
            return invalid("lr_gamma", "must be a finite positive number");
        }
        Ok(())
    }

    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            lr_step_epochs: self.lr_step_epochs,
            lr_gamma: self.lr_gamma,
        }
    }

    pub fn self_play(&self) -> SelfPlayConfig {
        SelfPlayConfig { top_k: self.top_k }
    }

    pub fn rating_tracker(&self) -> RatingTracker {
        RatingTracker::new(self.initial_rating, self.k_factor)
    }

    /// Search bound of the engine standing in for an untrained predictor
    pub fn search_limit(&self) -> SearchLimit {
        SearchLimit::Depth(self.search_depth)
    }

    /// Search bound of the engine opponent
    pub fn opponent_limit(&self) -> SearchLimit {
        SearchLimit::MoveTime(Duration::from_millis(self.opponent_move_time_ms))
    }

    pub fn history_path(&self) -> PathBuf {
        self.log_dir.join(HISTORY_FILENAME)
    }
}
