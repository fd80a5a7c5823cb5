//! Error types for the training pipeline
//!
//! One enum per layer, each with its own result alias. Lower layers convert
//! upward through `#[from]`, so a failure deep inside a game surfaces at the
//! orchestrator with its original cause attached.

use std::io;
use std::path::PathBuf;

use chess_rules::RulesError;
use stockfish_uci::EngineError;
use thiserror::Error;

/// Errors from running the predictor network
#[derive(Error, Debug)]
pub enum PredictorError {
    /// The network produced an output of unexpected size
    #[error("Predictor {head} head produced {actual} values, expected {expected}")]
    Shape {
        head: &'static str,
        expected: usize,
        actual: usize,
    },

    /// libtorch reported an error
    #[error("Tensor operation failed: {0}")]
    Torch(#[from] tch::TchError),
}

/// Result type alias for predictor operations
pub type PredictorResult<T> = Result<T, PredictorError>;

/// Errors reading or writing the weights checkpoint
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Filesystem failure around the checkpoint file
    #[error("Checkpoint I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// libtorch failed to serialize or restore the weights
    #[error("Checkpoint at {path:?} could not be processed: {source}")]
    Torch {
        path: PathBuf,
        #[source]
        source: tch::TchError,
    },
}

/// Result type alias for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Errors loading, saving or validating the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file exists but could not be read
    #[error("Failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::config::TrainerConfig`]
    #[error("Failed to parse config file at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration could not be written
    #[error("Failed to write config file at {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    /// No per-user configuration directory exists on this platform
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    /// A field holds a value the pipeline cannot run with
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors while playing a self-play game
///
/// All of them are fatal for the game in progress.
#[derive(Error, Debug)]
pub enum SelfPlayError {
    /// The reference engine failed or returned no usable move
    #[error("Reference engine failed: {0}")]
    Engine(#[from] EngineError),

    /// The predictor could not evaluate a position
    #[error("Predictor failed: {0}")]
    Predictor(#[from] PredictorError),

    /// A mover produced a move the rules engine rejected
    #[error("Rules engine rejected a move: {0}")]
    Rules(#[from] RulesError),

    /// A mover was asked to move in a finished game
    #[error("No legal move available at ply {ply}")]
    NoLegalMove { ply: usize },
}

/// Result type alias for self-play operations
pub type SelfPlayResult<T> = Result<T, SelfPlayError>;

/// Errors during a training pass
#[derive(Error, Debug)]
pub enum TrainError {
    /// libtorch reported an error
    #[error("Tensor operation failed: {0}")]
    Torch(#[from] tch::TchError),

    /// A hyperparameter is out of range
    #[error("Invalid training parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The training history could not be written
    #[error("Failed to write training history at {path:?}: {reason}")]
    History { path: PathBuf, reason: String },
}

/// Result type alias for training operations
pub type TrainResult<T> = Result<T, TrainError>;

/// Errors from the iteration loop and the evaluator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    SelfPlay(#[from] SelfPlayError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The background worker panicked before returning a report
    #[error("Session worker panicked")]
    WorkerPanicked,
}

/// Result type alias for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
