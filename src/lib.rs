//! XFChess self-play trainer
//!
//! Trains a chess move predictor by having it play against a reference UCI
//! engine, labelling every move with the final result of its game and
//! fitting the network to those labels.
//!
//! # Pipeline
//!
//! ```text
//! selfplay::play_game ──► selfplay::label_outcomes ──► ExperienceBuffer
//!        ▲                                                   │
//!        │                                                   ▼
//!   PolicyNet ◄── CheckpointStore::save ◄── training::Trainer::train
//! ```
//!
//! [`orchestrator::Orchestrator`] drives the loop; [`orchestrator::session`]
//! runs it on a worker thread.
//!
//! # Modules
//!
//! - [`encoding`]: position tensors and the 64×73 move index
//! - [`predictor`]: the predictor contract, the `tch` network and checkpoints
//! - [`selfplay`]: move selection, movers, games and outcome labels
//! - [`rating`]: Elo tracking
//! - [`training`]: the optimizer loop and its persisted history
//! - [`orchestrator`]: training iterations, evaluation and sessions
//! - [`config`], [`logging`], [`error`]: ambient plumbing

pub mod config;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod predictor;
pub mod rating;
pub mod selfplay;
pub mod training;

pub use config::TrainerConfig;
pub use encoding::{MoveIndex, PositionTensor};
pub use error::{
    CheckpointError, ConfigError, OrchestratorError, PredictorError, SelfPlayError, TrainError,
};
pub use orchestrator::{EvaluationReport, Orchestrator, SessionEvent, TrainingReport};
pub use predictor::{FileCheckpoint, PolicyNet, Prediction, Predictor, QualityLabel};
pub use rating::RatingTracker;
pub use selfplay::{ExperienceRecord, Mover};
