//! Driving the training loop and measuring the result
//!
//! - [`pipeline`]: [`Orchestrator`] iterates self-play → label → train → checkpoint
//! - [`evaluator`]: [`Evaluator`] plays predictor-vs-engine games without training
//! - [`session`]: runs either on a worker thread and streams progress back

pub mod evaluator;
pub mod pipeline;
pub mod session;

pub use evaluator::{EvaluationReport, Evaluator};
pub use pipeline::{Orchestrator, TrainingReport};
pub use session::{spawn_evaluation, spawn_training, Session, SessionEvent, SessionSummary};
