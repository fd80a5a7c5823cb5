//! Reference engine access over the Universal Chess Interface
//!
//! The reference engine (normally Stockfish) runs as a long-lived child
//! process driven through the [`stockfish`] client crate. Every request is
//! synchronous: the calling thread writes a command and blocks until the
//! engine answers. Only the per-move search is bounded, through a
//! [`SearchLimit`].
//!
//! # Lifecycle
//!
//! [`UciEngine`] is a scoped resource. It is acquired by
//! [`UciEngine::start`] and released either explicitly with
//! [`UciEngine::quit`] or implicitly when dropped. Dropping sends `quit` and
//! closes the engine's stdin, so an early return or a panic in the caller
//! leaves no engine running.
//!
//! # Seams
//!
//! Callers depend on the [`SearchEngine`] trait rather than on the process
//! type, which keeps self-play and evaluation testable without a Stockfish
//! binary.

pub mod analyzer;
pub mod engine;
pub mod error;
pub mod limit;
pub mod score;

pub use analyzer::{GameAnalyzer, MoveEvaluation};
pub use engine::{SearchEngine, UciEngine};
pub use error::{EngineError, EngineResult};
pub use limit::SearchLimit;
pub use score::{Score, MATE_SCORE};
