//! Background sessions
//!
//! Training and evaluation block for a long time, so they run on a worker
//! thread. The worker owns the engine process, the network and the
//! experience buffer; the calling thread owns the user-visible
//! [`SessionSummary`] and is the only one that mutates it.
//!
//! # Handoff
//!
//! ```text
//! worker thread                       calling thread
//! ─────────────                       ──────────────
//! Orchestrator::run
//!   └─ SessionEvent ──(channel)──►    Session::poll / Session::wait
//!                                       └─ SessionSummary::apply
//! OrchestratorResult<T> ─(join)──►    Session::wait
//! ```
//!
//! Exactly one producer and one consumer: events arrive in the order the
//! worker produced them.

use std::thread::{self, JoinHandle};

use chess_rules::{Color, GameOutcome};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use stockfish_uci::{EngineResult, SearchEngine};
use tracing::{info, warn};

use super::evaluator::{EvaluationReport, Evaluator};
use super::pipeline::{Orchestrator, TrainingReport};
use crate::config::TrainerConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::predictor::{CheckpointStore, PolicyNet};
use crate::training::EpochStats;

/// Progress reported by a running session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A game ended; `iteration` is 0 for evaluation games
    GameFinished {
        iteration: usize,
        game: usize,
        outcome: GameOutcome,
        plies: usize,
        /// Predictor rating after the game, `None` when the predictor did not play
        rating: Option<f64>,
    },
    /// A training epoch ended
    EpochFinished { iteration: usize, stats: EpochStats },
    /// The checkpoint was overwritten at the end of an iteration
    CheckpointSaved { iteration: usize },
}

/// Running totals kept on the calling thread
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub games: usize,
    pub white_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
    pub rating: Option<f64>,
    pub epochs: usize,
    pub last_loss: Option<f64>,
    pub checkpoints: usize,
}

impl SessionSummary {
    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::GameFinished {
                outcome, rating, ..
            } => {
                self.games += 1;
                match outcome.winner() {
                    Some(Color::White) => self.white_wins += 1,
                    Some(Color::Black) => self.black_wins += 1,
                    None => self.draws += 1,
                }
                if let Some(rating) = rating {
                    self.rating = Some(*rating);
                }
            }
            SessionEvent::EpochFinished { stats, .. } => {
                self.epochs += 1;
                self.last_loss = Some(stats.total_loss);
            }
            SessionEvent::CheckpointSaved { .. } => self.checkpoints += 1,
        }
    }
}

/// Handle to a session running on a worker thread
pub struct Session<T> {
    events: Receiver<SessionEvent>,
    handle: JoinHandle<OrchestratorResult<T>>,
    summary: SessionSummary,
}

impl<T> Session<T> {
    fn spawn<F>(name: &str, work: F) -> std::io::Result<Self>
    where
        F: FnOnce(Sender<SessionEvent>) -> OrchestratorResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || work(tx))?;
        Ok(Self {
            events: rx,
            handle,
            summary: SessionSummary::default(),
        })
    }

    /// Apply every event that has arrived so far without blocking
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let events: Vec<SessionEvent> = self.events.try_iter().collect();
        for event in &events {
            self.summary.apply(event);
        }
        events
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Whether the worker has returned
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the worker returns, applying all remaining events
    pub fn wait(mut self) -> OrchestratorResult<(T, SessionSummary)> {
        for event in self.events.iter() {
            self.summary.apply(&event);
        }
        let result = self
            .handle
            .join()
            .map_err(|_| OrchestratorError::WorkerPanicked)?;
        result.map(|value| (value, self.summary))
    }
}

fn forward(tx: &Sender<SessionEvent>) -> impl FnMut(SessionEvent) + '_ {
    move |event| {
        // The receiver only goes away when the caller stopped caring
        let _ = tx.send(event);
    }
}

/// Run the full training loop on a worker thread
///
/// `make_engine` runs on the worker, so the engine process lives and dies
/// there.
pub fn spawn_training<E, F, S>(
    config: TrainerConfig,
    make_engine: F,
    store: S,
) -> std::io::Result<Session<TrainingReport>>
where
    E: SearchEngine + 'static,
    F: FnOnce() -> EngineResult<E> + Send + 'static,
    S: CheckpointStore + Send + 'static,
{
    Session::spawn("training", move |tx| {
        let engine = make_engine()?;
        let mut orchestrator = Orchestrator::new(config, engine, store)?;
        let mut observer = forward(&tx);
        let report = orchestrator.run(&mut observer)?;
        info!("[SESSION] Training session finished");
        Ok(report)
    })
}

/// Evaluate the checkpointed predictor on a worker thread
pub fn spawn_evaluation<E, F, S>(
    config: TrainerConfig,
    make_engine: F,
    store: S,
) -> std::io::Result<Session<EvaluationReport>>
where
    E: SearchEngine + 'static,
    F: FnOnce() -> EngineResult<E> + Send + 'static,
    S: CheckpointStore + Send + 'static,
{
    Session::spawn("evaluation", move |tx| {
        config.validate(false)?;
        let mut engine = make_engine()?;
        if let Some(level) = config.skill_level {
            engine.set_skill_level(level)?;
        }

        if let Some(seed) = config.seed {
            tch::manual_seed(seed as i64);
        }
        let mut net = PolicyNet::new(&config.network);
        if !store.load_into(&mut net)? {
            warn!("[EVAL] No checkpoint found, evaluating untrained weights");
        }
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut evaluator = Evaluator::new(
            config.eval_games,
            config.opponent_limit(),
            config.opponent_rating,
            config.self_play(),
            config.rating_tracker(),
        );
        let mut observer = forward(&tx);
        let report = evaluator.run(&mut engine, &net, &mut rng, &mut observer)?;
        info!("[SESSION] Evaluation session finished");
        Ok(report)
    })
}
