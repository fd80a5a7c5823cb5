//! The self-play → label → train → checkpoint loop
//!
//! # Iteration
//!
//! 1. Play `games_per_iteration` games. White is the predictor once it has
//!    weights worth using (a loaded checkpoint or a finished training pass),
//!    otherwise the engine at `search_depth`. Black is always the engine on
//!    a per-move time budget.
//! 2. Label each finished game's records from each mover's point of view
//!    and append to the buffer. The rating only moves on games the
//!    predictor actually played; engine-vs-engine warm-up games leave it
//!    unchanged.
//! 3. Train for `epochs` epochs over everything accumulated so far.
//! 4. Overwrite the checkpoint.
//!
//! Any error aborts the run; the engine process is released by its owner.

use std::path::PathBuf;

use chess_rules::{Color, GameState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use stockfish_uci::SearchEngine;
use tracing::info;

use super::session::SessionEvent;
use crate::config::TrainerConfig;
use crate::error::{OrchestratorResult, TrainError};
use crate::predictor::{CheckpointStore, PolicyNet};
use crate::rating::RatingTracker;
use crate::selfplay::{label_outcomes, play_game, ExperienceBuffer, MoveContext, Mover};
use crate::training::{Trainer, TrainingHistory};

/// What a full training run produced
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub iterations: usize,
    pub games_played: usize,
    pub white_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
    /// Records in the experience buffer at the end of the run
    pub records: usize,
    pub checkpoint_saves: usize,
    pub final_rating: f64,
    /// Average total loss of the last epoch, if any epoch ran
    pub final_loss: Option<f64>,
}

/// Owns everything one training run mutates
pub struct Orchestrator<E: SearchEngine, S: CheckpointStore> {
    config: TrainerConfig,
    engine: E,
    store: S,
    net: PolicyNet,
    trainer: Trainer,
    rating: RatingTracker,
    buffer: ExperienceBuffer,
    history: TrainingHistory,
    history_path: PathBuf,
    rng: StdRng,
    predictor_ready: bool,
}

impl<E: SearchEngine, S: CheckpointStore> Orchestrator<E, S> {
    /// Build the network, restore the checkpoint if one exists and configure the engine
    pub fn new(config: TrainerConfig, mut engine: E, store: S) -> OrchestratorResult<Self> {
        config.validate(true)?;
        let trainer = Trainer::new(config.training())?;

        if let Some(seed) = config.seed {
            tch::manual_seed(seed as i64);
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut net = PolicyNet::new(&config.network);
        let predictor_ready = store.load_into(&mut net)?;

        if let Some(level) = config.skill_level {
            engine.set_skill_level(level)?;
        }

        let history_path = config.history_path();
        let history = TrainingHistory::load(&history_path);

        Ok(Self {
            rating: config.rating_tracker(),
            config,
            engine,
            store,
            net,
            trainer,
            buffer: ExperienceBuffer::new(),
            history,
            history_path,
            rng,
            predictor_ready,
        })
    }

    pub fn rating(&self) -> &RatingTracker {
        &self.rating
    }

    pub fn buffer(&self) -> &ExperienceBuffer {
        &self.buffer
    }

    pub fn network(&self) -> &PolicyNet {
        &self.net
    }

    /// Whether White is played by the predictor
    pub fn predictor_ready(&self) -> bool {
        self.predictor_ready
    }

    /// Give up the network and the engine, e.g. to evaluate afterwards
    pub fn into_parts(self) -> (PolicyNet, E) {
        (self.net, self.engine)
    }

    /// Run every configured iteration
    pub fn run(&mut self, observer: &mut dyn FnMut(SessionEvent)) -> OrchestratorResult<TrainingReport> {
        let mut report = TrainingReport {
            iterations: 0,
            games_played: 0,
            white_wins: 0,
            black_wins: 0,
            draws: 0,
            records: 0,
            checkpoint_saves: 0,
            final_rating: self.rating.rating(),
            final_loss: None,
        };

        for iteration in 1..=self.config.iterations {
            info!("[PIPELINE] ===== Iteration {}/{} =====", iteration, self.config.iterations);
            self.play_iteration(iteration, &mut report, observer)?;
            if let Some(loss) = self.train_iteration(iteration, observer)? {
                report.final_loss = Some(loss);
            }
            self.store.save(&self.net)?;
            report.checkpoint_saves += 1;
            observer(SessionEvent::CheckpointSaved { iteration });
            report.iterations = iteration;
        }

        report.records = self.buffer.len();
        report.final_rating = self.rating.rating();
        info!(
            "[PIPELINE] Finished {} iterations: {} games (+{} ={} -{}), rating {:.0}",
            report.iterations,
            report.games_played,
            report.white_wins,
            report.draws,
            report.black_wins,
            report.final_rating
        );
        Ok(report)
    }

    fn play_iteration(
        &mut self,
        iteration: usize,
        report: &mut TrainingReport,
        observer: &mut dyn FnMut(SessionEvent),
    ) -> OrchestratorResult<()> {
        let white = if self.predictor_ready {
            Mover::Predictor
        } else {
            Mover::Engine(self.config.search_limit())
        };
        let black = Mover::Engine(self.config.opponent_limit());
        info!("[SELFPLAY] White: {}, Black: {}", white, black);

        let games = self.config.games_per_iteration;
        for game in 1..=games {
            let mut ctx = MoveContext {
                engine: &mut self.engine,
                predictor: &self.net,
                rng: &mut self.rng,
                config: self.config.self_play(),
            };
            let mut record = play_game(GameState::new(), &white, &black, &mut ctx)?;
            label_outcomes(&mut record.records, record.outcome);

            let score = record.outcome.score_for(Color::White);
            let rating = match &white {
                Mover::Predictor => Some(
                    self.rating
                        .update(self.config.opponent_rating, f64::from(score)),
                ),
                Mover::Engine(_) => None,
            };

            match record.outcome.winner() {
                Some(Color::White) => report.white_wins += 1,
                Some(Color::Black) => report.black_wins += 1,
                None => report.draws += 1,
            }
            report.games_played += 1;

            info!(
                "[SELFPLAY] Game {}/{} over after {} plies: {:?} ({:?}), outcome {}",
                game,
                games,
                record.plies(),
                record.outcome,
                record.termination,
                score
            );
            match rating {
                Some(rating) => info!("[SELFPLAY] Predictor rating {:.0}", rating),
                None => info!(
                    "[SELFPLAY] Engine played White, rating unchanged at {:.0}",
                    self.rating.rating()
                ),
            }
            observer(SessionEvent::GameFinished {
                iteration,
                game,
                outcome: record.outcome,
                plies: record.plies(),
                rating,
            });
            self.buffer.extend(record.records);
        }
        Ok(())
    }

    /// Train over the whole buffer, returning the last epoch's average loss
    fn train_iteration(
        &mut self,
        iteration: usize,
        observer: &mut dyn FnMut(SessionEvent),
    ) -> OrchestratorResult<Option<f64>> {
        let rating = self.rating.rating();
        let history = &mut self.history;
        let history_path = &self.history_path;

        let stats = self.trainer.train(
            &mut self.net,
            self.buffer.records(),
            &mut self.rng,
            |stats| {
                history.record(iteration, stats, rating);
                history.save(history_path)?;
                observer(SessionEvent::EpochFinished {
                    iteration,
                    stats: *stats,
                });
                Ok::<(), TrainError>(())
            },
        )?;

        if !stats.is_empty() {
            self.predictor_ready = true;
        }
        Ok(stats.last().map(|s| s.total_loss))
    }
}
