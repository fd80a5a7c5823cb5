//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chess_rules::{uci, GameState, Move};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use stockfish_uci::{EngineError, EngineResult, Score, SearchEngine, SearchLimit};
use xfchess_trainer::config::TrainerConfig;
use xfchess_trainer::encoding::{MoveIndex, PositionTensor, ACTION_SPACE};
use xfchess_trainer::error::{CheckpointResult, PredictorResult};
use xfchess_trainer::predictor::{
    CheckpointStore, FileCheckpoint, NetworkConfig, PolicyNet, Prediction, Predictor,
    QUALITY_CLASSES,
};

/// Plays a fixed list of UCI moves, then the first legal move
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    script: VecDeque<String>,
    pub new_games: usize,
    pub skill_level: Option<u8>,
}

impl ScriptedEngine {
    pub fn new(moves: &[&str]) -> Self {
        Self {
            script: moves.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl SearchEngine for ScriptedEngine {
    fn new_game(&mut self) -> EngineResult<()> {
        self.new_games += 1;
        Ok(())
    }

    fn best_move(&mut self, state: &GameState, _limit: SearchLimit) -> EngineResult<Move> {
        match self.script.pop_front() {
            Some(text) => state
                .parse_uci(&text)
                .ok_or(EngineError::IllegalBestMove { uci: text }),
            None => state.legal_moves().into_iter().next().ok_or(EngineError::NoMove),
        }
    }

    fn analyse(&mut self, _state: &GameState, _limit: SearchLimit) -> EngineResult<Score> {
        Ok(Score::Centipawns(0))
    }

    fn set_skill_level(&mut self, level: u8) -> EngineResult<()> {
        self.skill_level = Some(level);
        Ok(())
    }
}

/// Plays uniformly random legal moves from a seeded generator
pub struct RandomEngine {
    rng: StdRng,
    pub moves_played: usize,
}

impl RandomEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            moves_played: 0,
        }
    }
}

impl SearchEngine for RandomEngine {
    fn new_game(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn best_move(&mut self, state: &GameState, _limit: SearchLimit) -> EngineResult<Move> {
        let m = state
            .legal_moves()
            .choose(&mut self.rng)
            .cloned()
            .ok_or(EngineError::NoMove)?;
        self.moves_played += 1;
        Ok(m)
    }

    fn analyse(&mut self, _state: &GameState, _limit: SearchLimit) -> EngineResult<Score> {
        Ok(Score::Centipawns(0))
    }

    fn set_skill_level(&mut self, _level: u8) -> EngineResult<()> {
        Ok(())
    }
}

/// Returns the same prediction for every position
pub struct FixedPredictor {
    pub prediction: Prediction,
}

impl FixedPredictor {
    /// Flat policy over the whole action space
    pub fn uniform() -> Self {
        Self {
            prediction: Prediction {
                policy: vec![1.0 / ACTION_SPACE as f32; ACTION_SPACE],
                value: 0.5,
                quality: vec![1.0 / QUALITY_CLASSES as f32; QUALITY_CLASSES],
            },
        }
    }

    /// All probability mass on the given moves, in decreasing order
    pub fn preferring(moves: &[Move]) -> Self {
        let mut fixed = Self::uniform();
        fixed.prediction.policy = vec![0.0; ACTION_SPACE];
        for (rank, m) in moves.iter().enumerate() {
            let index = MoveIndex::encode(m);
            fixed.prediction.policy[index.get()] = 1.0 - rank as f32 * 0.01;
        }
        fixed
    }
}

impl Predictor for FixedPredictor {
    fn predict(&self, _position: &PositionTensor) -> PredictorResult<Prediction> {
        Ok(self.prediction.clone())
    }
}

/// File checkpoint that counts its saves
///
/// The counter is shared so a test can read it after the store moved into a
/// worker or an orchestrator.
pub struct CountingStore {
    pub inner: FileCheckpoint,
    pub saves: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(path: &Path) -> Self {
        Self {
            inner: FileCheckpoint::new(path),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.saves)
    }
}

impl CheckpointStore for CountingStore {
    fn load_into(&self, net: &mut PolicyNet) -> CheckpointResult<bool> {
        self.inner.load_into(net)
    }

    fn save(&mut self, net: &PolicyNet) -> CheckpointResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(net)
    }
}

/// Small, seeded configuration writing into `dir`
pub fn small_config(dir: &Path) -> TrainerConfig {
    TrainerConfig {
        checkpoint_path: dir.join("chess_model.ot"),
        log_dir: dir.join("logs"),
        iterations: 2,
        games_per_iteration: 1,
        epochs: 1,
        batch_size: 32,
        seed: Some(7),
        network: NetworkConfig {
            channels: 8,
            residual_blocks: 1,
            dropout: 0.0,
        },
        ..TrainerConfig::default()
    }
}

pub fn uci_moves(moves: &[Move]) -> Vec<String> {
    moves.iter().map(uci).collect()
}
