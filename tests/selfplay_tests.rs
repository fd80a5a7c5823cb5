//! Self-Play Integration Tests
//!
//! Tests for whole games driven through the public self-play API:
//! - One record per half-move
//! - Per-mover outcome labels
//! - Predictor moves falling back when candidates are stale

mod common;

use chess_rules::{Color, GameOutcome, GameState, Termination};
use common::{uci_moves, FixedPredictor, RandomEngine, ScriptedEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;
use stockfish_uci::SearchLimit;
use xfchess_trainer::encoding::MoveIndex;
use xfchess_trainer::selfplay::{label_outcomes, play_game, MoveContext, Mover, SelfPlayConfig};

const MATE_IN_ONE_AFTER_BLACK: &str = "k7/7p/1K6/8/8/8/8/2R5 b - - 0 1";
const MATE_IN_ONE: &str = "k7/7p/1K6/8/8/8/8/2R5 w - - 0 1";

fn engine_mover() -> Mover {
    Mover::Engine(SearchLimit::Depth(1))
}

// ============================================================================
// Engine vs Engine
// ============================================================================

#[test]
fn test_scripted_mate_labels_each_side() {
    let mut engine = ScriptedEngine::new(&["h7h6", "c1c8"]);
    let predictor = FixedPredictor::uniform();
    let mut rng = StdRng::seed_from_u64(1);
    let mut ctx = MoveContext {
        engine: &mut engine,
        predictor: &predictor,
        rng: &mut rng,
        config: SelfPlayConfig::default(),
    };

    let start = GameState::from_fen(MATE_IN_ONE_AFTER_BLACK).unwrap();
    let mut game = play_game(start, &engine_mover(), &engine_mover(), &mut ctx).unwrap();

    assert_eq!(game.plies(), 2);
    assert_eq!(game.san_moves, vec!["h6", "Rc8"]);
    assert_eq!(game.termination, Termination::Checkmate);
    assert_eq!(
        game.outcome,
        GameOutcome::Decisive {
            winner: Color::White
        }
    );

    label_outcomes(&mut game.records, game.outcome);
    assert_eq!(game.records[0].mover, Color::Black);
    assert_eq!(game.records[0].outcome, 0.0);
    assert_eq!(game.records[1].mover, Color::White);
    assert_eq!(game.records[1].outcome, 1.0);
    assert_eq!(engine.new_games, 1);
}

#[test]
fn test_random_game_records_every_ply() {
    let mut engine = RandomEngine::new(11);
    let predictor = FixedPredictor::uniform();
    let mut rng = StdRng::seed_from_u64(11);
    let mut ctx = MoveContext {
        engine: &mut engine,
        predictor: &predictor,
        rng: &mut rng,
        config: SelfPlayConfig::default(),
    };

    let mut game = play_game(GameState::new(), &engine_mover(), &engine_mover(), &mut ctx).unwrap();
    assert!(game.final_state.is_game_over());
    assert_eq!(game.plies(), game.final_state.ply());
    assert_eq!(game.san_moves.len(), game.plies());

    label_outcomes(&mut game.records, game.outcome);
    for (ply, record) in game.records.iter().enumerate() {
        let expected_mover = if ply % 2 == 0 { Color::White } else { Color::Black };
        assert_eq!(record.mover, expected_mover);
        assert_eq!(record.outcome, game.outcome.score_for(record.mover));
        assert!([0.0, 0.5, 1.0].contains(&record.outcome));
    }
    assert_eq!(engine.moves_played, game.plies());
}

#[test]
fn test_record_move_index_matches_played_move() {
    let mut engine = RandomEngine::new(3);
    let predictor = FixedPredictor::uniform();
    let mut rng = StdRng::seed_from_u64(3);
    let mut ctx = MoveContext {
        engine: &mut engine,
        predictor: &predictor,
        rng: &mut rng,
        config: SelfPlayConfig::default(),
    };

    let game = play_game(GameState::new(), &engine_mover(), &engine_mover(), &mut ctx).unwrap();
    let played = game.final_state.moves();
    for (record, m) in game.records.iter().zip(played) {
        assert_eq!(record.move_index, MoveIndex::encode(m));
    }
}

// ============================================================================
// Predictor Moves
// ============================================================================

#[test]
fn test_predictor_plays_top_candidate() {
    let state = GameState::from_fen(MATE_IN_ONE).unwrap();
    let mate = state.parse_uci("c1c8").unwrap();

    let mut engine = ScriptedEngine::new(&[]);
    let predictor = FixedPredictor::preferring(&[mate]);
    let mut rng = StdRng::seed_from_u64(5);
    let mut ctx = MoveContext {
        engine: &mut engine,
        predictor: &predictor,
        rng: &mut rng,
        config: SelfPlayConfig::default(),
    };

    let game = play_game(state, &Mover::Predictor, &engine_mover(), &mut ctx).unwrap();
    assert_eq!(game.plies(), 1);
    assert_eq!(uci_moves(game.final_state.moves()), vec!["c1c8"]);
    assert_eq!(game.outcome.winner(), Some(Color::White));
}

#[test]
fn test_predictor_skips_stale_candidate() {
    // e2e4 has no piece to move here, the next candidate mates
    let stale = GameState::new().parse_uci("e2e4").unwrap();
    let state = GameState::from_fen(MATE_IN_ONE).unwrap();
    let mate = state.parse_uci("c1c8").unwrap();

    let mut engine = ScriptedEngine::new(&[]);
    let predictor = FixedPredictor::preferring(&[stale, mate]);
    let mut rng = StdRng::seed_from_u64(5);
    let mut ctx = MoveContext {
        engine: &mut engine,
        predictor: &predictor,
        rng: &mut rng,
        config: SelfPlayConfig::default(),
    };

    let (m, _) = Mover::Predictor.produce_move(&state, &mut ctx).unwrap();
    assert_eq!(m, mate);
}

#[test]
fn test_predictor_falls_back_to_legal_move() {
    // Only stale candidates in the policy
    let stale = GameState::new().parse_uci("e2e4").unwrap();
    let state = GameState::from_fen(MATE_IN_ONE).unwrap();

    let mut engine = ScriptedEngine::new(&[]);
    let predictor = FixedPredictor::preferring(&[stale]);
    let mut rng = StdRng::seed_from_u64(9);
    let mut ctx = MoveContext {
        engine: &mut engine,
        predictor: &predictor,
        rng: &mut rng,
        config: SelfPlayConfig { top_k: 1 },
    };

    let (m, _) = Mover::Predictor.produce_move(&state, &mut ctx).unwrap();
    assert!(state.is_legal(&m));
}

#[test]
fn test_illegal_engine_reply_aborts_game() {
    let mut engine = ScriptedEngine::new(&["a1a1"]);
    let predictor = FixedPredictor::uniform();
    let mut rng = StdRng::seed_from_u64(2);
    let mut ctx = MoveContext {
        engine: &mut engine,
        predictor: &predictor,
        rng: &mut rng,
        config: SelfPlayConfig::default(),
    };

    let result = play_game(GameState::new(), &engine_mover(), &engine_mover(), &mut ctx);
    assert!(result.is_err());
}
