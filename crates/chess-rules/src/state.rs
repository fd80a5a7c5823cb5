//! Owned game state
//!
//! [`GameState`] is the single source of truth for one game in progress. It
//! is mutated only through [`GameState::push`] and [`GameState::pop`], keeps
//! the full move stack (needed to describe the position to a UCI engine) and
//! counts position repetitions so that fivefold repetition ends the game.

use std::collections::HashMap;

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    CastlingMode, CastlingSide, Chess, Color, EnPassantMode, Move, Piece, Position, Role, Square,
};

use crate::error::{RulesError, RulesResult};
use crate::notation;

/// Halfmove clock value at which the seventy-five-move rule ends the game
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of one position that end the game as a draw
pub const FIVEFOLD_REPETITION: u32 = 5;

const ROLES: [Role; 6] = [
    Role::Pawn,
    Role::Knight,
    Role::Bishop,
    Role::Rook,
    Role::Queen,
    Role::King,
];

const COLORS: [Color; 2] = [Color::White, Color::Black];

/// Final result of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// One side won
    Decisive { winner: Color },
    /// Nobody won
    Draw,
}

impl GameOutcome {
    /// The winning side, `None` on a draw
    pub fn winner(self) -> Option<Color> {
        match self {
            GameOutcome::Decisive { winner } => Some(winner),
            GameOutcome::Draw => None,
        }
    }

    /// Game score from `side`'s point of view: 1.0 win, 0.0 loss, 0.5 draw
    pub fn score_for(self, side: Color) -> f32 {
        match self {
            GameOutcome::Decisive { winner } if winner == side => 1.0,
            GameOutcome::Decisive { .. } => 0.0,
            GameOutcome::Draw => 0.5,
        }
    }
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

/// Castling rights of both sides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

/// A chess game in progress
#[derive(Debug, Clone)]
pub struct GameState {
    position: Chess,
    /// Position before each move in `moves`
    previous: Vec<Chess>,
    moves: Vec<Move>,
    initial_fen: Option<String>,
    /// Occurrences per position, keyed by Zobrist hash
    repetitions: HashMap<Zobrist64, u32>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Standard starting position
    pub fn new() -> Self {
        Self::from_position(Chess::default(), None)
    }

    /// Start from an arbitrary position in Forsyth-Edwards notation
    pub fn from_fen(fen: &str) -> RulesResult<Self> {
        let fen = fen.trim();
        let parsed: Fen = fen.parse().map_err(|e| RulesError::InvalidFen {
            fen: fen.to_owned(),
            reason: format!("{e}"),
        })?;
        let position: Chess =
            parsed
                .into_position(CastlingMode::Standard)
                .map_err(|e| RulesError::InvalidFen {
                    fen: fen.to_owned(),
                    reason: format!("{e}"),
                })?;
        Ok(Self::from_position(position, Some(fen.to_owned())))
    }

    fn from_position(position: Chess, initial_fen: Option<String>) -> Self {
        let mut state = Self {
            position,
            previous: Vec::new(),
            moves: Vec::new(),
            initial_fen,
            repetitions: HashMap::new(),
        };
        let key = state.repetition_key();
        state.repetitions.insert(key, 1);
        state
    }

    /// Underlying shakmaty position
    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Side to move
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Number of half-moves pushed since the starting position
    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    /// Moves played so far, oldest first
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// The state this game started from, before any move was pushed
    pub fn initial_state(&self) -> GameState {
        let mut initial = self.clone();
        while initial.pop().is_some() {}
        initial
    }

    /// Legal moves in the current position (empty once the game is over)
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_game_over() {
            return Vec::new();
        }
        self.position.legal_moves().into_iter().collect()
    }

    /// Whether `m` may be pushed right now
    pub fn is_legal(&self, m: &Move) -> bool {
        !self.is_game_over() && self.position.is_legal(m)
    }

    /// Find the legal move written in UCI notation
    pub fn parse_uci(&self, text: &str) -> Option<Move> {
        if self.is_game_over() {
            return None;
        }
        let parsed = UciMove::from_ascii(text.trim().as_bytes()).ok()?;
        parsed.to_move(&self.position).ok()
    }

    /// Play a move
    pub fn push(&mut self, m: Move) -> RulesResult<()> {
        if !self.is_legal(&m) {
            return Err(RulesError::IllegalMove {
                uci: notation::uci(&m),
                ply: self.ply(),
            });
        }
        self.previous.push(self.position.clone());
        self.position.play_unchecked(&m);
        self.moves.push(m);
        let key = self.repetition_key();
        *self.repetitions.entry(key).or_insert(0) += 1;
        Ok(())
    }

    /// Take back the last move, returning it
    pub fn pop(&mut self) -> Option<Move> {
        let previous = self.previous.pop()?;
        let key = self.repetition_key();
        if let Some(count) = self.repetitions.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.repetitions.remove(&key);
            }
        }
        self.position = previous;
        self.moves.pop()
    }

    /// Whether the game has ended
    pub fn is_game_over(&self) -> bool {
        self.termination().is_some()
    }

    /// Why the game ended, `None` while it is still running
    pub fn termination(&self) -> Option<Termination> {
        if self.position.legal_moves().is_empty() {
            return Some(if self.position.is_check() {
                Termination::Checkmate
            } else {
                Termination::Stalemate
            });
        }
        if self.position.is_insufficient_material() {
            return Some(Termination::InsufficientMaterial);
        }
        if self.position.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
            return Some(Termination::SeventyFiveMoves);
        }
        let seen = self
            .repetitions
            .get(&self.repetition_key())
            .copied()
            .unwrap_or(0);
        if seen >= FIVEFOLD_REPETITION {
            return Some(Termination::FivefoldRepetition);
        }
        None
    }

    /// Final result, `None` while the game is still running
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.termination().map(|termination| match termination {
            Termination::Checkmate => GameOutcome::Decisive {
                winner: !self.turn(),
            },
            _ => GameOutcome::Draw,
        })
    }

    /// Standard algebraic notation of `m` in the current position
    pub fn san(&self, m: &Move) -> String {
        San::from_move(&self.position, m).to_string()
    }

    /// UCI `position` command reproducing the current state
    pub fn uci_position_command(&self) -> String {
        let mut command = match &self.initial_fen {
            Some(fen) => format!("position fen {fen}"),
            None => "position startpos".to_string(),
        };
        if !self.moves.is_empty() {
            command.push_str(" moves");
            for m in &self.moves {
                command.push(' ');
                command.push_str(&notation::uci(m));
            }
        }
        command
    }

    /// All pieces on the board
    pub fn pieces(&self) -> Vec<(Square, Piece)> {
        let board = self.position.board();
        let mut pieces = Vec::with_capacity(32);
        for color in COLORS {
            for role in ROLES {
                let piece = Piece { color, role };
                for square in board.by_piece(piece) {
                    pieces.push((square, piece));
                }
            }
        }
        pieces
    }

    /// Number of pieces on the board
    pub fn piece_count(&self) -> usize {
        self.position.board().occupied().count()
    }

    /// Current castling rights
    pub fn castling_rights(&self) -> CastlingRights {
        let castles = self.position.castles();
        CastlingRights {
            white_kingside: castles.has(Color::White, CastlingSide::KingSide),
            white_queenside: castles.has(Color::White, CastlingSide::QueenSide),
            black_kingside: castles.has(Color::Black, CastlingSide::KingSide),
            black_queenside: castles.has(Color::Black, CastlingSide::QueenSide),
        }
    }

    /// Target square of a possible en passant capture after a double pawn push
    pub fn en_passant_square(&self) -> Option<Square> {
        self.position.ep_square(EnPassantMode::Always)
    }

    fn repetition_key(&self) -> Zobrist64 {
        self.position.zobrist_hash(EnPassantMode::Legal)
    }
}
