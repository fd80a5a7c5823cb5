//! Board → tensor encoding
//!
//! # Layout
//!
//! The tensor has shape `[17, 8, 8]` (plane, row, column). Row 0 is the
//! eighth rank and column 0 the a-file, so the board reads the way it is
//! printed with White at the bottom.
//!
//! | Plane | Content                                                  |
//! |-------|----------------------------------------------------------|
//! | 0-5   | White pawn, knight, bishop, rook, queen, king            |
//! | 6-11  | Black pawn, knight, bishop, rook, queen, king            |
//! | 12    | White kingside castling right, cell (0, 0)               |
//! | 13    | White queenside castling right, cell (0, 7)              |
//! | 14    | Black kingside castling right, cell (7, 0)               |
//! | 15    | Black queenside castling right, cell (7, 7)              |
//! | 16    | En passant target square                                 |
//!
//! The castling cells are fixed markers, not board squares.

use chess_rules::{Color, GameState, Role, Square};

/// Number of planes in an encoded position
pub const PLANES: usize = 17;
/// Rows and columns of a plane
pub const BOARD_SIZE: usize = 8;
/// Planes holding one-hot piece occupancy
pub const PIECE_PLANES: usize = 12;

const CASTLING_PLANE: usize = 12;
const EN_PASSANT_PLANE: usize = 16;
const PLANE_LEN: usize = BOARD_SIZE * BOARD_SIZE;

/// A position encoded as `[17, 8, 8]` floats, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTensor {
    data: Vec<f32>,
}

impl PositionTensor {
    /// Shape of the encoded tensor
    pub const SHAPE: [usize; 3] = [PLANES, BOARD_SIZE, BOARD_SIZE];
    /// Number of values in the encoded tensor
    pub const LEN: usize = PLANES * PLANE_LEN;

    fn zeros() -> Self {
        Self {
            data: vec![0.0; Self::LEN],
        }
    }

    /// Wrap raw values; `None` unless exactly [`Self::LEN`] values are given
    pub fn from_vec(data: Vec<f32>) -> Option<Self> {
        (data.len() == Self::LEN).then_some(Self { data })
    }

    pub fn get(&self, plane: usize, row: usize, col: usize) -> f32 {
        self.data[plane * PLANE_LEN + row * BOARD_SIZE + col]
    }

    fn set(&mut self, plane: usize, row: usize, col: usize) {
        self.data[plane * PLANE_LEN + row * BOARD_SIZE + col] = 1.0;
    }

    /// The 64 cells of one plane
    pub fn plane(&self, plane: usize) -> &[f32] {
        &self.data[plane * PLANE_LEN..(plane + 1) * PLANE_LEN]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Row and column of a board square in the tensor
pub fn square_cell(square: Square) -> (usize, usize) {
    let index = square as usize;
    let rank = index / BOARD_SIZE;
    let file = index % BOARD_SIZE;
    (BOARD_SIZE - 1 - rank, file)
}

fn piece_plane(color: Color, role: Role) -> usize {
    let offset = match role {
        Role::Pawn => 0,
        Role::Knight => 1,
        Role::Bishop => 2,
        Role::Rook => 3,
        Role::Queen => 4,
        Role::King => 5,
    };
    match color {
        Color::White => offset,
        Color::Black => 6 + offset,
    }
}

/// Encode the current position of `state`
pub fn encode(state: &GameState) -> PositionTensor {
    let mut tensor = PositionTensor::zeros();

    for (square, piece) in state.pieces() {
        let (row, col) = square_cell(square);
        tensor.set(piece_plane(piece.color, piece.role), row, col);
    }

    let rights = state.castling_rights();
    let corners = [
        (rights.white_kingside, 0, 0),
        (rights.white_queenside, 0, 7),
        (rights.black_kingside, 7, 0),
        (rights.black_queenside, 7, 7),
    ];
    for (offset, (present, row, col)) in corners.into_iter().enumerate() {
        if present {
            tensor.set(CASTLING_PLANE + offset, row, col);
        }
    }

    if let Some(square) = state.en_passant_square() {
        let (row, col) = square_cell(square);
        tensor.set(EN_PASSANT_PLANE, row, col);
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;
    use rand::SeedableRng;

    fn plane_sum(tensor: &PositionTensor, plane: usize) -> f32 {
        tensor.plane(plane).iter().sum()
    }

    fn piece_sum(tensor: &PositionTensor) -> f32 {
        (0..PIECE_PLANES).map(|p| plane_sum(tensor, p)).sum()
    }

    fn play(moves: &[&str]) -> GameState {
        let mut state = GameState::new();
        for text in moves {
            let m = state.parse_uci(text).unwrap();
            state.push(m).unwrap();
        }
        state
    }

    #[test]
    fn test_starting_position_layout() {
        let tensor = encode(&GameState::new());

        assert_eq!(tensor.as_slice().len(), 17 * 8 * 8);
        assert_eq!(piece_sum(&tensor), 32.0);
        // White pawns on the second rank sit in row 6
        assert!((0..8).all(|col| tensor.get(0, 6, col) == 1.0));
        // Black king on e8
        assert_eq!(tensor.get(11, 0, 4), 1.0);
        // White queen on d1
        assert_eq!(tensor.get(4, 7, 3), 1.0);

        assert_eq!(tensor.get(12, 0, 0), 1.0);
        assert_eq!(tensor.get(13, 0, 7), 1.0);
        assert_eq!(tensor.get(14, 7, 0), 1.0);
        assert_eq!(tensor.get(15, 7, 7), 1.0);
        for plane in 12..16 {
            assert_eq!(plane_sum(&tensor, plane), 1.0);
        }
        assert_eq!(plane_sum(&tensor, 16), 0.0);
    }

    #[test]
    fn test_en_passant_marker() {
        let tensor = encode(&play(&["e2e4"]));
        // e3 is rank 3, file e
        assert_eq!(tensor.get(16, 5, 4), 1.0);
        assert_eq!(plane_sum(&tensor, 16), 1.0);

        let tensor = encode(&play(&["e2e4", "g8f6"]));
        assert_eq!(plane_sum(&tensor, 16), 0.0);
    }

    #[test]
    fn test_lost_castling_rights_cleared() {
        let tensor = encode(&play(&["e2e4", "e7e5", "e1e2", "h7h6"]));
        assert_eq!(plane_sum(&tensor, 12), 0.0);
        assert_eq!(plane_sum(&tensor, 13), 0.0);
        assert_eq!(plane_sum(&tensor, 14), 1.0);
        assert_eq!(plane_sum(&tensor, 15), 1.0);
    }

    #[test]
    fn test_piece_planes_track_captures() {
        //! Piece plane total equals the piece count after every move
        let mut state = GameState::new();
        for text in ["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a5"] {
            let m = state.parse_uci(text).unwrap();
            state.push(m).unwrap();
            let tensor = encode(&state);
            assert_eq!(piece_sum(&tensor), state.piece_count() as f32);
        }
        assert_eq!(state.piece_count(), 30);
    }

    #[test]
    fn test_random_walk_planes_stay_consistent() {
        //! Seeded random games, including underpromotions, checked at every ply
        let starts = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1",
            "4k3/PPP5/8/8/8/8/5ppp/2K5 w - - 0 1",
        ];
        for seed in 0..6 {
            for fen in starts {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut state = GameState::from_fen(fen).unwrap();
                loop {
                    let tensor = encode(&state);
                    let context = state.uci_position_command();

                    assert_eq!(piece_sum(&tensor), state.piece_count() as f32, "{context}");
                    for cell in 0..PLANE_LEN {
                        let stacked: f32 = (0..PIECE_PLANES)
                            .map(|p| tensor.plane(p)[cell])
                            .sum();
                        assert!(stacked <= 1.0, "{context}");
                    }

                    let en_passant = tensor.plane(EN_PASSANT_PLANE);
                    assert!(en_passant.iter().filter(|v| **v != 0.0).count() <= 1, "{context}");

                    let rights = state.castling_rights();
                    let expected = [
                        rights.white_kingside,
                        rights.white_queenside,
                        rights.black_kingside,
                        rights.black_queenside,
                    ];
                    for (offset, present) in expected.into_iter().enumerate() {
                        let sum = plane_sum(&tensor, CASTLING_PLANE + offset);
                        assert!(sum == 0.0 || sum == 1.0, "{context}");
                        assert_eq!(sum == 1.0, present, "{context}");
                    }

                    if state.ply() >= 150 {
                        break;
                    }
                    let Some(next) = state.legal_moves().choose(&mut rng).cloned() else {
                        break;
                    };
                    state.push(next).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let state = play(&["d2d4", "g8f6", "c2c4"]);
        assert_eq!(encode(&state), encode(&state));
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(PositionTensor::from_vec(vec![0.0; PositionTensor::LEN]).is_some());
        assert!(PositionTensor::from_vec(vec![0.0; 10]).is_none());
    }
}
