use once_cell::sync::Lazy;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    coordinates::{File, Square},
    piece::Piece,
    r#move::CastlingRight,
};

/// Type alias for the Zobrist hash value
pub type Zobrist = u64;

// The keys are drawn from a fixed seed so that hashes are stable from one run to the next.
const ZOBRIST_SEED: u64 = 0x5A0B_F15C_0DE5_EED5;

struct ZobristKeys {
    piece_square: [[Zobrist; Square::COUNT]; Piece::COUNT],
    en_passant: [Zobrist; File::COUNT],
    black_to_move: Zobrist,
    castling: [Zobrist; CastlingRight::COUNT],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

        let mut piece_square = [[0; Square::COUNT]; Piece::COUNT];
        for keys in piece_square.iter_mut() {
            for key in keys.iter_mut() {
                *key = rng.random();
            }
        }

        let mut en_passant = [0; File::COUNT];
        for key in en_passant.iter_mut() {
            *key = rng.random();
        }

        let black_to_move = rng.random();

        // Index zero (no castling right) keeps the value 0 so that an empty board with white to move hashes to zero.
        let mut castling = [0; CastlingRight::COUNT];
        for key in castling.iter_mut().skip(1) {
            *key = rng.random();
        }

        ZobristKeys { piece_square, en_passant, black_to_move, castling }
    }
}

static ZOBRIST_KEYS: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

/// Forces the generation of the Zobrist keys.
pub(crate) fn initialize() {
    Lazy::force(&ZOBRIST_KEYS);
}

/// Returns the Zobrist hash value for a specific piece on a specific square. This hash is used when adding or removing
/// pieces from the board.
pub fn zobrist_piece_square(piece: Piece, square: Square) -> Zobrist {
    ZOBRIST_KEYS.piece_square[usize::from(piece)][usize::from(square)]
}

/// Returns the Zobrist hash value for an en passant square. Only the file of the square is hashed. Returns 0 when there
/// is no en passant square.
pub fn zobrist_en_passant(square: Option<Square>) -> Zobrist {
    match square {
        Some(square) => ZOBRIST_KEYS.en_passant[usize::from(square.file())],
        None => 0,
    }
}

/// Returns the Zobrist hash value that toggles the side to move.
pub fn zobrist_black_to_move() -> Zobrist {
    ZOBRIST_KEYS.black_to_move
}

/// Returns the Zobrist hash value for a specific castling right combination. This hash is used to update the position
/// signature when castling rights change.
pub fn zobrist_castling(castling_right: CastlingRight) -> Zobrist {
    ZOBRIST_KEYS.castling[usize::from(castling_right.bits())]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_no_castling_right_hashes_to_zero() {
        assert_eq!(zobrist_castling(CastlingRight::empty()), 0);
        assert_ne!(zobrist_castling(CastlingRight::WHITE_KINGSIDE), 0);
    }

    #[test]
    fn test_no_en_passant_hashes_to_zero() {
        assert_eq!(zobrist_en_passant(None), 0);
        assert_eq!(zobrist_en_passant(Some(Square::E3)), zobrist_en_passant(Some(Square::E6)));
    }

    #[test]
    fn test_piece_square_keys_are_distinct() {
        let keys: HashSet<Zobrist> = Piece::ALL
            .iter()
            .flat_map(|&piece| Square::ALL.iter().map(move |&square| zobrist_piece_square(piece, square)))
            .collect();
        assert_eq!(keys.len(), Piece::COUNT * Square::COUNT);
    }
}
