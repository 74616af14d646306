use thiserror::Error;

use crate::{
    coordinates::{CoordinatesError, Square},
    piece::{PieceError, PieceType},
    position::Position,
    r#move::Move,
};

/// Represents errors that can occur when parsing chess move notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// The source square of the notation is invalid.
    #[error("Invalid from square: {0}")]
    InvalidFromSquare(CoordinatesError),

    /// The destination square of the notation is invalid.
    #[error("Invalid to square: {0}")]
    InvalidToSquare(CoordinatesError),

    /// The promotion piece of the notation is invalid.
    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(PieceError),

    /// The notation does not have the shape of a coordinate move.
    #[error("Invalid notation: {0}")]
    InvalidNotation(String),

    /// The notation is well formed, but no legal move of the position matches it.
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

/// Parses a move in coordinate notation and resolves it against the legal moves of the position.
///
/// Coordinate notation is the source square followed by the destination square and an optional promotion piece
/// ("e2e4", "e7e8q"). Castling is written either as the king's move ("e1g1") or, for Chess960, as the king taking its
/// own rook ("e1h1").
///
/// # Parameters
/// * `position` - The current chess position
/// * `notation` - The move in coordinate notation
///
/// # Returns
/// * `Ok(Move)` - The matching legal move, carrying all its flags
/// * `Err(NotationError)` - Why the notation could not be parsed or matched
pub fn parse_coordinate_notation(position: &Position, notation: &str) -> Result<Move, NotationError> {
    if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
        return Err(NotationError::InvalidNotation(notation.to_string()));
    }

    let from = Square::try_from(&notation[0..2]).map_err(NotationError::InvalidFromSquare)?;
    let to = Square::try_from(&notation[2..4]).map_err(NotationError::InvalidToSquare)?;
    let promotion = notation[4..]
        .chars()
        .next()
        .map(PieceType::try_from)
        .transpose()
        .map_err(NotationError::InvalidPromotion)?;

    let matches = |mv: &Move| {
        if mv.from_square() != from || mv.promotion().map(|piece| piece.piece_type()) != promotion {
            return false;
        }

        match mv.castling_side() {
            Some(side) => {
                mv.to_square() == to
                    || position
                        .castle_check(position.side_to_move(), side)
                        .is_some_and(|check| check.rook_from == to)
            }
            None => mv.to_square() == to,
        }
    };

    // A king step onto a square next to it is preferred over a castling with the same squares.
    let legal = position.legal_moves();
    legal
        .iter()
        .filter(|mv| matches(mv))
        .min_by_key(|mv| mv.castling_side().is_some())
        .ok_or_else(|| NotationError::IllegalMove(notation.to_string()))
}
