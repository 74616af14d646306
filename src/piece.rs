use std::fmt::Display;

use thiserror::Error;

/// Error produced when a character does not name a piece.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PieceError {
    #[error("'{0}' is not a valid piece")]
    InvalidCharacter(char),
}

//======================================================================================================================
// Color
//======================================================================================================================

/// Represents the color of a chess piece.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const COUNT: usize = 2;
    pub const ALL: [Color; Color::COUNT] = [Color::White, Color::Black];

    // Values used as const generic parameters by the move generator.
    pub const WHITE_VALUE: u8 = 0;
    pub const BLACK_VALUE: u8 = 1;
}

impl std::ops::Not for Color {
    type Output = Color;

    /// Returns the opposite color.
    fn not(self) -> Self::Output {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> Self {
        color as u8
    }
}

impl From<Color> for usize {
    fn from(color: Color) -> Self {
        color as usize
    }
}

impl From<u8> for Color {
    /// Converts a `u8` value to a `Color`.
    ///
    /// # Panics
    /// Panics if the value is greater than 1.
    fn from(value: u8) -> Self {
        Color::ALL[value as usize]
    }
}

impl From<Color> for char {
    /// Returns the FEN letter of the color ('w' or 'b').
    fn from(color: Color) -> Self {
        match color {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

//======================================================================================================================
// PieceType
//======================================================================================================================

/// The kind of a piece, regardless of its color. The order matches the order of the piece type bitboards.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub const COUNT: usize = 6;

    /// All piece types, from the least to the most valuable.
    pub const ALL: [PieceType; PieceType::COUNT] =
        [PieceType::Pawn, PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen, PieceType::King];

    // Values used as const generic parameters by the attack and move generation functions.
    pub const PAWN_VALUE: u8 = 0;
    pub const KNIGHT_VALUE: u8 = 1;
    pub const BISHOP_VALUE: u8 = 2;
    pub const ROOK_VALUE: u8 = 3;
    pub const QUEEN_VALUE: u8 = 4;
    pub const KING_VALUE: u8 = 5;
}

impl From<PieceType> for u8 {
    fn from(piece_type: PieceType) -> Self {
        piece_type as u8
    }
}

impl From<PieceType> for usize {
    fn from(piece_type: PieceType) -> Self {
        piece_type as usize
    }
}

impl From<u8> for PieceType {
    /// Converts a `u8` value to a `PieceType`.
    ///
    /// # Panics
    /// Panics if the value is greater than 5.
    fn from(value: u8) -> Self {
        PieceType::ALL[value as usize]
    }
}

impl From<PieceType> for char {
    /// Returns the lowercase letter of the piece type.
    fn from(piece_type: PieceType) -> Self {
        match piece_type {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }
}

impl TryFrom<char> for PieceType {
    type Error = PieceError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase() {
            'p' => Ok(PieceType::Pawn),
            'n' => Ok(PieceType::Knight),
            'b' => Ok(PieceType::Bishop),
            'r' => Ok(PieceType::Rook),
            'q' => Ok(PieceType::Queen),
            'k' => Ok(PieceType::King),
            _ => Err(PieceError::InvalidCharacter(value)),
        }
    }
}

impl Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "Pawn"),
            PieceType::Knight => write!(f, "Knight"),
            PieceType::Bishop => write!(f, "Bishop"),
            PieceType::Rook => write!(f, "Rook"),
            PieceType::Queen => write!(f, "Queen"),
            PieceType::King => write!(f, "King"),
        }
    }
}

//======================================================================================================================
// Piece
//======================================================================================================================

/// Represents a chess piece.
///
/// A `Piece` is a combination of a `Color` and a `PieceType` packed in 4 bits: the lowest bit is the color and the
/// three bits above it are the piece type. The values 0 to 11 are valid pieces; `Piece::NONE_CODE` (15) is used by
/// packed encodings to mean "no piece".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Piece(u8);

impl Piece {
    pub const WHITE_PAWN: Piece = Piece(0);
    pub const BLACK_PAWN: Piece = Piece(1);
    pub const WHITE_KNIGHT: Piece = Piece(2);
    pub const BLACK_KNIGHT: Piece = Piece(3);
    pub const WHITE_BISHOP: Piece = Piece(4);
    pub const BLACK_BISHOP: Piece = Piece(5);
    pub const WHITE_ROOK: Piece = Piece(6);
    pub const BLACK_ROOK: Piece = Piece(7);
    pub const WHITE_QUEEN: Piece = Piece(8);
    pub const BLACK_QUEEN: Piece = Piece(9);
    pub const WHITE_KING: Piece = Piece(10);
    pub const BLACK_KING: Piece = Piece(11);

    pub const COUNT: usize = 12;

    /// The 4-bit code that stands for "no piece" in packed encodings.
    pub const NONE_CODE: u32 = 0xF;

    pub const ALL: [Piece; Piece::COUNT] = [
        Piece::WHITE_PAWN,
        Piece::BLACK_PAWN,
        Piece::WHITE_KNIGHT,
        Piece::BLACK_KNIGHT,
        Piece::WHITE_BISHOP,
        Piece::BLACK_BISHOP,
        Piece::WHITE_ROOK,
        Piece::BLACK_ROOK,
        Piece::WHITE_QUEEN,
        Piece::BLACK_QUEEN,
        Piece::WHITE_KING,
        Piece::BLACK_KING,
    ];

    /// Creates a new `Piece` with the given `Color` and `PieceType`.
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        Piece((piece_type as u8) << 1 | color as u8)
    }

    /// Returns the Color of the piece.
    pub fn color(self) -> Color {
        Color::from(self.0 & 1)
    }

    /// Returns the PieceType of the piece.
    pub fn piece_type(self) -> PieceType {
        PieceType::from(self.0 >> 1)
    }

    /// Packs an optional piece in 4 bits.
    pub fn pack(piece: Option<Piece>) -> u32 {
        piece.map_or(Self::NONE_CODE, |piece| piece.0 as u32)
    }

    /// Reverses `pack`. Codes that are not a piece decode to `None`.
    pub fn unpack(code: u32) -> Option<Piece> {
        let code = code & 0xF;
        if (code as usize) < Piece::COUNT {
            Some(Piece(code as u8))
        } else {
            None
        }
    }
}

impl From<Piece> for u8 {
    fn from(piece: Piece) -> Self {
        piece.0
    }
}

impl From<Piece> for usize {
    fn from(piece: Piece) -> Self {
        piece.0 as usize
    }
}

impl From<Piece> for char {
    /// Returns the FEN letter of the piece: uppercase for White, lowercase for Black.
    fn from(piece: Piece) -> Self {
        let c = char::from(piece.piece_type());
        match piece.color() {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl TryFrom<char> for Piece {
    type Error = PieceError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        let piece_type = PieceType::try_from(value)?;
        let color = if value.is_ascii_uppercase() { Color::White } else { Color::Black };
        Ok(Piece::new(color, piece_type))
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", char::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_color() {
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(!Color::Black, Color::White);
    }

    #[test]
    fn test_piece_type_and_color_are_recoverable() {
        for color in Color::ALL {
            for piece_type in PieceType::ALL {
                let piece = Piece::new(color, piece_type);
                assert_eq!(piece.color(), color);
                assert_eq!(piece.piece_type(), piece_type);
                assert!(u8::from(piece) < 16);
            }
        }
    }

    #[test]
    fn test_piece_from_char() {
        assert_eq!(Piece::try_from('K'), Ok(Piece::WHITE_KING));
        assert_eq!(Piece::try_from('n'), Ok(Piece::BLACK_KNIGHT));
        assert_eq!(Piece::try_from('x'), Err(PieceError::InvalidCharacter('x')));
    }

    #[test]
    fn test_piece_to_char() {
        assert_eq!(char::from(Piece::WHITE_QUEEN), 'Q');
        assert_eq!(char::from(Piece::BLACK_PAWN), 'p');
    }

    #[test]
    fn test_pack_sentinel() {
        assert_eq!(Piece::pack(None), Piece::NONE_CODE);
        assert_eq!(Piece::unpack(Piece::NONE_CODE), None);
        assert_eq!(Piece::unpack(Piece::pack(Some(Piece::BLACK_ROOK))), Some(Piece::BLACK_ROOK));
    }
}
