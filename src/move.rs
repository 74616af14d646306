use std::{fmt::Display, hash::Hash};

use bitflags::bitflags;

use crate::{
    coordinates::Square,
    piece::{Color, Piece, PieceType},
};

//======================================================================================================================
// Castling
//======================================================================================================================

/// The two sides a king can castle to.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CastlingSide {
    Kingside = 0,
    Queenside = 1,
}

impl CastlingSide {
    pub const COUNT: usize = 2;
    pub const ALL: [CastlingSide; CastlingSide::COUNT] = [CastlingSide::Kingside, CastlingSide::Queenside];
}

impl From<CastlingSide> for usize {
    fn from(side: CastlingSide) -> Self {
        side as usize
    }
}

bitflags! {
    /// Castling availability, one bit per color and side.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CastlingRight: u8 {
        const WHITE_KINGSIDE = 0b0001;
        const WHITE_QUEENSIDE = 0b0010;
        const BLACK_KINGSIDE = 0b0100;
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRight {
    /// Number of distinct combinations of castling rights.
    pub const COUNT: usize = 16;

    /// Returns the single right for a color and a side.
    pub fn new(color: Color, side: CastlingSide) -> Self {
        match (color, side) {
            (Color::White, CastlingSide::Kingside) => CastlingRight::WHITE_KINGSIDE,
            (Color::White, CastlingSide::Queenside) => CastlingRight::WHITE_QUEENSIDE,
            (Color::Black, CastlingSide::Kingside) => CastlingRight::BLACK_KINGSIDE,
            (Color::Black, CastlingSide::Queenside) => CastlingRight::BLACK_QUEENSIDE,
        }
    }
}

//======================================================================================================================
// Move
//======================================================================================================================

bitflags! {
    /// Semantic tags of a move. A move with no tag is a quiet move.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MoveFlags: u8 {
        const CAPTURE = 0b0000_0001;
        const EN_PASSANT = 0b0000_0010;
        const PROMOTION = 0b0000_0100;
        const KINGSIDE_CASTLE = 0b0000_1000;
        const QUEENSIDE_CASTLE = 0b0001_0000;
        const DOUBLE_PUSH = 0b0010_0000;
        const CHECK = 0b0100_0000;
    }
}

/// A chess move packed in a 32-bit integer, plus an ordering score used by the search.
///
/// | bits  | content                                 |
/// |-------|-----------------------------------------|
/// | 0-5   | origin square                           |
/// | 6-11  | destination square                      |
/// | 12-15 | moving piece                            |
/// | 16-19 | captured piece, or `Piece::NONE_CODE`   |
/// | 20-23 | promotion piece, or `Piece::NONE_CODE`  |
/// | 24-31 | `MoveFlags`                             |
///
/// Castling moves are encoded as the king going from its square to its destination square (g or c file).
///
/// The ordering score and the `CHECK` tag are annotations: two moves that differ only by them are equal and hash the
/// same.
#[derive(Clone, Copy)]
pub struct Move {
    data: u32,
    score: i32,
}

impl Move {
    const FROM_OFFSET: u32 = 0;
    const TO_OFFSET: u32 = 6;
    const PIECE_OFFSET: u32 = 12;
    const CAPTURED_OFFSET: u32 = 16;
    const PROMOTION_OFFSET: u32 = 20;
    const FLAGS_OFFSET: u32 = 24;

    const SQUARE_MASK: u32 = 0x3F;
    const PIECE_MASK: u32 = 0xF;
    const CHECK_BIT: u32 = (MoveFlags::CHECK.bits() as u32) << Self::FLAGS_OFFSET;

    /// The "no move" sentinel. No generated move encodes to zero since origin and destination would both be a1 and the
    /// move would carry no tag.
    pub const NONE: Move = Move { data: 0, score: 0 };

    fn encode(
        from: Square,
        to: Square,
        piece: Piece,
        captured: Option<Piece>,
        promotion: Option<Piece>,
        flags: MoveFlags,
    ) -> Self {
        let data = (u8::from(from) as u32) << Self::FROM_OFFSET
            | (u8::from(to) as u32) << Self::TO_OFFSET
            | (u8::from(piece) as u32) << Self::PIECE_OFFSET
            | Piece::pack(captured) << Self::CAPTURED_OFFSET
            | Piece::pack(promotion) << Self::PROMOTION_OFFSET
            | (flags.bits() as u32) << Self::FLAGS_OFFSET;
        Move { data, score: 0 }
    }

    /// Creates a quiet move.
    pub fn new(from: Square, to: Square, piece: Piece) -> Self {
        Self::encode(from, to, piece, None, None, MoveFlags::empty())
    }

    /// Creates a capture.
    pub fn new_capture(from: Square, to: Square, piece: Piece, captured: Piece) -> Self {
        Self::encode(from, to, piece, Some(captured), None, MoveFlags::CAPTURE)
    }

    /// Creates a non-capturing promotion.
    pub fn new_promotion(from: Square, to: Square, piece: Piece, promotion: Piece) -> Self {
        Self::encode(from, to, piece, None, Some(promotion), MoveFlags::PROMOTION)
    }

    /// Creates a promotion that also captures a piece.
    pub fn new_capture_promotion(from: Square, to: Square, piece: Piece, captured: Piece, promotion: Piece) -> Self {
        Self::encode(from, to, piece, Some(captured), Some(promotion), MoveFlags::CAPTURE | MoveFlags::PROMOTION)
    }

    /// Creates a pawn push of two squares.
    pub fn new_two_square_pawn_push(from: Square, to: Square, piece: Piece) -> Self {
        Self::encode(from, to, piece, None, None, MoveFlags::DOUBLE_PUSH)
    }

    /// Creates an en passant capture. The captured pawn is the opponent's pawn.
    pub fn new_en_passant(from: Square, to: Square, piece: Piece) -> Self {
        let captured = Piece::new(!piece.color(), PieceType::Pawn);
        Self::encode(from, to, piece, Some(captured), None, MoveFlags::CAPTURE | MoveFlags::EN_PASSANT)
    }

    /// Creates a castling move. `from` and `to` are the king's squares.
    pub fn new_castling(from: Square, to: Square, piece: Piece, side: CastlingSide) -> Self {
        let flags = match side {
            CastlingSide::Kingside => MoveFlags::KINGSIDE_CASTLE,
            CastlingSide::Queenside => MoveFlags::QUEENSIDE_CASTLE,
        };
        Self::encode(from, to, piece, None, None, flags)
    }

    /// Rebuilds a move from its packed value. The score is reset to zero.
    pub fn from_data(data: u32) -> Self {
        Move { data, score: 0 }
    }

    /// Returns the packed value of the move, without the ordering score.
    pub fn data(self) -> u32 {
        self.data
    }

    pub fn from_square(self) -> Square {
        Square::from(((self.data >> Self::FROM_OFFSET) & Self::SQUARE_MASK) as u8)
    }

    pub fn to_square(self) -> Square {
        Square::from(((self.data >> Self::TO_OFFSET) & Self::SQUARE_MASK) as u8)
    }

    /// Returns the piece being moved (the pawn, for a promotion).
    pub fn piece(self) -> Piece {
        Piece::unpack((self.data >> Self::PIECE_OFFSET) & Self::PIECE_MASK).unwrap_or(Piece::WHITE_PAWN)
    }

    pub fn captured(self) -> Option<Piece> {
        Piece::unpack((self.data >> Self::CAPTURED_OFFSET) & Self::PIECE_MASK)
    }

    pub fn promotion(self) -> Option<Piece> {
        Piece::unpack((self.data >> Self::PROMOTION_OFFSET) & Self::PIECE_MASK)
    }

    pub fn flags(self) -> MoveFlags {
        MoveFlags::from_bits_truncate((self.data >> Self::FLAGS_OFFSET) as u8)
    }

    pub fn is_none(self) -> bool {
        self.data == 0
    }

    pub fn is_capture(self) -> bool {
        self.flags().contains(MoveFlags::CAPTURE)
    }

    pub fn is_promotion(self) -> bool {
        self.flags().contains(MoveFlags::PROMOTION)
    }

    pub fn is_en_passant(self) -> bool {
        self.flags().contains(MoveFlags::EN_PASSANT)
    }

    pub fn is_double_push(self) -> bool {
        self.flags().contains(MoveFlags::DOUBLE_PUSH)
    }

    pub fn is_check(self) -> bool {
        self.flags().contains(MoveFlags::CHECK)
    }

    /// Returns true for moves that neither capture nor promote.
    pub fn is_quiet(self) -> bool {
        !self.flags().intersects(MoveFlags::CAPTURE | MoveFlags::PROMOTION)
    }

    /// Returns the square of the captured piece. It differs from the destination only for en passant captures.
    pub fn capture_square(self) -> Square {
        if self.is_en_passant() {
            Square::new(self.to_square().file(), self.from_square().rank())
        } else {
            self.to_square()
        }
    }

    /// Returns the castling side if the move is a castling move.
    pub fn castling_side(self) -> Option<CastlingSide> {
        let flags = self.flags();
        if flags.contains(MoveFlags::KINGSIDE_CASTLE) {
            Some(CastlingSide::Kingside)
        } else if flags.contains(MoveFlags::QUEENSIDE_CASTLE) {
            Some(CastlingSide::Queenside)
        } else {
            None
        }
    }

    /// Tags the move as giving check.
    pub fn set_check(&mut self) {
        self.data |= Self::CHECK_BIT;
    }

    /// Returns the same move without the check tag.
    pub fn without_check(self) -> Self {
        Move { data: self.data & !Self::CHECK_BIT, score: self.score }
    }

    /// Returns the ordering score of the move.
    pub fn score(self) -> i32 {
        self.score
    }

    /// Sets the ordering score of the move.
    pub fn set_score(&mut self, score: i32) {
        self.score = score;
    }
}

impl Default for Move {
    fn default() -> Self {
        Move::NONE
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.data & !Self::CHECK_BIT == other.data & !Self::CHECK_BIT
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.data & !Self::CHECK_BIT).hash(state);
    }
}

impl Display for Move {
    /// Formats the move in coordinate notation ("e2e4", "e7e8q"). The sentinel prints as "0000".
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            return write!(f, "0000");
        }

        write!(f, "{}{}", self.from_square(), self.to_square())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{}", char::from(promotion.piece_type()))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {:?}, score {})", self, self.piece(), self.flags(), self.score)
    }
}
