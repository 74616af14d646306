use crate::{
    bitboard::Bitboard,
    coordinates::Square,
    piece::{Color, Piece, PieceType},
    r#move::Move,
};

//======================================================================================================================
// OccupancyFilter implementation (used as input parameter for the occupied method of the Board struct)
//======================================================================================================================

/// Defines filtering criteria for retrieving occupied squares from a board.
///
/// # Variants
/// * `All` - Selects all occupied squares regardless of the pieces on them
/// * `ByColor(Color)` - Selects only squares occupied by pieces of the specified color
/// * `ByType(PieceType)` - Selects only squares occupied by pieces of the specified type, regardless of color
/// * `ByPiece(Piece)` - Selects only squares occupied by the specific piece
/// * `ByColorAndType(Color, PieceType)` - Same as `ByPiece`, built from separate color and type parameters
/// * `ByColorAndTwoTypes(Color, PieceType, PieceType)` - Selects squares occupied by pieces of the specified color that
///   match either of the two piece types
pub enum OccupancyFilter {
    All,
    ByColor(Color),
    ByType(PieceType),
    ByPiece(Piece),
    ByColorAndType(Color, PieceType),
    ByColorAndTwoTypes(Color, PieceType, PieceType),
}

impl From<Color> for OccupancyFilter {
    fn from(color: Color) -> Self {
        Self::ByColor(color)
    }
}

impl From<PieceType> for OccupancyFilter {
    fn from(piece_type: PieceType) -> Self {
        Self::ByType(piece_type)
    }
}

impl From<Piece> for OccupancyFilter {
    fn from(piece: Piece) -> Self {
        Self::ByPiece(piece)
    }
}

impl From<(Color, PieceType)> for OccupancyFilter {
    fn from((color, piece_type): (Color, PieceType)) -> Self {
        Self::ByColorAndType(color, piece_type)
    }
}

impl From<(Color, PieceType, PieceType)> for OccupancyFilter {
    fn from((color, type1, type2): (Color, PieceType, PieceType)) -> Self {
        Self::ByColorAndTwoTypes(color, type1, type2)
    }
}

//======================================================================================================================
// Board implementation
//======================================================================================================================

/// The placement of the pieces, stored as one bitboard per piece type and one per color.
///
/// Every occupied square is set in exactly one piece type bitboard and in exactly one color bitboard.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Board {
    bb_type: [Bitboard; PieceType::COUNT],
    bb_color: [Bitboard; Color::COUNT],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the piece on a square, if any.
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        let color = if self.bb_color[usize::from(Color::White)].get(sq) {
            Color::White
        } else if self.bb_color[usize::from(Color::Black)].get(sq) {
            Color::Black
        } else {
            return None;
        };

        PieceType::ALL
            .into_iter()
            .find(|&piece_type| self.bb_type[usize::from(piece_type)].get(sq))
            .map(|piece_type| Piece::new(color, piece_type))
    }

    /// Places a piece on an empty square.
    pub fn put_piece(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.piece_at(sq).is_none(), "{sq} is already occupied");

        self.bb_type[usize::from(piece.piece_type())] |= sq;
        self.bb_color[usize::from(piece.color())] |= sq;
    }

    /// Removes a known piece from a square.
    pub fn remove_piece(&mut self, piece: Piece, sq: Square) {
        debug_assert_eq!(self.piece_at(sq), Some(piece));

        self.bb_type[usize::from(piece.piece_type())] ^= sq;
        self.bb_color[usize::from(piece.color())] ^= sq;
    }

    /// Moves a known piece from one square to an empty square.
    pub fn move_piece(&mut self, piece: Piece, from: Square, to: Square) {
        debug_assert_eq!(self.piece_at(from), Some(piece));
        debug_assert!(self.piece_at(to).is_none(), "{to} is already occupied");

        let bb = from | to;
        self.bb_type[usize::from(piece.piece_type())] ^= bb;
        self.bb_color[usize::from(piece.color())] ^= bb;
    }

    /// Returns a bitboard of squares occupied by pieces matching the specified filter.
    ///
    /// # Parameters
    /// * `filter`: Criteria for which pieces to include in the returned bitboard. Any type that can be converted into
    ///   an `OccupancyFilter` is accepted.
    ///
    /// # Returns
    /// A bitboard with 1-bits in positions where matching pieces are located.
    #[inline(always)]
    pub fn occupied<F: Into<OccupancyFilter>>(&self, filter: F) -> Bitboard {
        match filter.into() {
            OccupancyFilter::All => self.bb_color[usize::from(Color::White)] | self.bb_color[usize::from(Color::Black)],
            OccupancyFilter::ByColor(color) => self.bb_color[usize::from(color)],
            OccupancyFilter::ByType(piece_type) => self.bb_type[usize::from(piece_type)],
            OccupancyFilter::ByPiece(piece) => {
                self.bb_type[usize::from(piece.piece_type())] & self.bb_color[usize::from(piece.color())]
            }
            OccupancyFilter::ByColorAndType(color, piece_type) => {
                self.bb_type[usize::from(piece_type)] & self.bb_color[usize::from(color)]
            }
            OccupancyFilter::ByColorAndTwoTypes(color, type1, type2) => {
                let types = self.bb_type[usize::from(type1)] | self.bb_type[usize::from(type2)];
                types & self.bb_color[usize::from(color)]
            }
        }
    }

    /// Applies the placement change of a move.
    ///
    /// # Parameters
    /// * `mv` - The move to apply. It must have been generated for the current placement.
    /// * `castling_rook` - The origin and destination squares of the rook, for castling moves only.
    pub fn apply_move(&mut self, mv: Move, castling_rook: Option<(Square, Square)>) {
        if let Some(captured) = mv.captured() {
            self.remove_piece(captured, mv.capture_square());
        }

        match castling_rook {
            // Both pieces leave the board before either lands, because in Chess960 the king may land on the rook's
            // square and the other way around.
            Some((rook_from, rook_to)) => {
                let rook = Piece::new(mv.piece().color(), PieceType::Rook);
                self.remove_piece(mv.piece(), mv.from_square());
                self.remove_piece(rook, rook_from);
                self.put_piece(mv.piece(), mv.to_square());
                self.put_piece(rook, rook_to);
            }
            None => match mv.promotion() {
                Some(promotion) => {
                    self.remove_piece(mv.piece(), mv.from_square());
                    self.put_piece(promotion, mv.to_square());
                }
                None => self.move_piece(mv.piece(), mv.from_square(), mv.to_square()),
            },
        }
    }

    /// Reverses `apply_move`. The arguments must be the ones given to `apply_move`.
    pub fn revert_move(&mut self, mv: Move, castling_rook: Option<(Square, Square)>) {
        match castling_rook {
            Some((rook_from, rook_to)) => {
                let rook = Piece::new(mv.piece().color(), PieceType::Rook);
                self.remove_piece(mv.piece(), mv.to_square());
                self.remove_piece(rook, rook_to);
                self.put_piece(mv.piece(), mv.from_square());
                self.put_piece(rook, rook_from);
            }
            None => match mv.promotion() {
                Some(promotion) => {
                    self.remove_piece(promotion, mv.to_square());
                    self.put_piece(mv.piece(), mv.from_square());
                }
                None => self.move_piece(mv.piece(), mv.to_square(), mv.from_square()),
            },
        }

        if let Some(captured) = mv.captured() {
            self.put_piece(captured, mv.capture_square());
        }
    }
}
