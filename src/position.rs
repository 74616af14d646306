use std::fmt::Display;

use thiserror::Error;

use crate::{
    bitboard::Bitboard,
    board::{Board, OccupancyFilter},
    coordinates::{File, Rank, Square},
    eval::Eval,
    move_gen::attacks::{attacks_from, attacks_from_pawn},
    piece::{Color, Piece, PieceType},
    r#move::{CastlingRight, CastlingSide, Move},
    zobrist::{zobrist_black_to_move, zobrist_castling, zobrist_en_passant, zobrist_piece_square, Zobrist},
};

/// The standard initial position.
pub const STARTING_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Values of the pieces used by the static exchange evaluation, in centipawns.
const SEE_VALUES: [i16; PieceType::COUNT] = [100, 300, 300, 500, 900, 20000];

/// Error produced when a FEN (Forsyth-Edwards Notation) string cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("a FEN string has 6 fields, found {0}")]
    WrongFieldCount(usize),

    #[error("invalid piece placement '{0}'")]
    InvalidPiecePlacement(String),

    #[error("invalid active color '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling availability '{0}'")]
    InvalidCastlingAvailability(String),

    #[error("invalid en passant square '{0}'")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock '{0}'")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number '{0}'")]
    InvalidFullmoveNumber(String),

    #[error("each side must have exactly one king")]
    InvalidKingCount,
}

//======================================================================================================================
// Game State implementation
//======================================================================================================================

/// The scalar metadata of a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameState {
    side_to_move: Color,
    castling_rights: CastlingRight,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            side_to_move: Color::White,
            castling_rights: CastlingRight::empty(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

/// Everything `unmake_move` needs besides the move itself. It must be taken with `Position::snapshot` before the move
/// is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    state: GameState,
    hash: Zobrist,
    pawn_hash: Zobrist,
}

/// The squares involved in castling to one side.
///
/// * `empty` - squares, other than the king and rook origins, that must be empty
/// * `safe` - squares the king stands on or crosses, which must not be attacked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastleCheck {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    pub empty: Bitboard,
    pub safe: Bitboard,
}

impl CastleCheck {
    fn new(color: Color, side: CastlingSide, king_from: Square, rook_from: Square) -> Self {
        let rank = Rank::R1.relative_to_color(color);
        let (king_to_file, rook_to_file) = match side {
            CastlingSide::Kingside => (File::G, File::F),
            CastlingSide::Queenside => (File::C, File::D),
        };
        let king_to = Square::new(king_to_file, rank);
        let rook_to = Square::new(rook_to_file, rank);

        let king_path = Bitboard::between(king_from, king_to) | king_to;
        let rook_path = Bitboard::between(rook_from, rook_to) | rook_to;

        CastleCheck {
            king_from,
            king_to,
            rook_from,
            rook_to,
            empty: (king_path | rook_path) & !(king_from | rook_from),
            safe: king_path | king_from,
        }
    }
}

//======================================================================================================================
// Position implementation
//======================================================================================================================

/// A chess position: the placement of the pieces, the game metadata and both Zobrist hashes.
///
/// The position is mutated in place by `make_move` and restored by `unmake_move`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    board: Board,
    state: GameState,
    hash: Zobrist,
    pawn_hash: Zobrist,
    castle_checks: [[Option<CastleCheck>; CastlingSide::COUNT]; Color::COUNT],
    castling_rights_mask: [CastlingRight; Square::COUNT],
}

impl Position {
    fn empty() -> Self {
        Position {
            board: Board::new(),
            state: GameState::default(),
            hash: 0,
            pawn_hash: 0,
            castle_checks: [[None; CastlingSide::COUNT]; Color::COUNT],
            castling_rights_mask: [CastlingRight::empty(); Square::COUNT],
        }
    }

    fn read_piece_placement(&mut self, piece_placement: &str) -> Result<(), FenError> {
        let invalid = || FenError::InvalidPiecePlacement(piece_placement.to_string());

        let ranks: Vec<&str> = piece_placement.split('/').collect();
        if ranks.len() != Rank::COUNT {
            return Err(invalid());
        }

        for (text, rank) in ranks.iter().zip(Rank::ALL.iter().rev()) {
            let mut file_index = 0usize;
            for c in text.chars() {
                if let Some(count) = c.to_digit(10).filter(|count| (1..=8).contains(count)) {
                    file_index += count as usize;
                } else {
                    let piece = Piece::try_from(c).map_err(|_| invalid())?;
                    if file_index >= File::COUNT {
                        return Err(invalid());
                    }
                    if piece.piece_type() == PieceType::Pawn && (*rank == Rank::R1 || *rank == Rank::R8) {
                        return Err(invalid());
                    }
                    self.board.put_piece(piece, Square::new(File::from(file_index as u8), *rank));
                    file_index += 1;
                }
            }

            if file_index != File::COUNT {
                return Err(invalid());
            }
        }

        for color in Color::ALL {
            if !self.occupied((color, PieceType::King)).has_one() {
                return Err(FenError::InvalidKingCount);
            }
        }

        Ok(())
    }

    fn read_active_color(&mut self, active_color: &str) -> Result<(), FenError> {
        self.state.side_to_move = match active_color {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::InvalidActiveColor(active_color.to_string())),
        };
        Ok(())
    }

    fn read_castling(&mut self, castling_availability: &str) -> Result<(), FenError> {
        if castling_availability == "-" {
            return Ok(());
        }

        let invalid = || FenError::InvalidCastlingAvailability(castling_availability.to_string());

        for c in castling_availability.chars() {
            let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
            let king_from = self.king_square(color);
            let back_rank = Rank::R1.relative_to_color(color);
            if king_from.rank() != back_rank {
                return Err(invalid());
            }

            let rooks = self.occupied((color, PieceType::Rook)) & Bitboard::from(back_rank);
            let rook_from = match c.to_ascii_lowercase() {
                'k' => self.outermost_rook(color, CastlingSide::Kingside),
                'q' => self.outermost_rook(color, CastlingSide::Queenside),
                'a'..='h' => {
                    let file = File::try_from(c).map_err(|_| invalid())?;
                    Some(Square::new(file, back_rank)).filter(|&sq| rooks.get(sq))
                }
                _ => None,
            }
            .ok_or_else(invalid)?;

            if rook_from.file() == king_from.file() {
                return Err(invalid());
            }
            let side =
                if rook_from.file() > king_from.file() { CastlingSide::Kingside } else { CastlingSide::Queenside };

            let right = CastlingRight::new(color, side);
            if self.state.castling_rights.contains(right) {
                return Err(invalid());
            }

            self.state.castling_rights |= right;
            self.castle_checks[usize::from(color)][usize::from(side)] =
                Some(CastleCheck::new(color, side, king_from, rook_from));
            self.castling_rights_mask[usize::from(king_from)] |= right;
            self.castling_rights_mask[usize::from(rook_from)] |= right;
        }

        Ok(())
    }

    /// Returns the rook of `color` on its back rank that is the farthest from the king on the given side.
    fn outermost_rook(&self, color: Color, side: CastlingSide) -> Option<Square> {
        let king_file = self.king_square(color).file();
        let back_rank = Bitboard::from(Rank::R1.relative_to_color(color));
        let mut rooks = (self.occupied((color, PieceType::Rook)) & back_rank)
            .into_iter()
            .filter(|sq| match side {
                CastlingSide::Kingside => sq.file() > king_file,
                CastlingSide::Queenside => sq.file() < king_file,
            });

        match side {
            CastlingSide::Kingside => rooks.last(),
            CastlingSide::Queenside => rooks.next(),
        }
    }

    fn read_en_passant_square(&mut self, en_passant_square: &str) -> Result<(), FenError> {
        if en_passant_square == "-" {
            return Ok(());
        }

        let invalid = || FenError::InvalidEnPassantSquare(en_passant_square.to_string());
        let sq = Square::try_from(en_passant_square).map_err(|_| invalid())?;
        let expected_rank = match self.side_to_move() {
            Color::White => Rank::R6,
            Color::Black => Rank::R3,
        };
        if sq.rank() != expected_rank {
            return Err(invalid());
        }

        self.state.en_passant = Some(sq);
        Ok(())
    }

    /// Creates a new chess position from a FEN (Forsyth-Edwards Notation) string.
    ///
    /// A FEN string contains 6 fields separated by spaces:
    ///
    /// 1. Piece placement: each rank from 8 to 1, separated by '/'. Uppercase letters are white pieces, lowercase
    ///    letters are black pieces and digits are runs of empty squares.
    /// 2. Active color: "w" or "b".
    /// 3. Castling availability: "-", or a combination of "K", "Q", "k" and "q". For Chess960, the file letter of the
    ///    castling rook ("A" to "H" for White, "a" to "h" for Black) can be used instead.
    /// 4. En passant target square, or "-".
    /// 5. Halfmove clock.
    /// 6. Fullmove number, starting at 1.
    ///
    /// # Returns
    /// The position with both hashes computed, or a `FenError` naming the first malformed field.
    pub fn new(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::WrongFieldCount(fields.len()));
        }

        let mut position = Position::empty();
        position.read_piece_placement(fields[0])?;
        position.read_active_color(fields[1])?;
        position.read_castling(fields[2])?;
        position.read_en_passant_square(fields[3])?;

        position.state.halfmove_clock =
            fields[4].parse().map_err(|_| FenError::InvalidHalfmoveClock(fields[4].to_string()))?;

        position.state.fullmove_number = fields[5]
            .parse()
            .ok()
            .filter(|&number: &u16| number > 0)
            .ok_or_else(|| FenError::InvalidFullmoveNumber(fields[5].to_string()))?;

        (position.hash, position.pawn_hash) = position.compute_hashes();

        Ok(position)
    }

    /// Creates a new chess position with the standard initial board setup.
    pub fn startpos() -> Self {
        Self::new(STARTING_POSITION).expect("The starting position FEN is always valid.")
    }

    /// Computes both hashes of the position from scratch.
    ///
    /// # Returns
    /// A tuple `(hash, pawn_hash)`. They are equal to the incrementally maintained values of a consistent position.
    pub fn compute_hashes(&self) -> (Zobrist, Zobrist) {
        let mut hash = 0;
        let mut pawn_hash = 0;

        for piece in Piece::ALL {
            for sq in self.occupied(piece) {
                hash ^= zobrist_piece_square(piece, sq);
                if piece.piece_type() == PieceType::Pawn {
                    pawn_hash ^= zobrist_piece_square(piece, sq);
                }
            }
        }

        hash ^= zobrist_castling(self.state.castling_rights);
        hash ^= zobrist_en_passant(self.state.en_passant);
        if self.side_to_move() == Color::Black {
            hash ^= zobrist_black_to_move();
        }

        (hash, pawn_hash)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn side_to_move(&self) -> Color {
        self.state.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRight {
        self.state.castling_rights
    }

    pub fn en_passant_square(&self) -> Option<Square> {
        self.state.en_passant
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.state.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u16 {
        self.state.fullmove_number
    }

    /// Returns the Zobrist hash of the position.
    pub fn hash(&self) -> Zobrist {
        self.hash
    }

    /// Returns the Zobrist hash of the pawns only.
    pub fn pawn_hash(&self) -> Zobrist {
        self.pawn_hash
    }

    /// Returns the squares involved in castling for a color and side, if the position was set up with that castling
    /// right. The geometry stays available after the right is lost.
    pub fn castle_check(&self, color: Color, side: CastlingSide) -> Option<&CastleCheck> {
        self.castle_checks[usize::from(color)][usize::from(side)].as_ref()
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.piece_at(sq)
    }

    /// Returns a bitboard of squares occupied by pieces matching the specified filter. See `Board::occupied`.
    #[inline(always)]
    pub fn occupied<F: Into<OccupancyFilter>>(&self, filter: F) -> Bitboard {
        self.board.occupied(filter)
    }

    /// Returns the square occupied by the king of the specified color.
    ///
    /// # Panics
    /// Panics if there is no king of that color, which a position built by `new` never allows.
    pub fn king_square(&self, color: Color) -> Square {
        self.occupied((color, PieceType::King)).lsb().expect("There should always be a king on the board.")
    }

    /// Returns every piece, of both colors, attacking a square.
    ///
    /// # Parameters
    /// * `sq` - The target square
    /// * `occupied` - The occupancy blocking the sliding pieces. It can differ from the board to analyze hypothetical
    ///   positions.
    pub fn attackers(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let rooks_queens = self.occupied(PieceType::Rook) | self.occupied(PieceType::Queen);
        let bishops_queens = self.occupied(PieceType::Bishop) | self.occupied(PieceType::Queen);

        attacks_from::<{ PieceType::ROOK_VALUE }>(occupied, sq) & rooks_queens
            | attacks_from::<{ PieceType::BISHOP_VALUE }>(occupied, sq) & bishops_queens
            | attacks_from::<{ PieceType::KNIGHT_VALUE }>(occupied, sq) & self.occupied(PieceType::Knight)
            | attacks_from::<{ PieceType::KING_VALUE }>(occupied, sq) & self.occupied(PieceType::King)
            | attacks_from_pawn(Color::Black, sq) & self.occupied((Color::White, PieceType::Pawn))
            | attacks_from_pawn(Color::White, sq) & self.occupied((Color::Black, PieceType::Pawn))
    }

    /// Returns the pieces of `color` attacking a square.
    pub fn attacks_to(&self, sq: Square, occupied: Bitboard, color: Color) -> Bitboard {
        self.attackers(sq, occupied) & self.occupied(color)
    }

    /// Returns true if any piece of `color` attacks the square.
    pub fn is_attacked(&self, sq: Square, occupied: Bitboard, color: Color) -> bool {
        let rooks_queens = self.occupied((color, PieceType::Rook, PieceType::Queen));
        if (attacks_from::<{ PieceType::ROOK_VALUE }>(occupied, sq) & rooks_queens).has_any() {
            return true;
        }

        let bishops_queens = self.occupied((color, PieceType::Bishop, PieceType::Queen));
        if (attacks_from::<{ PieceType::BISHOP_VALUE }>(occupied, sq) & bishops_queens).has_any() {
            return true;
        }

        (attacks_from::<{ PieceType::KNIGHT_VALUE }>(occupied, sq) & self.occupied((color, PieceType::Knight)))
            .has_any()
            || (attacks_from_pawn(!color, sq) & self.occupied((color, PieceType::Pawn))).has_any()
            || (attacks_from::<{ PieceType::KING_VALUE }>(occupied, sq) & self.occupied((color, PieceType::King)))
                .has_any()
    }

    /// Returns the enemy pieces giving check to the king of the side to move.
    pub fn checkers(&self) -> Bitboard {
        let us = self.side_to_move();
        self.attacks_to(self.king_square(us), self.occupied(OccupancyFilter::All), !us)
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        let us = self.side_to_move();
        self.is_attacked(self.king_square(us), self.occupied(OccupancyFilter::All), !us)
    }

    /// Returns true if `color` has a piece other than pawns and its king.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        (self.occupied(color) & !(self.occupied(PieceType::Pawn) | self.occupied(PieceType::King))).has_any()
    }

    /// Returns true if neither side can possibly checkmate: there are no pawns, rooks or queens, and either at most one
    /// minor piece or only bishops all standing on squares of the same color.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.occupied(PieceType::Pawn) | self.occupied(PieceType::Rook) | self.occupied(PieceType::Queen);
        if heavy.has_any() {
            return false;
        }

        let knights = self.occupied(PieceType::Knight);
        let bishops = self.occupied(PieceType::Bishop);
        if (knights | bishops).popcnt() <= 1 {
            return true;
        }

        knights.is_empty() && (bishops.into_iter().all(Square::is_dark) || !bishops.into_iter().any(Square::is_dark))
    }

    /// Returns true if the fifty-move rule or insufficient material makes the position a draw.
    pub fn is_draw(&self) -> bool {
        self.state.halfmove_clock >= 100 || self.is_insufficient_material()
    }

    //==================================================================================================================
    // Make / unmake
    //==================================================================================================================

    /// Captures the metadata and hashes `unmake_move` restores.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { state: self.state, hash: self.hash, pawn_hash: self.pawn_hash }
    }

    fn castling_rook_squares(&self, mv: Move) -> Option<(Square, Square)> {
        let side = mv.castling_side()?;
        self.castle_check(mv.piece().color(), side).map(|check| (check.rook_from, check.rook_to))
    }

    fn toggle_piece_hash(&mut self, piece: Piece, sq: Square) {
        let key = zobrist_piece_square(piece, sq);
        self.hash ^= key;
        if piece.piece_type() == PieceType::Pawn {
            self.pawn_hash ^= key;
        }
    }

    /// Makes a pseudo-legal move.
    ///
    /// The placement, the castling rights, the en passant square, the clocks, the side to move and both hashes are
    /// updated. If the move leaves the mover's king attacked, the position is restored and the move is rejected.
    ///
    /// # Parameters
    /// * `mv` - A move generated for this exact position
    ///
    /// # Returns
    /// `true` if the move is legal and was made, `false` if it was rejected and the position is unchanged.
    pub fn make_move(&mut self, mv: Move) -> bool {
        let snapshot = self.snapshot();
        let us = self.side_to_move();
        let castling_rook = self.castling_rook_squares(mv);

        self.hash ^= zobrist_castling(self.state.castling_rights) ^ zobrist_en_passant(self.state.en_passant);

        if let Some(captured) = mv.captured() {
            self.toggle_piece_hash(captured, mv.capture_square());
        }
        self.toggle_piece_hash(mv.piece(), mv.from_square());
        self.toggle_piece_hash(mv.promotion().unwrap_or(mv.piece()), mv.to_square());
        if let Some((rook_from, rook_to)) = castling_rook {
            let rook = Piece::new(us, PieceType::Rook);
            self.toggle_piece_hash(rook, rook_from);
            self.toggle_piece_hash(rook, rook_to);
        }

        self.board.apply_move(mv, castling_rook);

        self.state.castling_rights &= !(self.castling_rights_mask[usize::from(mv.from_square())]
            | self.castling_rights_mask[usize::from(mv.to_square())]);

        self.state.en_passant = if mv.is_double_push() { mv.from_square().forward(us).ok() } else { None };

        if mv.piece().piece_type() == PieceType::Pawn || mv.is_capture() {
            self.state.halfmove_clock = 0;
        } else {
            self.state.halfmove_clock = self.state.halfmove_clock.saturating_add(1);
        }

        if us == Color::Black {
            self.state.fullmove_number = self.state.fullmove_number.saturating_add(1);
        }

        self.state.side_to_move = !us;

        self.hash ^= zobrist_castling(self.state.castling_rights)
            ^ zobrist_en_passant(self.state.en_passant)
            ^ zobrist_black_to_move();

        if self.is_attacked(self.king_square(us), self.occupied(OccupancyFilter::All), !us) {
            self.unmake_move(mv, &snapshot);
            return false;
        }

        true
    }

    /// Reverts a move made with `make_move`.
    ///
    /// # Parameters
    /// * `mv` - The move that was made
    /// * `snapshot` - The snapshot taken just before the move was made
    pub fn unmake_move(&mut self, mv: Move, snapshot: &Snapshot) {
        let castling_rook = self.castling_rook_squares(mv);
        self.board.revert_move(mv, castling_rook);

        self.state = snapshot.state;
        self.hash = snapshot.hash;
        self.pawn_hash = snapshot.pawn_hash;
    }

    /// Passes the turn without moving. The en passant square is cleared.
    ///
    /// The caller must make sure the side to move is not in check.
    pub fn make_null_move(&mut self) {
        self.hash ^= zobrist_en_passant(self.state.en_passant) ^ zobrist_black_to_move();
        self.state.en_passant = None;
        self.state.halfmove_clock = self.state.halfmove_clock.saturating_add(1);
        self.state.side_to_move = !self.state.side_to_move;
    }

    /// Reverts `make_null_move` from the snapshot taken before it.
    pub fn unmake_null_move(&mut self, snapshot: &Snapshot) {
        self.state = snapshot.state;
        self.hash = snapshot.hash;
        self.pawn_hash = snapshot.pawn_hash;
    }

    //==================================================================================================================
    // Static exchange
    //==================================================================================================================

    /// Replays the sequence of captures on the destination square of a move.
    ///
    /// The callback first receives the type of the moving piece, then the type of each recapturing piece. The sides
    /// alternate and each side always recaptures with its least valuable attacker. Sliding pieces hidden behind a
    /// piece that just captured join the sequence. A king never recaptures a piece that is still defended.
    ///
    /// # Parameters
    /// * `mv` - The move starting the exchange, usually a capture
    /// * `callback` - Receives each capturing piece type in order; returning `true` stops the sequence
    pub fn static_exchange<F: FnMut(PieceType) -> bool>(&self, mv: Move, mut callback: F) {
        if callback(mv.piece().piece_type()) {
            return;
        }

        let target = mv.to_square();
        let mut occupied = self.occupied(OccupancyFilter::All) ^ mv.from_square();
        if mv.is_en_passant() {
            occupied ^= mv.capture_square();
        }

        let rooks_queens = self.occupied(PieceType::Rook) | self.occupied(PieceType::Queen);
        let bishops_queens = self.occupied(PieceType::Bishop) | self.occupied(PieceType::Queen);

        let mut attackers = self.attackers(target, occupied) & occupied;
        let mut side = !mv.piece().color();

        loop {
            let ours = attackers & self.occupied(side);
            let Some((piece_type, from)) = PieceType::ALL.into_iter().find_map(|piece_type| {
                (ours & self.occupied(piece_type)).lsb().map(|sq| (piece_type, sq))
            }) else {
                return;
            };

            if piece_type == PieceType::King && (attackers & self.occupied(!side)).has_any() {
                return;
            }

            if callback(piece_type) {
                return;
            }

            occupied ^= from;
            attackers ^= from;
            attackers |= (attacks_from::<{ PieceType::ROOK_VALUE }>(occupied, target) & rooks_queens
                | attacks_from::<{ PieceType::BISHOP_VALUE }>(occupied, target) & bishops_queens)
                & occupied;

            side = !side;
        }
    }

    /// Evaluates the material outcome of a move with the swap-list algorithm, from the point of view of the mover.
    ///
    /// Each side may stop capturing when continuing would lose material.
    pub fn see(&self, mv: Move) -> Eval {
        let value = |piece_type: PieceType| SEE_VALUES[usize::from(piece_type)];

        let mut sequence = [PieceType::Pawn; 32];
        let mut count = 0;
        self.static_exchange(mv, |piece_type| {
            sequence[count] = piece_type;
            count += 1;
            count == sequence.len()
        });

        let mut gains = [0i16; 32];
        gains[0] = mv.captured().map_or(0, |piece| value(piece.piece_type()));

        // The first piece standing on the target square is the promoted piece, if any.
        let mut standing = match mv.promotion() {
            Some(promotion) => {
                gains[0] += value(promotion.piece_type()) - value(PieceType::Pawn);
                value(promotion.piece_type())
            }
            None => value(sequence[0]),
        };

        for depth in 1..count {
            gains[depth] = standing - gains[depth - 1];
            standing = value(sequence[depth]);
        }

        for depth in (1..count).rev() {
            gains[depth - 1] = -std::cmp::max(-gains[depth - 1], gains[depth]);
        }

        Eval::new(gains[0])
    }

    //==================================================================================================================
    // FEN output
    //==================================================================================================================

    fn write_piece_placement(&self) -> String {
        let mut result = String::with_capacity(72);
        for rank in Rank::ALL.iter().rev() {
            let mut empty_count = 0;
            for file in File::ALL {
                match self.piece_at(Square::new(file, *rank)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            result.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        result.push(piece.into());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                result.push_str(&empty_count.to_string());
            }
            if *rank != Rank::R1 {
                result.push('/');
            }
        }
        result
    }

    fn write_castling(&self) -> String {
        let mut result = String::with_capacity(4);
        for color in Color::ALL {
            for side in CastlingSide::ALL {
                if !self.castling_rights().contains(CastlingRight::new(color, side)) {
                    continue;
                }
                let Some(check) = self.castle_check(color, side) else {
                    continue;
                };

                let letter = if self.outermost_rook(color, side) == Some(check.rook_from) {
                    match side {
                        CastlingSide::Kingside => 'k',
                        CastlingSide::Queenside => 'q',
                    }
                } else {
                    char::from(check.rook_from.file())
                };

                result.push(if color == Color::White { letter.to_ascii_uppercase() } else { letter });
            }
        }

        if result.is_empty() {
            result.push('-');
        }
        result
    }

    /// Returns the FEN (Forsyth-Edwards Notation) representation of the position.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.write_piece_placement(),
            char::from(self.side_to_move()),
            self.write_castling(),
            self.en_passant_square().map_or(String::from("-"), |sq| sq.to_string()),
            self.state.halfmove_clock,
            self.state.fullmove_number
        )
    }
}

impl Display for Position {
    /// Draws the board from White's point of view, followed by the FEN of the position.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in Rank::ALL.iter().rev() {
            write!(f, "{}  ", rank)?;
            for file in File::ALL {
                let c = self.piece_at(Square::new(file, *rank)).map_or('.', char::from);
                write!(f, "{}{}", c, if file == File::H { '\n' } else { ' ' })?;
            }
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "{}", self.to_fen())
    }
}
