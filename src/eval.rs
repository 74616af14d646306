use std::{cmp::min, fmt::Display};

use crate::{
    bitboard::Bitboard,
    coordinates::{File, Rank, Square},
    pawn_table::PawnTable,
    piece::{Color, Piece, PieceType},
    position::Position,
};

//======================================================================================================================
// Eval implementation
//======================================================================================================================

/// A simple wrapper around a 16-bit integer that represents the evaluation of a position, in centipawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Eval(i16);

impl Eval {
    const MAX_MAT_DEPTH: u16 = 10000;

    /// The minimum possible evaluation score. It is the negation of `MAX` so that it can itself be negated.
    pub const MIN: Eval = Eval(-i16::MAX);

    /// The maximum possible evaluation score
    pub const MAX: Eval = Eval(i16::MAX);

    /// The evaluation score for a mat.
    pub const MAT: Eval = Eval(30000);

    /// The evaluation score for a draw.
    pub const DRAW: Eval = Eval(0);

    /// Creates a new Eval instance with the given value.
    pub const fn new(value: i16) -> Self {
        Eval(value)
    }

    /// Creates the score of a side that mates `ply` plies from the root. Closer mates score higher.
    pub const fn new_mat(ply: u16) -> Self {
        debug_assert!(ply <= Self::MAX_MAT_DEPTH);

        Eval(Self::MAT.0 - (ply as i16))
    }

    /// Returns true if the evaluation announces a mate, for either side.
    pub fn is_mat(self) -> bool {
        self.0.unsigned_abs() > Self::MAT.0 as u16 - Self::MAX_MAT_DEPTH
    }

    /// Converts a mate score relative to the root into a score relative to a node `ply` plies below the root. Scores
    /// that are not mates are returned unchanged.
    pub fn remove_ply_from_mat(self, ply: u16) -> Self {
        debug_assert!(ply <= Self::MAX_MAT_DEPTH);
        self.remove_ply_from_mat_signed(ply as i16)
    }

    /// Converts a mate score relative to a node `ply` plies below the root back into a score relative to the root.
    pub fn add_ply_to_mat(self, ply: u16) -> Self {
        debug_assert!(ply <= Self::MAX_MAT_DEPTH);
        self.remove_ply_from_mat_signed(-(ply as i16))
    }

    fn remove_ply_from_mat_signed(self, ply: i16) -> Self {
        if self.0 > Eval::MAT.0 - Self::MAX_MAT_DEPTH as i16 {
            Eval(self.0 + ply)
        } else if self.0 < -Eval::MAT.0 + Self::MAX_MAT_DEPTH as i16 {
            Eval(self.0 - ply)
        } else {
            self
        }
    }
}

impl std::ops::Add for Eval {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Eval(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Eval {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Eval(self.0 - rhs.0)
    }
}

impl std::ops::Add<i16> for Eval {
    type Output = Self;
    fn add(self, rhs: i16) -> Self {
        Eval(self.0 + rhs)
    }
}

impl std::ops::Sub<i16> for Eval {
    type Output = Self;
    fn sub(self, rhs: i16) -> Self {
        Eval(self.0 - rhs)
    }
}

impl std::ops::Mul<i16> for Eval {
    type Output = Self;
    fn mul(self, rhs: i16) -> Self {
        Eval(self.0 * rhs)
    }
}

impl std::ops::Neg for Eval {
    type Output = Self;
    fn neg(self) -> Self {
        Eval(-self.0)
    }
}

impl From<Eval> for i32 {
    fn from(value: Eval) -> Self {
        value.0 as i32
    }
}

impl From<i32> for Eval {
    /// Converts a wide intermediate value, saturating it into the `MIN..=MAX` range.
    fn from(value: i32) -> Self {
        Eval(value.clamp(Eval::MIN.0 as i32, Eval::MAX.0 as i32) as i16)
    }
}

impl From<Eval> for i16 {
    fn from(value: Eval) -> Self {
        value.0
    }
}

impl From<i16> for Eval {
    fn from(value: i16) -> Self {
        Eval(value)
    }
}

/// Formats the evaluation score as a floating-point number of pawns, with 2 decimal places ("1.00" for 100
/// centipawns).
impl Display for Eval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0 as f32 / 100.0)
    }
}

//======================================================================================================================
// EvalPair implementation
//======================================================================================================================

/// A pair of evaluations for the middle game and the end game
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalPair {
    /// Evaluation for the middle game
    mg: Eval,

    /// Evaluation for the end game
    eg: Eval,
}

impl EvalPair {
    /// Creates a new EvalPair with separate evaluations for middle game and end game phases.
    ///
    /// # Parameters
    /// * `mg` - The middle game evaluation score
    /// * `eg` - The end game evaluation score
    pub const fn new(mg: Eval, eg: Eval) -> Self {
        EvalPair { mg, eg }
    }

    /// Returns the middle game evaluation.
    pub fn mg(&self) -> Eval {
        self.mg
    }

    /// Returns the end game evaluation.
    pub fn eg(&self) -> Eval {
        self.eg
    }

    /// Blends the two evaluations according to the game phase, `MAX_GAME_PHASE` being a full middle game.
    pub fn taper(&self, phase: u8) -> Eval {
        let mg_phase = min(phase, MAX_GAME_PHASE) as i32;
        let eg_phase = MAX_GAME_PHASE as i32 - mg_phase;

        Eval::from((mg_phase * i32::from(self.mg) + eg_phase * i32::from(self.eg)) / MAX_GAME_PHASE as i32)
    }
}

impl std::ops::Add for EvalPair {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        EvalPair { mg: self.mg + rhs.mg, eg: self.eg + rhs.eg }
    }
}

impl std::ops::AddAssign for EvalPair {
    fn add_assign(&mut self, rhs: Self) {
        self.mg = self.mg + rhs.mg;
        self.eg = self.eg + rhs.eg;
    }
}

impl std::ops::Sub for EvalPair {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        EvalPair { mg: self.mg - rhs.mg, eg: self.eg - rhs.eg }
    }
}

impl std::ops::SubAssign for EvalPair {
    fn sub_assign(&mut self, rhs: Self) {
        self.mg = self.mg - rhs.mg;
        self.eg = self.eg - rhs.eg;
    }
}

impl std::ops::Mul<i16> for EvalPair {
    type Output = Self;
    fn mul(self, rhs: i16) -> Self {
        EvalPair { mg: self.mg * rhs, eg: self.eg * rhs }
    }
}

impl std::ops::Neg for EvalPair {
    type Output = Self;
    fn neg(self) -> Self {
        EvalPair { mg: -self.mg, eg: -self.eg }
    }
}

//======================================================================================================================
// Evaluators
//======================================================================================================================

const PIECES_GAME_PHASE: [u8; Piece::COUNT] = [0, 0, 1, 1, 1, 1, 2, 2, 4, 4, 0, 0];
const MAX_GAME_PHASE: u8 = 24;

#[rustfmt::skip]
const PIECE_TYPE_VALUES: [EvalPair; PieceType::COUNT] = [
    EvalPair { mg: Eval(   82), eg: Eval(  94) },
    EvalPair { mg: Eval(  337), eg: Eval( 281) },
    EvalPair { mg: Eval(  365), eg: Eval( 297) },
    EvalPair { mg: Eval(  477), eg: Eval( 512) },
    EvalPair { mg: Eval( 1025), eg: Eval( 936) },
    EvalPair { mg: Eval(    0), eg: Eval(   0) },
];

const DOUBLED_PAWN: EvalPair = EvalPair::new(Eval(-10), Eval(-20));
const ISOLATED_PAWN: EvalPair = EvalPair::new(Eval(-15), Eval(-10));

#[rustfmt::skip]
const PASSED_PAWN: [EvalPair; Rank::COUNT] = [
    EvalPair { mg: Eval(  0), eg: Eval(  0) },
    EvalPair { mg: Eval(  5), eg: Eval( 10) },
    EvalPair { mg: Eval( 10), eg: Eval( 20) },
    EvalPair { mg: Eval( 20), eg: Eval( 40) },
    EvalPair { mg: Eval( 35), eg: Eval( 70) },
    EvalPair { mg: Eval( 60), eg: Eval(120) },
    EvalPair { mg: Eval(100), eg: Eval(200) },
    EvalPair { mg: Eval(  0), eg: Eval(  0) },
];

/// Returns the game phase contribution value of a given piece. Minor pieces count 1, rooks 2 and queens 4, so the
/// starting position adds up to `MAX_GAME_PHASE`.
pub fn get_piece_type_game_phase(piece: Piece) -> u8 {
    PIECES_GAME_PHASE[usize::from(piece)]
}

/// Returns the material value of a piece type.
pub fn get_piece_type_value(piece_type: PieceType) -> EvalPair {
    PIECE_TYPE_VALUES[usize::from(piece_type)]
}

/// A static evaluation function consumed by the search.
pub trait Evaluator {
    /// Evaluates the position from the point of view of the side to move. Positive values favor the side to move.
    fn evaluate(&mut self, position: &Position) -> Eval;

    /// Drops any cached state. Called when the engine is reconfigured.
    fn clear(&mut self) {}
}

/// Evaluates the pawn structure of a position.
pub trait PawnStructureEvaluator {
    /// Evaluates the pawns of both sides, from White's point of view.
    ///
    /// The result must depend only on the pawn placement, since it is cached by pawn hash.
    fn evaluate_pawns(&self, position: &Position) -> EvalPair;
}

/// Pawn structure evaluation based on doubled, isolated and passed pawns.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicPawnStructure;

impl BasicPawnStructure {
    /// Returns the squares in front of `sq`, from the point of view of `color`, on its file and the adjacent ones.
    fn front_span(color: Color, sq: Square) -> Bitboard {
        let files = Self::adjacent_files(sq.file()) | Bitboard::from(sq.file());
        let relative_rank = u8::from(sq.rank().relative_to_color(color));

        Rank::ALL
            .into_iter()
            .filter(|rank| u8::from(rank.relative_to_color(color)) > relative_rank)
            .fold(Bitboard::EMPTY, |bb, rank| bb | (Bitboard::from(rank) & files))
    }

    fn adjacent_files(file: File) -> Bitboard {
        [file.left(1), file.right(1)]
            .into_iter()
            .flatten()
            .fold(Bitboard::EMPTY, |bb, adjacent| bb | Bitboard::from(adjacent))
    }

    fn evaluate_color(position: &Position, color: Color) -> EvalPair {
        let ours = position.occupied(Piece::new(color, PieceType::Pawn));
        let theirs = position.occupied(Piece::new(!color, PieceType::Pawn));
        let mut eval = EvalPair::default();

        for file in File::ALL {
            let count = (ours & Bitboard::from(file)).popcnt();
            if count > 1 {
                eval += DOUBLED_PAWN * (count - 1) as i16;
            }
        }

        for sq in ours {
            if (ours & Self::adjacent_files(sq.file())).is_empty() {
                eval += ISOLATED_PAWN;
            }

            if (theirs & Self::front_span(color, sq)).is_empty() {
                eval += PASSED_PAWN[usize::from(sq.rank().relative_to_color(color))];
            }
        }

        eval
    }
}

impl PawnStructureEvaluator for BasicPawnStructure {
    fn evaluate_pawns(&self, position: &Position) -> EvalPair {
        Self::evaluate_color(position, Color::White) - Self::evaluate_color(position, Color::Black)
    }
}

/// Tapered material evaluation plus a pawn structure term cached in a `PawnTable`.
#[derive(Debug)]
pub struct MaterialEvaluator<P: PawnStructureEvaluator = BasicPawnStructure> {
    pawns: P,
    pawn_table: PawnTable,
}

impl<P: PawnStructureEvaluator> MaterialEvaluator<P> {
    /// Creates an evaluator.
    ///
    /// # Parameters
    /// * `pawns` - The pawn structure evaluator whose results are cached
    /// * `pawn_table_entries` - The number of entries of the pawn table, rounded down to a power of two
    pub fn new(pawns: P, pawn_table_entries: usize) -> Self {
        MaterialEvaluator { pawns, pawn_table: PawnTable::new(pawn_table_entries) }
    }

    fn pawn_structure(&mut self, position: &Position) -> EvalPair {
        let key = position.pawn_hash();
        if let Some(eval) = self.pawn_table.get(key) {
            return eval;
        }

        let eval = self.pawns.evaluate_pawns(position);
        self.pawn_table.set(key, eval);
        eval
    }
}

impl Default for MaterialEvaluator<BasicPawnStructure> {
    fn default() -> Self {
        Self::new(BasicPawnStructure, PawnTable::DEFAULT_ENTRIES)
    }
}

impl<P: PawnStructureEvaluator> Evaluator for MaterialEvaluator<P> {
    fn evaluate(&mut self, position: &Position) -> Eval {
        let mut eval = self.pawn_structure(position);
        let mut phase = 0;

        for piece_type in PieceType::ALL {
            for color in Color::ALL {
                let piece = Piece::new(color, piece_type);
                let count = position.occupied(piece).popcnt();
                let material = get_piece_type_value(piece_type) * count as i16;

                phase += get_piece_type_game_phase(piece) * count as u8;
                match color {
                    Color::White => eval += material,
                    Color::Black => eval -= material,
                }
            }
        }

        let white_eval = eval.taper(phase);
        match position.side_to_move() {
            Color::White => white_eval,
            Color::Black => -white_eval,
        }
    }

    fn clear(&mut self) {
        self.pawn_table.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::STARTING_POSITION;

    #[test]
    fn test_remove_ply_from_mat() {
        assert_eq!(Eval::new_mat(2), Eval::new_mat(5).remove_ply_from_mat(3));
        assert_eq!(-Eval::new_mat(2), (-Eval::new_mat(5)).remove_ply_from_mat(3));
        assert_eq!(Eval::new(-30), Eval::new(-30).remove_ply_from_mat(3));
        assert_eq!(Eval::new_mat(5), Eval::new_mat(2).add_ply_to_mat(3));
    }

    #[test]
    fn test_is_mat() {
        assert!(Eval::new_mat(0).is_mat());
        assert!((-Eval::new_mat(40)).is_mat());
        assert!(!Eval::new(900).is_mat());
        assert!(!Eval::DRAW.is_mat());
    }

    #[test]
    fn test_from_i32_saturates() {
        assert_eq!(Eval::from(100_000), Eval::MAX);
        assert_eq!(Eval::from(-100_000), Eval::MIN);
        assert_eq!(Eval::from(-250), Eval::new(-250));
    }

    #[test]
    fn test_taper() {
        let pair = EvalPair::new(Eval::new(100), Eval::new(200));
        assert_eq!(pair.taper(MAX_GAME_PHASE), Eval::new(100));
        assert_eq!(pair.taper(0), Eval::new(200));
        assert_eq!(pair.taper(12), Eval::new(150));
        assert_eq!(pair.taper(40), Eval::new(100));
    }

    #[test]
    fn test_starting_position_is_balanced() {
        let mut evaluator = MaterialEvaluator::default();
        let position = Position::new(STARTING_POSITION).unwrap();
        assert_eq!(evaluator.evaluate(&position), Eval::DRAW);
    }

    #[test]
    fn test_evaluation_is_relative_to_side_to_move() {
        let mut evaluator = MaterialEvaluator::default();
        let white = Position::new("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let black = Position::new("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();

        let eval = evaluator.evaluate(&white);
        assert!(eval > Eval::new(800));
        assert_eq!(evaluator.evaluate(&black), -eval);
    }

    #[test]
    fn test_pawn_structure_terms() {
        let structure = BasicPawnStructure;

        // Doubled and isolated pawns on the a-file, blocked by a black pawn on a6.
        let position = Position::new("4k3/8/p7/8/8/P7/P7/4K3 w - - 0 1").unwrap();
        let white = BasicPawnStructure::evaluate_color(&position, Color::White);
        assert_eq!(white, DOUBLED_PAWN + ISOLATED_PAWN + ISOLATED_PAWN);

        // A lone white pawn on e6 is isolated and passed.
        let position = Position::new("4k3/8/4P3/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(structure.evaluate_pawns(&position), ISOLATED_PAWN + PASSED_PAWN[5]);

        // The same structure for Black mirrors the sign.
        let position = Position::new("4k3/8/8/8/8/4p3/8/4K3 w - - 0 1").unwrap();
        assert_eq!(structure.evaluate_pawns(&position), -(ISOLATED_PAWN + PASSED_PAWN[5]));
    }

    #[test]
    fn test_pawn_structure_is_cached_by_pawn_hash() {
        let mut evaluator = MaterialEvaluator::default();
        let position = Position::new("4k3/8/4P3/8/8/8/8/4K3 w - - 0 1").unwrap();

        let first = evaluator.evaluate(&position);
        assert!(evaluator.pawn_table.get(position.pawn_hash()).is_some());
        assert_eq!(evaluator.evaluate(&position), first);
    }
}
