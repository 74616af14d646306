use crate::{
    bitboard::Bitboard,
    board::OccupancyFilter,
    coordinates::{Rank, Square},
    piece::{Color, Piece, PieceType},
    position::Position,
    r#move::{CastlingRight, CastlingSide, Move},
};

use super::{
    attacks::{attacks_from, attacks_from_pawn},
    move_list::MoveList,
};

/// Enum to specify the type of moves to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveGenerationType {
    /// Every pseudo-legal move.
    All = 0,
    /// Captures only, including capturing promotions and en passant.
    Captures = 1,
}

impl MoveGenerationType {
    pub const ALL_VALUE: u8 = 0;
    pub const CAPTURES_VALUE: u8 = 1;
}

const PROMOTION_TYPES: [PieceType; 4] = [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];

/// Shifts a bitboard `rows` ranks towards the opponent of `COLOR`.
fn forward<const COLOR: u8>(bb: Bitboard, rows: u32) -> Bitboard {
    match COLOR {
        Color::WHITE_VALUE => bb << (8 * rows),
        _ => bb >> (8 * rows),
    }
}

/// Returns the square `rows` ranks behind `sq` from the point of view of `COLOR`.
fn behind<const COLOR: u8>(sq: Square, rows: u8) -> Square {
    match COLOR {
        Color::WHITE_VALUE => Square::from(u8::from(sq) - 8 * rows),
        _ => Square::from(u8::from(sq) + 8 * rows),
    }
}

fn push_promotions(list: &mut MoveList, from_sq: Square, to_sq: Square, pawn: Piece, captured: Option<Piece>) {
    for piece_type in PROMOTION_TYPES {
        let promotion = Piece::new(pawn.color(), piece_type);
        list.push(match captured {
            Some(captured) => Move::new_capture_promotion(from_sq, to_sq, pawn, captured, promotion),
            None => Move::new_promotion(from_sq, to_sq, pawn, promotion),
        });
    }
}

fn generate_pawn_moves<const TYPE: u8, const COLOR: u8>(
    position: &Position,
    targets: Bitboard,
    checkers: Bitboard,
    list: &mut MoveList,
) {
    let color = Color::from(COLOR);
    let pawn = Piece::new(color, PieceType::Pawn);
    let bb_from = position.occupied(pawn);
    let bb_empty = !position.occupied(OccupancyFilter::All);
    let bb_them = position.occupied(!color);
    let bb_last_rank = Bitboard::from(Rank::R8.relative_to_color(color));
    let bb_double_push_rank = Bitboard::from(Rank::R4.relative_to_color(color));

    if TYPE == MoveGenerationType::ALL_VALUE {
        let single = forward::<COLOR>(bb_from, 1) & bb_empty;
        let double = forward::<COLOR>(single, 1) & bb_empty & bb_double_push_rank;

        for to_sq in single & targets & !bb_last_rank {
            list.push(Move::new(behind::<COLOR>(to_sq, 1), to_sq, pawn));
        }
        for to_sq in single & targets & bb_last_rank {
            push_promotions(list, behind::<COLOR>(to_sq, 1), to_sq, pawn, None);
        }
        for to_sq in double & targets {
            list.push(Move::new_two_square_pawn_push(behind::<COLOR>(to_sq, 2), to_sq, pawn));
        }
    }

    for from_sq in bb_from {
        for to_sq in attacks_from_pawn(color, from_sq) & bb_them & targets {
            let Some(captured) = position.piece_at(to_sq) else {
                continue;
            };
            if bb_last_rank.get(to_sq) {
                push_promotions(list, from_sq, to_sq, pawn, Some(captured));
            } else {
                list.push(Move::new_capture(from_sq, to_sq, pawn, captured));
            }
        }
    }

    // The en passant capture lands on an empty square, so it cannot be filtered with the targets. When in check, it is
    // allowed if it removes the checker or lands between the checker and the king.
    if let Some(ep_sq) = position.en_passant_square() {
        let captured_sq = behind::<COLOR>(ep_sq, 1);
        let evades = match checkers.lsb() {
            None => true,
            Some(checker) => {
                checker == captured_sq || Bitboard::between(position.king_square(color), checker).get(ep_sq)
            }
        };

        if evades {
            for from_sq in attacks_from_pawn(!color, ep_sq) & bb_from {
                list.push(Move::new_en_passant(from_sq, ep_sq, pawn));
            }
        }
    }
}

fn generate_piece_moves<const COLOR: u8, const PIECE_TYPE: u8>(
    position: &Position,
    targets: Bitboard,
    list: &mut MoveList,
) {
    let piece = Piece::new(Color::from(COLOR), PieceType::from(PIECE_TYPE));
    let bb_occupied = position.occupied(OccupancyFilter::All);

    for from_sq in position.occupied(piece) {
        for to_sq in attacks_from::<PIECE_TYPE>(bb_occupied, from_sq) & targets {
            match position.piece_at(to_sq) {
                Some(captured) => list.push(Move::new_capture(from_sq, to_sq, piece, captured)),
                None => list.push(Move::new(from_sq, to_sq, piece)),
            }
        }
    }
}

fn generate_castlings<const COLOR: u8>(position: &Position, list: &mut MoveList) {
    let color = Color::from(COLOR);
    let king = Piece::new(color, PieceType::King);

    for side in CastlingSide::ALL {
        if !position.castling_rights().contains(CastlingRight::new(color, side)) {
            continue;
        }
        let Some(check) = position.castle_check(color, side) else {
            continue;
        };

        // In Chess960 the king and the rook may already stand on their destination squares.
        if check.king_from == check.king_to && check.rook_from == check.rook_to {
            continue;
        }

        let occupied = position.occupied(OccupancyFilter::All) ^ check.king_from ^ check.rook_from;
        if (occupied & check.empty).has_any() {
            continue;
        }

        if check.safe.into_iter().any(|sq| position.is_attacked(sq, occupied, !color)) {
            continue;
        }

        list.push(Move::new_castling(check.king_from, check.king_to, king, side));
    }
}

fn generate_moves_color<const TYPE: u8, const COLOR: u8>(position: &Position, list: &mut MoveList) -> bool {
    let color = Color::from(COLOR);
    let king_sq = position.king_square(color);
    let checkers = position.checkers();

    let base_targets = match TYPE {
        MoveGenerationType::ALL_VALUE => !position.occupied(color),
        _ => position.occupied(!color),
    };

    // Under a double check only the king can move.
    if !checkers.has_many() {
        let targets = match checkers.lsb() {
            Some(checker) => base_targets & (Bitboard::between(king_sq, checker) | checker),
            None => base_targets,
        };

        generate_pawn_moves::<TYPE, COLOR>(position, targets, checkers, list);
        generate_piece_moves::<COLOR, { PieceType::KNIGHT_VALUE }>(position, targets, list);
        generate_piece_moves::<COLOR, { PieceType::BISHOP_VALUE }>(position, targets, list);
        generate_piece_moves::<COLOR, { PieceType::ROOK_VALUE }>(position, targets, list);
        generate_piece_moves::<COLOR, { PieceType::QUEEN_VALUE }>(position, targets, list);
    }

    generate_piece_moves::<COLOR, { PieceType::KING_VALUE }>(position, base_targets, list);

    if TYPE == MoveGenerationType::ALL_VALUE && checkers.is_empty() {
        generate_castlings::<COLOR>(position, list);
    }

    checkers.has_any()
}

impl Position {
    /// Generates the pseudo-legal moves of the side to move.
    ///
    /// When the king is in check, only moves that may resolve the check are generated: king moves, captures of a
    /// single checker and interpositions on its ray. Under a double check only king moves are generated. The moves may
    /// still leave the king attacked; `make_move` rejects them.
    ///
    /// # Parameters
    /// * `list` - The list the moves are appended to
    ///
    /// # Returns
    /// `true` if the side to move is in check.
    pub fn pseudo_moves(&self, list: &mut MoveList) -> bool {
        match self.side_to_move() {
            Color::White => {
                generate_moves_color::<{ MoveGenerationType::ALL_VALUE }, { Color::WHITE_VALUE }>(self, list)
            }
            Color::Black => {
                generate_moves_color::<{ MoveGenerationType::ALL_VALUE }, { Color::BLACK_VALUE }>(self, list)
            }
        }
    }

    /// Generates the pseudo-legal captures of the side to move, with the same check restrictions as `pseudo_moves`.
    pub fn loud_moves(&self, list: &mut MoveList) {
        match self.side_to_move() {
            Color::White => {
                generate_moves_color::<{ MoveGenerationType::CAPTURES_VALUE }, { Color::WHITE_VALUE }>(self, list)
            }
            Color::Black => {
                generate_moves_color::<{ MoveGenerationType::CAPTURES_VALUE }, { Color::BLACK_VALUE }>(self, list)
            }
        };
    }

    /// Returns the legal moves of the side to move. Each candidate is made and unmade on a copy of the position, and
    /// the moves that give check carry the check tag.
    pub fn legal_moves(&self) -> MoveList {
        let mut candidates = MoveList::default();
        self.pseudo_moves(&mut candidates);

        let mut scratch = self.clone();
        candidates
            .iter()
            .filter_map(|mut mv| {
                let snapshot = scratch.snapshot();
                if !scratch.make_move(mv) {
                    return None;
                }
                let gives_check = scratch.is_check();
                scratch.unmake_move(mv, &snapshot);

                if gives_check {
                    mv.set_check();
                }
                Some(mv)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo(fen: &str) -> (MoveList, bool) {
        let position = Position::new(fen).unwrap();
        let mut list = MoveList::default();
        let in_check = position.pseudo_moves(&mut list);
        (list, in_check)
    }

    #[test]
    fn test_starting_position() {
        let (list, in_check) = pseudo("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");

        assert!(!in_check);
        assert_eq!(list.len(), 20);
        assert!(list.iter().all(|mv| !mv.is_capture() && !mv.is_check()));
        assert_eq!(list.iter().filter(|mv| mv.is_double_push()).count(), 8);
    }

    #[test]
    fn test_single_check_evasions() {
        // The bishop on b4 checks the king on e1 through c3 and d2.
        let fen = "4k3/8/8/8/1b6/8/8/R2QK1N1 w - - 0 1";
        let position = Position::new(fen).unwrap();
        let (list, in_check) = pseudo(fen);

        assert!(in_check);
        let ray = Bitboard::between(Square::E1, Square::B4) | Square::B4;
        for mv in list.iter() {
            assert!(
                mv.piece().piece_type() == PieceType::King || ray.get(mv.to_square()),
                "{mv} does not address the check"
            );
        }
        assert!(list.contains(Move::new(Square::D1, Square::D2, Piece::WHITE_QUEEN)));
        assert!(list.contains(Move::new(Square::E1, Square::F2, Piece::WHITE_KING)));
        assert!(!list.contains(Move::new(Square::G1, Square::F3, Piece::WHITE_KNIGHT)));
        assert_eq!(position.checkers(), Bitboard::from(Square::B4));
    }

    #[test]
    fn test_double_check_only_king_moves() {
        let (list, in_check) = pseudo("4k3/8/8/8/1b6/8/4r3/R3K1N1 w - - 0 1");

        assert!(in_check);
        assert!(!list.is_empty());
        assert!(list.iter().all(|mv| mv.piece().piece_type() == PieceType::King));
    }

    #[test]
    fn test_en_passant_capturing_the_checker() {
        // The pawn on d5 just moved two squares and checks the king on e4.
        let (list, in_check) = pseudo("4k3/8/8/3pP3/4K3/8/8/8 w - d6 0 1");

        assert!(in_check);
        assert!(list.contains(Move::new_en_passant(Square::E5, Square::D6, Piece::WHITE_PAWN)));
    }

    #[test]
    fn test_castlings() {
        let (list, _) = pseudo("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(list.contains(Move::new_castling(Square::E1, Square::G1, Piece::WHITE_KING, CastlingSide::Kingside)));
        assert!(list.contains(Move::new_castling(Square::E1, Square::C1, Piece::WHITE_KING, CastlingSide::Queenside)));

        // The rook on f8 attacks f1, the king cannot cross it.
        let (list, _) = pseudo("5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!list.iter().any(|mv| mv.castling_side() == Some(CastlingSide::Kingside)));
        assert!(list.iter().any(|mv| mv.castling_side() == Some(CastlingSide::Queenside)));

        // b1 is attacked, but only the rook crosses it.
        let (list, _) = pseudo("1r5k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(list.iter().any(|mv| mv.castling_side() == Some(CastlingSide::Queenside)));
    }

    #[test]
    fn test_chess960_castling_with_king_on_destination() {
        // The king already stands on g1, only the rook moves to f1.
        let position = Position::new("6k1/8/8/8/8/8/8/6KR w K - 0 1").unwrap();
        let mut list = MoveList::default();
        position.pseudo_moves(&mut list);

        let castling = Move::new_castling(Square::G1, Square::G1, Piece::WHITE_KING, CastlingSide::Kingside);
        assert!(list.contains(castling));
        assert_eq!(position.castle_check(Color::White, CastlingSide::Kingside).map(|c| c.rook_from), Some(Square::H1));

        let mut position = position;
        assert!(position.make_move(castling));
        assert_eq!(position.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
        assert_eq!(position.piece_at(Square::G1), Some(Piece::WHITE_KING));
    }

    #[test]
    fn test_loud_moves_are_captures() {
        let position =
            Position::new("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        let mut list = MoveList::default();
        position.loud_moves(&mut list);

        assert_eq!(list.len(), 8);
        assert!(list.iter().all(|mv| mv.is_capture()));
    }

    #[test]
    fn test_promotions() {
        let (list, _) = pseudo("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promotions: Vec<Move> = list.iter().filter(|mv| mv.is_promotion()).collect();

        assert_eq!(promotions.len(), 8);
        assert_eq!(promotions.iter().filter(|mv| mv.is_capture()).count(), 4);
    }

    #[test]
    fn test_legal_moves_filters_pinned_pieces() {
        let position = Position::new("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        let legal = position.legal_moves();

        assert!(legal.iter().all(|mv| mv.piece().piece_type() == PieceType::King));
        assert_eq!(legal.len(), 4);
    }

    #[test]
    fn test_legal_moves_tag_checks() {
        let position = Position::new("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let checks: Vec<String> =
            position.legal_moves().iter().filter(|mv| mv.is_check()).map(|mv| mv.to_string()).collect();
        assert_eq!(checks, vec!["a1a8"]);

        assert!(Position::startpos().legal_moves().iter().all(|mv| !mv.is_check()));
    }
}
