use once_cell::sync::Lazy;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    bitboard::Bitboard,
    coordinates::{File, Rank, Square},
    move_gen::magic::{find_magic, MagicEntry, MagicError},
    piece::{Color, PieceType},
};

// The magic search is seeded so that every run builds the same tables.
const MAGIC_SEED: u64 = 0x00C0_FFEE_BAAD_F00D;

const KING_OFFSETS: [(i8, i8); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [(-2, -1), (-2, 1), (-1, -2), (-1, 2), (1, -2), (1, 2), (2, -1), (2, 1)];

/// Slow ray-casting attack generation. Used to build the magic tables and to verify them.
pub(crate) mod naive_sliders {
    use crate::{
        bitboard::Bitboard,
        coordinates::{CoordinatesResult, Square},
    };

    type Step = fn(Square) -> CoordinatesResult<Square>;

    fn slide(occupied: Bitboard, from_sq: Square, steps: &[Step]) -> Bitboard {
        let mut attacks = Bitboard::EMPTY;

        for step in steps {
            let mut next = step(from_sq);
            while let Ok(to) = next {
                attacks |= to;
                if occupied.get(to) {
                    break;
                }
                next = step(to);
            }
        }

        attacks
    }

    /// Returns the squares attacked by a rook, walking each ray until a blocker or the edge of the board.
    pub fn attacks_from_rook(occupied: Bitboard, from_sq: Square) -> Bitboard {
        let steps: [Step; 4] = [|sq| sq.up(1), |sq| sq.down(1), |sq| sq.left(1), |sq| sq.right(1)];
        slide(occupied, from_sq, &steps)
    }

    /// Returns the squares attacked by a bishop, walking each ray until a blocker or the edge of the board.
    pub fn attacks_from_bishop(occupied: Bitboard, from_sq: Square) -> Bitboard {
        let steps: [Step; 4] = [
            |sq| sq.up(1).and_then(|sq| sq.right(1)),
            |sq| sq.up(1).and_then(|sq| sq.left(1)),
            |sq| sq.down(1).and_then(|sq| sq.right(1)),
            |sq| sq.down(1).and_then(|sq| sq.left(1)),
        ];
        slide(occupied, from_sq, &steps)
    }

}

/// Precomputed attack sets for every piece type and square.
///
/// Leaper attacks are stored directly. Rook and bishop attacks are found through a `MagicEntry` per square that points
/// in a table shared by both piece types.
pub struct AttackTables {
    king: [Bitboard; Square::COUNT],
    knight: [Bitboard; Square::COUNT],
    pawn: [[Bitboard; Square::COUNT]; Color::COUNT],
    rook_magics: Vec<MagicEntry>,
    bishop_magics: Vec<MagicEntry>,
    sliders: Vec<Bitboard>,
}

impl AttackTables {
    /// Builds all the attack tables, searching a magic constant for every square.
    ///
    /// # Returns
    /// The tables, or `MagicError` if no collision-free magic could be found for a square.
    pub fn new() -> Result<Self, MagicError> {
        let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
        let mut sliders = Vec::new();

        let rook_magics = Square::ALL
            .iter()
            .map(|&sq| {
                find_magic(
                    &mut rng,
                    sq,
                    PieceType::Rook,
                    rook_mask(sq),
                    naive_sliders::attacks_from_rook,
                    &mut sliders,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let bishop_magics = Square::ALL
            .iter()
            .map(|&sq| {
                find_magic(
                    &mut rng,
                    sq,
                    PieceType::Bishop,
                    bishop_mask(sq),
                    naive_sliders::attacks_from_bishop,
                    &mut sliders,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Magic tables built with {} attack sets", sliders.len());

        Ok(AttackTables {
            king: leaper_table(&KING_OFFSETS),
            knight: leaper_table(&KNIGHT_OFFSETS),
            pawn: [pawn_table(Color::White), pawn_table(Color::Black)],
            rook_magics,
            bishop_magics,
            sliders,
        })
    }

    pub fn king(&self, sq: Square) -> Bitboard {
        self.king[usize::from(sq)]
    }

    pub fn knight(&self, sq: Square) -> Bitboard {
        self.knight[usize::from(sq)]
    }

    /// Returns the squares attacked by a pawn of the given color standing on `sq`.
    pub fn pawn(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn[usize::from(color)][usize::from(sq)]
    }

    #[inline(always)]
    pub fn rook(&self, occupied: Bitboard, sq: Square) -> Bitboard {
        self.sliders[self.rook_magics[usize::from(sq)].index(occupied)]
    }

    #[inline(always)]
    pub fn bishop(&self, occupied: Bitboard, sq: Square) -> Bitboard {
        self.sliders[self.bishop_magics[usize::from(sq)].index(occupied)]
    }

    pub fn queen(&self, occupied: Bitboard, sq: Square) -> Bitboard {
        self.rook(occupied, sq) | self.bishop(occupied, sq)
    }
}

/// Returns the squares that can block a rook on `sq`. The last square of each ray never blocks anything behind it and
/// is left out.
fn rook_mask(sq: Square) -> Bitboard {
    let first_and_last_rank = Bitboard::from(Rank::R1) | Bitboard::from(Rank::R8);
    let first_and_last_file = Bitboard::from(File::A) | Bitboard::from(File::H);

    ((Bitboard::from(sq.file()) & !first_and_last_rank) | (Bitboard::from(sq.rank()) & !first_and_last_file))
        & !Bitboard::from(sq)
}

/// Returns the squares that can block a bishop on `sq`.
fn bishop_mask(sq: Square) -> Bitboard {
    let border =
        Bitboard::from(Rank::R1) | Bitboard::from(Rank::R8) | Bitboard::from(File::A) | Bitboard::from(File::H);
    naive_sliders::attacks_from_bishop(Bitboard::EMPTY, sq) & !border
}

fn leaper_table(offsets: &[(i8, i8)]) -> [Bitboard; Square::COUNT] {
    std::array::from_fn(|index| {
        let sq = Square::from(index as u8);
        offsets
            .iter()
            .filter_map(|&(file_delta, rank_delta)| sq.right(file_delta).and_then(|to| to.up(rank_delta)).ok())
            .fold(Bitboard::EMPTY, |attacks, to| attacks | to)
    })
}

fn pawn_table(color: Color) -> [Bitboard; Square::COUNT] {
    std::array::from_fn(|index| {
        let sq_bb = Bitboard::from(Square::from(index as u8));
        let not_a = sq_bb & !Bitboard::from(File::A);
        let not_h = sq_bb & !Bitboard::from(File::H);
        match color {
            Color::White => (not_a << 7) | (not_h << 9),
            Color::Black => (not_a >> 9) | (not_h >> 7),
        }
    })
}

static ATTACK_TABLES: Lazy<AttackTables> = Lazy::new(|| match AttackTables::new() {
    Ok(tables) => tables,
    Err(error) => {
        log::error!("Unable to build the attack tables: {error}");
        panic!("{error}");
    }
});

/// Forces the construction of the attack tables.
pub(crate) fn initialize() {
    Lazy::force(&ATTACK_TABLES);
}

/// Returns the process-wide attack tables.
pub fn tables() -> &'static AttackTables {
    &ATTACK_TABLES
}

/// Returns a bitboard with all squares attacked by a specific piece type from a given square.
///
/// # Type Parameters
/// * `PIECE_TYPE_VALUE` - A compile-time constant representing the piece type (one of KING_VALUE, KNIGHT_VALUE,
///   BISHOP_VALUE, ROOK_VALUE or QUEEN_VALUE)
///
/// # Parameters
/// * `occupied` - A bitboard representing all occupied squares on the board
/// * `sq` - The square from which to calculate attacks
///
/// # Returns
/// All squares attacked from `sq`. For sliding pieces, the occupied squares block the rays but are included in the
/// result.
///
/// # Panics
/// Panics if called with the pawn value; use `attacks_from_pawn` instead.
#[inline(always)]
pub fn attacks_from<const PIECE_TYPE_VALUE: u8>(occupied: Bitboard, sq: Square) -> Bitboard {
    let tables = tables();
    match PIECE_TYPE_VALUE {
        PieceType::KING_VALUE => tables.king(sq),
        PieceType::KNIGHT_VALUE => tables.knight(sq),
        PieceType::ROOK_VALUE => tables.rook(occupied, sq),
        PieceType::BISHOP_VALUE => tables.bishop(occupied, sq),
        PieceType::QUEEN_VALUE => tables.queen(occupied, sq),
        _ => unimplemented!("Pawn attacks depend on the color"),
    }
}

/// Returns the squares a pawn of the given color standing on `sq` attacks.
///
/// The squares from which pawns of a color attack `sq` are `attacks_from_pawn(!color, sq)`.
pub fn attacks_from_pawn(color: Color, sq: Square) -> Bitboard {
    tables().pawn(color, sq)
}
