use rand::{rngs::StdRng, Rng};
use thiserror::Error;

use crate::{bitboard::Bitboard, coordinates::Square, piece::PieceType};

/// Number of random candidates tried for a single square before giving up.
const MAX_ATTEMPTS: u32 = 10_000_000;

/// Error produced when no collision-free magic constant could be found for a square.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MagicError {
    #[error("no magic found for the {piece_type} on {square} after {attempts} attempts")]
    NotFound { square: Square, piece_type: PieceType, attempts: u32 },
}

/// The data required to find the attacks of a sliding piece on a given square.
///
/// The relevant occupancy bits (`occupied & mask`) are multiplied by `magic` and shifted right by `shift`. The result
/// is an index relative to `offset` in the shared attack table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicEntry {
    pub mask: Bitboard,
    pub magic: u64,
    pub shift: u32,
    pub offset: usize,
}

impl MagicEntry {
    /// Returns the index of the attack set for an occupancy in the shared attack table.
    #[inline(always)]
    pub fn index(&self, occupied: Bitboard) -> usize {
        self.offset + ((occupied & self.mask).value().wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Finds a magic constant for a square and appends its attack sets to the shared table.
///
/// Every subset of `mask` is enumerated and its attacks computed with `slow_attacks`. Random candidates with few bits
/// set are then tried until one maps every subset to a slot that holds the right attack set. Two subsets may share a
/// slot only if their attacks are identical.
///
/// # Parameters
/// * `rng` - The random number generator used to draw candidates
/// * `square` - The square of the sliding piece
/// * `piece_type` - The sliding piece type, used for error reporting
/// * `mask` - The squares whose occupancy can block the piece
/// * `slow_attacks` - A ray-casting function returning the attacks for an occupancy
/// * `table` - The shared attack table, extended with the attack sets of this square
///
/// # Returns
/// The magic entry of the square, or `MagicError::NotFound` if no candidate worked.
pub fn find_magic(
    rng: &mut StdRng,
    square: Square,
    piece_type: PieceType,
    mask: Bitboard,
    slow_attacks: fn(Bitboard, Square) -> Bitboard,
    table: &mut Vec<Bitboard>,
) -> Result<MagicEntry, MagicError> {
    let bits = mask.popcnt();
    let shift = 64 - bits;
    let size = 1usize << bits;

    let occupancies: Vec<Bitboard> = mask.subsets().collect();
    let references: Vec<Bitboard> = occupancies.iter().map(|&occupied| slow_attacks(occupied, square)).collect();

    // `epoch[i] == attempt` means the slot i was written during the current attempt. This saves clearing `used`
    // between attempts.
    let mut epoch = vec![0u32; size];
    let mut used = vec![Bitboard::EMPTY; size];

    for attempt in 1..=MAX_ATTEMPTS {
        let magic = rng.random::<u64>() & rng.random::<u64>() & rng.random::<u64>();

        // Quickly reject candidates that do not spread the mask bits in the high byte.
        if (mask.value().wrapping_mul(magic) & 0xFF00_0000_0000_0000).count_ones() < 6 {
            continue;
        }

        let collision = occupancies.iter().zip(references.iter()).any(|(&occupied, &attacks)| {
            let index = (occupied.value().wrapping_mul(magic) >> shift) as usize;
            if epoch[index] != attempt {
                epoch[index] = attempt;
                used[index] = attacks;
                false
            } else {
                used[index] != attacks
            }
        });

        if !collision {
            let offset = table.len();
            table.extend_from_slice(&used);
            return Ok(MagicEntry { mask, magic, shift, offset });
        }
    }

    Err(MagicError::NotFound { square, piece_type, attempts: MAX_ATTEMPTS })
}
