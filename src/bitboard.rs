use once_cell::sync::Lazy;

use crate::coordinates::{CoordinatesResult, File, Rank, Square};

/// A bitboard is a 64-bit integer that represents a set of squares. Each bit represents a square on the board, the
/// least significant bit being A1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(u64);

impl Bitboard {
    /// Represents an empty bitboard.
    pub const EMPTY: Bitboard = Bitboard(0);

    /// Represents a filled bitboard.
    pub const ALL: Bitboard = Bitboard(u64::MAX);

    /// Creates a bitboard from its raw value.
    pub const fn new(value: u64) -> Self {
        Bitboard(value)
    }

    /// Returns the raw value of the bitboard.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the value of a single square on the bitboard.
    pub fn get(self, square: Square) -> bool {
        self.0 & (1u64 << u8::from(square)) != 0
    }

    /// Returns the least significant bit of the bitboard.
    pub fn lsb(self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }

        Some((self.0.trailing_zeros() as u8).into())
    }

    /// Returns the most significant bit of the bitboard.
    pub fn msb(self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }

        Some((63 - self.0.leading_zeros() as u8).into())
    }

    /// Returns the number of set bits in the bitboard.
    pub fn popcnt(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns whether the bitboard is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if at least one bit is set.
    pub fn has_any(self) -> bool {
        self.0 != 0
    }

    /// Returns true if no bit is set.
    pub fn has_none(self) -> bool {
        self.0 == 0
    }

    /// Returns true if exactly one bit is set.
    pub fn has_one(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }

    /// Returns true if two or more bits are set.
    pub fn has_many(self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// Returns an iterator over every subset of the bitboard, the empty set first.
    ///
    /// The subsets are produced with the carry-rippler trick: `next = (current - mask) & mask` walks through all
    /// `2^popcnt` combinations of the set bits and wraps back to zero after the full set.
    pub fn subsets(self) -> SubsetIterator {
        SubsetIterator { mask: self.0, current: 0, done: false }
    }

    /// Returns a bitboard with all squares strictly between two squares on the same line (rank, file or diagonal), or
    /// an empty bitboard if the squares are not aligned.
    pub fn between(from: Square, to: Square) -> Bitboard {
        BETWEEN[usize::from(from) * Square::COUNT + usize::from(to)]
    }
}

static BETWEEN: Lazy<Vec<Bitboard>> = Lazy::new(|| {
    let directions: [fn(Square) -> CoordinatesResult<Square>; 4] = [
        |square| square.right(1),
        |square| square.up(1),
        |square| square.right(1).and_then(|square| square.up(1)),
        |square| square.right(1).and_then(|square| square.down(1)),
    ];

    let mut between = vec![Bitboard::EMPTY; Square::COUNT * Square::COUNT];
    for from in Square::ALL {
        for direction in directions.iter() {
            let mut bb = Bitboard::EMPTY;
            let mut next = direction(from);
            while let Ok(to) = next {
                between[usize::from(from) * Square::COUNT + usize::from(to)] = bb;
                between[usize::from(to) * Square::COUNT + usize::from(from)] = bb;
                bb |= to;
                next = direction(to);
            }
        }
    }
    between
});

/// Forces the construction of the lazily built tables of this module.
pub(crate) fn initialize() {
    Lazy::force(&BETWEEN);
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Self {
        Bitboard(1u64 << u8::from(square))
    }
}

impl From<File> for Bitboard {
    fn from(file: File) -> Self {
        Bitboard(0x0101010101010101 << u8::from(file))
    }
}

impl From<Rank> for Bitboard {
    fn from(rank: Rank) -> Self {
        Bitboard(0xff << (8 * u8::from(rank)))
    }
}

/// Implements a bitwise operator and its assigning form between bitboards, and between a bitboard and a square.
macro_rules! impl_bitwise_op {
    ($op:ident, $method:ident, $assign_op:ident, $assign_method:ident) => {
        impl std::ops::$op for Bitboard {
            type Output = Self;
            fn $method(self, rhs: Self) -> Self::Output {
                Bitboard(std::ops::$op::$method(self.0, rhs.0))
            }
        }

        impl std::ops::$op<Square> for Bitboard {
            type Output = Self;
            fn $method(self, rhs: Square) -> Self::Output {
                std::ops::$op::$method(self, Bitboard::from(rhs))
            }
        }

        impl std::ops::$assign_op for Bitboard {
            fn $assign_method(&mut self, rhs: Self) {
                std::ops::$assign_op::$assign_method(&mut self.0, rhs.0);
            }
        }

        impl std::ops::$assign_op<Square> for Bitboard {
            fn $assign_method(&mut self, rhs: Square) {
                std::ops::$assign_op::$assign_method(&mut self.0, Bitboard::from(rhs).0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, bitand, BitAndAssign, bitand_assign);
impl_bitwise_op!(BitOr, bitor, BitOrAssign, bitor_assign);
impl_bitwise_op!(BitXor, bitxor, BitXorAssign, bitxor_assign);

impl std::ops::BitOr<Square> for Square {
    type Output = Bitboard;
    fn bitor(self, rhs: Square) -> Self::Output {
        Bitboard::from(self) | rhs
    }
}

impl std::ops::Not for Bitboard {
    type Output = Self;
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}

/// Shifts move every square toward higher indexes (`<<`) or lower ones (`>>`). Bits shifted past either end are lost
/// and nothing prevents wrapping from one file to the next; callers mask the edge files first.
impl std::ops::Shl<u32> for Bitboard {
    type Output = Self;
    fn shl(self, rhs: u32) -> Self::Output {
        Bitboard(self.0 << rhs)
    }
}

impl std::ops::Shr<u32> for Bitboard {
    type Output = Self;
    fn shr(self, rhs: u32) -> Self::Output {
        Bitboard(self.0 >> rhs)
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIterator;

    fn into_iter(self) -> Self::IntoIter {
        BitboardIterator(self.0)
    }
}

/// An iterator over the set bits in a bitboard.
pub struct BitboardIterator(u64);

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }

        let square: Square = (self.0.trailing_zeros() as u8).into();
        self.0 &= self.0 - 1;
        Some(square)
    }
}

/// An iterator over all the subsets of a bitboard. See `Bitboard::subsets`.
pub struct SubsetIterator {
    mask: u64,
    current: u64,
    done: bool,
}

impl Iterator for SubsetIterator {
    type Item = Bitboard;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let subset = self.current;
        self.current = self.current.wrapping_sub(self.mask) & self.mask;
        self.done = self.current == 0;
        Some(Bitboard(subset))
    }
}
