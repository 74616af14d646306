use std::fmt::Display;

use thiserror::Error;

use crate::piece::Color;

/// Errors produced when a coordinate is parsed from text or moved off the board.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatesError {
    #[error("'{0}' is not a valid file")]
    InvalidFile(char),

    #[error("'{0}' is not a valid rank")]
    InvalidRank(char),

    #[error("'{0}' is not a valid square")]
    InvalidSquare(String),

    #[error("the coordinate is outside of the board")]
    OutOfBoard,
}

pub type CoordinatesResult<T> = Result<T, CoordinatesError>;

//======================================================================================================================
// File
//======================================================================================================================

/// Represents a file (column) on a chess board.
///
/// Files are labeled from A to H, going from left to right when viewing the board from White's perspective.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl File {
    pub const COUNT: usize = 8;

    /// All files, from A to H.
    pub const ALL: [File; File::COUNT] = [File::A, File::B, File::C, File::D, File::E, File::F, File::G, File::H];

    /// Returns the file `count` columns to the right (towards H).
    pub fn right(self, count: i8) -> CoordinatesResult<File> {
        let value = self as i8 + count;
        if !(0..File::COUNT as i8).contains(&value) {
            return Err(CoordinatesError::OutOfBoard);
        }
        Ok(File::from(value as u8))
    }

    /// Returns the file `count` columns to the left (towards A).
    pub fn left(self, count: i8) -> CoordinatesResult<File> {
        self.right(-count)
    }
}

impl Display for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", char::from(*self))
    }
}

impl From<u8> for File {
    /// Converts a `u8` value to a `File`.
    ///
    /// # Panics
    /// Panics if the value is greater than 7.
    fn from(value: u8) -> Self {
        File::ALL[value as usize]
    }
}

impl From<File> for u8 {
    fn from(file: File) -> Self {
        file as u8
    }
}

impl From<File> for usize {
    fn from(file: File) -> Self {
        file as usize
    }
}

impl From<File> for char {
    fn from(file: File) -> Self {
        (b'a' + file as u8) as char
    }
}

impl TryFrom<char> for File {
    type Error = CoordinatesError;

    /// Parses a file letter. Both cases are accepted so the letters of Chess960 castling rights can be read.
    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase() {
            c @ 'a'..='h' => Ok(File::from(c as u8 - b'a')),
            _ => Err(CoordinatesError::InvalidFile(value)),
        }
    }
}

//======================================================================================================================
// Rank
//======================================================================================================================

/// Represents a rank (row) on a chess board.
///
/// Ranks are labeled from 1 to 8, going from the bottom to the top when viewing the board from White's perspective.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    R1 = 0,
    R2 = 1,
    R3 = 2,
    R4 = 3,
    R5 = 4,
    R6 = 5,
    R7 = 6,
    R8 = 7,
}

impl Rank {
    pub const COUNT: usize = 8;

    /// All ranks, from 1 to 8.
    pub const ALL: [Rank; Rank::COUNT] =
        [Rank::R1, Rank::R2, Rank::R3, Rank::R4, Rank::R5, Rank::R6, Rank::R7, Rank::R8];

    /// Returns the rank `count` rows up (towards rank 8).
    pub fn up(self, count: i8) -> CoordinatesResult<Rank> {
        let value = self as i8 + count;
        if !(0..Rank::COUNT as i8).contains(&value) {
            return Err(CoordinatesError::OutOfBoard);
        }
        Ok(Rank::from(value as u8))
    }

    /// Returns the rank `count` rows down (towards rank 1).
    pub fn down(self, count: i8) -> CoordinatesResult<Rank> {
        self.up(-count)
    }

    /// Returns the rank as seen from the given side. `Rank::R1.relative_to_color(Color::Black)` is `Rank::R8`.
    pub fn relative_to_color(self, color: Color) -> Rank {
        match color {
            Color::White => self,
            Color::Black => Rank::from(7 - self as u8),
        }
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", (b'1' + *self as u8) as char)
    }
}

impl From<u8> for Rank {
    /// Converts a `u8` value to a `Rank`.
    ///
    /// # Panics
    /// Panics if the value is greater than 7.
    fn from(value: u8) -> Self {
        Rank::ALL[value as usize]
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> Self {
        rank as u8
    }
}

impl From<Rank> for usize {
    fn from(rank: Rank) -> Self {
        rank as usize
    }
}

impl TryFrom<char> for Rank {
    type Error = CoordinatesError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '1'..='8' => Ok(Rank::from(value as u8 - b'1')),
            _ => Err(CoordinatesError::InvalidRank(value)),
        }
    }
}

//======================================================================================================================
// Square
//======================================================================================================================

/// Represents a square on a chess board.
///
/// Squares are indexed from 0 to 63, starting from A1 and ending at H8 with B1 being at index 1. The file value is
/// stored in the lower 3 bits and the rank value in the next 3 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A2: Square = Square(8);
    pub const B2: Square = Square(9);
    pub const C2: Square = Square(10);
    pub const D2: Square = Square(11);
    pub const E2: Square = Square(12);
    pub const F2: Square = Square(13);
    pub const G2: Square = Square(14);
    pub const H2: Square = Square(15);
    pub const A3: Square = Square(16);
    pub const B3: Square = Square(17);
    pub const C3: Square = Square(18);
    pub const D3: Square = Square(19);
    pub const E3: Square = Square(20);
    pub const F3: Square = Square(21);
    pub const G3: Square = Square(22);
    pub const H3: Square = Square(23);
    pub const A4: Square = Square(24);
    pub const B4: Square = Square(25);
    pub const C4: Square = Square(26);
    pub const D4: Square = Square(27);
    pub const E4: Square = Square(28);
    pub const F4: Square = Square(29);
    pub const G4: Square = Square(30);
    pub const H4: Square = Square(31);
    pub const A5: Square = Square(32);
    pub const B5: Square = Square(33);
    pub const C5: Square = Square(34);
    pub const D5: Square = Square(35);
    pub const E5: Square = Square(36);
    pub const F5: Square = Square(37);
    pub const G5: Square = Square(38);
    pub const H5: Square = Square(39);
    pub const A6: Square = Square(40);
    pub const B6: Square = Square(41);
    pub const C6: Square = Square(42);
    pub const D6: Square = Square(43);
    pub const E6: Square = Square(44);
    pub const F6: Square = Square(45);
    pub const G6: Square = Square(46);
    pub const H6: Square = Square(47);
    pub const A7: Square = Square(48);
    pub const B7: Square = Square(49);
    pub const C7: Square = Square(50);
    pub const D7: Square = Square(51);
    pub const E7: Square = Square(52);
    pub const F7: Square = Square(53);
    pub const G7: Square = Square(54);
    pub const H7: Square = Square(55);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    pub const COUNT: usize = 64;

    /// All squares, from A1 to H8.
    pub const ALL: [Square; Square::COUNT] = {
        let mut squares = [Square(0); Square::COUNT];
        let mut index = 0;
        while index < Square::COUNT {
            squares[index] = Square(index as u8);
            index += 1;
        }
        squares
    };

    /// Creates a new square from a file and a rank.
    pub fn new(file: File, rank: Rank) -> Square {
        Square((rank as u8) << 3 | file as u8)
    }

    /// Returns the rank of the square.
    pub fn rank(self) -> Rank {
        Rank::from(self.0 >> 3)
    }

    /// Returns the file of the square.
    pub fn file(self) -> File {
        File::from(self.0 & 0b111)
    }

    /// Returns the square `count` rows up, or an error if it falls off the board.
    pub fn up(self, count: i8) -> CoordinatesResult<Square> {
        Ok(Square::new(self.file(), self.rank().up(count)?))
    }

    /// Returns the square `count` rows down, or an error if it falls off the board.
    pub fn down(self, count: i8) -> CoordinatesResult<Square> {
        Ok(Square::new(self.file(), self.rank().down(count)?))
    }

    /// Returns the square `count` columns to the left, or an error if it falls off the board.
    pub fn left(self, count: i8) -> CoordinatesResult<Square> {
        Ok(Square::new(self.file().left(count)?, self.rank()))
    }

    /// Returns the square `count` columns to the right, or an error if it falls off the board.
    pub fn right(self, count: i8) -> CoordinatesResult<Square> {
        Ok(Square::new(self.file().right(count)?, self.rank()))
    }

    /// Returns the square one row forward from the point of view of `color`.
    pub fn forward(self, color: Color) -> CoordinatesResult<Square> {
        match color {
            Color::White => self.up(1),
            Color::Black => self.down(1),
        }
    }

    /// Returns the square one row backward from the point of view of `color`.
    pub fn backward(self, color: Color) -> CoordinatesResult<Square> {
        match color {
            Color::White => self.down(1),
            Color::Black => self.up(1),
        }
    }

    /// Returns true for the dark squares of the board (a1 is dark).
    pub fn is_dark(self) -> bool {
        (u8::from(self.file()) + u8::from(self.rank())) % 2 == 0
    }
}

impl Display for Square {
    /// Formats the square as a two-character string such as "e4".
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl From<u8> for Square {
    fn from(value: u8) -> Self {
        debug_assert!((value as usize) < Square::COUNT);
        Square(value)
    }
}

impl From<Square> for u8 {
    fn from(square: Square) -> Self {
        square.0
    }
}

impl From<Square> for usize {
    fn from(square: Square) -> Self {
        square.0 as usize
    }
}

impl TryFrom<&str> for Square {
    type Error = CoordinatesError;

    /// Parses a square written as a lowercase file letter followed by a rank digit ("e4").
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let invalid = || CoordinatesError::InvalidSquare(value.to_string());
        let mut chars = value.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file @ 'a'..='h'), Some(rank), None) => {
                let file = File::try_from(file).map_err(|_| invalid())?;
                let rank = Rank::try_from(rank).map_err(|_| invalid())?;
                Ok(Square::new(file, rank))
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod file_tests {
        use super::*;

        #[test]
        fn test_file_display() {
            assert_eq!(format!("{}", File::A), "a");
            assert_eq!(format!("{}", File::H), "h");
        }

        #[test]
        fn test_file_conversion() {
            assert_eq!(u8::from(File::A), 0);
            assert_eq!(u8::from(File::H), 7);
            assert_eq!(File::from(0), File::A);
            assert_eq!(File::from(7), File::H);
        }

        #[test]
        fn test_invalid_conversion_do_panic() {
            assert!(std::panic::catch_unwind(|| File::from(8)).is_err());
        }

        #[test]
        fn test_file_arithmetic() {
            assert_eq!(File::C.right(2), Ok(File::E));
            assert_eq!(File::C.left(2), Ok(File::A));
            assert_eq!(File::H.right(1), Err(CoordinatesError::OutOfBoard));
            assert_eq!(File::A.left(1), Err(CoordinatesError::OutOfBoard));
        }

        #[test]
        fn test_file_from_char() {
            assert_eq!(File::try_from('c'), Ok(File::C));
            assert_eq!(File::try_from('G'), Ok(File::G));
            assert_eq!(File::try_from('i'), Err(CoordinatesError::InvalidFile('i')));
        }
    }

    mod rank_tests {
        use super::*;

        #[test]
        fn test_rank_display() {
            assert_eq!(format!("{}", Rank::R1), "1");
            assert_eq!(format!("{}", Rank::R8), "8");
        }

        #[test]
        fn test_rank_conversion() {
            assert_eq!(u8::from(Rank::R1), 0);
            assert_eq!(u8::from(Rank::R8), 7);
            assert_eq!(Rank::from(0), Rank::R1);
            assert_eq!(Rank::from(7), Rank::R8);
        }

        #[test]
        fn test_relative_to_color() {
            assert_eq!(Rank::R1.relative_to_color(Color::White), Rank::R1);
            assert_eq!(Rank::R1.relative_to_color(Color::Black), Rank::R8);
            assert_eq!(Rank::R3.relative_to_color(Color::Black), Rank::R6);
        }
    }

    mod square_tests {
        use super::*;

        #[test]
        fn test_square_edge_cases() {
            assert_eq!(File::A, Square::A1.file());
            assert_eq!(Rank::R1, Square::A1.rank());
            assert_eq!(File::H, Square::H1.file());
            assert_eq!(Rank::R1, Square::H1.rank());
            assert_eq!(File::A, Square::A8.file());
            assert_eq!(Rank::R8, Square::A8.rank());
            assert_eq!(File::H, Square::H8.file());
            assert_eq!(Rank::R8, Square::H8.rank());
        }

        #[test]
        fn test_square_creation() {
            let e5 = Square::new(File::E, Rank::R5);
            assert_eq!(File::E, e5.file());
            assert_eq!(Rank::R5, e5.rank());
            assert_eq!(Square::E5, e5);
        }

        #[test]
        fn test_all_squares_are_indexed_in_order() {
            for (index, square) in Square::ALL.iter().enumerate() {
                assert_eq!(usize::from(*square), index);
            }
        }

        #[test]
        fn test_square_moves() {
            assert_eq!(Square::E4.up(2), Ok(Square::E6));
            assert_eq!(Square::E4.down(3), Ok(Square::E1));
            assert_eq!(Square::E4.left(4), Ok(Square::A4));
            assert_eq!(Square::H4.right(1), Err(CoordinatesError::OutOfBoard));
            assert_eq!(Square::A8.up(1), Err(CoordinatesError::OutOfBoard));
            assert_eq!(Square::E2.forward(Color::Black), Ok(Square::E1));
        }

        #[test]
        fn test_square_display_and_parse() {
            assert_eq!(format!("{}", Square::A1), "a1");
            assert_eq!(format!("{}", Square::H8), "h8");
            assert_eq!(Square::try_from("e4"), Ok(Square::E4));
            assert!(Square::try_from("E4").is_err());
            assert!(Square::try_from("e9").is_err());
            assert!(Square::try_from("e44").is_err());
            assert!(Square::try_from("").is_err());
        }

        #[test]
        fn test_square_color() {
            assert!(Square::A1.is_dark());
            assert!(!Square::H1.is_dark());
            assert!(Square::H8.is_dark());
        }
    }
}
