use std::collections::HashMap;

use crate::{r#move::Move, zobrist::Zobrist};

/// A source of opening moves keyed by position hash.
pub trait OpeningBook: Send {
    /// Returns the book moves of the position with the given hash, each with its weight. The moves are not guaranteed
    /// to be legal in the position; callers must check them.
    fn lookup(&self, hash: Zobrist) -> Vec<(Move, u16)>;
}

/// A book without any move.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBook;

impl OpeningBook for NoBook {
    fn lookup(&self, _hash: Zobrist) -> Vec<(Move, u16)> {
        Vec::new()
    }
}

/// A book held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryBook {
    entries: HashMap<Zobrist, Vec<(Move, u16)>>,
}

impl MemoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a move to the position with the given hash. Adding a move twice adds up the weights.
    pub fn insert(&mut self, hash: Zobrist, mv: Move, weight: u16) {
        let moves = self.entries.entry(hash).or_default();
        match moves.iter_mut().find(|(book_move, _)| *book_move == mv) {
            Some((_, book_weight)) => *book_weight = book_weight.saturating_add(weight),
            None => moves.push((mv, weight)),
        }
    }

    /// Returns the number of positions in the book.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OpeningBook for MemoryBook {
    fn lookup(&self, hash: Zobrist) -> Vec<(Move, u16)> {
        self.entries.get(&hash).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coordinates::Square, piece::Piece};

    #[test]
    fn test_memory_book() {
        let e4 = Move::new_two_square_pawn_push(Square::E2, Square::E4, Piece::WHITE_PAWN);
        let d4 = Move::new_two_square_pawn_push(Square::D2, Square::D4, Piece::WHITE_PAWN);

        let mut book = MemoryBook::new();
        book.insert(42, e4, 10);
        book.insert(42, d4, 5);
        book.insert(42, e4, 1);

        assert_eq!(book.len(), 1);
        assert_eq!(book.lookup(42), vec![(e4, 11), (d4, 5)]);
        assert!(book.lookup(43).is_empty());
        assert!(NoBook.lookup(42).is_empty());
    }
}
