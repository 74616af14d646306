use crate::r#move::Move;

/// Upper bound on the number of pseudo-legal moves in any reachable position.
const MAX_MOVES: usize = 256;

/// Structure to store a list of chess moves without heap allocations.
///
/// The moves are kept in a fixed-size array and a counter tracks how many of them are valid. Slots beyond the counter
/// hold `Move::NONE`.
#[derive(Debug, Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    count: usize,
}

impl Default for MoveList {
    fn default() -> Self {
        Self { moves: [Move::NONE; MAX_MOVES], count: 0 }
    }
}

impl MoveList {
    /// Adds a move to the list.
    ///
    /// # Panics
    /// Panics if the list already holds `MAX_MOVES` moves.
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.count < MAX_MOVES);

        self.moves[self.count] = mv;
        self.count += 1;
    }

    /// Removes and returns the highest-scoring move from the list.
    ///
    /// The best move is swapped with the last move of the list before the count is reduced, so the order of the
    /// remaining moves is not preserved. Among moves with the same score, the first one wins.
    ///
    /// # Returns
    /// The move with the highest ordering score, or `None` if the list is empty.
    pub fn pop(&mut self) -> Option<Move> {
        if self.count == 0 {
            return None;
        }

        let mut best_index = 0;
        for index in 1..self.count {
            if self.moves[best_index].score() < self.moves[index].score() {
                best_index = index;
            }
        }

        let result = self.moves[best_index];
        self.moves[best_index] = self.moves[self.count - 1];
        self.count -= 1;
        Some(result)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of moves currently in the list.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Removes every move from the list.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Returns true if the list holds the move. Scores and check tags are ignored.
    pub fn contains(&self, mv: Move) -> bool {
        self.iter().any(|candidate| candidate == mv)
    }

    /// Returns an iterator over the valid moves in the list.
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves[..self.count].iter().copied()
    }

    /// Returns a mutable iterator over the valid moves in the list, allowing the scores to be set in place.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Move> + '_ {
        self.moves[..self.count].iter_mut()
    }
}

impl FromIterator<Move> for MoveList {
    /// Collects moves into a new list.
    ///
    /// # Panics
    /// Panics if the iterator yields more than `MAX_MOVES` moves.
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut list = Self::default();
        for mv in iter {
            list.push(mv);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coordinates::Square, piece::Piece};

    fn scored(from: Square, to: Square, score: i32) -> Move {
        let mut mv = Move::new(from, to, Piece::WHITE_ROOK);
        mv.set_score(score);
        mv
    }

    #[test]
    fn test_pop_returns_moves_by_decreasing_score() {
        let mut list: MoveList = [
            scored(Square::A1, Square::A2, 10),
            scored(Square::A1, Square::A3, 30),
            scored(Square::A1, Square::A4, 20),
        ]
        .into_iter()
        .collect();

        assert_eq!(list.pop().map(Move::score), Some(30));
        assert_eq!(list.pop().map(Move::score), Some(20));
        assert_eq!(list.pop().map(Move::score), Some(10));
        assert_eq!(list.pop(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_contains_ignores_score() {
        let mut list = MoveList::default();
        list.push(scored(Square::H1, Square::H8, 5));

        assert!(list.contains(Move::new(Square::H1, Square::H8, Piece::WHITE_ROOK)));
        assert!(!list.contains(Move::new(Square::H1, Square::H7, Piece::WHITE_ROOK)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_iter_mut_updates_scores() {
        let mut list: MoveList = [scored(Square::A1, Square::A2, 0), scored(Square::A1, Square::A3, 0)]
            .into_iter()
            .collect();

        for mv in list.iter_mut() {
            mv.set_score(7);
        }

        assert!(list.iter().all(|mv| mv.score() == 7));
    }
}
