use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};

use crate::{
    book::{NoBook, OpeningBook},
    config::EngineConfig,
    eval::{BasicPawnStructure, Eval, Evaluator, MaterialEvaluator},
    options::SearchOptions,
    position::Position,
    r#move::Move,
    search::{CancellationToken, Search, SearchError, SearchLimits, SearchResult},
    tt::{TranspositionCache, TranspositionTable},
};

/// An engine instance. It owns what persists from one search to the next: the caches, the evaluation, the opening book
/// and the options.
pub struct Engine<T: TranspositionCache = TranspositionTable> {
    tt: T,
    evaluator: Box<dyn Evaluator>,
    book: Box<dyn OpeningBook>,
    options: SearchOptions,
    rng: StdRng,
}

impl Engine<TranspositionTable> {
    /// Creates an engine with a transposition table sized by the configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_cache(TranspositionTable::new(config.hash_megabytes), config)
    }

    /// Replaces the transposition table with an empty one of the given size.
    pub fn resize(&mut self, megabytes: usize) {
        self.tt.resize(megabytes);
    }
}

impl<T: TranspositionCache> Engine<T> {
    /// Creates an engine using the given transposition cache.
    pub fn with_cache(tt: T, config: &EngineConfig) -> Self {
        Engine {
            tt,
            evaluator: Box::new(MaterialEvaluator::new(BasicPawnStructure, config.pawn_table_entries)),
            book: Box::new(NoBook),
            options: config.search.clone(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replaces the static evaluation.
    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        self.evaluator = evaluator;
    }

    /// Replaces the opening book.
    pub fn set_book(&mut self, book: Box<dyn OpeningBook>) {
        self.book = book;
    }

    /// Sets the seed used to pick among weighted book moves.
    pub fn seed_book(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SearchOptions) {
        self.options = options;
    }

    pub fn cache(&self) -> &T {
        &self.tt
    }

    /// Picks a book move for the position, at random according to the book weights. Book moves that are not legal in
    /// the position are ignored.
    pub fn book_move(&mut self, position: &Position) -> Option<Move> {
        let book_moves = self.book.lookup(position.hash());
        if book_moves.is_empty() {
            return None;
        }

        let legal = position.legal_moves();
        let candidates: Vec<(Move, u16)> = book_moves
            .into_iter()
            .filter_map(|(mv, weight)| legal.iter().find(|&legal_move| legal_move == mv).map(|mv| (mv, weight)))
            .collect();

        candidates.choose_weighted(&mut self.rng, |(_, weight)| *weight).ok().map(|(mv, _)| *mv)
    }

    /// Selects a move for the position: a book move if the book has one, else the result of a search.
    ///
    /// # Parameters
    /// * `position` - The position to play in. It is restored to its original state before returning.
    /// * `limits` - The depth and node limits of the search
    /// * `token` - The cancellation signal of the search
    ///
    /// # Returns
    /// * `Ok(SearchResult)` - The book move, reported at depth 0, or the last completed search iteration
    /// * `Err(SearchError)` - The search was aborted before its first iteration completed
    pub fn search(
        &mut self,
        position: &mut Position,
        limits: SearchLimits,
        token: &CancellationToken,
    ) -> Result<SearchResult, SearchError> {
        if let Some(mv) = self.book_move(position) {
            log::info!("Book move {mv}");
            return Ok(SearchResult { best_move: Some(mv), score: Eval::DRAW, depth: 0, nodes: 0, pv: vec![mv] });
        }

        Search::new(position, &self.tt, self.evaluator.as_mut(), &self.options, token).run(limits)
    }

    /// Empties the transposition table and the evaluation caches.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.evaluator.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{book::MemoryBook, coordinates::Square, piece::Piece, tt::NoopTable};

    fn small_config() -> EngineConfig {
        EngineConfig { hash_megabytes: 1, ..EngineConfig::default() }
    }

    #[test]
    fn test_book_move_is_played() {
        let mut position = Position::startpos();
        let e4 = Move::new_two_square_pawn_push(Square::E2, Square::E4, Piece::WHITE_PAWN);
        let mut book = MemoryBook::new();
        book.insert(position.hash(), e4, 1);

        let mut engine = Engine::with_cache(NoopTable, &small_config());
        engine.set_book(Box::new(book));
        engine.seed_book(7);

        let result = engine.search(&mut position, SearchLimits::depth(3), &CancellationToken::new()).unwrap();
        assert_eq!(result.best_move, Some(e4));
        assert_eq!(result.depth, 0);
        assert!(result.best_move.is_some_and(|mv| mv.is_double_push()));
    }

    #[test]
    fn test_illegal_book_moves_are_ignored() {
        let mut position = Position::startpos();
        let mut book = MemoryBook::new();
        book.insert(position.hash(), Move::new(Square::E2, Square::E5, Piece::WHITE_PAWN), 1);

        let mut engine = Engine::with_cache(NoopTable, &small_config());
        engine.set_book(Box::new(book));

        assert_eq!(engine.book_move(&position), None);
        let result = engine.search(&mut position, SearchLimits::depth(2), &CancellationToken::new()).unwrap();
        assert_eq!(result.depth, 2);
    }

    #[test]
    fn test_search_fills_the_transposition_table() {
        let mut position = Position::new("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
        let mut engine = Engine::new(&small_config());

        let first = engine.search(&mut position, SearchLimits::depth(4), &CancellationToken::new()).unwrap();
        let second = engine.search(&mut position, SearchLimits::depth(4), &CancellationToken::new()).unwrap();
        assert_eq!(first.best_move, second.best_move);
        assert!(engine.cache().get(position.hash()).is_some());

        engine.clear();
        assert!(engine.cache().get(position.hash()).is_none());

        engine.resize(2);
        assert_eq!(engine.cache().capacity(), 131072);
    }

    #[test]
    fn test_replaced_options_and_evaluator_are_used() {
        let mut position = Position::new("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
        let mut engine = Engine::with_cache(NoopTable, &small_config());
        engine.set_options(SearchOptions::exhaustive());
        engine.set_evaluator(Box::new(MaterialEvaluator::new(BasicPawnStructure, 64)));

        assert!(!engine.options().null_move_pruning);
        let result = engine.search(&mut position, SearchLimits::depth(2), &CancellationToken::new()).unwrap();
        assert_eq!(result.best_move.map(|mv| mv.to_string()).as_deref(), Some("d1d5"));
    }
}
