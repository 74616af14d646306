use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use thiserror::Error;

use crate::{
    eval::{Eval, Evaluator},
    killers::{KillerList, MAX_PLY},
    move_gen::move_list::MoveList,
    options::SearchOptions,
    piece::PieceType,
    position::Position,
    r#move::Move,
    tt::{Bound, TranspositionCache, TtEntry},
};

/// Deepest iteration the iterative deepening driver runs when no depth limit is given.
pub const MAX_DEPTH: u8 = 64;

const TT_MOVE_SCORE: i32 = 1_000_000;
const PROMOTION_SCORE: i32 = 900_000;
const CASTLING_SCORE: i32 = 900_000;
const CAPTURE_SCORE: i32 = 800_000;
const KILLER_SCORES: [i32; 2] = [700_000, 690_000];

/// Reasons for a search to stop before completing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("The search was cancelled")]
    Cancelled,

    #[error("The node limit of the search was reached")]
    NodeLimitReached,
}

//======================================================================================================================
// CancellationToken implementation
//======================================================================================================================

/// A shared flag used to stop a running search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the cancellation of every search using this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns true once `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Cancels the token once `duration` has elapsed, from a timer thread.
    ///
    /// # Returns
    /// The handle of the timer thread.
    pub fn cancel_after(&self, duration: Duration) -> JoinHandle<()> {
        let token = self.clone();
        thread::spawn(move || {
            thread::sleep(duration);
            token.cancel();
        })
    }
}

//======================================================================================================================
// Search limits and result
//======================================================================================================================

/// Limits of a search. The search stops at the first limit reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Depth of the last iteration, in plies.
    pub depth: u8,

    /// Maximum number of nodes to visit, if any.
    pub nodes: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits { depth: MAX_DEPTH, nodes: None }
    }
}

impl SearchLimits {
    /// Limits the search to a depth.
    pub fn depth(depth: u8) -> Self {
        SearchLimits { depth, nodes: None }
    }

    /// Limits the search to a number of nodes.
    pub fn nodes(nodes: u64) -> Self {
        SearchLimits { depth: MAX_DEPTH, nodes: Some(nodes) }
    }
}

/// The outcome of the last completed iteration of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// The best move, `None` if the side to move has no legal move.
    pub best_move: Option<Move>,

    /// The score of the position from the point of view of the side to move.
    pub score: Eval,

    /// The depth of the completed iteration.
    pub depth: u8,

    /// Number of nodes visited by the whole search.
    pub nodes: u64,

    /// The principal variation, starting with the best move.
    pub pv: Vec<Move>,
}

//======================================================================================================================
// Search implementation
//======================================================================================================================

/// A principal variation search over a position.
///
/// The position is mutated during the search and restored to its original state when the search returns, whether it
/// completes or is aborted.
pub struct Search<'a> {
    position: &'a mut Position,
    tt: &'a dyn TranspositionCache,
    evaluator: &'a mut dyn Evaluator,
    options: &'a SearchOptions,
    token: &'a CancellationToken,
    killers: KillerList,
    max_nodes: Option<u64>,
    nodes: u64,
}

impl<'a> Search<'a> {
    /// Creates a new search.
    ///
    /// # Parameters
    /// * `position` - The position to search. It is mutated during the search and restored afterward.
    /// * `tt` - The transposition cache, shared with previous and later searches
    /// * `evaluator` - The static evaluation used at the leaves
    /// * `options` - Tuning of the selective reductions
    /// * `token` - The cancellation signal, checked at every node
    pub fn new(
        position: &'a mut Position,
        tt: &'a dyn TranspositionCache,
        evaluator: &'a mut dyn Evaluator,
        options: &'a SearchOptions,
        token: &'a CancellationToken,
    ) -> Search<'a> {
        Search { position, tt, evaluator, options, token, killers: KillerList::default(), max_nodes: None, nodes: 0 }
    }

    /// Runs an iterative deepening search, one iteration per depth from 1 to the depth limit.
    ///
    /// # Returns
    /// * `Ok(SearchResult)` - The result of the last completed iteration. A search aborted after the first iteration
    ///   still returns the last completed one.
    /// * `Err(SearchError)` - The search was aborted before the first iteration completed
    pub fn run(&mut self, limits: SearchLimits) -> Result<SearchResult, SearchError> {
        self.max_nodes = limits.nodes;
        self.nodes = 0;
        self.killers.clear();
        self.tt.new_search();

        let mut result: Option<SearchResult> = None;
        for depth in 1..=limits.depth.max(1) {
            let mut pv = Vec::new();
            match self.alpha_beta(depth as i16, 0, Eval::MIN, Eval::MAX, &mut pv, false) {
                Ok(score) => {
                    log::debug!(
                        "depth {depth} score {score} nodes {} pv {}",
                        self.nodes,
                        pv.iter().map(|mv| mv.to_string()).collect::<Vec<_>>().join(" ")
                    );

                    let finished = pv.is_empty();
                    result = Some(SearchResult { best_move: pv.first().copied(), score, depth, nodes: self.nodes, pv });

                    // Without legal moves deeper iterations cannot change anything.
                    if finished {
                        break;
                    }
                }
                Err(error) => {
                    log::debug!("Search stopped at depth {depth} after {} nodes: {error}", self.nodes);
                    return match result {
                        Some(result) => Ok(SearchResult { nodes: self.nodes, ..result }),
                        None => Err(error),
                    };
                }
            }
        }

        result.ok_or(SearchError::Cancelled)
    }

    /// Returns the number of nodes visited so far.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    fn check_abort(&self) -> Result<(), SearchError> {
        if self.token.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        match self.max_nodes {
            Some(max_nodes) if self.nodes >= max_nodes => Err(SearchError::NodeLimitReached),
            _ => Ok(()),
        }
    }

    /// Assigns ordering scores: the transposition table move first, then promotions and castlings, then captures by
    /// most valuable victim and least valuable attacker, then killers, then the remaining quiet moves.
    fn score_moves(&self, moves: &mut MoveList, tt_move: Option<Move>, ply: usize) {
        for mv in moves.iter_mut() {
            let score = if tt_move == Some(*mv) {
                TT_MOVE_SCORE
            } else if let Some(promotion) = mv.promotion() {
                PROMOTION_SCORE + u8::from(promotion.piece_type()) as i32
            } else if mv.castling_side().is_some() {
                CASTLING_SCORE
            } else if mv.is_capture() {
                CAPTURE_SCORE + mvv_lva(*mv)
            } else {
                self.killers.position(ply, *mv).map_or(0, |index| KILLER_SCORES[index])
            };
            mv.set_score(score);
        }
    }

    /// Searches the position with the window `alpha`..`beta`, `depth` plies deep, `ply` plies below the root.
    ///
    /// Fails hard: the returned score is clamped to the window. A cached bound at least `depth` deep narrows the window
    /// and ends the search when the window closes. The principal variation of the node is written to `pv`.
    fn alpha_beta(
        &mut self,
        depth: i16,
        ply: u16,
        mut alpha: Eval,
        mut beta: Eval,
        pv: &mut Vec<Move>,
        allow_null: bool,
    ) -> Result<Eval, SearchError> {
        self.check_abort()?;
        self.nodes += 1;
        pv.clear();

        let is_root = ply == 0;
        let is_pv = i32::from(beta) - i32::from(alpha) > 1;
        let (window_alpha, window_beta) = (alpha, beta);
        let hash = self.position.hash();

        if ply as usize >= MAX_PLY {
            return Ok(self.evaluator.evaluate(self.position).clamp(alpha, beta));
        }

        let mut tt_move = None;
        if let Some(entry) = self.tt.get(hash) {
            tt_move = entry.mv();

            if !is_root && entry.depth() as i16 >= depth {
                let score = entry.eval(ply);
                match entry.bound() {
                    Bound::Exact => return Ok(score.clamp(alpha, beta)),
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }
                if alpha >= beta {
                    return Ok(score.clamp(window_alpha, window_beta));
                }
            }
        }

        if !is_root && self.position.is_draw() {
            self.store(hash, Move::NONE, depth, Bound::Exact, ply, Eval::DRAW);
            return Ok(Eval::DRAW.clamp(alpha, beta));
        }

        let in_check = self.position.is_check();
        let depth = if in_check { depth + 1 } else { depth };

        if depth <= 0 {
            return self.quiescence(ply, alpha, beta);
        }

        let mut child_pv = Vec::new();

        if allow_null
            && self.options.null_move_pruning
            && !is_pv
            && !in_check
            && depth >= self.options.null_move_min_depth as i16
            && self.position.has_non_pawn_material(self.position.side_to_move())
        {
            let reduced = depth - 1 - self.options.null_move_reduction as i16;
            let snapshot = self.position.snapshot();
            self.position.make_null_move();
            let result = self.alpha_beta(reduced, ply + 1, -beta, -beta + 1, &mut child_pv, false);
            self.position.unmake_null_move(&snapshot);

            if -result? >= beta {
                return Ok(beta);
            }
        }

        let mut moves = MoveList::default();
        self.position.pseudo_moves(&mut moves);
        self.score_moves(&mut moves, tt_move, ply as usize);

        let mut legal_moves = 0;
        let mut best_move = Move::NONE;

        while let Some(mut mv) = moves.pop() {
            let snapshot = self.position.snapshot();
            if !self.position.make_move(mv) {
                continue;
            }
            legal_moves += 1;
            if self.position.is_check() {
                mv.set_check();
            }

            let reduction = if self.options.late_move_reductions
                && depth >= self.options.lmr_min_depth as i16
                && legal_moves > self.options.lmr_min_move_index as u32
                && !in_check
                && !mv.is_capture()
                && !mv.is_promotion()
                && !mv.is_check()
            {
                1
            } else {
                0
            };

            let result = self.search_move(depth, ply, alpha, beta, legal_moves == 1, reduction, &mut child_pv);
            self.position.unmake_move(mv, &snapshot);
            let score = result?;

            if score >= beta {
                if mv.is_quiet() {
                    self.killers.record(ply as usize, mv);
                }
                self.store(hash, mv, depth, Bound::Lower, ply, beta);
                return Ok(beta);
            }

            if score > alpha {
                alpha = score;
                best_move = mv;
                pv.clear();
                pv.push(mv);
                pv.extend_from_slice(&child_pv);
            }
        }

        if legal_moves == 0 {
            let score = if in_check { -Eval::new_mat(ply) } else { Eval::DRAW };
            return Ok(score.clamp(alpha, beta));
        }

        let bound = if best_move.is_none() { Bound::Upper } else { Bound::Exact };
        self.store(hash, best_move, depth, bound, ply, alpha);
        Ok(alpha)
    }

    /// Searches a move already made on the position. The first move gets the full window. Later moves are searched
    /// with a null window, `reduction` plies shallower. A reduced search that beats alpha is repeated at full depth,
    /// and a null window score strictly inside the window is confirmed with the full window.
    #[allow(clippy::too_many_arguments)]
    fn search_move(
        &mut self,
        depth: i16,
        ply: u16,
        alpha: Eval,
        beta: Eval,
        first_move: bool,
        reduction: i16,
        pv: &mut Vec<Move>,
    ) -> Result<Eval, SearchError> {
        if first_move {
            return Ok(-self.alpha_beta(depth - 1, ply + 1, -beta, -alpha, pv, true)?);
        }

        let mut score = -self.alpha_beta(depth - 1 - reduction, ply + 1, -alpha - 1, -alpha, pv, true)?;
        if score > alpha && reduction > 0 {
            score = -self.alpha_beta(depth - 1, ply + 1, -alpha - 1, -alpha, pv, true)?;
        }
        if score > alpha && score < beta {
            score = -self.alpha_beta(depth - 1, ply + 1, -beta, -alpha, pv, true)?;
        }

        Ok(score)
    }

    /// Resolves captures until the position is quiet, so that the static evaluation is not taken in the middle of an
    /// exchange.
    fn quiescence(&mut self, ply: u16, alpha: Eval, beta: Eval) -> Result<Eval, SearchError> {
        self.check_abort()?;
        self.nodes += 1;

        let stand_pat = self.evaluator.evaluate(self.position);
        if stand_pat >= beta {
            return Ok(beta);
        }
        if ply as usize >= MAX_PLY {
            return Ok(stand_pat.max(alpha));
        }
        let mut alpha = alpha.max(stand_pat);

        let mut moves = MoveList::default();
        self.position.loud_moves(&mut moves);
        for mv in moves.iter_mut() {
            mv.set_score(mvv_lva(*mv));
        }

        while let Some(mv) = moves.pop() {
            if self.position.see(mv) < Eval::DRAW {
                continue;
            }

            let snapshot = self.position.snapshot();
            if !self.position.make_move(mv) {
                continue;
            }
            let result = self.quiescence(ply + 1, -beta, -alpha);
            self.position.unmake_move(mv, &snapshot);
            let score = -result?;

            if score >= beta {
                return Ok(beta);
            }
            alpha = alpha.max(score);
        }

        Ok(alpha)
    }

    fn store(&self, hash: u64, mv: Move, depth: i16, bound: Bound, ply: u16, eval: Eval) {
        let depth = depth.clamp(0, u8::MAX as i16) as u8;
        self.tt.set(hash, TtEntry::new(mv, depth, bound, ply, eval));
    }
}

/// Most valuable victim, least valuable attacker.
fn mvv_lva(mv: Move) -> i32 {
    let victim = mv.captured().map_or(PieceType::Pawn, |piece| piece.piece_type());
    10 * (u8::from(victim) as i32 + 1) - u8::from(mv.piece().piece_type()) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coordinates::Square, eval::MaterialEvaluator, piece::Piece, tt::NoopTable, zobrist::Zobrist};

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    // White to move and a pawn down: the search alone scores it well below zero.
    const PAWN_DOWN: &str = "4k3/4p3/8/8/8/8/8/4K3 w - - 0 1";

    /// A cache holding a single entry and ignoring writes.
    struct SingleEntryCache {
        key: Zobrist,
        entry: TtEntry,
    }

    impl TranspositionCache for SingleEntryCache {
        fn get(&self, key: Zobrist) -> Option<TtEntry> {
            (key == self.key).then_some(self.entry)
        }

        fn set(&self, _key: Zobrist, _entry: TtEntry) {}
    }

    /// Searches `fen` one ply below the root, where a single cache entry of the given bound is known for the position.
    fn search_with_bound(fen: &str, bound: Bound, stored: Eval, alpha: Eval, beta: Eval) -> Eval {
        let mut position = Position::new(fen).unwrap();
        let tt = SingleEntryCache { key: position.hash(), entry: TtEntry::new(Move::NONE, 8, bound, 1, stored) };
        let mut evaluator = MaterialEvaluator::default();
        let options = SearchOptions::default();
        let token = CancellationToken::new();

        let mut search = Search::new(&mut position, &tt, &mut evaluator, &options, &token);
        search.alpha_beta(1, 1, alpha, beta, &mut Vec::new(), true).unwrap()
    }

    /// Counts the nodes of a null window search of Kiwipete, five plies deep.
    fn null_window_nodes(options: SearchOptions) -> u64 {
        let mut position = Position::new(KIWIPETE).unwrap();
        let mut evaluator = MaterialEvaluator::default();
        let token = CancellationToken::new();

        let mut search = Search::new(&mut position, &NoopTable, &mut evaluator, &options, &token);
        search.alpha_beta(5, 1, Eval::new(0), Eval::new(1), &mut Vec::new(), true).unwrap();
        search.nodes()
    }

    fn search(fen: &str, limits: SearchLimits) -> Result<SearchResult, SearchError> {
        let mut position = Position::new(fen).unwrap();
        let mut evaluator = MaterialEvaluator::default();
        let options = SearchOptions::default();
        let token = CancellationToken::new();
        let tt = NoopTable;

        let result = Search::new(&mut position, &tt, &mut evaluator, &options, &token).run(limits);
        assert_eq!(position, Position::new(fen).unwrap());
        result
    }

    #[test]
    fn test_mvv_lva() {
        let pawn_takes_queen = Move::new_capture(Square::E4, Square::D5, Piece::WHITE_PAWN, Piece::BLACK_QUEEN);
        let queen_takes_queen = Move::new_capture(Square::D1, Square::D5, Piece::WHITE_QUEEN, Piece::BLACK_QUEEN);
        let pawn_takes_pawn = Move::new_capture(Square::E4, Square::D5, Piece::WHITE_PAWN, Piece::BLACK_PAWN);

        assert!(mvv_lva(pawn_takes_queen) > mvv_lva(queen_takes_queen));
        assert!(mvv_lva(queen_takes_queen) > mvv_lva(pawn_takes_pawn));
    }

    #[test]
    fn test_captures_hanging_queen() {
        let result = search("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1", SearchLimits::depth(3)).unwrap();

        let capture = Move::new_capture(Square::D1, Square::D5, Piece::WHITE_ROOK, Piece::BLACK_QUEEN);
        assert_eq!(result.best_move, Some(capture));
        assert!(result.score > Eval::new(300));
        assert_eq!(result.depth, 3);
        assert_eq!(result.pv.first().copied(), result.best_move);
    }

    #[test]
    fn test_stalemate_scores_draw() {
        let result = search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", SearchLimits::depth(4)).unwrap();

        assert_eq!(result.best_move, None);
        assert_eq!(result.score, Eval::DRAW);
        assert!(result.pv.is_empty());
    }

    #[test]
    fn test_cancelled_before_first_iteration() {
        let mut position = Position::startpos();
        let mut evaluator = MaterialEvaluator::default();
        let options = SearchOptions::default();
        let token = CancellationToken::new();
        token.cancel();

        let result =
            Search::new(&mut position, &NoopTable, &mut evaluator, &options, &token).run(SearchLimits::default());
        assert_eq!(result, Err(SearchError::Cancelled));
        assert_eq!(position, Position::startpos());
    }

    #[test]
    fn test_node_limit_returns_last_completed_iteration() {
        let result = search(crate::position::STARTING_POSITION, SearchLimits::nodes(5_000)).unwrap();

        assert!(result.best_move.is_some());
        assert!(result.depth >= 1);
        assert!(result.depth < MAX_DEPTH);
        assert!(result.nodes >= 5_000);
    }

    #[test]
    fn test_cancel_after() {
        let token = CancellationToken::new();
        token.cancel_after(Duration::from_millis(1)).join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_lower_bound_raises_alpha() {
        let score = search_with_bound(PAWN_DOWN, Bound::Lower, Eval::new(50), Eval::new(-100), Eval::new(100));
        assert_eq!(score, Eval::new(50));
    }

    #[test]
    fn test_upper_bound_lowers_beta() {
        let score = search_with_bound(PAWN_DOWN, Bound::Upper, Eval::new(-200), Eval::new(-300), Eval::new(300));
        assert_eq!(score, Eval::new(-200));
    }

    #[test]
    fn test_collapsed_window_returns_the_bound() {
        let score = search_with_bound(KIWIPETE, Bound::Lower, Eval::new(400), Eval::new(-100), Eval::new(100));
        assert_eq!(score, Eval::new(100));
    }

    #[test]
    fn test_late_move_reductions_prune_null_window_nodes() {
        let without_null_move = SearchOptions { null_move_pruning: false, ..SearchOptions::default() };
        let reduced = null_window_nodes(without_null_move.clone());
        let full = null_window_nodes(SearchOptions { late_move_reductions: false, ..without_null_move });

        assert!(reduced < full, "{reduced} nodes with reductions, {full} without");
    }

    #[test]
    fn test_null_move_prunes_null_window_nodes() {
        let without_reductions = SearchOptions { late_move_reductions: false, ..SearchOptions::default() };
        let pruned = null_window_nodes(without_reductions.clone());
        let full = null_window_nodes(SearchOptions { null_move_pruning: false, ..without_reductions });

        assert!(pruned < full, "{pruned} nodes with null move pruning, {full} without");
    }

    #[test]
    fn test_checking_moves_are_tagged() {
        let result = search("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1", SearchLimits::depth(2)).unwrap();

        assert_eq!(result.best_move.map(|mv| mv.to_string()).as_deref(), Some("d1d8"));
        assert!(result.best_move.is_some_and(|mv| mv.is_check()));
    }
}
