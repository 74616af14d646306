use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread,
};

use thiserror::Error;

use crate::{
    move_gen::move_list::MoveList,
    position::{FenError, Position},
    r#move::Move,
};

/// Represents errors that can occur during perft (performance test) operations.
///
/// # Variants
/// * `InvalidFen(String, FenError)` - The provided FEN string was invalid, with the original FEN string and the
///   specific parsing error
#[derive(Error, Debug)]
pub enum PerftError {
    #[error("Invalid FEN ({0}): {1}")]
    InvalidFen(String, FenError),
}

/// Counts the leaf nodes of the legal move tree of a position, `depth` plies deep.
///
/// Moves are generated pseudo-legally and filtered by the legality gate of `make_move`. The position is restored
/// before returning.
pub fn perft(position: &mut Position, depth: u16) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::default();
    position.pseudo_moves(&mut moves);

    let mut nodes = 0;
    for mv in moves.iter() {
        let snapshot = position.snapshot();
        if position.make_move(mv) {
            nodes += if depth == 1 { 1 } else { perft(position, depth - 1) };
            position.unmake_move(mv, &snapshot);
        }
    }
    nodes
}

/// Counts the leaf nodes below each legal move of the position.
///
/// # Returns
/// One `(move, nodes)` pair per legal move, in generation order.
pub fn divide(position: &mut Position, depth: u16) -> Vec<(Move, u64)> {
    let mut moves = MoveList::default();
    position.pseudo_moves(&mut moves);

    let mut result = Vec::with_capacity(moves.len());
    for mv in moves.iter() {
        let snapshot = position.snapshot();
        if position.make_move(mv) {
            result.push((mv, perft(position, depth.saturating_sub(1))));
            position.unmake_move(mv, &snapshot);
        }
    }
    result
}

/// Same as `divide`, with the moves of the root distributed over `threads` worker threads. Each thread works on its
/// own copy of the position.
pub fn parallel_divide(position: &Position, depth: u16, threads: usize) -> Vec<(Move, u64)> {
    let root_moves = position.legal_moves();
    let next_index = AtomicUsize::new(0);
    let results = Mutex::new(Vec::with_capacity(root_moves.len()));

    thread::scope(|scope| {
        for _ in 0..threads.max(1) {
            scope.spawn(|| {
                let mut thread_position = position.clone();
                loop {
                    let index = next_index.fetch_add(1, Ordering::Relaxed);
                    let Some(mv) = root_moves.iter().nth(index) else {
                        break;
                    };

                    let snapshot = thread_position.snapshot();
                    thread_position.make_move(mv);
                    let nodes = perft(&mut thread_position, depth.saturating_sub(1));
                    thread_position.unmake_move(mv, &snapshot);

                    if let Ok(mut results) = results.lock() {
                        results.push((index, mv, nodes));
                    }
                }
            });
        }
    });

    let mut results = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    results.sort_by_key(|(index, _, _)| *index);
    results.into_iter().map(|(_, mv, nodes)| (mv, nodes)).collect()
}

/// Parses a FEN string and counts the leaf nodes of its legal move tree, `depth` plies deep.
///
/// # Errors
/// * `InvalidFen` - If the FEN string cannot be parsed
pub fn perft_fen(fen: &str, depth: u16) -> Result<u64, PerftError> {
    let mut position = Position::new(fen).map_err(|e| PerftError::InvalidFen(fen.to_string(), e))?;
    Ok(perft(&mut position, depth))
}
