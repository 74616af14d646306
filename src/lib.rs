use std::sync::Once;

pub mod bitboard;
pub mod board;
pub mod book;
pub mod config;
pub mod coordinates;
pub mod engine;
pub mod eval;
pub mod killers;
pub mod r#move;
pub mod move_gen;
pub mod notation;
pub mod options;
pub mod pawn_table;
pub mod perft;
pub mod piece;
pub mod position;
pub mod search;
pub mod tt;
pub mod zobrist;

static INIT: Once = Once::new();

/// Builds the process-wide tables (between squares, Zobrist keys, attack tables and magics) eagerly.
///
/// The tables are otherwise built lazily on first use; calling this function moves that cost to a predictable point.
pub fn initialize() {
    INIT.call_once(|| {
        bitboard::initialize();
        zobrist::initialize();
        move_gen::attacks::initialize();
        log::debug!("Global tables initialized");
    });
}
