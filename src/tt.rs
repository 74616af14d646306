use std::{
    cmp::min,
    mem,
    sync::atomic::{AtomicU64, AtomicU8, Ordering},
};

use crate::{eval::Eval, r#move::Move, zobrist::Zobrist};

pub type Generation = u8;

/// Kind of evaluation stored in a transposition table entry.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    /// The entry contains an exact evaluation.
    Exact = 0,

    /// The entry contains a lower bound for the evaluation: the search failed high.
    Lower = 1,

    /// The entry contains an upper bound for the evaluation: the search failed low.
    Upper = 2,
}

//======================================================================================================================
// TtEntry implementation
//======================================================================================================================

/// The result of searching a position, as stored in a transposition cache.
///
/// Mate scores are stored relative to the node that stores them rather than to the root, so an entry can be reused at
/// another distance from the root.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TtEntry {
    mv: Move,
    depth: u8,
    bound: Bound,
    eval: Eval,
}

impl TtEntry {
    const MOVE_SIZE: usize = 32;
    const EVAL_SIZE: usize = 16;
    const DEPTH_SIZE: usize = 8;
    const BOUND_SIZE: usize = 2;
    const GENERATION_SIZE: usize = 6;

    const MOVE_OFFSET: usize = 0;
    const EVAL_OFFSET: usize = Self::MOVE_OFFSET + Self::MOVE_SIZE;
    const DEPTH_OFFSET: usize = Self::EVAL_OFFSET + Self::EVAL_SIZE;
    const BOUND_OFFSET: usize = Self::DEPTH_OFFSET + Self::DEPTH_SIZE;
    const GENERATION_OFFSET: usize = Self::BOUND_OFFSET + Self::BOUND_SIZE;

    /// Creates a new entry.
    ///
    /// # Parameters
    /// * `mv` - Best move found for this position, `Move::NONE` if there is none
    /// * `depth` - Remaining depth the position was searched at
    /// * `bound` - Kind of evaluation
    /// * `ply` - Distance from the root of the node storing the entry (used for mate score adjustments)
    /// * `eval` - Evaluation relative to the root
    pub fn new(mv: Move, depth: u8, bound: Bound, ply: u16, eval: Eval) -> Self {
        TtEntry { mv: mv.without_check(), depth, bound, eval: eval.remove_ply_from_mat(ply) }
    }

    /// Returns the best move of the entry, if any.
    pub fn mv(&self) -> Option<Move> {
        (!self.mv.is_none()).then_some(self.mv)
    }

    /// Returns the remaining depth the position was searched at.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Returns the kind of evaluation stored in the entry.
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Returns the evaluation of the entry, adjusted for a node `ply` plies below the root.
    pub fn eval(&self, ply: u16) -> Eval {
        self.eval.add_ply_to_mat(ply)
    }

    fn pack(&self, generation: Generation) -> u64 {
        debug_assert!((generation as u64) < (1u64 << Self::GENERATION_SIZE));

        (self.mv.data() as u64) << Self::MOVE_OFFSET
            | (i16::from(self.eval) as u16 as u64) << Self::EVAL_OFFSET
            | (self.depth as u64) << Self::DEPTH_OFFSET
            | (self.bound as u8 as u64) << Self::BOUND_OFFSET
            | (generation as u64) << Self::GENERATION_OFFSET
    }

    fn unpack(data: u64) -> (Self, Generation) {
        let field = |offset: usize, size: usize| (data >> offset) & ((1u64 << size) - 1);

        let bound = match field(Self::BOUND_OFFSET, Self::BOUND_SIZE) {
            0 => Bound::Exact,
            1 => Bound::Lower,
            _ => Bound::Upper,
        };
        let entry = TtEntry {
            mv: Move::from_data(field(Self::MOVE_OFFSET, Self::MOVE_SIZE) as u32),
            depth: field(Self::DEPTH_OFFSET, Self::DEPTH_SIZE) as u8,
            bound,
            eval: Eval::from(field(Self::EVAL_OFFSET, Self::EVAL_SIZE) as u16 as i16),
        };

        (entry, field(Self::GENERATION_OFFSET, Self::GENERATION_SIZE) as Generation)
    }
}

//======================================================================================================================
// TranspositionCache trait and implementations
//======================================================================================================================

/// A store of search results keyed by position hash.
///
/// Stores may be dropped and entries may be evicted at any time, so a miss says nothing about what was stored before.
pub trait TranspositionCache: Send + Sync {
    /// Returns the entry stored for `key`, if still present.
    fn get(&self, key: Zobrist) -> Option<TtEntry>;

    /// Stores an entry for `key`. The cache may ignore the request.
    fn set(&self, key: Zobrist, entry: TtEntry);

    /// Signals the start of a new search, so entries of older searches can be replaced first.
    fn new_search(&self) {}

    /// Removes every entry.
    fn clear(&mut self) {}
}

/// A transposition cache that stores nothing. Searches using it are deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTable;

impl TranspositionCache for NoopTable {
    fn get(&self, _key: Zobrist) -> Option<TtEntry> {
        None
    }

    fn set(&self, _key: Zobrist, _entry: TtEntry) {}
}

/// A slot of the table. The key is stored xor-ed with the data, so a slot torn by concurrent writes does not match its
/// key anymore and reads as a miss.
#[derive(Default)]
struct Slot {
    checked_key: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    fn load(&self) -> (Zobrist, u64) {
        let data = self.data.load(Ordering::Relaxed);
        (self.checked_key.load(Ordering::Relaxed) ^ data, data)
    }

    fn store(&self, key: Zobrist, data: u64) {
        self.data.store(data, Ordering::Relaxed);
        self.checked_key.store(key ^ data, Ordering::Relaxed);
    }
}

/// A bounded, direct-mapped transposition table that can be shared between threads without locking.
pub struct TranspositionTable {
    slots: Box<[Slot]>,
    mask: usize,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Default size of the transposition table in megabytes.
    pub const DEFAULT_MB_SIZE: usize = 16;

    const GENERATION_MASK: u8 = (1 << TtEntry::GENERATION_SIZE) - 1;

    /// Creates a new transposition table using at most `megabytes` MiB. The number of slots is rounded down to a power
    /// of 2, with a minimum of one slot.
    pub fn new(megabytes: usize) -> Self {
        let slots = (megabytes * 1024 * 1024 / mem::size_of::<Slot>()).max(1);
        let capacity = 1usize << (usize::BITS - 1 - slots.leading_zeros());

        let mut vec = Vec::with_capacity(capacity);
        vec.resize_with(capacity, Slot::default);
        log::info!("Transposition table allocated: {megabytes} MiB, {capacity} entries");

        TranspositionTable { slots: vec.into_boxed_slice(), mask: capacity - 1, generation: AtomicU8::new(0) }
    }

    /// Replaces the table with an empty one of the given size.
    pub fn resize(&mut self, megabytes: usize) {
        *self = Self::new(megabytes);
    }

    /// Returns the number of slots of the table.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the current generation of the transposition table.
    pub fn read_generation(&self) -> Generation {
        self.generation.load(Ordering::Acquire)
    }

    /// Calculates an approximate load factor of the transposition table.
    ///
    /// Samples up to the first 1024 slots and counts those holding an entry of the current generation.
    ///
    /// # Returns
    /// A value between 0.0 and 1.0.
    pub fn load_factor(&self) -> f64 {
        let max_index = min(self.slots.len(), 1024);
        let generation = self.read_generation();
        let used_count = self.slots[..max_index]
            .iter()
            .filter(|slot| {
                let (_, data) = slot.load();
                data != 0 && TtEntry::unpack(data).1 == generation
            })
            .count();

        used_count as f64 / max_index as f64
    }

    fn slot(&self, key: Zobrist) -> &Slot {
        &self.slots[(key as usize) & self.mask]
    }
}

impl TranspositionCache for TranspositionTable {
    fn get(&self, key: Zobrist) -> Option<TtEntry> {
        let (stored_key, data) = self.slot(key).load();
        (data != 0 && stored_key == key).then(|| TtEntry::unpack(data).0)
    }

    /// Stores an entry. An entry of the current search is only replaced by one searched at least as deep.
    fn set(&self, key: Zobrist, entry: TtEntry) {
        debug_assert!(key != 0, "Cannot store an entry with a zero key");

        let slot = self.slot(key);
        let generation = self.read_generation();
        let (_, data) = slot.load();
        let (original, original_generation) = TtEntry::unpack(data);

        if data == 0 || original_generation != generation || original.depth() <= entry.depth() {
            slot.store(key, entry.pack(generation));
        }
    }

    fn new_search(&self) {
        let _ = self.generation.fetch_update(Ordering::AcqRel, Ordering::Acquire, |generation| {
            Some(generation.wrapping_add(1) & Self::GENERATION_MASK)
        });
    }

    fn clear(&mut self) {
        for slot in self.slots.iter() {
            slot.store(0, 0);
        }
        self.generation.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coordinates::Square, piece::Piece};

    fn promotion() -> Move {
        Move::new_capture_promotion(Square::H7, Square::G8, Piece::WHITE_PAWN, Piece::BLACK_KNIGHT, Piece::WHITE_QUEEN)
    }

    #[test]
    fn test_slot_size() {
        assert_eq!(std::mem::size_of::<Slot>(), 16);
    }

    #[test]
    fn test_data_total_size() {
        let total_size = TtEntry::MOVE_SIZE
            + TtEntry::EVAL_SIZE
            + TtEntry::DEPTH_SIZE
            + TtEntry::BOUND_SIZE
            + TtEntry::GENERATION_SIZE;
        assert_eq!(total_size, 64);
    }

    #[test]
    fn test_pack_and_unpack() {
        let entry = TtEntry::new(promotion(), 8, Bound::Lower, 4, -Eval::new_mat(12));
        let (unpacked, generation) = TtEntry::unpack(entry.pack(42));

        assert_eq!(unpacked, entry);
        assert_eq!(generation, 42);
        assert_eq!(unpacked.mv(), Some(promotion()));
        assert_eq!(unpacked.eval(4), -Eval::new_mat(12));
    }

    #[test]
    fn test_mate_score_is_relative_to_the_storing_node() {
        // A mate found 12 plies from the root by a node 4 plies deep is a mate in 8 plies from that node.
        let entry = TtEntry::new(Move::NONE, 3, Bound::Exact, 4, Eval::new_mat(12));
        assert_eq!(entry.eval(0), Eval::new_mat(8));
        assert_eq!(entry.eval(6), Eval::new_mat(14));
        assert_eq!(entry.mv(), None);
    }

    #[test]
    fn test_get_and_set() {
        let table = TranspositionTable::new(1);
        let entry = TtEntry::new(promotion(), 5, Bound::Exact, 0, Eval::new(37));

        assert_eq!(table.get(0xDEADBEEF), None);
        table.set(0xDEADBEEF, entry);
        assert_eq!(table.get(0xDEADBEEF), Some(entry));

        // Same slot, another key.
        let other_key = 0xDEADBEEF + table.capacity() as u64;
        assert_eq!(table.get(other_key), None);
    }

    #[test]
    fn test_replacement() {
        let table = TranspositionTable::new(1);
        let key = 0x1234_5678;
        let deep = TtEntry::new(promotion(), 9, Bound::Exact, 0, Eval::new(10));
        let shallow = TtEntry::new(Move::NONE, 2, Bound::Upper, 0, Eval::new(-10));

        table.set(key, deep);
        table.set(key, shallow);
        assert_eq!(table.get(key), Some(deep));

        // Entries of a previous search are always replaced.
        table.new_search();
        table.set(key, shallow);
        assert_eq!(table.get(key), Some(shallow));
    }

    #[test]
    fn test_generation_wraps() {
        let table = TranspositionTable::new(1);
        for _ in 0..64 {
            table.new_search();
        }
        assert_eq!(table.read_generation(), 0);
    }

    #[test]
    fn test_clear_and_load_factor() {
        let mut table = TranspositionTable::new(1);
        for key in 1..=512u64 {
            table.set(key, TtEntry::new(Move::NONE, 1, Bound::Exact, 0, Eval::new(1)));
        }
        assert_eq!(table.load_factor(), 0.5);

        table.clear();
        assert_eq!(table.load_factor(), 0.0);
        assert_eq!(table.get(1), None);
    }

    #[test]
    fn test_resize() {
        let mut table = TranspositionTable::new(1);
        assert_eq!(table.capacity(), 65536);

        table.set(7, TtEntry::new(Move::NONE, 1, Bound::Exact, 0, Eval::new(1)));
        table.resize(2);
        assert_eq!(table.capacity(), 131072);
        assert_eq!(table.get(7), None);
    }

    #[test]
    fn test_noop_table() {
        let table = NoopTable;
        table.set(1, TtEntry::new(promotion(), 1, Bound::Exact, 0, Eval::new(1)));
        assert_eq!(table.get(1), None);
    }
}
