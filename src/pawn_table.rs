use crate::{eval::EvalPair, zobrist::Zobrist};

#[derive(Clone, Copy, Debug, Default)]
struct PawnEntry {
    key: Zobrist,
    eval: EvalPair,
}

/// A cache of pawn structure evaluations, indexed by the pawn-only Zobrist hash.
///
/// The table is direct-mapped: each key has a single slot and a newer entry always overwrites the older one. A slot
/// with a zero key is empty, so the position without any pawn is never cached.
#[derive(Debug)]
pub struct PawnTable {
    entries: Box<[PawnEntry]>,
    mask: usize,
}

impl PawnTable {
    /// Default number of entries of the pawn table.
    pub const DEFAULT_ENTRIES: usize = 16384;

    /// Creates a pawn table.
    ///
    /// # Parameters
    /// * `entries` - The number of entries. It is rounded down to a power of two, with a minimum of one entry.
    pub fn new(entries: usize) -> Self {
        let capacity = 1usize << (usize::BITS - 1 - entries.max(1).leading_zeros());
        PawnTable { entries: vec![PawnEntry::default(); capacity].into_boxed_slice(), mask: capacity - 1 }
    }

    /// Returns the number of entries of the table.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the cached evaluation of the pawn structure with the given hash, if present.
    pub fn get(&self, key: Zobrist) -> Option<EvalPair> {
        let entry = &self.entries[key as usize & self.mask];
        (key != 0 && entry.key == key).then_some(entry.eval)
    }

    /// Stores the evaluation of the pawn structure with the given hash, replacing whatever was in its slot.
    pub fn set(&mut self, key: Zobrist, eval: EvalPair) {
        self.entries[key as usize & self.mask] = PawnEntry { key, eval };
    }

    /// Empties the table.
    pub fn clear(&mut self) {
        self.entries.fill(PawnEntry::default());
    }
}
