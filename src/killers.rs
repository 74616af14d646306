use crate::r#move::Move;

/// The deepest ply for which killer moves are kept.
pub const MAX_PLY: usize = 128;

/// Number of killer moves kept per ply.
const KILLERS_PER_PLY: usize = 2;

/// Quiet moves that recently caused a beta cutoff, indexed by the ply at which they did.
///
/// Each ply holds up to two distinct moves, the most recent one first. Plies at or beyond `MAX_PLY` hold nothing.
#[derive(Debug, Clone)]
pub struct KillerList {
    killers: [[Move; KILLERS_PER_PLY]; MAX_PLY],
}

impl Default for KillerList {
    fn default() -> Self {
        KillerList { killers: [[Move::NONE; KILLERS_PER_PLY]; MAX_PLY] }
    }
}

impl KillerList {
    /// Records a quiet move that caused a beta cutoff at `ply`.
    ///
    /// A move that is already the most recent killer of the ply is left in place, so both slots never hold the same
    /// move.
    pub fn record(&mut self, ply: usize, mv: Move) {
        let Some(slots) = self.killers.get_mut(ply) else {
            return;
        };

        if slots[0] != mv {
            slots[1] = slots[0];
            slots[0] = mv.without_check();
        }
    }

    /// Returns the killer moves of a ply, most recent first. Empty slots hold `Move::NONE`.
    pub fn get(&self, ply: usize) -> [Move; KILLERS_PER_PLY] {
        self.killers.get(ply).copied().unwrap_or([Move::NONE; KILLERS_PER_PLY])
    }

    /// Returns the slot index of `mv` among the killers of `ply`, if it is one of them.
    pub fn position(&self, ply: usize, mv: Move) -> Option<usize> {
        self.get(ply).iter().position(|&killer| !killer.is_none() && killer == mv)
    }

    /// Forgets every killer move.
    pub fn clear(&mut self) {
        self.killers.fill([Move::NONE; KILLERS_PER_PLY]);
    }
}
