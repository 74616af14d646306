use serde::Deserialize;

/// Tuning of the selective depth reductions of the search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Depth reduction, in plies, of the null-move search on top of the skipped ply.
    pub null_move_reduction: u8,

    /// Minimum remaining depth for null-move pruning to be tried.
    pub null_move_min_depth: u8,

    /// Minimum remaining depth for late move reductions to be applied.
    pub lmr_min_depth: u8,

    /// Number of legal moves searched at a node before later quiet moves are reduced.
    pub lmr_min_move_index: u8,

    /// Enables null-move pruning.
    pub null_move_pruning: bool,

    /// Enables late move reductions.
    pub late_move_reductions: bool,
}

impl Default for SearchOptions {
    /// Provides default values for search options.
    fn default() -> Self {
        Self {
            null_move_reduction: 2,
            null_move_min_depth: 3,
            lmr_min_depth: 3,
            lmr_min_move_index: 4,
            null_move_pruning: true,
            late_move_reductions: true,
        }
    }
}

impl SearchOptions {
    /// Returns options with every selective reduction disabled. Searches using them visit the full alpha-beta tree.
    pub fn exhaustive() -> Self {
        Self { null_move_pruning: false, late_move_reductions: false, ..Self::default() }
    }
}
