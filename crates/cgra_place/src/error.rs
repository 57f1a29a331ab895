//! Error types for the placement engine.

use cgra_common::{InternalError, Pos};
use cgra_netlist::{BlockId, ClusterId};

/// Errors produced by the placement engine.
///
/// [`CapacityExhausted`](Self::CapacityExhausted) is the only recoverable
/// failure: initial cluster packing cycled without finding room, and the
/// caller is expected to reduce the cluster count and retry. Everything
/// else indicates a broken caller contract or an algorithmic regression.
#[derive(Debug, thiserror::Error)]
pub enum PlaceError {
    /// Initial cluster packing revisited a position before placing the
    /// named cluster; the board cannot fit the current cluster set.
    #[error("cluster packing ran out of board capacity at cluster {0}")]
    CapacityExhausted(ClusterId),

    /// The free-space fallback could not find enough unoccupied legal
    /// cells anywhere on the board.
    #[error("no free region of {needed} cells left on the fabric")]
    NoSpace {
        /// Number of cells that were needed.
        needed: usize,
    },

    /// A post-squeeze occupancy check found a cell claimed by more than
    /// one cluster.
    #[error("cell {0} is assigned to more than one cluster")]
    Overlap(Pos),

    /// The netlist references a block that is neither placed nor pinned.
    #[error("netlist references block {0} with no known position")]
    MissingBlock(BlockId),

    /// A placer was handed fewer candidate cells than it needs.
    #[error("placement needs {needed} cells but only {available} are available")]
    InsufficientCells {
        /// Number of cells required.
        needed: usize,
        /// Number of cells actually provided.
        available: usize,
    },

    /// An internal invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
