//! Empty-cell-aware reshuffling of placed blocks.
//!
//! An optional post-pass over a finished placement. The state is keyed by
//! position rather than block because the candidate list includes empty
//! cells: a move can push a block into an empty cell or swap two blocks.
//! Special block classes (memory, I/O, reserved, centroids) are pinned
//! and never touched.

use crate::anneal::AnnealState;
use crate::cost::{check_coverage, merged_positions, wirelength};
use crate::error::PlaceError;
use cgra_arch::{CellKind, Fabric};
use cgra_common::Pos;
use cgra_netlist::{BlockClass, BlockId, Netlist};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;

/// Block classes excluded from reshuffling by default.
pub const DEFAULT_EXCLUDED: [BlockClass; 4] = [
    BlockClass::Reserved,
    BlockClass::Memory,
    BlockClass::Io,
    BlockClass::Centroid,
];

/// An undoable de-block move.
#[derive(Debug, Clone)]
pub enum DeblockUndo {
    /// The blocks at the two positions were exchanged.
    Swap(Pos, Pos),
    /// A block moved from `from` into the previously empty `to`.
    Relocate {
        /// The cell the block left (now empty).
        from: Pos,
        /// The cell the block occupies now.
        to: Pos,
    },
}

/// Simulated-annealing reshuffler over a position-keyed state.
#[derive(Clone)]
pub struct DeblockPlacer<'f> {
    available: Vec<Pos>,
    netlist: Netlist,
    board_pos: BTreeMap<BlockId, Pos>,
    excluded: BTreeMap<BlockId, Pos>,
    state: BTreeMap<Pos, BlockId>,
    fabric: &'f dyn Fabric,
}

impl<'f> DeblockPlacer<'f> {
    /// Builds the reshuffler with the default excluded classes.
    pub fn new(
        block_pos: &BTreeMap<BlockId, Pos>,
        available: Vec<Pos>,
        netlist: &Netlist,
        board_pos: BTreeMap<BlockId, Pos>,
        fabric: &'f dyn Fabric,
    ) -> Result<Self, PlaceError> {
        Self::with_excluded(block_pos, available, netlist, board_pos, fabric, &DEFAULT_EXCLUDED)
    }

    /// Builds the reshuffler with an explicit excluded-class list.
    ///
    /// Centroid pseudo-blocks are always pinned regardless of the list.
    pub fn with_excluded(
        block_pos: &BTreeMap<BlockId, Pos>,
        mut available: Vec<Pos>,
        netlist: &Netlist,
        board_pos: BTreeMap<BlockId, Pos>,
        fabric: &'f dyn Fabric,
        exclude: &[BlockClass],
    ) -> Result<Self, PlaceError> {
        available.sort_unstable();
        available.dedup();
        if available.len() < block_pos.len() {
            return Err(PlaceError::InsufficientCells {
                needed: block_pos.len(),
                available: available.len(),
            });
        }

        let mut excluded = BTreeMap::new();
        let mut state = BTreeMap::new();
        for (&block, &pos) in block_pos {
            if exclude.contains(&block.class()) || block.class() == BlockClass::Centroid {
                excluded.insert(block, pos);
            } else {
                state.insert(pos, block);
            }
        }

        {
            let block_pos = &*block_pos;
            let board_pos = &board_pos;
            check_coverage(netlist, |block| {
                block_pos.contains_key(&block) || board_pos.contains_key(&block)
            })?;
        }

        Ok(Self {
            available,
            netlist: netlist.clone(),
            board_pos,
            excluded,
            state,
            fabric,
        })
    }

    /// Default legality: only PE and register blocks move, and only onto
    /// cells the fabric allows for logic.
    fn is_legal(&self, pos: Pos, block: BlockId) -> bool {
        matches!(block.class(), BlockClass::Pe | BlockClass::Reg)
            && self.fabric.is_cell_legal(pos, CellKind::Clb)
    }

    /// Reconstructs the `block -> position` map, pinned blocks included.
    pub fn block_positions(&self) -> BTreeMap<BlockId, Pos> {
        let mut result: BTreeMap<BlockId, Pos> = self
            .state
            .iter()
            .map(|(&pos, &block)| (block, pos))
            .collect();
        result.extend(self.excluded.iter().map(|(&block, &pos)| (block, pos)));
        result
    }
}

impl std::fmt::Debug for DeblockPlacer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeblockPlacer")
            .field("movable", &self.state.len())
            .field("excluded", &self.excluded.len())
            .finish()
    }
}

impl AnnealState for DeblockPlacer<'_> {
    type Undo = DeblockUndo;
    type Snapshot = BTreeMap<Pos, BlockId>;

    fn propose(&mut self, rng: &mut StdRng) -> Option<Self::Undo> {
        if self.available.len() < 2 {
            return None;
        }
        let first = rng.gen_range(0..self.available.len());
        let mut second = rng.gen_range(0..self.available.len() - 1);
        if second >= first {
            second += 1;
        }
        let pos1 = self.available[first];
        let pos2 = self.available[second];

        match (self.state.get(&pos1).copied(), self.state.get(&pos2).copied()) {
            (Some(block1), Some(block2)) => {
                if self.is_legal(pos2, block1) && self.is_legal(pos1, block2) {
                    self.state.insert(pos1, block2);
                    self.state.insert(pos2, block1);
                    Some(DeblockUndo::Swap(pos1, pos2))
                } else {
                    None
                }
            }
            (Some(block1), None) => {
                if self.is_legal(pos2, block1) {
                    self.state.remove(&pos1);
                    self.state.insert(pos2, block1);
                    Some(DeblockUndo::Relocate {
                        from: pos1,
                        to: pos2,
                    })
                } else {
                    None
                }
            }
            (None, Some(block2)) => {
                if self.is_legal(pos1, block2) {
                    self.state.remove(&pos2);
                    self.state.insert(pos1, block2);
                    Some(DeblockUndo::Relocate {
                        from: pos2,
                        to: pos1,
                    })
                } else {
                    None
                }
            }
            (None, None) => None,
        }
    }

    fn revert(&mut self, undo: Self::Undo) {
        match undo {
            DeblockUndo::Swap(pos1, pos2) => {
                let block1 = self.state[&pos1];
                let block2 = self.state[&pos2];
                self.state.insert(pos1, block2);
                self.state.insert(pos2, block1);
            }
            DeblockUndo::Relocate { from, to } => {
                if let Some(block) = self.state.remove(&to) {
                    self.state.insert(from, block);
                }
            }
        }
    }

    fn energy(&self) -> f64 {
        let mut positions = merged_positions(
            &self.board_pos,
            self.excluded.iter().map(|(&block, &pos)| (block, pos)),
        );
        for (&pos, &block) in &self.state {
            positions.insert(block, pos);
        }
        wirelength(&self.netlist, &positions)
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.state.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.state = snapshot;
    }
}
