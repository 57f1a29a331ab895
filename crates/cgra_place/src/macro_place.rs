//! Swap-only placement for fixed sets of macro blocks.
//!
//! Macro blocks (memory tiles, I/O groups) have a fixed count and a
//! caller-supplied legality predicate. The move either relocates a block
//! to an empty candidate position or swaps it with the occupant.

use crate::anneal::AnnealState;
use crate::cost::{check_coverage, merged_positions, wirelength};
use crate::error::PlaceError;
use cgra_common::Pos;
use cgra_netlist::{BlockId, Netlist};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Caller-supplied legality predicate: may `block` sit at `pos`?
pub type MacroLegality = Arc<dyn Fn(Pos, BlockId) -> bool + Send + Sync>;

/// An undoable macro-placement move.
#[derive(Debug, Clone)]
pub enum MacroUndo {
    /// One block moved; the payload is its previous position.
    Move(BlockId, Pos),
    /// Two blocks exchanged positions.
    Swap(BlockId, BlockId),
}

/// Simulated-annealing placer for macro blocks.
#[derive(Clone)]
pub struct MacroPlacer {
    blocks: Vec<BlockId>,
    available: Vec<Pos>,
    netlist: Netlist,
    board_pos: BTreeMap<BlockId, Pos>,
    state: BTreeMap<BlockId, Pos>,
    is_legal: MacroLegality,
}

impl MacroPlacer {
    /// Builds the placer from an existing assignment.
    pub fn new(
        current_state: BTreeMap<BlockId, Pos>,
        mut available: Vec<Pos>,
        netlist: &Netlist,
        board_pos: BTreeMap<BlockId, Pos>,
        is_legal: MacroLegality,
    ) -> Result<Self, PlaceError> {
        available.sort_unstable();
        available.dedup();
        if current_state.len() > available.len() {
            return Err(PlaceError::InsufficientCells {
                needed: current_state.len(),
                available: available.len(),
            });
        }
        {
            let state = &current_state;
            let board_pos = &board_pos;
            check_coverage(netlist, |block| {
                state.contains_key(&block) || board_pos.contains_key(&block)
            })?;
        }
        let blocks: Vec<BlockId> = current_state.keys().copied().collect();
        Ok(Self {
            blocks,
            available,
            netlist: netlist.clone(),
            board_pos,
            state: current_state,
            is_legal,
        })
    }

    /// The current block assignment.
    pub fn state(&self) -> &BTreeMap<BlockId, Pos> {
        &self.state
    }

    /// Consumes the placer, returning the final assignment.
    pub fn into_state(self) -> BTreeMap<BlockId, Pos> {
        self.state
    }
}

impl std::fmt::Debug for MacroPlacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroPlacer")
            .field("blocks", &self.blocks.len())
            .field("available", &self.available.len())
            .finish()
    }
}

impl AnnealState for MacroPlacer {
    type Undo = MacroUndo;
    type Snapshot = BTreeMap<BlockId, Pos>;

    fn propose(&mut self, rng: &mut StdRng) -> Option<Self::Undo> {
        if self.blocks.is_empty() || self.available.is_empty() {
            return None;
        }
        let target = self.blocks[rng.gen_range(0..self.blocks.len())];
        let target_pos = self.state[&target];
        let dst = self.available[rng.gen_range(0..self.available.len())];
        if dst == target_pos {
            return None;
        }

        let occupant = self
            .state
            .iter()
            .find(|(_, &pos)| pos == dst)
            .map(|(&block, _)| block);

        match occupant {
            Some(other) => {
                if (self.is_legal)(dst, target) && (self.is_legal)(target_pos, other) {
                    self.state.insert(target, dst);
                    self.state.insert(other, target_pos);
                    Some(MacroUndo::Swap(target, other))
                } else {
                    None
                }
            }
            None => {
                if (self.is_legal)(dst, target) {
                    self.state.insert(target, dst);
                    Some(MacroUndo::Move(target, target_pos))
                } else {
                    None
                }
            }
        }
    }

    fn revert(&mut self, undo: Self::Undo) {
        match undo {
            MacroUndo::Move(block, old) => {
                self.state.insert(block, old);
            }
            MacroUndo::Swap(a, b) => {
                let pos_a = self.state[&a];
                let pos_b = self.state[&b];
                self.state.insert(a, pos_b);
                self.state.insert(b, pos_a);
            }
        }
    }

    fn energy(&self) -> f64 {
        let positions = merged_positions(
            &self.board_pos,
            self.state.iter().map(|(&block, &pos)| (block, pos)),
        );
        wirelength(&self.netlist, &positions)
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.state.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.state = snapshot;
    }
}
