//! Per-cluster detailed placement.
//!
//! Places the blocks of one cluster onto the cluster's concrete cell set.
//! In fold-register mode a cell may hold up to two blocks — one
//! processing element and one register — subject to the register-net
//! rule: a register may not share a cell with a PE that appears in any of
//! the register's nets. Without folding, the placer is a pure swap anneal
//! over exactly-sized position lists.

use crate::anneal::AnnealState;
use crate::cost::{check_coverage, merged_positions, wirelength};
use crate::error::PlaceError;
use cgra_common::Pos;
use cgra_netlist::{BlockId, Netlist};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// An undoable detailed-placement move.
#[derive(Debug, Clone)]
pub enum DetailedUndo {
    /// One block moved; the payload is its previous position.
    Move(BlockId, Pos),
    /// Two blocks exchanged positions.
    Swap(BlockId, BlockId),
}

/// Simulated-annealing placer for the blocks of a single cluster.
///
/// The netlist must already be reduced to this cluster's scope: blocks of
/// other clusters replaced by their centroid pseudo-blocks, which are
/// pinned in `board_pos` along with I/O and memory tiles.
#[derive(Clone)]
pub struct DetailedPlacer {
    blocks: Vec<BlockId>,
    available: Vec<Pos>,
    netlist: Netlist,
    board_pos: BTreeMap<BlockId, Pos>,
    reg_no_pos: BTreeMap<BlockId, BTreeSet<BlockId>>,
    state: BTreeMap<BlockId, Pos>,
    fold_reg: bool,
}

impl DetailedPlacer {
    /// Builds the placer and computes the round-robin initial placement.
    pub fn new(
        mut blocks: Vec<BlockId>,
        mut available: Vec<Pos>,
        netlist: &Netlist,
        board_pos: BTreeMap<BlockId, Pos>,
        fold_reg: bool,
    ) -> Result<Self, PlaceError> {
        blocks.sort_unstable();
        blocks.dedup();
        available.sort_unstable();
        available.dedup();

        if fold_reg {
            let pe = blocks.iter().filter(|b| b.is_pe()).count();
            let reg = blocks.iter().filter(|b| b.is_reg()).count();
            if pe > available.len() || reg > available.len() {
                return Err(PlaceError::InsufficientCells {
                    needed: pe.max(reg),
                    available: available.len(),
                });
            }
        } else if blocks.len() != available.len() {
            return Err(PlaceError::InsufficientCells {
                needed: blocks.len(),
                available: available.len(),
            });
        }

        {
            let blocks = &blocks;
            let board_pos = &board_pos;
            check_coverage(netlist, |block| {
                blocks.binary_search(&block).is_ok() || board_pos.contains_key(&block)
            })?;
        }

        // For each register in this cluster, the set of in-cluster peers
        // across all of its nets; the register may not sit on top of any
        // of them.
        let mut reg_no_pos: BTreeMap<BlockId, BTreeSet<BlockId>> = BTreeMap::new();
        if fold_reg {
            for (_net, members) in netlist.iter() {
                for &block in members {
                    if !block.is_reg() || blocks.binary_search(&block).is_err() {
                        continue;
                    }
                    let peers = reg_no_pos.entry(block).or_default();
                    for &other in members {
                        if other != block && blocks.binary_search(&other).is_ok() {
                            peers.insert(other);
                        }
                    }
                }
            }
        }

        let mut placer = Self {
            blocks,
            available,
            netlist: netlist.clone(),
            board_pos,
            reg_no_pos,
            state: BTreeMap::new(),
            fold_reg,
        };
        placer.state = placer.init_placement()?;
        Ok(placer)
    }

    /// Round-robin initial placement, PEs first.
    ///
    /// A position accepts a new occupant only if it holds fewer than two
    /// blocks, the occupant is of a different class, and the register-net
    /// rule passes. The attempt bound turns an unsatisfiable instance
    /// into an error instead of spinning forever.
    fn init_placement(&self) -> Result<BTreeMap<BlockId, Pos>, PlaceError> {
        let pes = self.blocks.iter().copied().filter(|b| b.is_pe());
        let others = self.blocks.iter().copied().filter(|b| !b.is_pe());
        let total: Vec<BlockId> = pes.chain(others).collect();

        let num_pos = self.available.len();
        if num_pos == 0 {
            if total.is_empty() {
                return Ok(BTreeMap::new());
            }
            return Err(PlaceError::InsufficientCells {
                needed: total.len(),
                available: 0,
            });
        }

        let mut board: BTreeMap<Pos, Vec<BlockId>> = BTreeMap::new();
        let mut state = BTreeMap::new();
        let mut pos_index = 0usize;
        let mut index = 0usize;
        let limit = 2 * num_pos * total.len() + num_pos;
        let mut attempts = 0usize;

        while index < total.len() {
            attempts += 1;
            if attempts > limit {
                return Err(PlaceError::InsufficientCells {
                    needed: total.len(),
                    available: num_pos,
                });
            }
            let block = total[index];
            let pos = self.available[pos_index % num_pos];
            pos_index += 1;

            let occupants = board.entry(pos).or_default();
            if occupants.len() > 1 {
                continue;
            }
            if let Some(&first) = occupants.first() {
                if first.class() == block.class() {
                    continue;
                }
                let conflict = if block.is_pe() && first.is_reg() {
                    self.reg_conflicts(first, block)
                } else if block.is_reg() && first.is_pe() {
                    self.reg_conflicts(block, first)
                } else {
                    false
                };
                if conflict {
                    continue;
                }
            }
            occupants.push(block);
            state.insert(block, pos);
            index += 1;
        }
        Ok(state)
    }

    /// Whether register `reg` is excluded from sharing a cell with `pe`.
    fn reg_conflicts(&self, reg: BlockId, pe: BlockId) -> bool {
        self.reg_no_pos
            .get(&reg)
            .is_some_and(|peers| peers.contains(&pe))
    }

    /// Register-net rule at `pos` for an incoming block, against the
    /// current occupants.
    fn reg_net_ok(&self, pos: Pos, block: BlockId, board: &BTreeMap<Pos, Vec<BlockId>>) -> bool {
        let Some(occupants) = board.get(&pos) else {
            return true;
        };
        if block.is_pe() {
            if let Some(&reg) = occupants.iter().find(|b| b.is_reg()) {
                if self.reg_conflicts(reg, block) {
                    return false;
                }
            }
        } else if block.is_reg() {
            if let Some(&pe) = occupants.iter().find(|b| b.is_pe()) {
                if self.reg_conflicts(block, pe) {
                    return false;
                }
            }
        }
        true
    }

    /// Fold-mode legality: occupancy below two, opposite class, and the
    /// register-net rule.
    fn is_legal_fold(&self, pos: Pos, block: BlockId, board: &BTreeMap<Pos, Vec<BlockId>>) -> bool {
        let occupants = match board.get(&pos) {
            Some(occupants) if !occupants.is_empty() => occupants,
            _ => return true,
        };
        if occupants.len() > 1 {
            return false;
        }
        if occupants[0].class() == block.class() {
            return false;
        }
        self.reg_net_ok(pos, block, board)
    }

    /// The current block assignment.
    pub fn state(&self) -> &BTreeMap<BlockId, Pos> {
        &self.state
    }

    /// Consumes the placer, returning the final assignment.
    pub fn into_state(self) -> BTreeMap<BlockId, Pos> {
        self.state
    }

    /// Rebuilds the position-to-blocks view of the current state.
    fn occupancy_board(&self) -> BTreeMap<Pos, Vec<BlockId>> {
        let mut board: BTreeMap<Pos, Vec<BlockId>> = BTreeMap::new();
        for (&block, &pos) in &self.state {
            board.entry(pos).or_default().push(block);
        }
        board
    }
}

impl std::fmt::Debug for DetailedPlacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailedPlacer")
            .field("blocks", &self.blocks.len())
            .field("available", &self.available.len())
            .field("fold_reg", &self.fold_reg)
            .finish()
    }
}

impl AnnealState for DetailedPlacer {
    type Undo = DetailedUndo;
    type Snapshot = BTreeMap<BlockId, Pos>;

    fn propose(&mut self, rng: &mut StdRng) -> Option<Self::Undo> {
        if self.blocks.is_empty() || self.available.is_empty() {
            return None;
        }
        if self.fold_reg {
            let board = self.occupancy_board();
            let block = self.blocks[rng.gen_range(0..self.blocks.len())];
            let block_pos = self.state[&block];
            let pos = self.available[rng.gen_range(0..self.available.len())];
            if pos == block_pos {
                return None;
            }
            if self.is_legal_fold(pos, block, &board) {
                self.state.insert(block, pos);
                return Some(DetailedUndo::Move(block, block_pos));
            }
            // The cell is full or same-class: try swapping with its
            // single same-class occupant.
            let occupants = board.get(&pos)?;
            let mut same_class = occupants.iter().copied().filter(|b| b.class() == block.class());
            let other = same_class.next()?;
            if same_class.next().is_some() {
                return None;
            }
            if self.reg_net_ok(pos, block, &board) && self.reg_net_ok(block_pos, other, &board) {
                self.state.insert(block, pos);
                self.state.insert(other, block_pos);
                return Some(DetailedUndo::Swap(block, other));
            }
            None
        } else {
            let a = self.blocks[rng.gen_range(0..self.blocks.len())];
            let b = self.blocks[rng.gen_range(0..self.blocks.len())];
            if a == b {
                return None;
            }
            let pos_a = self.state[&a];
            let pos_b = self.state[&b];
            self.state.insert(a, pos_b);
            self.state.insert(b, pos_a);
            Some(DetailedUndo::Swap(a, b))
        }
    }

    fn revert(&mut self, undo: Self::Undo) {
        match undo {
            DetailedUndo::Move(block, old) => {
                self.state.insert(block, old);
            }
            DetailedUndo::Swap(a, b) => {
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
