//! The `check` subcommand: verify a finished placement.

use crate::design::DesignFile;
use cgra_arch::{CellKind, Fabric};
use cgra_common::Pos;
use cgra_netlist::{total_hpwl, BlockClass, BlockId};
use std::collections::BTreeMap;
use std::path::Path;

/// Loads a placement map produced by the `place` subcommand.
pub fn load_placement(path: &Path) -> Result<BTreeMap<BlockId, Pos>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read placement {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse placement {}: {e}", path.display()))
}

/// Verifies a placement against the design's legality rules.
///
/// Returns a list of human-readable violations; an empty list means the
/// placement is sound.
pub fn verify(
    design: &DesignFile,
    placement: &BTreeMap<BlockId, Pos>,
    fabric: &dyn Fabric,
) -> Vec<String> {
    let mut violations = Vec::new();

    let mut positions = design.fixed.clone();
    for (&block, &pos) in placement {
        positions.insert(block, pos);
    }

    // Pinned blocks must not have been moved.
    for (&block, &pinned) in &design.fixed {
        if let Some(&placed) = placement.get(&block) {
            if placed != pinned {
                violations.push(format!("pinned block {block} moved from {pinned} to {placed}"));
            }
        }
    }

    // Every clustered block has exactly one position.
    for blocks in design.clusters.values() {
        for &block in blocks {
            if !positions.contains_key(&block) {
                violations.push(format!("block {block} has no position"));
            }
        }
    }

    // Every net member is covered.
    for (&net_id, members) in &design.nets {
        for &block in members {
            if !positions.contains_key(&block) {
                violations.push(format!("net {net_id} references unplaced block {block}"));
            }
        }
    }

    // Movable blocks sit on legal cells; a cell holds at most one PE and
    // at most one register.
    let mut occupants: BTreeMap<Pos, Vec<BlockId>> = BTreeMap::new();
    for (&block, &pos) in placement {
        match block.class() {
            BlockClass::Pe | BlockClass::Reg => {
                if !fabric.is_cell_legal(pos, CellKind::Clb) {
                    violations.push(format!("block {block} sits on illegal cell {pos}"));
                }
                occupants.entry(pos).or_default().push(block);
            }
            _ => {}
        }
    }
    for (pos, blocks) in &occupants {
        let pes = blocks.iter().filter(|b| b.is_pe()).count();
        let regs = blocks.iter().filter(|b| b.is_reg()).count();
        if pes > 1 || regs > 1 {
            violations.push(format!(
                "cell {pos} holds {pes} PEs and {regs} registers"
            ));
        }
    }

    // Register-net rule: a PE and a register on the same net never share
    // a cell.
    for (&net_id, members) in &design.nets {
        for &pe in members.iter().filter(|b| b.is_pe()) {
            for &reg in members.iter().filter(|b| b.is_reg()) {
                if let (Some(&pe_pos), Some(&reg_pos)) = (positions.get(&pe), positions.get(&reg))
                {
                    if pe_pos == reg_pos {
                        violations.push(format!(
                            "net {net_id}: {pe} and {reg} share cell {pe_pos}"
                        ));
                    }
                }
            }
        }
    }

    violations
}

/// Recomputes the total wire length of a placement.
pub fn placed_hpwl(
    design: &DesignFile,
    placement: &BTreeMap<BlockId, Pos>,
) -> Result<u64, String> {
    let netlist = design.netlist()?;
    let mut positions = design.fixed.clone();
    for (&block, &pos) in placement {
        positions.insert(block, pos);
    }
    total_hpwl(&netlist, &positions).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgra_arch::UniformFabric;
    use cgra_netlist::{ClusterId, NetId};
    use std::collections::BTreeSet;

    fn design() -> DesignFile {
        let mut design = DesignFile::default();
        design.clusters.insert(
            ClusterId::from_raw(0),
            [BlockId::pe(0), BlockId::reg(0)]
                .into_iter()
                .collect::<BTreeSet<_>>(),
        );
        design
            .nets
            .insert(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::reg(0)]);
        design.fixed.insert(BlockId::io(0), Pos::new(0, 3));
        design
    }

    #[test]
    fn clean_placement_has_no_violations() {
        let fabric = UniformFabric::new(10, 10);
        let mut placement = BTreeMap::new();
        placement.insert(BlockId::pe(0), Pos::new(1, 1));
        placement.insert(BlockId::reg(0), Pos::new(2, 1));
        assert!(verify(&design(), &placement, &fabric).is_empty());
    }

    #[test]
    fn missing_block_is_flagged() {
        let fabric = UniformFabric::new(10, 10);
        let mut placement = BTreeMap::new();
        placement.insert(BlockId::pe(0), Pos::new(1, 1));
        let violations = verify(&design(), &placement, &fabric);
        assert!(violations.iter().any(|v| v.contains("r0")));
    }

    #[test]
    fn shared_net_cell_is_flagged() {
        let fabric = UniformFabric::new(10, 10);
        let mut placement = BTreeMap::new();
        placement.insert(BlockId::pe(0), Pos::new(1, 1));
        placement.insert(BlockId::reg(0), Pos::new(1, 1));
        let violations = verify(&design(), &placement, &fabric);
        assert!(violations.iter().any(|v| v.contains("share cell")));
    }

    #[test]
    fn illegal_cell_is_flagged() {
        let fabric = UniformFabric::new(10, 10);
        let mut placement = BTreeMap::new();
        placement.insert(BlockId::pe(0), Pos::new(0, 0));
        placement.insert(BlockId::reg(0), Pos::new(2, 1));
        let violations = verify(&design(), &placement, &fabric);
        assert!(violations.iter().any(|v| v.contains("illegal cell")));
    }

    #[test]
    fn doubled_class_is_flagged() {
        let fabric = UniformFabric::new(10, 10);
        let mut design = design();
        design
            .clusters
            .get_mut(&ClusterId::from_raw(0))
            .unwrap()
            .insert(BlockId::pe(1));
        let mut placement = BTreeMap::new();
        placement.insert(BlockId::pe(0), Pos::new(1, 1));
        placement.insert(BlockId::pe(1), Pos::new(1, 1));
        placement.insert(BlockId::reg(0), Pos::new(2, 1));
        let violations = verify(&design, &placement, &fabric);
        assert!(violations.iter().any(|v| v.contains("holds 2 PEs")));
    }

    #[test]
    fn hpwl_matches_hand_computation() {
        let mut placement = BTreeMap::new();
        placement.insert(BlockId::pe(0), Pos::new(1, 1));
        placement.insert(BlockId::reg(0), Pos::new(4, 5));
        let hpwl = placed_hpwl(&design(), &placement).unwrap();
        assert_eq!(hpwl, 7);
    }
}
