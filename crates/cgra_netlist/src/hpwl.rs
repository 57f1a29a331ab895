//! Half-perimeter wire-length cost oracle.
//!
//! HPWL is the half-perimeter of the bounding box of a net's block
//! positions. It is the standard placement metric; the annealers sum the
//! per-net values to form their scalar energy.

use crate::ids::{BlockId, NetId};
use crate::netlist::Netlist;
use cgra_common::{CgraResult, InternalError, Pos};
use std::collections::BTreeMap;

/// Computes the HPWL contribution of every net.
///
/// Every net member must have a position in `positions`; a missing block
/// is a caller contract break and fails fast with an internal error.
pub fn compute_hpwl(
    netlist: &Netlist,
    positions: &BTreeMap<BlockId, Pos>,
) -> CgraResult<BTreeMap<NetId, u32>> {
    let mut result = BTreeMap::new();
    for (net_id, members) in netlist.iter() {
        let mut min_x = i32::MAX;
        let mut max_x = i32::MIN;
        let mut min_y = i32::MAX;
        let mut max_y = i32::MIN;
        for &block in members {
            let pos = positions.get(&block).ok_or_else(|| {
                InternalError::new(format!(
                    "net {net_id} references block {block} with no position"
                ))
            })?;
            min_x = min_x.min(pos.x);
            max_x = max_x.max(pos.x);
            min_y = min_y.min(pos.y);
            max_y = max_y.max(pos.y);
        }
        let hpwl = if members.is_empty() {
            0
        } else {
            ((max_x - min_x) + (max_y - min_y)) as u32
        };
        result.insert(net_id, hpwl);
    }
    Ok(result)
}

/// Sums [`compute_hpwl`] over all nets.
pub fn total_hpwl(netlist: &Netlist, positions: &BTreeMap<BlockId, Pos>) -> CgraResult<u64> {
    let per_net = compute_hpwl(netlist, positions)?;
    Ok(per_net.values().map(|&v| v as u64).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(entries: &[(BlockId, (i32, i32))]) -> BTreeMap<BlockId, Pos> {
        entries
            .iter()
            .map(|&(b, (x, y))| (b, Pos::new(x, y)))
            .collect()
    }

    #[test]
    fn two_pin_net() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::pe(1)])
            .unwrap();
        let pos = positions(&[(BlockId::pe(0), (0, 0)), (BlockId::pe(1), (3, 4))]);
        let hpwl = compute_hpwl(&nl, &pos).unwrap();
        assert_eq!(hpwl[&NetId::from_raw(0)], 7);
    }

    #[test]
    fn multi_pin_net_uses_bounding_box() {
        let mut nl = Netlist::new();
        nl.add_net(
            NetId::from_raw(0),
            vec![BlockId::pe(0), BlockId::pe(1), BlockId::reg(0)],
        )
        .unwrap();
        let pos = positions(&[
            (BlockId::pe(0), (1, 1)),
            (BlockId::pe(1), (5, 2)),
            (BlockId::reg(0), (3, 7)),
        ]);
        let hpwl = compute_hpwl(&nl, &pos).unwrap();
        // bbox is [1,5] x [1,7]
        assert_eq!(hpwl[&NetId::from_raw(0)], 10);
    }

    #[test]
    fn coincident_blocks_cost_nothing() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::reg(0)])
            .unwrap();
        let pos = positions(&[(BlockId::pe(0), (4, 4)), (BlockId::reg(0), (4, 4))]);
        assert_eq!(total_hpwl(&nl, &pos).unwrap(), 0);
    }

    #[test]
    fn missing_position_fails_fast() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::pe(1)])
            .unwrap();
        let pos = positions(&[(BlockId::pe(0), (0, 0))]);
        let err = compute_hpwl(&nl, &pos).unwrap_err();
        assert!(err.message.contains("p1"));
    }

    #[test]
    fn total_sums_all_nets() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::pe(1)])
            .unwrap();
        nl.add_net(NetId::from_raw(1), vec![BlockId::pe(1), BlockId::reg(0)])
            .unwrap();
        let pos = positions(&[
            (BlockId::pe(0), (0, 0)),
            (BlockId::pe(1), (2, 0)),
            (BlockId::reg(0), (2, 5)),
        ]);
        assert_eq!(total_hpwl(&nl, &pos).unwrap(), 7);
    }

    #[test]
    fn empty_netlist_costs_nothing() {
        let nl = Netlist::new();
        let pos = BTreeMap::new();
        assert_eq!(total_hpwl(&nl, &pos).unwrap(), 0);
    }
}
