//! The netlist container.

use crate::error::NetlistError;
use crate::ids::{BlockId, NetId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A netlist: each net is an ordered collection of block IDs.
///
/// Nets are undirected for wire-length purposes; member order is
/// preserved only so the first element may be treated as the source when
/// a consumer needs one. Iteration order over nets is ascending by
/// [`NetId`], which keeps every downstream computation deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Netlist {
    nets: BTreeMap<NetId, Vec<BlockId>>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a net with the given ordered members.
    ///
    /// Rejects nets that name the same block twice; an existing net with
    /// the same ID is replaced.
    pub fn add_net(&mut self, id: NetId, members: Vec<BlockId>) -> Result<(), NetlistError> {
        let mut seen = BTreeSet::new();
        for &block in &members {
            if !seen.insert(block) {
                return Err(NetlistError::DuplicateBlock { net: id, block });
            }
        }
        self.nets.insert(id, members);
        Ok(())
    }

    /// Returns the members of a net, if it exists.
    pub fn net(&self, id: NetId) -> Option<&[BlockId]> {
        self.nets.get(&id).map(|v| v.as_slice())
    }

    /// Iterates over all nets in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (NetId, &[BlockId])> {
        self.nets.iter().map(|(&id, members)| (id, members.as_slice()))
    }

    /// Returns the number of nets.
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    /// Returns whether the netlist has no nets.
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    /// Returns the set of distinct blocks appearing in any net.
    pub fn blocks(&self) -> BTreeSet<BlockId> {
        self.nets.values().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_query() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::reg(0)])
            .unwrap();
        assert_eq!(nl.len(), 1);
        assert_eq!(
            nl.net(NetId::from_raw(0)),
            Some(&[BlockId::pe(0), BlockId::reg(0)][..])
        );
        assert!(nl.net(NetId::from_raw(1)).is_none());
    }

    #[test]
    fn duplicate_member_rejected() {
        let mut nl = Netlist::new();
        let err = nl
            .add_net(NetId::from_raw(0), vec![BlockId::pe(1), BlockId::pe(1)])
            .unwrap_err();
        assert!(matches!(err, NetlistError::DuplicateBlock { .. }));
    }

    #[test]
    fn member_order_preserved() {
        let mut nl = Netlist::new();
        let members = vec![BlockId::reg(2), BlockId::pe(0), BlockId::pe(1)];
        nl.add_net(NetId::from_raw(3), members.clone()).unwrap();
        assert_eq!(nl.net(NetId::from_raw(3)).unwrap(), &members[..]);
    }

    #[test]
    fn blocks_are_deduplicated() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::reg(0)])
            .unwrap();
        nl.add_net(NetId::from_raw(1), vec![BlockId::pe(0), BlockId::reg(1)])
            .unwrap();
        let blocks = nl.blocks();
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn iteration_is_sorted_by_id() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(5), vec![BlockId::pe(0), BlockId::pe(1)])
            .unwrap();
        nl.add_net(NetId::from_raw(1), vec![BlockId::pe(2), BlockId::pe(3)])
            .unwrap();
        let ids: Vec<u32> = nl.iter().map(|(id, _)| id.as_raw()).collect();
        assert_eq!(ids, vec![1, 5]);
    }
}
