//! The JSON design file consumed by the CLI.
//!
//! The upstream clustering flow emits clusters, nets, and pinned
//! positions; this module parses them into the typed model.

use cgra_common::Pos;
use cgra_netlist::{BlockId, ClusterId, NetId, Netlist};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A placement problem: clusters, nets, and pinned positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignFile {
    /// Block clusters keyed by cluster ID.
    #[serde(default)]
    pub clusters: BTreeMap<ClusterId, BTreeSet<BlockId>>,
    /// Nets keyed by net ID; member order is preserved.
    #[serde(default)]
    pub nets: BTreeMap<NetId, Vec<BlockId>>,
    /// Pinned positions (I/O pads, memory tiles) that never move.
    #[serde(default)]
    pub fixed: BTreeMap<BlockId, Pos>,
}

impl DesignFile {
    /// Reads and parses a design file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read design file {}: {e}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("failed to parse design file {}: {e}", path.display()))
    }

    /// Builds the typed netlist, rejecting malformed nets.
    pub fn netlist(&self) -> Result<Netlist, String> {
        let mut netlist = Netlist::new();
        for (&net_id, members) in &self.nets {
            netlist
                .add_net(net_id, members.clone())
                .map_err(|e| e.to_string())?;
        }
        Ok(netlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "clusters": { "0": ["p0", "p1", "r0"], "1": ["p2"] },
        "nets": { "0": ["p0", "r0"], "1": ["p1", "p2", "i0"] },
        "fixed": { "i0": { "x": 0, "y": 5 } }
    }"#;

    #[test]
    fn parses_sample_design() {
        let design: DesignFile = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(design.clusters.len(), 2);
        assert!(design.clusters[&ClusterId::from_raw(0)].contains(&BlockId::reg(0)));
        assert_eq!(design.nets[&NetId::from_raw(1)].len(), 3);
        assert_eq!(design.fixed[&BlockId::io(0)], Pos::new(0, 5));
    }

    #[test]
    fn netlist_preserves_member_order() {
        let design: DesignFile = serde_json::from_str(SAMPLE).unwrap();
        let netlist = design.netlist().unwrap();
        assert_eq!(
            netlist.net(NetId::from_raw(1)).unwrap(),
            &[BlockId::pe(1), BlockId::pe(2), BlockId::io(0)][..]
        );
    }

    #[test]
    fn duplicate_net_member_is_reported() {
        let design: DesignFile =
            serde_json::from_str(r#"{ "nets": { "0": ["p0", "p0"] } }"#).unwrap();
        let err = design.netlist().unwrap_err();
        assert!(err.contains("p0"));
    }

    #[test]
    fn empty_design_is_valid() {
        let design: DesignFile = serde_json::from_str("{}").unwrap();
        assert!(design.clusters.is_empty());
        assert!(design.netlist().unwrap().is_empty());
    }

    #[test]
    fn bad_block_tag_is_rejected() {
        let result: Result<DesignFile, _> =
            serde_json::from_str(r#"{ "nets": { "0": ["q0"] } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn roundtrips_through_json() {
        let design: DesignFile = serde_json::from_str(SAMPLE).unwrap();
        let json = serde_json::to_string(&design).unwrap();
        let restored: DesignFile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.clusters, design.clusters);
        assert_eq!(restored.nets, design.nets);
        assert_eq!(restored.fixed, design.fixed);
    }
}
