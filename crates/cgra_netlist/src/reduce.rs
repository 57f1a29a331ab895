//! Cluster-graph reduction and centroid extraction.
//!
//! The cluster placer works on a reduced netlist where whole clusters are
//! collapsed into centroid pseudo-blocks; the detailed placer reduces the
//! netlist to one cluster's scope, collapsing every *other* cluster.

use crate::ids::{BlockId, ClusterId};
use crate::netlist::Netlist;
use cgra_common::Pos;
use std::collections::{BTreeMap, BTreeSet};

/// Collapses clustered blocks into centroid pseudo-blocks.
///
/// Every block that belongs to a cluster other than `scope` is replaced
/// by that cluster's centroid pseudo-block (`x<cluster>`); with
/// `scope = None` every clustered block collapses. Blocks that belong to
/// no cluster (I/O, memory, already-pinned blocks) pass through
/// unchanged. Members are deduplicated preserving first-occurrence
/// order, and nets left with fewer than two distinct members are dropped
/// since their wire length is identically zero.
pub fn reduce_cluster_graph(
    netlist: &Netlist,
    clusters: &BTreeMap<ClusterId, BTreeSet<BlockId>>,
    scope: Option<ClusterId>,
) -> Netlist {
    let mut owner = BTreeMap::new();
    for (&cluster_id, blocks) in clusters {
        for &block in blocks {
            owner.insert(block, cluster_id);
        }
    }

    let mut reduced = Netlist::new();
    for (net_id, members) in netlist.iter() {
        let mut seen = BTreeSet::new();
        let mut collapsed = Vec::new();
        for &block in members {
            let mapped = match owner.get(&block) {
                Some(&cluster_id) if Some(cluster_id) != scope => BlockId::centroid(cluster_id),
                _ => block,
            };
            if seen.insert(mapped) {
                collapsed.push(mapped);
            }
        }
        if collapsed.len() < 2 {
            continue;
        }
        // Deduplicated members cannot repeat, so this cannot fail.
        let _ = reduced.add_net(net_id, collapsed);
    }
    reduced
}

/// Computes each cluster's centroid as the arithmetic mean of its cell
/// coordinates (component-wise floor division).
///
/// Empty cell sets are skipped.
pub fn compute_centroids(
    cluster_cells: &BTreeMap<ClusterId, BTreeSet<Pos>>,
) -> BTreeMap<ClusterId, Pos> {
    let mut centroids = BTreeMap::new();
    for (&cluster_id, cells) in cluster_cells {
        if cells.is_empty() {
            continue;
        }
        let n = cells.len() as i32;
        let sum_x: i32 = cells.iter().map(|p| p.x).sum();
        let sum_y: i32 = cells.iter().map(|p| p.y).sum();
        centroids.insert(cluster_id, Pos::new(sum_x / n, sum_y / n));
    }
    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NetId;

    fn two_clusters() -> BTreeMap<ClusterId, BTreeSet<BlockId>> {
        let mut clusters = BTreeMap::new();
        clusters.insert(
            ClusterId::from_raw(0),
            [BlockId::pe(0), BlockId::pe(1)].into_iter().collect(),
        );
        clusters.insert(
            ClusterId::from_raw(1),
            [BlockId::pe(2), BlockId::reg(0)].into_iter().collect(),
        );
        clusters
    }

    #[test]
    fn full_collapse_replaces_every_clustered_block() {
        let mut nl = Netlist::new();
        nl.add_net(
            NetId::from_raw(0),
            vec![BlockId::pe(0), BlockId::pe(2), BlockId::io(0)],
        )
        .unwrap();
        let reduced = reduce_cluster_graph(&nl, &two_clusters(), None);
        let members = reduced.net(NetId::from_raw(0)).unwrap();
        assert_eq!(
            members,
            &[
                BlockId::centroid(ClusterId::from_raw(0)),
                BlockId::centroid(ClusterId::from_raw(1)),
                BlockId::io(0),
            ][..]
        );
    }

    #[test]
    fn scoped_reduction_keeps_own_blocks() {
        let mut nl = Netlist::new();
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::pe(2)])
            .unwrap();
        let reduced = reduce_cluster_graph(&nl, &two_clusters(), Some(ClusterId::from_raw(0)));
        let members = reduced.net(NetId::from_raw(0)).unwrap();
        assert_eq!(
            members,
            &[BlockId::pe(0), BlockId::centroid(ClusterId::from_raw(1))][..]
        );
    }

    #[test]
    fn intra_cluster_net_collapses_away() {
        let mut nl = Netlist::new();
        // Both blocks are in cluster 0, so the reduced net has one member.
        nl.add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::pe(1)])
            .unwrap();
        let reduced = reduce_cluster_graph(&nl, &two_clusters(), None);
        assert!(reduced.is_empty());
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let mut nl = Netlist::new();
        nl.add_net(
            NetId::from_raw(0),
            vec![BlockId::io(0), BlockId::pe(0), BlockId::pe(1), BlockId::io(1)],
        )
        .unwrap();
        let reduced = reduce_cluster_graph(&nl, &two_clusters(), None);
        let members = reduced.net(NetId::from_raw(0)).unwrap();
        assert_eq!(
            members,
            &[
                BlockId::io(0),
                BlockId::centroid(ClusterId::from_raw(0)),
                BlockId::io(1),
            ][..]
        );
    }

    #[test]
    fn centroid_is_mean_of_cells() {
        let mut cells = BTreeMap::new();
        cells.insert(
            ClusterId::from_raw(0),
            [Pos::new(0, 0), Pos::new(2, 0), Pos::new(0, 2), Pos::new(2, 2)]
                .into_iter()
                .collect(),
        );
        let centroids = compute_centroids(&cells);
        assert_eq!(centroids[&ClusterId::from_raw(0)], Pos::new(1, 1));
    }

    #[test]
    fn empty_cell_set_skipped() {
        let mut cells = BTreeMap::new();
        cells.insert(ClusterId::from_raw(0), BTreeSet::new());
        assert!(compute_centroids(&cells).is_empty());
    }
}
