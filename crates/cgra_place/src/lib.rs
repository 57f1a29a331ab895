//! Two-level simulated-annealing placement engine for CGRA fabrics.
//!
//! This crate takes a clustered netlist and a [`Fabric`](cgra_arch::Fabric)
//! and assigns every block a legal cell position while minimizing
//! half-perimeter wire length. The pipeline:
//!
//! 1. **Cluster placement** — anneal variable-size cluster footprints
//!    under an overlap budget, then squeeze each cluster into a disjoint
//!    concrete cell set pulled toward the board center.
//! 2. **Detailed placement** — per cluster, anneal individual blocks over
//!    the cluster's cell set; in fold-register mode a PE and a register
//!    may share a cell subject to the register-net rule.
//! 3. Optional post-passes — [`MacroPlacer`] for fixed macro sets and
//!    [`DeblockPlacer`] for empty-cell-aware reshuffling.
//!
//! All phases share the [`AnnealState`] contract driven by [`Annealer`]:
//! deterministic seeded RNG, geometric cooling, Metropolis acceptance,
//! best-state tracking, and optional parallel chains.
//!
//! # Usage
//!
//! ```
//! use cgra_arch::UniformFabric;
//! use cgra_diagnostics::DiagnosticSink;
//! use cgra_netlist::{BlockId, ClusterId, NetId, Netlist};
//! use cgra_place::{place, PlacementOptions, Schedule};
//! use std::collections::BTreeMap;
//!
//! let fabric = UniformFabric::new(12, 12);
//! let mut clusters = BTreeMap::new();
//! clusters.insert(
//!     ClusterId::from_raw(0),
//!     [BlockId::pe(0), BlockId::reg(0)].into_iter().collect(),
//! );
//! let mut netlist = Netlist::new();
//! netlist
//!     .add_net(NetId::from_raw(0), vec![BlockId::pe(0), BlockId::io(0)])
//!     .unwrap();
//! let mut fixed = BTreeMap::new();
//! fixed.insert(BlockId::io(0), cgra_common::Pos::new(0, 5));
//!
//! let options = PlacementOptions {
//!     schedule: Schedule::new(5.0, 0.1, 200),
//!     ..PlacementOptions::default()
//! };
//! let sink = DiagnosticSink::new();
//! let placement = place(&clusters, &netlist, &fabric, &fixed, &options, &sink).unwrap();
//! assert_eq!(placement.positions.len(), 2);
//! ```

#![warn(missing_docs)]

pub mod anneal;
pub mod cluster;
mod cost;
pub mod deblock;
pub mod detailed;
pub mod error;
pub mod macro_place;

pub use anneal::{AnnealState, Annealed, Annealer, Schedule};
pub use cluster::{ClusterOptions, ClusterPlacer, ClusterUndo};
pub use deblock::{DeblockPlacer, DeblockUndo, DEFAULT_EXCLUDED};
pub use detailed::{DetailedPlacer, DetailedUndo};
pub use error::PlaceError;
pub use macro_place::{MacroLegality, MacroPlacer, MacroUndo};

use cgra_arch::Fabric;
use cgra_common::Pos;
use cgra_diagnostics::{Diagnostic, DiagnosticSink};
use cgra_netlist::{reduce_cluster_graph, BlockId, ClusterId, Netlist};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Knobs for the full placement pipeline.
#[derive(Debug, Clone)]
pub struct PlacementOptions {
    /// Cooling schedule shared by both annealing levels.
    pub schedule: Schedule,
    /// RNG seed; runs with the same seed and inputs are reproducible.
    pub seed: u64,
    /// Number of independent annealing chains per phase.
    pub chains: usize,
    /// Allowed coarse overlap is `cluster_size / place_factor` cells.
    pub place_factor: usize,
    /// Whether a PE and a register may share a cell.
    pub fold_reg: bool,
    /// Number of center-squeeze sweeps after de-overlap.
    pub squeeze_iter: usize,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            schedule: Schedule::default(),
            seed: 0,
            chains: 1,
            place_factor: 6,
            fold_reg: true,
            squeeze_iter: 5,
        }
    }
}

/// The result of a full placement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    /// Final position of every movable block.
    pub positions: BTreeMap<BlockId, Pos>,
    /// The concrete cell set assigned to each cluster.
    pub cluster_cells: BTreeMap<ClusterId, BTreeSet<Pos>>,
    /// The centroid of each cluster's cell set.
    pub centroids: BTreeMap<ClusterId, Pos>,
}

/// Runs the two-level placement pipeline.
///
/// `fixed_pos` pins I/O blocks, memory tiles, and anything else the
/// caller has already committed; pinned positions are never moved. The
/// returned [`Placement`] covers exactly the clustered blocks.
///
/// [`PlaceError::CapacityExhausted`] is recoverable — retry with fewer
/// clusters. Any other error is fatal.
pub fn place(
    clusters: &BTreeMap<ClusterId, BTreeSet<BlockId>>,
    netlist: &Netlist,
    fabric: &dyn Fabric,
    fixed_pos: &BTreeMap<BlockId, Pos>,
    options: &PlacementOptions,
    sink: &DiagnosticSink,
) -> Result<Placement, PlaceError> {
    let cluster_options = ClusterOptions {
        place_factor: options.place_factor,
        fold_reg: options.fold_reg,
        squeeze_iter: options.squeeze_iter,
        seed: options.seed,
    };
    let mut coarse = ClusterPlacer::new(
        clusters.clone(),
        netlist,
        fabric,
        fixed_pos.clone(),
        &cluster_options,
    )?;

    let annealer = Annealer::with_seed(options.schedule.clone(), options.seed);
    let outcome = if options.chains > 1 {
        let outcome = annealer.run_chains(&coarse, options.chains, None);
        coarse.restore(outcome.snapshot.clone());
        outcome
    } else {
        annealer.run(&mut coarse, None)
    };
    sink.emit(
        Diagnostic::note(format!("cluster placement over {} clusters", clusters.len()))
            .with_note(format!("initial energy {}", outcome.initial_energy))
            .with_note(format!("final energy {}", outcome.energy)),
    );

    let (cluster_cells, centroids) = coarse.squeeze(sink)?;

    let mut positions = BTreeMap::new();
    for (&cluster_id, blocks) in clusters {
        let scoped = reduce_cluster_graph(netlist, clusters, Some(cluster_id));
        let mut pinned = fixed_pos.clone();
        for (&other_id, &centroid) in &centroids {
            if other_id != cluster_id {
                pinned.insert(BlockId::centroid(other_id), centroid);
            }
        }
        let cells: Vec<Pos> = cluster_cells[&cluster_id].iter().copied().collect();
        let mut detail = DetailedPlacer::new(
            blocks.iter().copied().collect(),
            cells,
            &scoped,
            pinned,
            options.fold_reg,
        )?;
        let outcome = if options.chains > 1 {
            let outcome = annealer.run_chains(&detail, options.chains, None);
            detail.restore(outcome.snapshot.clone());
            outcome
        } else {
            annealer.run(&mut detail, None)
        };
        sink.emit(
            Diagnostic::note(format!(
                "detailed placement of cluster {cluster_id} ({} blocks)",
                blocks.len()
            ))
            .with_note(format!("final energy {}", outcome.energy)),
        );
        positions.extend(detail.into_state());
    }

    Ok(Placement {
        positions,
        cluster_cells,
        centroids,
    })
}
