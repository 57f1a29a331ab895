//! Netlist model for the CGRA placement toolchain.
//!
//! Defines the typed block identifiers ([`BlockId`], [`BlockClass`]), the
//! [`Netlist`] container, the half-perimeter wire-length cost oracle
//! ([`compute_hpwl`]), cluster-graph reduction ([`reduce_cluster_graph`]),
//! and the metapath2vec embedding reader used by the upstream clustering
//! flow.
//!
//! Block identity is parsed once at the system boundary: the textual
//! `p…`/`r…`/`m…`/`i…`/`u…`/`x…` prefixes become a [`BlockClass`] variant,
//! and the placers never look at strings again.

#![warn(missing_docs)]

pub mod embedding;
pub mod error;
pub mod hpwl;
pub mod ids;
pub mod netlist;
pub mod reduce;

pub use embedding::{parse_embedding, parse_embedding_str, Embedding};
pub use error::NetlistError;
pub use hpwl::{compute_hpwl, total_hpwl};
pub use ids::{BlockClass, BlockId, ClusterId, NetId};
pub use netlist::Netlist;
pub use reduce::{compute_centroids, reduce_cluster_graph};
