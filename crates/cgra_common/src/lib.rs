//! Shared primitives for the CGRA placement toolchain.
//!
//! This crate holds the pieces every other crate needs: the integer grid
//! geometry used by the placers ([`Pos`], Manhattan distance, rectangle
//! overlap, zig-zag enumeration) and the internal error type for
//! "this is a bug" failures.

#![warn(missing_docs)]

pub mod geometry;
pub mod result;

pub use geometry::{manhattan_distance, rect_overlap, zigzag_order, Corner, Pos};
pub use result::{CgraResult, InternalError};
