//! A uniform all-CLB fabric.

use crate::{CellKind, Fabric};
use cgra_common::Pos;

/// A board whose every interior cell is a CLB.
///
/// Useful for fabrics without column specialization and for exercising
/// the placers on small boards. The margin ring is I/O like the
/// reference board.
#[derive(Clone, Debug)]
pub struct UniformFabric {
    width: i32,
    height: i32,
    margin: i32,
}

impl UniformFabric {
    /// Creates a uniform fabric with a 1-cell I/O margin.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            margin: 1,
        }
    }

    /// Creates a uniform fabric with no margin at all; every cell is a CLB.
    pub fn borderless(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            margin: 0,
        }
    }
}

impl Fabric for UniformFabric {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn margin(&self) -> i32 {
        self.margin
    }

    fn cell_kind(&self, pos: Pos) -> CellKind {
        if !self.in_bounds(pos) {
            return CellKind::Void;
        }
        if pos.x < self.margin
            || pos.y < self.margin
            || pos.x >= self.width - self.margin
            || pos.y >= self.height - self.margin
        {
            return CellKind::Io;
        }
        CellKind::Clb
    }
}
