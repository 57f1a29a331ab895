//! The VPR-style reference fabric.

use crate::{CellKind, Fabric};
use cgra_common::Pos;

/// The 60×60 reference board used by the CGRA flow.
///
/// Columns `2 + 8j` and `6 + 8j` (for `j` in `0..7`) are complex lanes
/// holding memory tiles and cannot host logic. The outermost ring of
/// cells is reserved for I/O and is illegal for CLB blocks.
#[derive(Clone, Debug)]
pub struct ReferenceFabric {
    width: i32,
    height: i32,
    margin: i32,
}

impl ReferenceFabric {
    /// Creates a reference fabric with explicit dimensions.
    ///
    /// The complex-lane pattern repeats every 8 columns regardless of
    /// width, so narrower boards simply have fewer lanes.
    pub fn with_dims(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            margin: 1,
        }
    }

    /// Complex lanes sit at columns `2 + 8j` and `6 + 8j`; the last lane
    /// pair on the 60-wide reference board is at `j = 6` (columns 50, 54),
    /// leaving the rightmost CLB columns free.
    fn is_complex_column(&self, x: i32) -> bool {
        x >= 2 && (x % 8 == 2 || x % 8 == 6) && x / 8 < self.width / 8
    }
}

impl Default for ReferenceFabric {
    fn default() -> Self {
        Self::with_dims(60, 60)
    }
}

impl Fabric for ReferenceFabric {
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
        if self.is_complex_column(pos.x) {
            CellKind::Complex
        } else {
            CellKind::Clb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_columns_match_reference_pattern() {
        let fabric = ReferenceFabric::default();
        let expected: Vec<i32> = (0..7).flat_map(|j| [2 + j * 8, 6 + j * 8]).collect();
        for x in 0..60 {
            let is_complex = fabric.is_complex_column(x);
            assert_eq!(is_complex, expected.contains(&x), "column {x}");
        }
    }

    #[test]
    fn border_ring_is_io() {
        let fabric = ReferenceFabric::default();
        assert_eq!(fabric.cell_kind(Pos::new(0, 30)), CellKind::Io);
        assert_eq!(fabric.cell_kind(Pos::new(59, 30)), CellKind::Io);
        assert_eq!(fabric.cell_kind(Pos::new(30, 0)), CellKind::Io);
        assert_eq!(fabric.cell_kind(Pos::new(30, 59)), CellKind::Io);
    }

    #[test]
    fn interior_clb_cells() {
        let fabric = ReferenceFabric::default();
        assert!(fabric.is_cell_legal(Pos::new(1, 1), CellKind::Clb));
        assert!(fabric.is_cell_legal(Pos::new(58, 58), CellKind::Clb));
        assert!(!fabric.is_cell_legal(Pos::new(2, 1), CellKind::Clb));
        assert!(!fabric.is_cell_legal(Pos::new(6, 1), CellKind::Clb));
        assert!(!fabric.is_cell_legal(Pos::new(50, 1), CellKind::Clb));
    }

    #[test]
    fn complex_cells_host_complex_blocks() {
        let fabric = ReferenceFabric::default();
        assert!(fabric.is_cell_legal(Pos::new(2, 10), CellKind::Complex));
        assert!(!fabric.is_cell_legal(Pos::new(3, 10), CellKind::Complex));
    }
}
