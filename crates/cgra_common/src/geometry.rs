//! Integer grid geometry for fabric placement.
//!
//! Positions are `(x, y)` pairs with the origin at the top-left of the
//! board. All distances are Manhattan (L1), which is what half-perimeter
//! wire length measures and what the squeeze heuristics sort by.

use serde::{Deserialize, Serialize};

/// A cell position on the fabric grid, origin top-left.
///
/// The derived `Ord` compares `x` first and then `y`, which is also the
/// tie-break order used by [`zigzag_order`].
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct Pos {
    /// Column index, increasing to the right.
    pub x: i32,
    /// Row index, increasing downward.
    pub y: i32,
}

impl Pos {
    /// Creates a position from column and row indices.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this position offset by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Pos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Returns the Manhattan (L1) distance between two positions.
pub fn manhattan_distance(a: Pos, b: Pos) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Returns the area of the axis-aligned intersection of two rectangles.
///
/// Each rectangle is given by its top-left corner and `(width, height)`
/// extent. Disjoint rectangles yield 0.
pub fn rect_overlap(pos1: Pos, dims1: (i32, i32), pos2: Pos, dims2: (i32, i32)) -> i32 {
    let x = (pos1.x + dims1.0).min(pos2.x + dims2.0) - pos1.x.max(pos2.x);
    let y = (pos1.y + dims1.1).min(pos2.y + dims2.1) - pos1.y.max(pos2.y);
    if x <= 0 || y <= 0 {
        0
    } else {
        x * y
    }
}

/// A corner of a `width × height` rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Corner {
    /// `(0, 0)`.
    TopLeft,
    /// `(width - 1, 0)`.
    TopRight,
    /// `(width - 1, height - 1)`.
    BottomRight,
    /// `(0, height - 1)`.
    BottomLeft,
}

impl Corner {
    /// All four corners, in clockwise order starting from the top-left.
    ///
    /// The index order matches the corner order of a cluster bounding box:
    /// top-left, top-right, bottom-right, bottom-left.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Returns the concrete position of this corner within a
    /// `width × height` rectangle anchored at the origin.
    pub fn pos(self, width: i32, height: i32) -> Pos {
        match self {
            Corner::TopLeft => Pos::new(0, 0),
            Corner::TopRight => Pos::new(width - 1, 0),
            Corner::BottomRight => Pos::new(width - 1, height - 1),
            Corner::BottomLeft => Pos::new(0, height - 1),
        }
    }
}

/// Enumerates every cell of a `width × height` grid in order of
/// increasing Manhattan distance from the chosen corner.
///
/// Ties are broken lexicographically by `(x, y)`. Packing cells in this
/// order fills the rectangle outward from the corner, which the cluster
/// placer uses to pack cells toward the board center.
pub fn zigzag_order(width: i32, height: i32, corner: Corner) -> Vec<Pos> {
    let anchor = corner.pos(width, height);
    let mut cells = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
    for x in 0..width {
        for y in 0..height {
            cells.push(Pos::new(x, y));
        }
    }
    cells.sort_by_key(|&p| (manhattan_distance(p, anchor), p.x, p.y));
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_basics() {
        let a = Pos::new(1, 2);
        let b = Pos::new(4, 6);
        assert_eq!(manhattan_distance(a, b), 7);
        assert_eq!(manhattan_distance(b, a), 7);
        assert_eq!(manhattan_distance(a, a), 0);
    }

    #[test]
    fn overlap_disjoint_is_zero() {
        let a = Pos::new(0, 0);
        let b = Pos::new(10, 10);
        assert_eq!(rect_overlap(a, (3, 3), b, (3, 3)), 0);
    }

    #[test]
    fn overlap_touching_edges_is_zero() {
        let a = Pos::new(0, 0);
        let b = Pos::new(3, 0);
        assert_eq!(rect_overlap(a, (3, 3), b, (3, 3)), 0);
    }

    #[test]
    fn overlap_partial() {
        let a = Pos::new(0, 0);
        let b = Pos::new(2, 2);
        // Intersection is [2,3) x [2,3)
        assert_eq!(rect_overlap(a, (3, 3), b, (3, 3)), 1);
    }

    #[test]
    fn overlap_contained() {
        let outer = Pos::new(0, 0);
        let inner = Pos::new(2, 2);
        assert_eq!(rect_overlap(outer, (10, 10), inner, (2, 2)), 4);
        assert_eq!(rect_overlap(inner, (2, 2), outer, (10, 10)), 4);
    }

    #[test]
    fn overlap_symmetric() {
        let a = Pos::new(1, 1);
        let b = Pos::new(3, 2);
        assert_eq!(
            rect_overlap(a, (4, 4), b, (5, 3)),
            rect_overlap(b, (5, 3), a, (4, 4))
        );
    }

    #[test]
    fn zigzag_covers_grid_exactly_once() {
        let order = zigzag_order(4, 3, Corner::TopLeft);
        assert_eq!(order.len(), 12);
        let unique: std::collections::BTreeSet<_> = order.iter().copied().collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn zigzag_monotone_from_every_corner() {
        for corner in Corner::ALL {
            let anchor = corner.pos(5, 4);
            let order = zigzag_order(5, 4, corner);
            let mut prev = 0;
            for p in order {
                let d = manhattan_distance(p, anchor);
                assert!(d >= prev, "distance decreased at {p} from corner {corner:?}");
                prev = d;
            }
        }
    }

    #[test]
    fn zigzag_starts_at_corner() {
        for corner in Corner::ALL {
            let order = zigzag_order(6, 6, corner);
            assert_eq!(order[0], corner.pos(6, 6));
        }
    }

    #[test]
    fn zigzag_tie_break_is_lexicographic() {
        let order = zigzag_order(3, 3, Corner::TopLeft);
        // Distance-1 cells are (0,1) and (1,0); (0,1) has the smaller x.
        assert_eq!(order[1], Pos::new(0, 1));
        assert_eq!(order[2], Pos::new(1, 0));
    }

    #[test]
    fn pos_serde_roundtrip() {
        let p = Pos::new(7, -3);
        let json = serde_json::to_string(&p).unwrap();
        let restored: Pos = serde_json::from_str(&json).unwrap();
        assert_eq!(p, restored);
    }
}
