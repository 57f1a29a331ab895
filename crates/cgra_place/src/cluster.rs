//! Coarse cluster placement.
//!
//! Packs variable-size cluster footprints onto the fabric, anneals their
//! positions with an overlap budget, then "squeezes" each cluster into a
//! concrete set of cells pulled toward the board center. The output is a
//! disjoint cell set per cluster plus a centroid per cluster; the
//! detailed placer then works inside each cell set.

use crate::anneal::AnnealState;
use crate::cost::{check_coverage, merged_positions, wirelength};
use crate::error::PlaceError;
use cgra_arch::{CellKind, Fabric};
use cgra_common::{manhattan_distance, rect_overlap, zigzag_order, Corner, InternalError, Pos};
use cgra_diagnostics::{Diagnostic, DiagnosticSink};
use cgra_netlist::{compute_centroids, reduce_cluster_graph, BlockId, ClusterId, Netlist};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

/// Knobs for the cluster placer.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Allowed coarse overlap is `cluster_size / place_factor` cells.
    pub place_factor: usize,
    /// Whether a PE and a register may later share a cell; shrinks the
    /// footprint to `max(#PE, #reg)` cells.
    pub fold_reg: bool,
    /// Number of center-squeeze sweeps after de-overlap.
    pub squeeze_iter: usize,
    /// Seed for the deterministic initial packing.
    pub seed: u64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            place_factor: 6,
            fold_reg: true,
            squeeze_iter: 5,
            seed: 0,
        }
    }
}

/// Maximum cell swaps per squeeze pass over one cluster.
const MAX_SQUEEZE_MOVES: usize = 15;

/// De-overlap gives up after this many futile rounds.
const DEOVERLAP_EFFORT: usize = 5;

/// Clusters that needed the free-space fallback keep squeezing until a
/// pass makes at most this many moves.
const SPECIAL_SETTLE_MOVES: usize = 5;

/// An undoable cluster-placement move.
#[derive(Debug, Clone)]
pub enum ClusterUndo {
    /// Two clusters exchanged positions.
    Swap(ClusterId, ClusterId),
    /// One cluster moved; the payload is its previous position.
    Nudge(ClusterId, Pos),
}

/// Simulated-annealing placer for cluster footprints.
///
/// The mutable state is the map from cluster to footprint top-left
/// corner. Energy substitutes each cluster by its centroid pseudo-block
/// and sums the HPWL of the reduced netlist.
#[derive(Clone)]
pub struct ClusterPlacer<'f> {
    clusters: BTreeMap<ClusterId, BTreeSet<BlockId>>,
    netlist: Netlist,
    board_pos: BTreeMap<BlockId, Pos>,
    fabric: &'f dyn Fabric,
    square_sizes: BTreeMap<ClusterId, i32>,
    state: BTreeMap<ClusterId, Pos>,
    ids: Vec<ClusterId>,
    place_factor: usize,
    fold_reg: bool,
    squeeze_iter: usize,
    center: Pos,
}

impl<'f> ClusterPlacer<'f> {
    /// Builds the placer and computes the deterministic initial packing.
    ///
    /// The netlist must reference only clustered blocks and blocks pinned
    /// in `board_pos`; it is reduced here so every clustered block
    /// becomes its cluster's centroid pseudo-block.
    pub fn new(
        clusters: BTreeMap<ClusterId, BTreeSet<BlockId>>,
        netlist: &Netlist,
        fabric: &'f dyn Fabric,
        board_pos: BTreeMap<BlockId, Pos>,
        options: &ClusterOptions,
    ) -> Result<Self, PlaceError> {
        let reduced = reduce_cluster_graph(netlist, &clusters, None);
        {
            let clusters = &clusters;
            let board_pos = &board_pos;
            check_coverage(&reduced, |block| {
                if block.class() == cgra_netlist::BlockClass::Centroid {
                    clusters.contains_key(&ClusterId::from_raw(block.index()))
                } else {
                    board_pos.contains_key(&block)
                }
            })?;
        }

        let ids: Vec<ClusterId> = clusters.keys().copied().collect();
        let mut placer = Self {
            square_sizes: BTreeMap::new(),
            state: BTreeMap::new(),
            ids,
            netlist: reduced,
            board_pos,
            fabric,
            place_factor: options.place_factor.max(1),
            fold_reg: options.fold_reg,
            squeeze_iter: options.squeeze_iter,
            center: fabric.center(),
            clusters,
        };
        for (&cluster_id, blocks) in &placer.clusters {
            let capacity = Self::cluster_capacity(blocks, placer.fold_reg);
            let square = (capacity as f64).sqrt().ceil() as i32;
            placer.square_sizes.insert(cluster_id, square);
        }

        let mut rng = StdRng::seed_from_u64(options.seed);
        placer.state = placer.init_placement(&mut rng)?;
        Ok(placer)
    }

    /// Number of cells a cluster ultimately occupies.
    fn cluster_capacity(blocks: &BTreeSet<BlockId>, fold_reg: bool) -> usize {
        if fold_reg {
            let pe = blocks.iter().filter(|b| b.is_pe()).count();
            let reg = blocks.iter().filter(|b| b.is_reg()).count();
            pe.max(reg).max(1)
        } else {
            blocks.len().max(1)
        }
    }

    fn capacity(&self, cluster_id: ClusterId) -> usize {
        Self::cluster_capacity(&self.clusters[&cluster_id], self.fold_reg)
    }

    /// Left-to-right, top-to-bottom packing of cluster footprints.
    ///
    /// Marches each cluster rightward one cell per failed trial, wrapping
    /// to the next row band when the board edge is reached. Revisiting a
    /// position before success means the board is full.
    fn init_placement(&self, rng: &mut StdRng) -> Result<BTreeMap<ClusterId, Pos>, PlaceError> {
        let margin = self.fabric.margin();
        let mut state = BTreeMap::new();
        let initial_x = margin;
        let mut x = initial_x;
        let mut rows: Vec<i32> = Vec::new();
        let mut current_rows: Vec<i32> = Vec::new();
        let mut col = 0usize;

        for &cluster_id in &self.ids {
            let square_size = self.square_sizes[&cluster_id];
            let mut visited = BTreeSet::new();
            loop {
                if x >= self.fabric.width() {
                    x = initial_x;
                    rows = std::mem::take(&mut current_rows);
                    col = 0;
                }
                let y = if rows.is_empty() {
                    margin
                } else if col < rows.len() {
                    rows[col]
                } else {
                    *rows.last().expect("rows is non-empty")
                };
                let pos = Pos::new(x, y);
                if !visited.insert(pos) {
                    return Err(PlaceError::CapacityExhausted(cluster_id));
                }
                if self.footprint_is_legal(pos, cluster_id, &state) {
                    state.insert(cluster_id, pos);
                    x += rng.gen_range(square_size..square_size + 3);
                    current_rows.push(square_size + y);
                    col += 1;
                    break;
                }
                x += 1;
            }
        }
        Ok(state)
    }

    /// Whether placing `cluster_id` at `pos` respects margins, board
    /// bounds, and the overlap budget against every other placed cluster.
    fn footprint_is_legal(
        &self,
        pos: Pos,
        cluster_id: ClusterId,
        state: &BTreeMap<ClusterId, Pos>,
    ) -> bool {
        let margin = self.fabric.margin();
        if pos.x < margin || pos.y < margin {
            return false;
        }
        let square = self.square_sizes[&cluster_id];
        let bbox = match self.compute_bbox(pos, square) {
            Some(bbox) => bbox,
            None => return false,
        };
        let far_x = pos.x + bbox.0;
        let far_y = pos.y + bbox.1;
        if far_x >= self.fabric.width() - margin
            || far_x < margin
            || far_y >= self.fabric.height() - margin
            || far_y < margin
        {
            return false;
        }

        let mut overlap = 0;
        for (&other_id, &other_pos) in state {
            if other_id == cluster_id {
                continue;
            }
            let other_square = self.square_sizes[&other_id];
            let other_bbox = match self.compute_bbox(other_pos, other_square) {
                Some(bbox) => bbox,
                None => return false,
            };
            overlap += rect_overlap(pos, bbox, other_pos, other_bbox);
        }
        overlap as usize <= self.clusters[&cluster_id].len() / self.place_factor
    }

    /// Realizes a footprint: walking right from `pos`, skip columns that
    /// cannot host CLB blocks until `square_size` legal columns are
    /// collected. Returns `(width, height)` or `None` if the board edge
    /// is reached first.
    fn compute_bbox(&self, pos: Pos, square_size: i32) -> Option<(i32, i32)> {
        let mut width = 0;
        let mut span = 0;
        while width < square_size {
            let x = pos.x + span;
            if x >= self.fabric.width() {
                return None;
            }
            if !self.fabric.is_cell_legal(Pos::new(x, pos.y), CellKind::Clb) {
                span += 1;
                continue;
            }
            width += 1;
            span += 1;
        }
        Some((span, square_size))
    }

    /// Midpoint of each cluster's realized bounding box.
    pub fn footprint_centers(&self) -> BTreeMap<ClusterId, Pos> {
        let mut centers = BTreeMap::new();
        for (&cluster_id, &pos) in &self.state {
            let square = self.square_sizes[&cluster_id];
            // State positions were legality-checked, so a bbox exists.
            let (width, height) = self.compute_bbox(pos, square).unwrap_or((square, square));
            centers.insert(cluster_id, Pos::new(pos.x + width / 2, pos.y + height / 2));
        }
        centers
    }

    /// The current footprint assignment.
    pub fn state(&self) -> &BTreeMap<ClusterId, Pos> {
        &self.state
    }

    fn occupancy_index(&self, pos: Pos) -> usize {
        (pos.y * self.fabric.width() + pos.x) as usize
    }

    fn occupied(&self, occupancy: &[bool], pos: Pos) -> bool {
        if !self.fabric.in_bounds(pos) {
            return true;
        }
        occupancy[self.occupancy_index(pos)]
    }

    /// Builds the occupancy bitboard over all cluster cells. With `check`
    /// set, a doubly-claimed cell is a fatal overlap.
    fn occupancy(
        &self,
        cluster_cells: &BTreeMap<ClusterId, BTreeSet<Pos>>,
        check: bool,
    ) -> Result<Vec<bool>, PlaceError> {
        let size = (self.fabric.width() * self.fabric.height()) as usize;
        let mut board = vec![false; size];
        for cells in cluster_cells.values() {
            for &pos in cells {
                let index = self.occupancy_index(pos);
                if check && board[index] {
                    return Err(PlaceError::Overlap(pos));
                }
                board[index] = true;
            }
        }
        Ok(board)
    }

    /// Unoccupied legal cells within Manhattan distance `max_dist` of at
    /// least one of the cluster's cells.
    ///
    /// `search_all` scans the whole margin-interior board; otherwise only
    /// a 1-cell border around the cluster's bounding box.
    fn exterior_set(
        &self,
        cluster_id: ClusterId,
        cluster_cells: &BTreeMap<ClusterId, BTreeSet<Pos>>,
        occupancy: &[bool],
        max_dist: i32,
        search_all: bool,
    ) -> BTreeSet<Pos> {
        let cells = &cluster_cells[&cluster_id];
        let margin = self.fabric.margin();
        let (x_range, y_range) = if search_all {
            (
                margin..self.fabric.width() - margin,
                margin..self.fabric.height() - margin,
            )
        } else {
            let pos = self.state[&cluster_id];
            let square = self.square_sizes[&cluster_id];
            let (width, height) = self.compute_bbox(pos, square).unwrap_or((square, square));
            (
                pos.x - 1..pos.x + width + 1,
                pos.y - 1..pos.y + height + 1,
            )
        };

        let mut result = BTreeSet::new();
        for y in y_range {
            for x in x_range.clone() {
                let cell = Pos::new(x, y);
                if !cells.contains(&cell) {
                    continue;
                }
                for dy in -max_dist..=max_dist {
                    for dx in -max_dist..=max_dist {
                        if dx.abs() + dy.abs() > max_dist {
                            continue;
                        }
                        let candidate = cell.offset(dx, dy);
                        if !self.fabric.is_cell_legal(candidate, CellKind::Clb) {
                            continue;
                        }
                        if !self.occupied(occupancy, candidate) {
                            result.insert(candidate);
                        }
                    }
                }
            }
        }
        result
    }

    /// Swaps a cluster's overlapping cells for nearby exterior cells,
    /// retrying until the overlap clears or progress stalls.
    fn deoverlap(
        &self,
        cluster_cells: &mut BTreeMap<ClusterId, BTreeSet<Pos>>,
        cluster_id: ClusterId,
        overlap: &mut BTreeSet<Pos>,
    ) -> Result<(), PlaceError> {
        let mut effort = 0;
        let mut last_len = overlap.len();
        while !overlap.is_empty() && effort < DEOVERLAP_EFFORT {
            let occupancy = self.occupancy(cluster_cells, false)?;
            let mut exterior: Vec<Pos> = self
                .exterior_set(cluster_id, cluster_cells, &occupancy, 4, false)
                .into_iter()
                .collect();
            exterior.sort_by_key(|&p| (manhattan_distance(p, self.center), p));
            for free in exterior {
                let Some(cell) = overlap.pop_first() else {
                    break;
                };
                let cells = cluster_cells
                    .get_mut(&cluster_id)
                    .expect("cluster has a cell set");
                cells.remove(&cell);
                cells.insert(free);
            }
            if overlap.len() == last_len {
                effort += 1;
            } else {
                effort = 0;
            }
            last_len = overlap.len();
        }
        Ok(())
    }

    /// Brute-force search for `num_cells` unoccupied legal cells, first
    /// as one contiguous rectangular region (scanning from the bottom
    /// right), then anywhere on the board.
    fn find_space(&self, occupancy: &[bool], num_cells: usize) -> Result<BTreeSet<Pos>, PlaceError> {
        let square = (num_cells as f64).sqrt().ceil() as i32;
        let max_y = self.fabric.height() - square - 1;
        let max_x = self.fabric.width() - square - 1;
        for y in (0..=max_y.max(-1)).rev() {
            for x in (0..=max_x.max(-1)).rev() {
                let pos = Pos::new(x, y);
                let Some((width, height)) = self.compute_bbox(pos, square) else {
                    continue;
                };
                let mut cells = Vec::new();
                for dy in 0..height {
                    for dx in 0..width {
                        let cell = pos.offset(dx, dy);
                        if !self.occupied(occupancy, cell)
                            && self.fabric.is_cell_legal(cell, CellKind::Clb)
                        {
                            cells.push(cell);
                        }
                    }
                }
                if cells.len() >= num_cells {
                    return Ok(cells.into_iter().take(num_cells).collect());
                }
            }
        }

        // No contiguous region: take any unoccupied legal cells.
        let mut result = BTreeSet::new();
        for y in 0..self.fabric.height() {
            for x in 0..self.fabric.width() {
                let pos = Pos::new(x, y);
                if self.fabric.is_cell_legal(pos, CellKind::Clb) && !self.occupied(occupancy, pos) {
                    result.insert(pos);
                    if result.len() == num_cells {
                        return Ok(result);
                    }
                }
            }
        }
        Err(PlaceError::NoSpace { needed: num_cells })
    }

    /// One center-squeeze pass over a cluster: swap its center-farthest
    /// cells for the center-nearest free exterior cells, stopping when a
    /// candidate free cell is no closer than the cell it would replace.
    ///
    /// Returns the number of moves attempted.
    fn squeeze_cluster(
        &self,
        cluster_cells: &mut BTreeMap<ClusterId, BTreeSet<Pos>>,
        cluster_id: ClusterId,
    ) -> Result<usize, PlaceError> {
        let occupancy = self.occupancy(cluster_cells, true)?;
        let mut exterior: Vec<Pos> = self
            .exterior_set(cluster_id, cluster_cells, &occupancy, 1, true)
            .into_iter()
            .collect();
        exterior.sort_by_key(|&p| (manhattan_distance(p, self.center), p));
        let mut own: Vec<Pos> = cluster_cells[&cluster_id].iter().copied().collect();
        own.sort_by_key(|&p| (std::cmp::Reverse(manhattan_distance(p, self.center)), p));

        let mut moves = 0;
        let mut free_iter = exterior.into_iter();
        let mut own_iter = own.into_iter();
        loop {
            if moves > MAX_SQUEEZE_MOVES {
                break;
            }
            let (Some(free), Some(old)) = (free_iter.next(), own_iter.next()) else {
                break;
            };
            moves += 1;
            if manhattan_distance(free, self.center) > manhattan_distance(old, self.center) {
                break;
            }
            let cells = cluster_cells
                .get_mut(&cluster_id)
                .expect("cluster has a cell set");
            cells.remove(&old);
            cells.insert(free);
        }
        Ok(moves)
    }

    /// Materializes disjoint per-cluster cell sets and centroids.
    ///
    /// Runs after annealing: zig-zag cell selection from the
    /// center-nearest bbox corner, center-out de-overlap (with the
    /// free-space fallback for stubborn clusters), then `squeeze_iter`
    /// center-squeeze sweeps. Post-conditions: cell sets are disjoint and
    /// each has exactly the cluster's capacity.
    pub fn squeeze(
        &self,
        sink: &DiagnosticSink,
    ) -> Result<(BTreeMap<ClusterId, BTreeSet<Pos>>, BTreeMap<ClusterId, Pos>), PlaceError> {
        let mut cluster_cells: BTreeMap<ClusterId, BTreeSet<Pos>> = BTreeMap::new();

        // Materialize each cluster's cells inside its bounding box.
        for (&cluster_id, &pos) in &self.state {
            let capacity = self.capacity(cluster_id);
            let square = self.square_sizes[&cluster_id];
            let (width, height) = self.compute_bbox(pos, square).ok_or_else(|| {
                InternalError::new(format!("cluster {cluster_id} footprint fell off the board"))
            })?;

            let corners = [
                pos,
                pos.offset(width, 0),
                pos.offset(width, height),
                pos.offset(0, height),
            ];
            let mut nearest = 0;
            for (index, corner) in corners.iter().enumerate() {
                if manhattan_distance(*corner, self.center)
                    < manhattan_distance(corners[nearest], self.center)
                {
                    nearest = index;
                }
            }

            let mut cells = BTreeSet::new();
            for cell in zigzag_order(width, height, Corner::ALL[nearest]) {
                if cells.len() == capacity {
                    break;
                }
                let candidate = Pos::new(pos.x + cell.x, pos.y + cell.y);
                if self.fabric.is_cell_legal(candidate, CellKind::Clb) {
                    cells.insert(candidate);
                }
            }
            if cells.len() < capacity {
                return Err(InternalError::new(format!(
                    "cluster {cluster_id} bounding box holds {} of {capacity} cells",
                    cells.len()
                ))
                .into());
            }
            cluster_cells.insert(cluster_id, cells);
        }

        // De-overlap center-out: the middle of the board has the least
        // spare room, so clusters closest to the center go first.
        let mut order: Vec<ClusterId> = self.state.keys().copied().collect();
        order.sort_by_key(|id| (manhattan_distance(self.state[id], self.center), *id));

        let mut special_working_set = BTreeSet::new();
        for &cluster_id in &order {
            let mut overlap = BTreeSet::new();
            for (&other_id, cells) in &cluster_cells {
                if other_id == cluster_id {
                    continue;
                }
                overlap.extend(cluster_cells[&cluster_id].intersection(cells).copied());
            }

            self.deoverlap(&mut cluster_cells, cluster_id, &mut overlap)?;
            if !overlap.is_empty() {
                sink.emit(
                    Diagnostic::warning(format!("failed to de-overlap cluster {cluster_id}"))
                        .with_note("falling back to free-space search"),
                );
                special_working_set.insert(cluster_id);
                let occupancy = self.occupancy(&cluster_cells, false)?;
                let extra = self.find_space(&occupancy, overlap.len())?;
                for free in extra {
                    let Some(cell) = overlap.pop_first() else {
                        break;
                    };
                    let cells = cluster_cells
                        .get_mut(&cluster_id)
                        .expect("cluster has a cell set");
                    cells.remove(&cell);
                    cells.insert(free);
                }
            }
            if cluster_cells[&cluster_id].len() != self.capacity(cluster_id) {
                return Err(InternalError::new(format!(
                    "cluster {cluster_id} lost cells while de-overlapping"
                ))
                .into());
            }
        }

        // Fatal if any overlap survived.
        self.occupancy(&cluster_cells, true)?;

        // Squeeze everything toward the center.
        for _ in 0..self.squeeze_iter {
            for &cluster_id in &self.ids {
                self.squeeze_cluster(&mut cluster_cells, cluster_id)?;
            }
        }
        for &cluster_id in &special_working_set {
            loop {
                let moves = self.squeeze_cluster(&mut cluster_cells, cluster_id)?;
                if moves <= SPECIAL_SETTLE_MOVES {
                    break;
                }
            }
        }

        let centroids = compute_centroids(&cluster_cells);
        Ok((cluster_cells, centroids))
    }
}

impl std::fmt::Debug for ClusterPlacer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterPlacer")
            .field("clusters", &self.clusters.len())
            .field("state", &self.state)
            .finish()
    }
}

impl AnnealState for ClusterPlacer<'_> {
    type Undo = ClusterUndo;
    type Snapshot = BTreeMap<ClusterId, Pos>;

    fn propose(&mut self, rng: &mut StdRng) -> Option<Self::Undo> {
        if self.ids.is_empty() {
            return None;
        }
        if self.ids.len() > 1 {
            let first = rng.gen_range(0..self.ids.len());
            let mut second = rng.gen_range(0..self.ids.len() - 1);
            if second >= first {
                second += 1;
            }
            let (id1, id2) = (self.ids[first], self.ids[second]);
            let pos1 = self.state[&id1];
            let pos2 = self.state[&id2];
            // Evaluate legality on the resulting state, then keep or
            // roll back and fall through to a direct move.
            self.state.insert(id1, pos2);
            self.state.insert(id2, pos1);
            if self.footprint_is_legal(pos2, id1, &self.state)
                && self.footprint_is_legal(pos1, id2, &self.state)
            {
                return Some(ClusterUndo::Swap(id1, id2));
            }
            self.state.insert(id1, pos1);
            self.state.insert(id2, pos2);
        }

        let id = self.ids[rng.gen_range(0..self.ids.len())];
        let pos = self.state[&id];
        let dx = rng.gen_range(-2..=2);
        let dy = rng.gen_range(-2..=2);
        let moved = pos.offset(dx, dy);
        if moved != pos && self.footprint_is_legal(moved, id, &self.state) {
            self.state.insert(id, moved);
            return Some(ClusterUndo::Nudge(id, pos));
        }
        None
    }

    fn revert(&mut self, undo: Self::Undo) {
        match undo {
            ClusterUndo::Swap(id1, id2) => {
                let pos1 = self.state[&id1];
                let pos2 = self.state[&id2];
                self.state.insert(id1, pos2);
                self.state.insert(id2, pos1);
            }
            ClusterUndo::Nudge(id, old) => {
                self.state.insert(id, old);
            }
        }
    }

    fn energy(&self) -> f64 {
        let centers = self.footprint_centers();
        let positions = merged_positions(
            &self.board_pos,
            centers
                .iter()
                .map(|(&id, &pos)| (BlockId::centroid(id), pos)),
        );
        wirelength(&self.netlist, &positions)
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.state.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.state = snapshot;
    }
}
