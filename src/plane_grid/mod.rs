//! Uniform-grid spatial index for fast k-nearest-neighbor queries in the plane.
//!
//! Buckets points into a regular grid over their bounding box.
//! O(n) build, O(1) cell lookup.
//!
//! Queries use best-first expansion over neighboring cells with exact
//! point-to-rectangle distance bounds. Results are ordered by increasing
//! distance, ties broken by lower point index, so every query is
//! deterministic regardless of grid resolution.

mod build;
mod query;

pub(crate) use build::bounding_box;

use glam::DVec2;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::{DensityError, Point2};

/// Target points per grid cell.
/// Lower = more cells, faster scans, more heap overhead.
/// Higher = fewer cells, longer scans, less overhead.
pub const GRID_TARGET_DENSITY: f64 = 4.0;

/// A f64 wrapper that implements Ord using total_cmp.
/// Unlike NotNan, this doesn't check for NaN - it just orders NaN consistently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl OrdF64 {
    #[inline]
    pub(crate) fn new(v: f64) -> Self {
        OrdF64(v)
    }

    #[inline]
    pub(crate) fn get(self) -> f64 {
        self.0
    }
}

/// Uniform spatial grid over a planar point set.
#[derive(Debug, Clone)]
pub struct PlaneGrid {
    pub(super) res_x: usize,
    pub(super) res_y: usize,
    /// Lower-left corner of cell (0, 0).
    pub(super) origin: DVec2,
    pub(super) cell_size: f64,
    pub(super) inv_cell_size: f64,
    /// Start index into point_indices for each cell, plus final length.
    /// Length: res_x * res_y + 1
    pub(super) cell_offsets: Vec<u32>,
    /// Point indices grouped by cell, ascending within each cell.
    /// Length: n (number of points)
    pub(super) point_indices: Vec<u32>,

    // === SoA layout: points stored contiguous by cell ===
    /// X coordinates of points, ordered by cell (use cell_offsets for ranges).
    pub(super) cell_points_x: Vec<f64>,
    /// Y coordinates of points, ordered by cell.
    pub(super) cell_points_y: Vec<f64>,

    /// Inverse mapping from point index to SOA slot index.
    ///
    /// `point_slots[point_idx]` gives the slot in `point_indices` / `cell_points_*`.
    pub(super) point_slots: Vec<u32>,
}

/// Status of a k-NN query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnnStatus {
    /// More neighbors may be available; query can be restarted with a larger k.
    CanResume,
    /// Search exhausted; every indexed point was returned.
    Exhausted,
}

/// Reusable per-query scratch buffers.
///
/// For parallel queries, create one scratch per worker via `PlaneGrid::make_scratch()`.
#[derive(Debug)]
pub struct PlaneGridScratch {
    /// Cell visitation stamps (avoids clearing between queries)
    visited_stamp: Vec<u32>,
    stamp: u32,
    /// Priority queue for cell expansion (min-heap by distance bound)
    cell_heap: BinaryHeap<Reverse<(OrdF64, u32)>>,
    /// Current best candidates as a max-heap keyed by (dist_sq, point_idx),
    /// so the root is the worst of the k kept.
    candidates: BinaryHeap<(OrdF64, u32)>,
}

impl PlaneGrid {
    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.point_indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.point_indices.is_empty()
    }

    /// Grid resolution as (columns, rows).
    #[inline]
    pub fn resolution(&self) -> (usize, usize) {
        (self.res_x, self.res_y)
    }

    /// Side length of a grid cell.
    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.res_x * self.res_y
    }

    /// Position of an indexed point.
    #[inline]
    pub fn point(&self, idx: usize) -> DVec2 {
        let slot = self.point_slots[idx] as usize;
        DVec2::new(self.cell_points_x[slot], self.cell_points_y[slot])
    }

    /// Point indices stored in a grid cell.
    #[inline]
    pub fn cell_points(&self, cell: usize) -> &[u32] {
        let start = self.cell_offsets[cell] as usize;
        let end = self.cell_offsets[cell + 1] as usize;
        &self.point_indices[start..end]
    }

    /// Grid cell containing `p`, clamped to the grid for outside queries.
    #[inline]
    pub fn point_to_cell(&self, p: DVec2) -> usize {
        let (ix, iy) = self.point_to_cell_ij(p);
        iy * self.res_x + ix
    }

    #[inline]
    pub(super) fn point_to_cell_ij(&self, p: DVec2) -> (usize, usize) {
        let fx = ((p.x - self.origin.x) * self.inv_cell_size).floor();
        let fy = ((p.y - self.origin.y) * self.inv_cell_size).floor();
        (
            clamp_index(fx, self.res_x),
            clamp_index(fy, self.res_y),
        )
    }

    /// Indices of the 3×3 neighborhood (including `cell`), clipped to the grid.
    pub fn cell_neighbors(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        let ix = (cell % self.res_x) as isize;
        let iy = (cell / self.res_x) as isize;
        let (rx, ry) = (self.res_x as isize, self.res_y as isize);
        (-1..=1isize).flat_map(move |dy| {
            (-1..=1isize).filter_map(move |dx| {
                let nx = ix + dx;
                let ny = iy + dy;
                if nx < 0 || ny < 0 || nx >= rx || ny >= ry {
                    None
                } else {
                    Some(ny as usize * self.res_x + nx as usize)
                }
            })
        })
    }

    /// Create a scratch buffer for k-NN queries.
    #[inline]
    pub fn make_scratch(&self) -> PlaneGridScratch {
        PlaneGridScratch::new(self.num_cells())
    }

    /// Squared distance from `query` to the closest point of a grid cell rectangle.
    ///
    /// The rectangle is padded slightly so points bucketed across a rounding
    /// boundary are still covered by the bound.
    #[inline]
    pub(super) fn cell_min_dist_sq(&self, query: DVec2, cell: usize) -> f64 {
        let ix = (cell % self.res_x) as f64;
        let iy = (cell / self.res_x) as f64;
        let pad = self.cell_size * 1e-9;
        let lo = self.origin + DVec2::new(ix, iy) * self.cell_size - DVec2::splat(pad);
        let hi = lo + DVec2::splat(self.cell_size + 2.0 * pad);
        let dx = (lo.x - query.x).max(query.x - hi.x).max(0.0);
        let dy = (lo.y - query.y).max(query.y - hi.y).max(0.0);
        dx * dx + dy * dy
    }

    /// The `k` nearest indexed points to `p`, by increasing distance.
    ///
    /// Ties are broken by lower index. Requires `1 <= k <= len()`.
    pub fn query(&self, p: Point2, k: usize) -> Result<Vec<usize>, DensityError> {
        self.check_k(k)?;
        let mut scratch = self.make_scratch();
        let mut out = Vec::with_capacity(k);
        self.find_k_nearest_into(p.to_glam(), k, &mut scratch, &mut out);
        Ok(out)
    }

    /// The `k` nearest points to indexed point `idx`, always including `idx`
    /// itself as the first entry.
    pub fn query_point(&self, idx: usize, k: usize) -> Result<Vec<usize>, DensityError> {
        self.check_k(k)?;
        let mut scratch = self.make_scratch();
        let mut out = Vec::with_capacity(k);
        self.find_k_nearest_self_into(idx, k, &mut scratch, &mut out);
        Ok(out)
    }

    #[inline]
    fn check_k(&self, k: usize) -> Result<(), DensityError> {
        if k == 0 || k > self.len() {
            return Err(DensityError::InvalidNeighborCount { k, n: self.len() });
        }
        Ok(())
    }
}

#[inline]
fn clamp_index(f: f64, res: usize) -> usize {
    if f.is_nan() || f <= 0.0 {
        0
    } else if f >= (res - 1) as f64 {
        res - 1
    } else {
        f as usize
    }
}

impl PlaneGridScratch {
    pub fn new(num_cells: usize) -> Self {
        Self {
            visited_stamp: vec![0; num_cells],
            stamp: 0,
            cell_heap: BinaryHeap::new(),
            candidates: BinaryHeap::new(),
        }
    }

    #[inline]
    pub(super) fn begin_query(&mut self) {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.visited_stamp.fill(0);
            self.stamp = 1;
        }
        self.cell_heap.clear();
        self.candidates.clear();
    }

    #[inline]
    pub(super) fn mark_visited(&mut self, cell: usize) -> bool {
        if self.visited_stamp[cell] == self.stamp {
            return false;
        }
        self.visited_stamp[cell] = self.stamp;
        true
    }

    #[inline]
    pub(super) fn push_cell(&mut self, cell: usize, bound_dist_sq: f64) {
        self.cell_heap
            .push(Reverse((OrdF64::new(bound_dist_sq), cell as u32)));
    }

    #[inline]
    pub(super) fn pop_cell(&mut self) -> Option<(f64, usize)> {
        self.cell_heap
            .pop()
            .map(|Reverse((bound, cell))| (bound.get(), cell as usize))
    }

    /// Distance of the worst kept candidate, once `k` are held.
    #[inline]
    pub(super) fn kth_dist_sq(&self, k: usize) -> Option<f64> {
        if self.candidates.len() < k {
            return None;
        }
        self.candidates.peek().map(|(d, _)| d.get())
    }

    /// Offer a candidate; keeps the k smallest by (dist_sq, index).
    #[inline]
    pub(super) fn try_add_neighbor(&mut self, idx: u32, dist_sq: f64, k: usize) {
        let key = (OrdF64::new(dist_sq), idx);
        if self.candidates.len() < k {
            self.candidates.push(key);
        } else if let Some(worst) = self.candidates.peek() {
            if key < *worst {
                self.candidates.pop();
                self.candidates.push(key);
            }
        }
    }

    /// Drain candidates into `out` in ascending (dist_sq, index) order.
    #[inline]
    pub(super) fn drain_sorted_into(&mut self, out: &mut Vec<usize>) {
        let mut sorted = std::mem::take(&mut self.candidates).into_sorted_vec();
        out.extend(sorted.iter().map(|&(_, idx)| idx as usize));
        // Hand the allocation back for the next query.
        sorted.clear();
        self.candidates = BinaryHeap::from(sorted);
    }
}
