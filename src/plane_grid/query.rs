//! k-NN queries for PlaneGrid.

use glam::DVec2;

use super::{KnnStatus, PlaneGrid, PlaneGridScratch};

impl PlaneGrid {
    /// Find the `k` nearest points to `query`, writing indices to `out` in
    /// ascending (distance, index) order.
    ///
    /// `k` is clamped to the number of indexed points. Returns `Exhausted`
    /// when every point was returned.
    pub fn find_k_nearest_into(
        &self,
        query: DVec2,
        k: usize,
        scratch: &mut PlaneGridScratch,
        out: &mut Vec<usize>,
    ) -> KnnStatus {
        out.clear();
        let n = self.len();
        let k = k.min(n);
        if k == 0 {
            return KnnStatus::Exhausted;
        }

        scratch.begin_query();
        let start = self.point_to_cell(query);
        scratch.mark_visited(start);
        scratch.push_cell(start, self.cell_min_dist_sq(query, start));

        while let Some((bound, cell)) = scratch.pop_cell() {
            // Equal bounds may still hold a tie with a lower index, so only a
            // strictly larger bound ends the search.
            if let Some(kth) = scratch.kth_dist_sq(k) {
                if bound > kth {
                    break;
                }
            }
            self.scan_cell_points(query, cell, k, scratch);
            for nb in self.cell_neighbors(cell) {
                if scratch.mark_visited(nb) {
                    scratch.push_cell(nb, self.cell_min_dist_sq(query, nb));
                }
            }
        }

        scratch.drain_sorted_into(out);
        if k == n {
            KnnStatus::Exhausted
        } else {
            KnnStatus::CanResume
        }
    }

    /// Like `find_k_nearest_into` centred on indexed point `idx`, with `idx`
    /// guaranteed to be the first entry.
    ///
    /// Only differs from the plain query when another point coincides with
    /// `idx` and has a lower index.
    pub fn find_k_nearest_self_into(
        &self,
        idx: usize,
        k: usize,
        scratch: &mut PlaneGridScratch,
        out: &mut Vec<usize>,
    ) -> KnnStatus {
        let status = self.find_k_nearest_into(self.point(idx), k, scratch, out);
        if out.is_empty() {
            return status;
        }
        match out.iter().position(|&j| j == idx) {
            Some(pos) => out[..=pos].rotate_right(1),
            None => {
                out.pop();
                out.insert(0, idx);
            }
        }
        status
    }

    #[inline]
    fn scan_cell_points(&self, query: DVec2, cell: usize, k: usize, scratch: &mut PlaneGridScratch) {
        let start = self.cell_offsets[cell] as usize;
        let end = self.cell_offsets[cell + 1] as usize;
        for slot in start..end {
            let dx = self.cell_points_x[slot] - query.x;
            let dy = self.cell_points_y[slot] - query.y;
            let dist_sq = dx * dx + dy * dy;
            scratch.try_add_neighbor(self.point_indices[slot], dist_sq, k);
        }
    }

    /// Brute-force reference query, used to cross-check the grid in tests.
    #[cfg(test)]
    pub(crate) fn bruteforce_k_nearest(&self, query: DVec2, k: usize) -> Vec<usize> {
        let mut all: Vec<(f64, usize)> = (0..self.len())
            .map(|i| (self.point(i).distance_squared(query), i))
            .collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        all.into_iter().take(k).map(|(_, i)| i).collect()
    }
}
