//! Preprocessing helpers (merge coincident generators).

use crate::plane_grid::PlaneGrid;
use crate::Point2;

/// Result of merging coincident generators before cell construction.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Points to build cells for (representatives only).
    pub effective_points: Vec<Point2>,
    /// Original index of each effective point (its representative).
    pub effective_to_original: Vec<usize>,
    /// Maps original point index -> index in `effective_points`.
    pub original_to_effective: Vec<usize>,
    /// Number of points that were merged (removed).
    pub num_merged: usize,
}

impl MergeResult {
    fn identity(points: &[Point2]) -> Self {
        let n = points.len();
        Self {
            effective_points: points.to_vec(),
            effective_to_original: (0..n).collect(),
            original_to_effective: (0..n).collect(),
            num_merged: 0,
        }
    }
}

struct MergeDsu {
    parent: Vec<u32>,
}

impl MergeDsu {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    // Order-dependent merge: keep the smaller representative as the parent.
    fn union_keep_min(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (min, max) = if ra <= rb { (ra, rb) } else { (rb, ra) };
            self.parent[max as usize] = min;
        }
    }
}

/// Find and merge points closer than `threshold` (transitively).
///
/// The lowest original index of each group is its representative, and the
/// effective points keep the representatives' relative order.
pub fn merge_close_points(points: &[Point2], threshold: f64) -> MergeResult {
    let n = points.len();
    if n == 0 || !(threshold > 0.0) {
        return MergeResult::identity(points);
    }

    let threshold_sq = threshold * threshold;
    let mut dsu = MergeDsu::new(n);
    let mut try_pair = |a: u32, b: u32| {
        if points[a as usize].distance_squared(points[b as usize]) < threshold_sq {
            dsu.union_keep_min(a, b);
        }
    };

    let grid = PlaneGrid::new(points);
    if threshold <= grid.cell_size() {
        // Any close pair shares a cell or sits in adjacent cells.
        for cell in 0..grid.num_cells() {
            let a_points = grid.cell_points(cell);
            if a_points.is_empty() {
                continue;
            }
            for (i, &ai) in a_points.iter().enumerate() {
                for &aj in &a_points[i + 1..] {
                    try_pair(ai, aj);
                }
            }
            for nb in grid.cell_neighbors(cell) {
                if nb <= cell {
                    continue;
                }
                for &ai in a_points {
                    for &bj in grid.cell_points(nb) {
                        try_pair(ai, bj);
                    }
                }
            }
        }
    } else {
        tracing::debug!(threshold, "merge threshold exceeds grid cell size, checking all pairs");
        for a in 0..n as u32 {
            for b in (a + 1)..n as u32 {
                try_pair(a, b);
            }
        }
    }

    let mut rep_to_effective: Vec<Option<usize>> = vec![None; n];
    let mut effective_points = Vec::new();
    let mut effective_to_original = Vec::new();
    let mut original_to_effective = vec![0usize; n];

    for i in 0..n {
        let rep = dsu.find(i as u32) as usize;
        let eff = match rep_to_effective[rep] {
            Some(e) => e,
            None => {
                let e = effective_points.len();
                rep_to_effective[rep] = Some(e);
                effective_points.push(points[rep]);
                effective_to_original.push(rep);
                e
            }
        };
        original_to_effective[i] = eff;
    }

    let num_merged = n - effective_points.len();
    MergeResult {
        effective_points,
        effective_to_original,
        original_to_effective,
        num_merged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_merges_is_identity() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let r = merge_close_points(&pts, 1e-9);
        assert_eq!(r.num_merged, 0);
        assert_eq!(r.original_to_effective, vec![0, 1, 2]);
        assert_eq!(r.effective_points, pts);
    }

    #[test]
    fn test_duplicates_merge_to_lowest_index() {
        let pts = vec![
            Point2::new(5.0, 5.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 5.0),
        ];
        let r = merge_close_points(&pts, 1e-9);
        assert_eq!(r.num_merged, 2);
        assert_eq!(r.effective_to_original, vec![0, 1, 2]);
        assert_eq!(r.original_to_effective, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_merge_is_transitive() {
        // 0-1 and 1-2 are within threshold, 0-2 is not.
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.6, 0.0),
            Point2::new(1.2, 0.0),
            Point2::new(10.0, 10.0),
        ];
        let r = merge_close_points(&pts, 0.7);
        assert_eq!(r.original_to_effective, vec![0, 0, 0, 1]);
        assert_eq!(r.num_merged, 2);
    }

    #[test]
    fn test_zero_threshold_disables_merge() {
        let pts = vec![Point2::new(1.0, 1.0); 4];
        let r = merge_close_points(&pts, 0.0);
        assert_eq!(r.num_merged, 0);
        assert_eq!(r.effective_points.len(), 4);
    }
}
