//! Grid build helpers for PlaneGrid.

use glam::DVec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

use super::{PlaneGrid, GRID_TARGET_DENSITY};
use crate::Point2;

impl PlaneGrid {
    /// Build a grid over `points` with the default cell occupancy.
    pub fn new(points: &[Point2]) -> Self {
        Self::new_with_target_density(points, GRID_TARGET_DENSITY)
    }

    /// Build a grid sized so that cells hold about `target_points_per_cell` points.
    ///
    /// The cell size is the larger of the area-based size and a line-based
    /// size, so near-collinear inputs never allocate more than about
    /// `3n / target` cells.
    pub fn new_with_target_density(points: &[Point2], target_points_per_cell: f64) -> Self {
        let n = points.len();
        assert!(
            n <= u32::MAX as usize,
            "PlaneGrid supports at most u32::MAX points"
        );

        let (min, max) = bounding_box(points);
        let extent = max - min;
        let span = extent.x.max(extent.y);
        let target = target_points_per_cell.max(1.0);
        let cell_size = if n == 0 || !(span > 0.0) {
            1.0
        } else {
            let area_based = (extent.x * extent.y * target / n as f64).sqrt();
            let line_based = span * target / n as f64;
            area_based.max(line_based)
        };
        let res_x = (extent.x / cell_size).floor() as usize + 1;
        let res_y = (extent.y / cell_size).floor() as usize + 1;
        let num_cells = res_x * res_y;

        let mut grid = PlaneGrid {
            res_x,
            res_y,
            origin: min,
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cell_offsets: Vec::new(),
            point_indices: Vec::new(),
            cell_points_x: Vec::new(),
            cell_points_y: Vec::new(),
            point_slots: Vec::new(),
        };

        // Step 1: classify points into cells.
        let point_cells: Vec<u32> = maybe_par_iter!(points)
            .map(|p| grid.point_to_cell(p.to_glam()) as u32)
            .collect();

        // Step 2: counting sort. Scattering in index order keeps each cell ascending.
        let mut cell_offsets = vec![0u32; num_cells + 1];
        for &c in &point_cells {
            cell_offsets[c as usize + 1] += 1;
        }
        for i in 0..num_cells {
            cell_offsets[i + 1] += cell_offsets[i];
        }

        let mut cursor: Vec<u32> = cell_offsets[..num_cells].to_vec();
        let mut point_indices = vec![0u32; n];
        let mut point_slots = vec![0u32; n];
        let mut cell_points_x = vec![0.0f64; n];
        let mut cell_points_y = vec![0.0f64; n];
        for (i, (&c, p)) in point_cells.iter().zip(points).enumerate() {
            let slot = cursor[c as usize];
            cursor[c as usize] += 1;
            point_indices[slot as usize] = i as u32;
            point_slots[i] = slot;
            cell_points_x[slot as usize] = p.x;
            cell_points_y[slot as usize] = p.y;
        }

        grid.cell_offsets = cell_offsets;
        grid.point_indices = point_indices;
        grid.point_slots = point_slots;
        grid.cell_points_x = cell_points_x;
        grid.cell_points_y = cell_points_y;
        grid
    }
}

/// Axis-aligned bounds of `points`; a unit box at the origin when empty.
pub(crate) fn bounding_box(points: &[Point2]) -> (DVec2, DVec2) {
    if points.is_empty() {
        return (DVec2::ZERO, DVec2::ONE);
    }
    points.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(lo, hi), p| {
            let v = p.to_glam();
            (lo.min(v), hi.max(v))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let pts = [
            Point2::new(1.0, -2.0),
            Point2::new(-3.0, 4.0),
            Point2::new(0.5, 0.5),
        ];
        let (lo, hi) = bounding_box(&pts);
        assert_eq!(lo, DVec2::new(-3.0, -2.0));
        assert_eq!(hi, DVec2::new(1.0, 4.0));
    }

    #[test]
    fn test_collinear_input_stays_small() {
        let pts: Vec<Point2> = (0..10_000).map(|i| Point2::new(i as f64, 0.0)).collect();
        let grid = PlaneGrid::new(&pts);
        assert!(
            grid.num_cells() <= 3 * pts.len(),
            "too many cells for collinear input: {}",
            grid.num_cells()
        );
    }

    #[test]
    fn test_identical_points() {
        let pts = vec![Point2::new(2.0, 2.0); 5];
        let grid = PlaneGrid::new(&pts);
        assert_eq!(grid.num_cells(), 1);
        assert_eq!(grid.cell_points(0), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_grid() {
        let grid = PlaneGrid::new(&[]);
        assert!(grid.is_empty());
        assert_eq!(grid.num_cells(), 1);
    }
}
