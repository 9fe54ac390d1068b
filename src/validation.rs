//! Geometric validation for planar Voronoi diagrams.
//!
//! Provides functions to verify that a diagram actually partitions the plane
//! by nearest generator. Useful for debugging, testing, and catching
//! numerical issues.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::geometry::{point_in_convex_polygon, signed_area};
use crate::plane_grid::{bounding_box, PlaneGrid};
use crate::{PlanarVoronoi, Point2};

/// Neighbor cells checked for overlap at each sample.
const OVERLAP_CANDIDATES: usize = 8;

/// Detailed validation report for a planar Voronoi diagram.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Number of cells in the diagram.
    pub num_cells: usize,
    pub bounded_cells: usize,
    /// Hull and promoted cells.
    pub unbounded_cells: usize,
    pub promoted_cells: usize,

    /// Bounded cells with < 3 vertices.
    pub malformed_cells: Vec<usize>,
    /// Bounded cells with non-positive signed area.
    pub clockwise_cells: Vec<usize>,
    /// Bounded cells with two consecutive identical vertices.
    pub duplicate_vertex_cells: Vec<usize>,
    /// Cell edges (i -> j) whose reverse (j -> i) is missing, counted only
    /// between bounded cells with distinct generators.
    pub asymmetric_edges: usize,

    /// Samples drawn inside the generators' bounding box.
    pub samples: usize,
    /// Samples whose nearest generator has an unbounded cell.
    pub unbounded_samples: usize,
    /// Samples outside the bounded cell of their nearest generator.
    pub uncovered_samples: usize,
    /// Samples strictly inside the cell of a farther generator.
    pub overlapping_samples: usize,
}

impl ValidationReport {
    /// True when no structural or partition issue was found.
    pub fn is_valid(&self) -> bool {
        self.malformed_cells.is_empty()
            && self.clockwise_cells.is_empty()
            && self.duplicate_vertex_cells.is_empty()
            && self.asymmetric_edges == 0
            && self.uncovered_samples == 0
            && self.overlapping_samples == 0
    }

    /// Format a summary of any issues found.
    pub fn summary(&self) -> String {
        let mut issues = Vec::new();

        if !self.malformed_cells.is_empty() {
            issues.push(format!("{} malformed cells", self.malformed_cells.len()));
        }
        if !self.clockwise_cells.is_empty() {
            issues.push(format!("{} clockwise cells", self.clockwise_cells.len()));
        }
        if !self.duplicate_vertex_cells.is_empty() {
            issues.push(format!(
                "{} cells with duplicate vertices",
                self.duplicate_vertex_cells.len()
            ));
        }
        if self.asymmetric_edges > 0 {
            issues.push(format!("{} asymmetric edges", self.asymmetric_edges));
        }
        if self.uncovered_samples > 0 {
            issues.push(format!(
                "{}/{} samples outside their nearest cell",
                self.uncovered_samples, self.samples
            ));
        }
        if self.overlapping_samples > 0 {
            issues.push(format!(
                "{}/{} samples in overlapping cells",
                self.overlapping_samples, self.samples
            ));
        }

        if issues.is_empty() {
            "Valid".to_string()
        } else {
            issues.join(", ")
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ValidationReport {{ cells={}, bounded={}, unbounded={}, samples={}, {} }}",
            self.num_cells,
            self.bounded_cells,
            self.unbounded_cells,
            self.samples,
            self.summary()
        )
    }
}

/// Validate a planar Voronoi diagram.
///
/// Checks:
/// - Bounded cells have ≥ 3 distinct consecutive vertices, counter-clockwise
/// - Adjacency is symmetric between bounded cells
/// - `samples` random locations in the generators' bounding box lie in the
///   cell of their nearest generator and in no farther generator's cell
pub fn validate(diagram: &PlanarVoronoi, samples: usize, seed: u64) -> ValidationReport {
    let generators = &diagram.generators;
    let mut report = ValidationReport {
        num_cells: diagram.num_cells(),
        promoted_cells: diagram.promoted_cells().len(),
        ..Default::default()
    };

    // Generators that appear more than once share a cell and its labels.
    let mut position_counts: FxHashMap<[u64; 2], u32> = FxHashMap::default();
    for g in generators {
        *position_counts
            .entry([g.x.to_bits(), g.y.to_bits()])
            .or_insert(0) += 1;
    }
    let is_unique = |i: usize| {
        let g = generators[i];
        position_counts.get(&[g.x.to_bits(), g.y.to_bits()]) == Some(&1)
    };

    let mut edges: FxHashSet<(u32, u32)> = FxHashSet::default();
    for cell in diagram.iter_cells() {
        if !cell.is_bounded() {
            report.unbounded_cells += 1;
            continue;
        }
        report.bounded_cells += 1;
        let i = cell.generator_index;
        let len = cell.len();
        if len < 3 {
            report.malformed_cells.push(i);
            continue;
        }
        if signed_area(cell.vertices) <= 0.0 {
            report.clockwise_cells.push(i);
        }
        if (0..len).any(|k| cell.vertices[k] == cell.vertices[(k + 1) % len]) {
            report.duplicate_vertex_cells.push(i);
        }
        for j in cell.neighbors() {
            edges.insert((i as u32, j as u32));
        }
    }

    report.asymmetric_edges = edges
        .iter()
        .filter(|&&(i, j)| {
            let (i, j) = (i as usize, j as usize);
            is_unique(i)
                && is_unique(j)
                && diagram.cell(j).is_bounded()
                && !edges.contains(&(j as u32, i as u32))
        })
        .count();

    if samples > 0 && !generators.is_empty() {
        check_partition(diagram, samples, seed, &mut report);
    }
    report
}

fn check_partition(diagram: &PlanarVoronoi, samples: usize, seed: u64, report: &mut ValidationReport) {
    let generators = &diagram.generators;
    let grid = PlaneGrid::new(generators);
    let (lo, hi) = bounding_box(generators);
    let extent = (hi - lo).max_element().max(f64::MIN_POSITIVE);
    let tol = 1e-9 * extent;
    let k = OVERLAP_CANDIDATES.min(generators.len());

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut scratch = grid.make_scratch();
    let mut near = Vec::with_capacity(k);
    report.samples = samples;

    for _ in 0..samples {
        let s = Point2::new(rng.gen_range(lo.x..=hi.x), rng.gen_range(lo.y..=hi.y));
        grid.find_k_nearest_into(s.to_glam(), k, &mut scratch, &mut near);
        let nearest = near[0];
        let best_d = generators[nearest].distance_squared(s).sqrt();

        let cell = diagram.cell(nearest);
        if !cell.is_bounded() {
            report.unbounded_samples += 1;
        } else if !point_in_convex_polygon(s, cell.vertices, tol) {
            report.uncovered_samples += 1;
        }

        // A farther generator's cell may only touch the sample on its boundary.
        let overlaps = near[1..].iter().any(|&j| {
            let other = diagram.cell(j);
            let d = generators[j].distance_squared(s).sqrt();
            other.is_bounded()
                && d - best_d > tol
                && point_in_convex_polygon(s, other.vertices, -tol)
        });
        if overlaps {
            report.overlapping_samples += 1;
        }
    }
}
