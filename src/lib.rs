//! Surface-density estimation on planar Voronoi tessellations.
//!
//! Each input point carries a mass. The crate builds the Voronoi diagram of
//! the points, pools the masses and cell areas of every point's k nearest
//! neighbors (including itself) into a local density, and normalizes the
//! result to `[0, 1]` for rendering.
//!
//! # Example
//!
//! ```
//! use voronoi_density::{compute, Point2};
//!
//! // Four corners of a square plus its centre
//! let points = vec![
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(0.0, 1.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.5, 0.5),
//! ];
//! let masses = vec![1.0; 5];
//!
//! let output = compute(&points, &masses).expect("computation should succeed");
//! assert_eq!(output.diagram.num_cells(), 5);
//! // Every neighborhood touches a hull cell, so every density is 0.
//! assert!(output.normalized.is_degenerate_max());
//! ```

mod diagram;
mod error;
mod fp;
mod types;

pub mod density;
pub mod geometry;
pub mod hull;
pub mod normalize;
pub mod validation;

// Internal modules
pub(crate) mod knn_clipping;
pub(crate) mod plane_grid;

pub use density::DensityField;
pub use diagram::{Cell, CellKind, CellView, PlanarVoronoi};
pub use error::DensityError;
pub use geometry::CellAreas;
pub use knn_clipping::{merge_close_points, MergeResult, TerminationConfig};
pub use normalize::{NormalizedDensity, DEFAULT_LOWER_LIMIT};
pub use plane_grid::{KnnStatus, PlaneGrid, PlaneGridScratch};
pub use types::{Point2, Point2Like};

use knn_clipping::constants::merge_threshold_for_extent;
use knn_clipping::timing::{Timer, TimingBuilder};

/// Output from density computation, including every intermediate stage.
#[derive(Debug, Clone)]
pub struct DensityOutput {
    /// The Voronoi tessellation of the input points.
    pub diagram: PlanarVoronoi,
    /// Area of every cell (`f64::INFINITY` for unbounded cells).
    pub areas: CellAreas,
    /// Raw neighborhood densities.
    pub density: DensityField,
    /// Densities scaled to `[0, 1]` with small values masked.
    pub normalized: NormalizedDensity,
    /// Diagnostic information about the computation.
    pub diagnostics: DensityDiagnostics,
}

/// Diagnostic information from density computation.
///
/// None of these are errors; they flag inputs worth a second look.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityDiagnostics {
    /// Points whose neighborhood had zero total area (density set to 0).
    pub degenerate_points: Vec<usize>,
    /// Points whose neighborhood touched an unbounded cell (density 0).
    pub unbounded_neighborhoods: usize,
    /// Cells treated as unbounded (hull and promoted).
    pub unbounded_cells: usize,
    /// Interior cells that could not be closed and were treated as unbounded.
    pub promoted_cells: Vec<usize>,
    /// Points merged into a coincident representative before tessellation.
    pub merged_points: usize,
    /// Cells that hit the neighbor cap before they were certified.
    pub uncertified_cells: usize,
    /// The maximum density was not positive; the normalized field is all 0.
    pub degenerate_max: bool,
}

impl DensityDiagnostics {
    /// Returns true if no issues were detected.
    pub fn is_clean(&self) -> bool {
        self.degenerate_points.is_empty()
            && self.promoted_cells.is_empty()
            && self.uncertified_cells == 0
            && !self.degenerate_max
    }
}

/// Configuration for density computation.
#[derive(Debug, Clone)]
pub struct DensityConfig {
    /// Neighborhood size, counting the point itself. `k = 2` pools each point
    /// with its single nearest neighbor.
    pub k: usize,
    /// Normalized values at or below this are set to 0.
    pub lower_limit: f64,
    /// If true, merge coincident points before tessellation.
    ///
    /// Merged points share their representative's cell. With merging off,
    /// coincident points each get the same cell.
    pub preprocess: bool,
    /// Merge distance. `None` uses a tiny fraction of the input extent, so
    /// only numerically coincident points merge.
    pub merge_threshold: Option<f64>,
    /// kNN schedule for cell clipping.
    pub termination: TerminationConfig,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            k: 2,
            lower_limit: DEFAULT_LOWER_LIMIT,
            preprocess: true,
            merge_threshold: None,
            termination: TerminationConfig::default(),
        }
    }
}

impl DensityConfig {
    /// Check this configuration against an input of `n` points.
    pub fn validate(&self, n: usize) -> Result<(), DensityError> {
        if n < 3 {
            return Err(DensityError::InsufficientPoints(n));
        }
        if self.k == 0 || self.k > n {
            return Err(DensityError::InvalidNeighborCount { k: self.k, n });
        }
        normalize::check_lower_limit(self.lower_limit)
    }

    fn merge_threshold(&self, points: &[Point2]) -> Option<f64> {
        if !self.preprocess {
            return None;
        }
        Some(self.merge_threshold.unwrap_or_else(|| {
            let (lo, hi) = plane_grid::bounding_box(points);
            merge_threshold_for_extent((hi - lo).max_element())
        }))
    }
}

/// Compute the Voronoi tessellation with default settings.
pub fn tessellate<P: Point2Like>(points: &[P]) -> Result<PlanarVoronoi, DensityError> {
    tessellate_with(points, &DensityConfig::default())
}

/// Compute the Voronoi tessellation with explicit configuration.
///
/// Only `preprocess`, `merge_threshold` and `termination` are used.
pub fn tessellate_with<P: Point2Like>(
    points: &[P],
    config: &DensityConfig,
) -> Result<PlanarVoronoi, DensityError> {
    let pts = convert_points(points)?;
    if pts.len() < 3 {
        return Err(DensityError::InsufficientPoints(pts.len()));
    }
    let out = knn_clipping::build_tessellation(&pts, config.termination, config.merge_threshold(&pts))?;
    Ok(out.diagram)
}

/// Compute normalized densities with default settings (k = 2).
///
/// Returns every stage plus diagnostics. Errors are reserved for invalid
/// inputs (e.g., too few or collinear points) or malformed cells.
pub fn compute<P: Point2Like>(points: &[P], masses: &[f64]) -> Result<DensityOutput, DensityError> {
    compute_with(points, masses, &DensityConfig::default())
}

/// Compute normalized densities with explicit configuration.
pub fn compute_with<P: Point2Like>(
    points: &[P],
    masses: &[f64],
    config: &DensityConfig,
) -> Result<DensityOutput, DensityError> {
    let pts = convert_points(points)?;
    if masses.len() != pts.len() {
        return Err(DensityError::LengthMismatch {
            points: pts.len(),
            masses: masses.len(),
        });
    }
    density::check_masses(masses)?;
    config.validate(pts.len())?;

    let tess = knn_clipping::build_tessellation(&pts, config.termination, config.merge_threshold(&pts))?;
    let diagram = tess.diagram;

    let mut tb = TimingBuilder::new();

    let t = Timer::start();
    let areas = CellAreas::compute(&diagram)?;
    tb.set_areas(t.elapsed());

    let t = Timer::start();
    let index = PlaneGrid::new(&pts);
    tb.set_knn_build(t.elapsed());

    let t = Timer::start();
    let density = density::estimate_with_areas(masses, &areas, &index, config.k)?;
    tb.set_density(t.elapsed());

    let t = Timer::start();
    let normalized = normalize::normalize_field(&density, config.lower_limit)?;
    tb.set_normalize(t.elapsed());

    let timings = tb.finish();
    timings.report("density", pts.len());

    let diagnostics = DensityDiagnostics {
        degenerate_points: density.degenerate_points.clone(),
        unbounded_neighborhoods: density.unbounded_neighborhoods,
        unbounded_cells: diagram.num_unbounded(),
        promoted_cells: diagram.promoted_cells(),
        merged_points: tess.merged_points,
        uncertified_cells: tess.uncertified_cells,
        degenerate_max: normalized.is_degenerate_max(),
    };
    tracing::debug!(
        n = pts.len(),
        k = config.k,
        masked = normalized.masked_count(),
        clean = diagnostics.is_clean(),
        "density computed"
    );

    Ok(DensityOutput {
        diagram,
        areas,
        density,
        normalized,
        diagnostics,
    })
}

fn convert_points<P: Point2Like>(points: &[P]) -> Result<Vec<Point2>, DensityError> {
    points
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let q = Point2::from_like(p);
            if q.is_finite() {
                Ok(q)
            } else {
                Err(DensityError::NonFiniteCoordinate { index })
            }
        })
        .collect()
}
