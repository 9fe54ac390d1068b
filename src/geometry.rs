//! Region geometry: polygon areas and point-in-cell tests.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::diagram::{Cell, PlanarVoronoi};
use crate::fp::{self, fma_f64, orient2d};
use crate::plane_grid::bounding_box;
use crate::{DensityError, Point2};

/// Signed shoelace area; positive for counter-clockwise vertex order.
///
/// Cross products are taken relative to the first vertex, which keeps the
/// sum well conditioned for small polygons far from the origin.
pub fn signed_area(vertices: &[Point2]) -> f64 {
    signed_area_scaled(vertices, 1.0)
}

/// Signed area with every coordinate difference multiplied by `inv` before
/// the cross products. With `inv` a power of two this is exactly
/// `signed_area * inv^2` whenever both are in the normal range.
fn signed_area_scaled(vertices: &[Point2], inv: f64) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let o = vertices[0];
    let mut twice = 0.0;
    for w in vertices[1..].windows(2) {
        let (a, b) = (w[0], w[1]);
        let (ax, ay) = ((a.x - o.x) * inv, (a.y - o.y) * inv);
        let (bx, by) = ((b.x - o.x) * inv, (b.y - o.y) * inv);
        twice = fma_f64(ax, by, twice) - ay * bx;
    }
    0.5 * twice
}

/// Unsigned polygon area, independent of vertex order direction.
#[inline]
pub fn polygon_area(vertices: &[Point2]) -> f64 {
    signed_area(vertices).abs()
}

/// Area of cell `index`: `f64::INFINITY` for an unbounded cell.
///
/// A polygon with fewer than 3 vertices is `MalformedCell`.
pub fn cell_area(index: usize, cell: Cell<'_>) -> Result<f64, DensityError> {
    match cell {
        Cell::Unbounded => Ok(f64::INFINITY),
        Cell::Polygon(vertices) if vertices.len() < 3 => Err(DensityError::MalformedCell {
            index,
            vertices: vertices.len(),
        }),
        Cell::Polygon(vertices) => Ok(polygon_area(vertices)),
    }
}

/// True if `p` lies inside or on a convex counter-clockwise polygon.
///
/// `tol` is an absolute slack on the edge distance.
pub fn point_in_convex_polygon(p: Point2, vertices: &[Point2], tol: f64) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let len = a.distance_squared(b).sqrt();
        orient2d(a.x, a.y, b.x, b.y, p.x, p.y) >= -tol * len
    })
}

/// Per-cell areas, computed once and indexed by point.
///
/// Alongside the areas in input units the table keeps the same areas in
/// units of `2^unit_exponent()` squared, a length close to the input extent.
/// Those stay well inside the `f64` range when the input coordinates are
/// very small or very large and the areas themselves underflow.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAreas {
    areas: Vec<f64>,
    scaled: Vec<f64>,
    unit_exp: i32,
}

impl CellAreas {
    /// Compute the area of every cell in the diagram.
    pub fn compute(diagram: &PlanarVoronoi) -> Result<Self, DensityError> {
        let (lo, hi) = bounding_box(&diagram.generators);
        let unit_exp = fp::exponent_of((hi - lo).max_element());
        let inv = fp::ldexp(1.0, -unit_exp);

        let area_of = |i: usize| -> Result<(f64, f64), DensityError> {
            let cell = diagram.cell(i);
            let area = cell.area()?;
            let scaled = if area.is_finite() {
                signed_area_scaled(cell.vertices, inv).abs()
            } else {
                area
            };
            Ok((area, scaled))
        };

        #[cfg(feature = "parallel")]
        let pairs = (0..diagram.num_cells())
            .into_par_iter()
            .map(area_of)
            .collect::<Result<Vec<_>, DensityError>>()?;
        #[cfg(not(feature = "parallel"))]
        let pairs = (0..diagram.num_cells())
            .map(area_of)
            .collect::<Result<Vec<_>, DensityError>>()?;

        let (areas, scaled) = pairs.into_iter().unzip();
        Ok(Self {
            areas,
            scaled,
            unit_exp,
        })
    }

    /// Wrap precomputed areas (`f64::INFINITY` marks an unbounded cell).
    pub fn from_vec(areas: Vec<f64>) -> Self {
        Self {
            scaled: areas.clone(),
            areas,
            unit_exp: 0,
        }
    }

    /// Areas in units of `2^unit_exponent()` squared.
    #[inline]
    pub fn scaled(&self) -> &[f64] {
        &self.scaled
    }

    /// Binary exponent of the length unit behind `scaled()`.
    #[inline]
    pub fn unit_exponent(&self) -> i32 {
        self.unit_exp
    }

    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.areas[index]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.areas
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    #[inline]
    pub fn is_unbounded(&self, index: usize) -> bool {
        self.areas[index].is_infinite()
    }

    /// Sum of all finite cell areas.
    pub fn bounded_total(&self) -> f64 {
        self.areas.iter().filter(|a| a.is_finite()).sum()
    }
}
