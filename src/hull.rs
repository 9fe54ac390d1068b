//! Convex hull of the generators and on-hull classification.
//!
//! A generator has an unbounded Voronoi cell exactly when it lies on the
//! boundary of the convex hull: either as a hull vertex or on a hull edge.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::fp::orient2d;
use crate::{DensityError, Point2};

/// Relative tolerance for treating a point as lying on a hull edge.
///
/// A distance to the hull edge, as a fraction of the input extent. Points
/// closer to the hull than this have cells that reach far beyond any
/// practical bounding region.
pub const HULL_EDGE_EPS: f64 = 1e-12;

/// Convex hull plus per-point boundary flags.
#[derive(Debug, Clone)]
pub struct HullClassification {
    /// Hull vertex indices in counter-clockwise order, without collinear points.
    pub hull: Vec<usize>,
    /// `on_hull[i]` is true when point `i` lies on the hull boundary.
    pub on_hull: Vec<bool>,
}

impl HullClassification {
    /// Number of points on the hull boundary (vertices and edge points).
    pub fn boundary_count(&self) -> usize {
        self.on_hull.iter().filter(|&&b| b).count()
    }
}

/// Compute the convex hull (Andrew's monotone chain) and flag boundary points.
///
/// Fails with `CollinearInput` when the hull has fewer than 3 vertices
/// (all points collinear or coincident).
pub fn classify(points: &[Point2]) -> Result<HullClassification, DensityError> {
    if points.len() < 3 {
        return Err(DensityError::InsufficientPoints(points.len()));
    }

    // Orientation tests run on the bounding box mapped to unit extent, so
    // the tolerances below do not depend on the input units.
    let (lo, hi) = crate::plane_grid::bounding_box(points);
    let span = (hi - lo).max_element();
    if !(span > 0.0) {
        return Err(DensityError::CollinearInput);
    }
    let inv_span = if span.is_finite() { span.recip() } else { 1.0 };
    let unit: Vec<Point2> = points
        .iter()
        .map(|p| Point2::new((p.x - lo.x) * inv_span, (p.y - lo.y) * inv_span))
        .collect();
    let points = unit.as_slice();

    let hull = monotone_chain(points);
    if hull.len() < 3 {
        return Err(DensityError::CollinearInput);
    }

    let edges: Vec<(Point2, Point2)> = (0..hull.len())
        .map(|e| (points[hull[e]], points[hull[(e + 1) % hull.len()]]))
        .collect();

    let mut on_hull: Vec<bool> = {
        #[cfg(feature = "parallel")]
        {
            points
                .par_iter()
                .map(|&p| on_any_edge(p, &edges))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            points
                .iter()
                .map(|&p| on_any_edge(p, &edges))
                .collect()
        }
    };
    for &h in &hull {
        on_hull[h] = true;
    }

    Ok(HullClassification { hull, on_hull })
}

fn monotone_chain(points: &[Point2]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .x
            .total_cmp(&points[b].x)
            .then(points[a].y.total_cmp(&points[b].y))
            .then(a.cmp(&b))
    });

    let turn = |o: usize, a: usize, b: usize| {
        let (o, a, b) = (points[o], points[a], points[b]);
        orient2d(o.x, o.y, a.x, a.y, b.x, b.y)
    };

    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], i) <= 0.0 {
            lower.pop();
        }
        lower.push(i);
    }

    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], i) <= 0.0 {
            upper.pop();
        }
        upper.push(i);
    }

    // Last point of each chain is the first point of the other.
    lower.pop();
    upper.pop();
    lower.extend(upper);

    // Coincident extreme points can survive as zero-length edges.
    lower.dedup_by(|a, b| points[*a] == points[*b]);
    if lower.len() > 1 && points[lower[0]] == points[lower[lower.len() - 1]] {
        lower.pop();
    }
    lower
}

fn on_any_edge(p: Point2, edges: &[(Point2, Point2)]) -> bool {
    edges.iter().any(|&(a, b)| {
        let ab_len = a.distance_squared(b).sqrt();
        let tol = HULL_EDGE_EPS * ab_len;
        let o = orient2d(a.x, a.y, b.x, b.y, p.x, p.y);
        if o.abs() > tol {
            return false;
        }
        // Projection must fall within the segment.
        let (abx, aby) = (b.x - a.x, b.y - a.y);
        let t = (p.x - a.x) * abx + (p.y - a.y) * aby;
        t >= -tol && t <= ab_len * ab_len + tol
    })
}
