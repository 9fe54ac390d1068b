//! Convex polygon clipping by bisector half-planes.
//!
//! Polygons live in coordinates local to the generator, so the generator is
//! always at the origin and every bisector half-plane contains it.

use super::constants::EPS_INSIDE;
use crate::fp;

/// Edge label for sides of the seed square (no neighbor).
pub const BOUNDING_EDGE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipResult {
    /// Polygon unchanged (all vertices inside). Note: `out` is NOT written.
    Unchanged,
    Changed,
    /// Fewer than 3 vertices survived.
    ClippedAway,
}

/// A 2D half-plane constraint: a*u + b*v + c >= 0.
#[derive(Debug, Clone, Copy)]
pub struct HalfPlane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub ab2: f64,
    pub plane_idx: u32,
    pub eps: f64,
}

impl HalfPlane {
    /// Half-plane of points closer to the origin than to `(du, dv)`.
    pub fn bisector(du: f64, dv: f64, plane_idx: u32) -> Self {
        let ab2 = fp::fma_f64(du, du, dv * dv);
        HalfPlane {
            a: -du,
            b: -dv,
            c: 0.5 * ab2,
            ab2,
            plane_idx,
            eps: EPS_INSIDE * ab2,
        }
    }

    #[inline]
    pub fn signed_dist(&self, u: f64, v: f64) -> f64 {
        fp::fma_f64(self.a, u, fp::fma_f64(self.b, v, self.c))
    }
}

/// Growable polygon buffer, counter-clockwise.
///
/// Edge `i` runs from vertex `i` to vertex `i + 1` (cyclically) and
/// `edge_planes[i]` names the neighbor whose bisector produced it.
#[derive(Debug, Clone, Default)]
pub struct PolyBuffer {
    pub us: Vec<f64>,
    pub vs: Vec<f64>,
    pub edge_planes: Vec<u32>,
    /// Largest squared distance from the origin to any vertex.
    pub max_r2: f64,
    /// Number of edges still lying on the seed square.
    pub bounding_edges: usize,
}

impl PolyBuffer {
    #[inline]
    pub fn len(&self) -> usize {
        self.us.len()
    }

    /// Reset to a square of half-size `bound` centred on the origin.
    pub fn init_bounding(&mut self, bound: f64) {
        self.clear();
        for (u, v) in [(-bound, -bound), (bound, -bound), (bound, bound), (-bound, bound)] {
            self.push_raw(u, v, BOUNDING_EDGE);
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.us.clear();
        self.vs.clear();
        self.edge_planes.clear();
        self.max_r2 = 0.0;
        self.bounding_edges = 0;
    }

    #[inline]
    pub fn push_raw(&mut self, u: f64, v: f64, ep: u32) {
        self.us.push(u);
        self.vs.push(v);
        self.edge_planes.push(ep);
        self.max_r2 = self.max_r2.max(fp::fma_f64(u, u, v * v));
        if ep == BOUNDING_EDGE {
            self.bounding_edges += 1;
        }
    }

    #[inline]
    pub fn has_bounding_ref(&self) -> bool {
        self.bounding_edges > 0
    }
}

/// Clip a convex polygon by a half-plane (Sutherland-Hodgman with edge labels).
pub(crate) fn clip_convex(poly: &PolyBuffer, hp: &HalfPlane, out: &mut PolyBuffer) -> ClipResult {
    let n = poly.len();
    debug_assert!(n >= 3, "clip_convex expects poly.len >= 3, got {}", n);

    // Every vertex lies within sqrt(max_r2) of the origin, so a line at least
    // that far away cannot cut the polygon.
    if !poly.has_bounding_ref() {
        let t = hp.c + hp.eps;
        if t >= 0.0 && t * t >= hp.ab2 * poly.max_r2 {
            return ClipResult::Unchanged;
        }
    }

    let mut inside_count = 0usize;
    for i in 0..n {
        if hp.signed_dist(poly.us[i], poly.vs[i]) >= -hp.eps {
            inside_count += 1;
        }
    }
    if inside_count == n {
        return ClipResult::Unchanged;
    }
    if inside_count == 0 {
        out.clear();
        return ClipResult::ClippedAway;
    }

    out.clear();
    for i in 0..n {
        let j = if i + 1 == n { 0 } else { i + 1 };
        let (u0, v0) = (poly.us[i], poly.vs[i]);
        let (u1, v1) = (poly.us[j], poly.vs[j]);
        let d0 = hp.signed_dist(u0, v0);
        let d1 = hp.signed_dist(u1, v1);
        let in0 = d0 >= -hp.eps;
        let in1 = d1 >= -hp.eps;

        if in0 {
            out.push_raw(u0, v0, poly.edge_planes[i]);
        }
        if in0 != in1 {
            let t = (d0 / (d0 - d1)).clamp(0.0, 1.0);
            let u = fp::fma_f64(t, u1 - u0, u0);
            let v = fp::fma_f64(t, v1 - v0, v0);
            // Leaving the half-plane starts the new bisector edge; entering
            // resumes the remainder of edge i.
            let ep = if in0 { hp.plane_idx } else { poly.edge_planes[i] };
            out.push_raw(u, v, ep);
        }
    }

    if out.len() < 3 {
        ClipResult::ClippedAway
    } else {
        ClipResult::Changed
    }
}
