//! Incremental construction of a single planar Voronoi cell.

use glam::DVec2;

use super::clipper::{clip_convex, ClipResult, HalfPlane, PolyBuffer};
use super::constants::TERMINATION_PAD;
use crate::{fp, Point2};

/// Reasons a cell build can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFailure {
    /// Cell was completely clipped away (all vertices outside a plane).
    ClippedAway,
}

/// A buffer to hold a finished cell, in absolute coordinates.
#[derive(Debug, Default)]
pub struct CellOutputBuffer {
    pub vertices: Vec<Point2>,
    pub edge_neighbors: Vec<u32>,
}

impl CellOutputBuffer {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edge_neighbors.clear();
    }
}

/// Clips a seed square around one generator, neighbor by neighbor.
///
/// Clipping runs in a frame centred on the generator and divided by `scale`
/// (the input extent), so squared distances stay near 1 whatever the units
/// of the input. Reused across cells by a worker; `reset` starts a new cell.
#[derive(Debug, Default)]
pub struct CellBuilder {
    generator: DVec2,
    scale: f64,
    inv_scale: f64,
    poly: PolyBuffer,
    tmp: PolyBuffer,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cell at `generator`. `bound` is the seed half-size in units
    /// of `scale`.
    pub fn reset(&mut self, generator: DVec2, scale: f64, bound: f64) {
        self.generator = generator;
        self.scale = scale;
        self.inv_scale = scale.recip();
        self.poly.init_bounding(bound);
    }

    /// Offset of `q` from the generator in the local frame.
    #[inline]
    pub fn local(&self, q: DVec2) -> DVec2 {
        (q - self.generator) * self.inv_scale
    }

    /// Clip by the bisector between the generator and neighbor `idx` at `q`.
    pub fn clip(&mut self, idx: usize, q: DVec2) -> Result<(), CellFailure> {
        let d = self.local(q);
        let hp = HalfPlane::bisector(d.x, d.y, idx as u32);
        match clip_convex(&self.poly, &hp, &mut self.tmp) {
            ClipResult::Unchanged => Ok(()),
            ClipResult::Changed => {
                std::mem::swap(&mut self.poly, &mut self.tmp);
                Ok(())
            }
            ClipResult::ClippedAway => Err(CellFailure::ClippedAway),
        }
    }

    /// True while some edge of the seed square survives.
    #[inline]
    pub fn touches_bounding(&self) -> bool {
        self.poly.has_bounding_ref()
    }

    /// Security radius test: can a neighbor at local squared distance
    /// `next_d2` (and everything farther) still change the cell?
    #[inline]
    pub fn can_terminate(&self, next_d2: f64) -> bool {
        !self.touches_bounding() && next_d2 > 4.0 * self.poly.max_r2 * (1.0 + TERMINATION_PAD)
    }

    #[cfg(test)]
    pub fn vertex_count(&self) -> usize {
        self.poly.len()
    }

    /// Write the cell in absolute coordinates, collapsing consecutive vertices
    /// closer than `merge_eps` (in local units).
    pub fn write_output(&self, merge_eps: f64, out: &mut CellOutputBuffer) {
        out.clear();
        let merge_eps2 = merge_eps * merge_eps;
        let poly = &self.poly;
        let close = |a: (f64, f64), b: (f64, f64)| {
            let (du, dv) = (a.0 - b.0, a.1 - b.1);
            du * du + dv * dv <= merge_eps2
        };

        // Local coordinates of the kept vertices, parallel to `out.vertices`.
        let mut kept: Vec<(f64, f64)> = Vec::with_capacity(poly.len());
        for i in 0..poly.len() {
            let uv = (poly.us[i], poly.vs[i]);
            let ep = poly.edge_planes[i];
            match kept.last() {
                Some(&last) if close(last, uv) => {
                    // The short edge disappears; the merged vertex keeps the
                    // outgoing edge of the later one.
                    if let Some(e) = out.edge_neighbors.last_mut() {
                        *e = ep;
                    }
                }
                _ => {
                    kept.push(uv);
                    out.vertices.push(self.to_absolute(uv));
                    out.edge_neighbors.push(ep);
                }
            }
        }

        if kept.len() > 1 && close(kept[kept.len() - 1], kept[0]) {
            out.vertices.pop();
            out.edge_neighbors.pop();
        }
    }

    #[inline]
    fn to_absolute(&self, (u, v): (f64, f64)) -> Point2 {
        let g = self.generator;
        Point2::new(fp::fma_f64(u, self.scale, g.x), fp::fma_f64(v, self.scale, g.y))
    }
}
