//! Planar Voronoi diagram storage and access.

use crate::{geometry, DensityError, Point2};

/// Why a cell is (or is not) a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Closed convex polygon.
    Bounded,
    /// Generator lies on the convex hull; the cell extends to infinity.
    Hull,
    /// Interior generator whose cell could not be closed inside the
    /// bounding square. Treated as unbounded.
    ///
    /// The square reaches `BOUNDING_SCALE` (1e6) input extents from the
    /// generator, while hull edges only absorb points within `HULL_EDGE_EPS`
    /// (1e-12) of the edge length. An interior point closer than roughly
    /// 1e-6 extents to a hull edge has a finite cell that reaches past the
    /// square, so it lands here. Such cells are listed in
    /// `DensityDiagnostics::promoted_cells` and logged with `warn!`.
    Promoted,
}

impl CellKind {
    #[inline]
    pub fn is_bounded(self) -> bool {
        self == CellKind::Bounded
    }
}

/// A cell as seen by area and rendering code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// Polygon vertices in counter-clockwise order.
    Polygon(&'a [Point2]),
    Unbounded,
}

/// A planar Voronoi diagram, one cell per input point.
///
/// Bounded cells store their own vertex runs; vertices shared between
/// neighboring cells are duplicated. Unbounded cells store nothing.
#[derive(Debug, Clone)]
pub struct PlanarVoronoi {
    /// Generator points (input), one per cell.
    pub generators: Vec<Point2>,

    /// Per-cell data: (start_index, vertex_count, kind) into `vertices`.
    cells: Vec<CellData>,

    /// Flattened polygon vertices for all bounded cells.
    vertices: Vec<Point2>,

    /// `edge_neighbors[k]` is the generator across the edge that starts at
    /// `vertices[k]`.
    edge_neighbors: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CellData {
    pub(crate) start: u32,
    pub(crate) len: u32,
    pub(crate) kind: CellKind,
}

impl CellData {
    pub(crate) fn unbounded(kind: CellKind) -> Self {
        Self {
            start: 0,
            len: 0,
            kind,
        }
    }
}

impl PlanarVoronoi {
    /// Create a diagram where every cell is a hull cell.
    ///
    /// This is a small test helper for constructing diagrams without running the backend.
    #[cfg(test)]
    pub(crate) fn empty(generators: Vec<Point2>) -> Self {
        let n = generators.len();
        Self {
            generators,
            cells: vec![CellData::unbounded(CellKind::Hull); n],
            vertices: Vec::new(),
            edge_neighbors: Vec::new(),
        }
    }

    /// Create a diagram from raw parts.
    ///
    /// This is the internal constructor used by the knn_clipping backend.
    pub(crate) fn from_raw_parts(
        generators: Vec<Point2>,
        cells: Vec<CellData>,
        vertices: Vec<Point2>,
        edge_neighbors: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(generators.len(), cells.len());
        debug_assert_eq!(vertices.len(), edge_neighbors.len());
        Self {
            generators,
            cells,
            vertices,
            edge_neighbors,
        }
    }

    /// Number of cells (same as number of generators).
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.generators.len()
    }

    /// Total number of stored polygon vertices across all bounded cells.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get a view of a specific cell.
    #[inline]
    pub fn cell(&self, index: usize) -> CellView<'_> {
        let data = &self.cells[index];
        let start = data.start as usize;
        let end = start + data.len as usize;
        CellView {
            generator_index: index,
            kind: data.kind,
            vertices: &self.vertices[start..end],
            edge_neighbors: &self.edge_neighbors[start..end],
        }
    }

    /// Iterate over all cells.
    pub fn iter_cells(&self) -> impl Iterator<Item = CellView<'_>> {
        (0..self.num_cells()).map(move |i| self.cell(i))
    }

    /// Bounded cells only, as `(index, vertices)`. Unbounded cells are skipped.
    pub fn bounded_cells(&self) -> impl Iterator<Item = (usize, &[Point2])> {
        self.iter_cells()
            .filter(|c| c.kind.is_bounded())
            .map(|c| (c.generator_index, c.vertices))
    }

    /// Number of cells treated as unbounded (hull and promoted).
    pub fn num_unbounded(&self) -> usize {
        self.cells.iter().filter(|c| !c.kind.is_bounded()).count()
    }

    /// Interior cells that had to be treated as unbounded.
    pub fn promoted_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == CellKind::Promoted)
            .map(|(i, _)| i)
            .collect()
    }

    /// Get the generator (center point) of a cell.
    #[inline]
    pub fn generator(&self, index: usize) -> Point2 {
        self.generators[index]
    }
}

/// A view into a single Voronoi cell.
#[derive(Debug, Clone, Copy)]
pub struct CellView<'a> {
    /// Index of the generator point for this cell.
    pub generator_index: usize,

    pub kind: CellKind,

    /// Polygon vertices in counter-clockwise order; empty when unbounded.
    pub vertices: &'a [Point2],

    /// Generator across each edge; `edge_neighbors[i]` belongs to the edge
    /// from `vertices[i]` to `vertices[i + 1]`.
    pub edge_neighbors: &'a [u32],
}

impl<'a> CellView<'a> {
    /// Number of vertices in this cell.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.kind.is_bounded()
    }

    pub fn as_cell(&self) -> Cell<'a> {
        if self.kind.is_bounded() {
            Cell::Polygon(self.vertices)
        } else {
            Cell::Unbounded
        }
    }

    /// Voronoi neighbors of this cell, one per edge, in boundary order.
    pub fn neighbors(&self) -> impl Iterator<Item = usize> + 'a {
        let edges: &'a [u32] = self.edge_neighbors;
        edges.iter().map(|&n| n as usize)
    }

    /// Area of the cell; `f64::INFINITY` when unbounded.
    pub fn area(&self) -> Result<f64, DensityError> {
        geometry::cell_area(self.generator_index, self.as_cell())
    }
}
