//! Compute entry point for the kNN + clipping tessellation backend.

use glam::DVec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::cell_builder::{CellBuilder, CellOutputBuffer};
use super::constants::{BOUNDING_SCALE, VERTEX_MERGE_EPS};
use super::timing::{Timer, TimingBuilder};
use super::{merge_close_points, MergeResult, TerminationConfig};
use crate::diagram::{CellData, CellKind, PlanarVoronoi};
use crate::plane_grid::{bounding_box, KnnStatus, PlaneGrid, PlaneGridScratch};
use crate::{hull, DensityError, Point2};

/// Diagram plus counters the caller folds into its diagnostics.
#[derive(Debug, Clone)]
pub(crate) struct TessellationOutput {
    pub diagram: PlanarVoronoi,
    /// Points merged into a coincident representative.
    pub merged_points: usize,
    /// Cells that hit the k cap before the security radius was reached.
    pub uncertified_cells: usize,
}

enum CellRecord {
    Unbounded(CellKind),
    Bounded {
        vertices: Vec<Point2>,
        edge_neighbors: Vec<u32>,
    },
}

struct CellResult {
    record: CellRecord,
    certified: bool,
}

type WorkerState = (PlaneGridScratch, CellBuilder, Vec<usize>, CellOutputBuffer);

struct CellContext<'a> {
    grid: &'a PlaneGrid,
    on_hull: &'a [bool],
    /// Input extent; cells are clipped in units of it.
    scale: f64,
    bound: f64,
    merge_eps: f64,
    termination: TerminationConfig,
}

/// Build the tessellation for `points`.
///
/// `merge_threshold` of `None` (or a non-positive value) skips the
/// coincident-point merge; coincident points then each get the same cell.
pub(crate) fn build_tessellation(
    points: &[Point2],
    termination: TerminationConfig,
    merge_threshold: Option<f64>,
) -> Result<TessellationOutput, DensityError> {
    if points.len() < 3 {
        return Err(DensityError::InsufficientPoints(points.len()));
    }
    let mut tb = TimingBuilder::new();

    let t = Timer::start();
    let merge: MergeResult = match merge_threshold {
        Some(threshold) if threshold > 0.0 => merge_close_points(points, threshold),
        _ => merge_close_points(points, 0.0),
    };
    tb.set_preprocess(t.elapsed());
    if merge.num_merged > 0 {
        tracing::debug!(merged = merge.num_merged, "merged coincident points");
    }

    let effective = &merge.effective_points;
    if effective.len() < 3 {
        return Err(DensityError::CollinearInput);
    }

    let t = Timer::start();
    let classification = hull::classify(effective)?;
    tb.set_hull(t.elapsed());

    let t = Timer::start();
    let grid = PlaneGrid::new(effective);
    tb.set_knn_build(t.elapsed());

    let (lo, hi) = bounding_box(effective);
    let extent = (hi - lo).max_element();
    let ctx = CellContext {
        grid: &grid,
        on_hull: &classification.on_hull,
        scale: extent,
        bound: BOUNDING_SCALE,
        merge_eps: VERTEX_MERGE_EPS,
        termination,
    };

    let t = Timer::start();
    let init = || -> WorkerState {
        (
            grid.make_scratch(),
            CellBuilder::new(),
            Vec::new(),
            CellOutputBuffer::default(),
        )
    };
    let work = |state: &mut WorkerState, i: usize| build_cell(&ctx, i, state);

    #[cfg(feature = "parallel")]
    let records: Vec<CellResult> = (0..effective.len())
        .into_par_iter()
        .map_init(init, work)
        .collect::<Result<Vec<_>, DensityError>>()?;
    #[cfg(not(feature = "parallel"))]
    let records: Vec<CellResult> = {
        let mut state = init();
        (0..effective.len())
            .map(|i| work(&mut state, i))
            .collect::<Result<Vec<_>, DensityError>>()?
    };
    tb.set_cell_construction(t.elapsed());

    let t = Timer::start();
    let uncertified_cells = records.iter().filter(|r| !r.certified).count();
    let diagram = assemble(points, &merge, &records);
    tb.set_assemble(t.elapsed());

    let promoted = diagram.promoted_cells();
    if !promoted.is_empty() {
        tracing::warn!(
            count = promoted.len(),
            first = promoted[0],
            "interior cells could not be closed and are treated as unbounded"
        );
    }
    if uncertified_cells > 0 {
        tracing::warn!(uncertified_cells, "cells reached the k cap before certification");
    }
    tracing::debug!(
        n = points.len(),
        hull = classification.boundary_count(),
        vertices = diagram.num_vertices(),
        "tessellation built"
    );

    let timings = tb.finish();
    timings.report("tessellation", points.len());

    Ok(TessellationOutput {
        diagram,
        merged_points: merge.num_merged,
        uncertified_cells,
    })
}

fn build_cell(
    ctx: &CellContext<'_>,
    i: usize,
    state: &mut WorkerState,
) -> Result<CellResult, DensityError> {
    if ctx.on_hull[i] {
        return Ok(CellResult {
            record: CellRecord::Unbounded(CellKind::Hull),
            certified: true,
        });
    }

    let (scratch, builder, knn, out) = state;
    let grid = ctx.grid;
    let n = grid.len();
    let p = grid.point(i);
    builder.reset(p, ctx.scale, ctx.bound);

    let mut k = ctx.termination.first_k(n);
    // knn[0] is always the generator itself.
    let mut next = 1;
    let certified = loop {
        let status = grid.find_k_nearest_self_into(i, k, scratch, knn);
        let mut terminated = false;
        for &j in &knn[next..] {
            let q: DVec2 = grid.point(j);
            if builder.can_terminate(builder.local(q).length_squared()) {
                terminated = true;
                break;
            }
            if q == p {
                continue;
            }
            builder
                .clip(j, q)
                .map_err(|_| DensityError::MalformedCell { index: i, vertices: 0 })?;
        }
        if terminated || status == KnnStatus::Exhausted {
            break true;
        }
        next = knn.len();
        match ctx.termination.next_k(k, n) {
            Some(k_next) => k = k_next,
            None => break false,
        }
    };

    if builder.touches_bounding() {
        return Ok(CellResult {
            record: CellRecord::Unbounded(CellKind::Promoted),
            certified,
        });
    }

    builder.write_output(ctx.merge_eps, out);
    if out.vertices.len() < 3 {
        return Err(DensityError::MalformedCell {
            index: i,
            vertices: out.vertices.len(),
        });
    }
    Ok(CellResult {
        record: CellRecord::Bounded {
            vertices: out.vertices.clone(),
            edge_neighbors: out.edge_neighbors.clone(),
        },
        certified,
    })
}

/// Flatten per-cell records, mapping merged points onto their
/// representative's cell and neighbor labels back to original indices.
fn assemble(points: &[Point2], merge: &MergeResult, records: &[CellResult]) -> PlanarVoronoi {
    let mut cells = Vec::with_capacity(points.len());
    let mut vertices = Vec::new();
    let mut edge_neighbors = Vec::new();

    for &eff in &merge.original_to_effective {
        match &records[eff].record {
            CellRecord::Unbounded(kind) => cells.push(CellData::unbounded(*kind)),
            CellRecord::Bounded {
                vertices: vs,
                edge_neighbors: es,
            } => {
                let start =
                    u32::try_from(vertices.len()).expect("cell vertex buffer exceeds u32 capacity");
                vertices.extend_from_slice(vs);
                edge_neighbors.extend(es.iter().map(|&e| merge.effective_to_original[e as usize] as u32));
                cells.push(CellData {
                    start,
                    len: vs.len() as u32,
                    kind: CellKind::Bounded,
                });
            }
        }
    }

    PlanarVoronoi::from_raw_parts(points.to_vec(), cells, vertices, edge_neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon_area;

    fn pts(raw: &[[f64; 2]]) -> Vec<Point2> {
        raw.iter().map(|&p| p.into()).collect()
    }

    #[test]
    fn test_square_with_center() {
        let p = pts(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0], [1.0, 1.0]]);
        let out = build_tessellation(&p, TerminationConfig::default(), None).unwrap();
        let d = &out.diagram;
        for i in 0..4 {
            assert_eq!(d.cell(i).kind, CellKind::Hull);
        }
        let c = d.cell(4);
        assert!(c.is_bounded());
        // The centre cell is the diamond |x-1| + |y-1| <= 1.
        assert_eq!(c.len(), 4);
        assert!((polygon_area(c.vertices) - 2.0).abs() < 1e-12);
        let mut nb: Vec<usize> = c.neighbors().collect();
        nb.sort_unstable();
        assert_eq!(nb, vec![0, 1, 2, 3]);
        assert_eq!(out.uncertified_cells, 0);
    }

    #[test]
    fn test_lattice_cells_are_unit_squares() {
        let mut raw = Vec::new();
        for y in 0..6 {
            for x in 0..6 {
                raw.push([x as f64, y as f64]);
            }
        }
        let p = pts(&raw);
        let out = build_tessellation(&p, TerminationConfig::default(), None).unwrap();
        let d = &out.diagram;
        for (i, v) in d.bounded_cells() {
            let g = d.generator(i);
            assert!(g.x > 0.0 && g.x < 5.0 && g.y > 0.0 && g.y < 5.0);
            assert!((polygon_area(v) - 1.0).abs() < 1e-9, "cell {} area", i);
        }
        assert_eq!(d.bounded_cells().count(), 16);
        assert_eq!(d.num_unbounded(), 20);
    }

    #[test]
    fn test_merged_duplicates_share_cell() {
        let p = pts(&[
            [0.0, 0.0],
            [4.0, 0.0],
            [0.0, 4.0],
            [4.0, 4.0],
            [2.0, 2.0],
            [2.0, 2.0],
        ]);
        let out = build_tessellation(&p, TerminationConfig::default(), Some(1e-9)).unwrap();
        assert_eq!(out.merged_points, 1);
        let a = out.diagram.cell(4);
        let b = out.diagram.cell(5);
        assert_eq!(a.vertices, b.vertices);
        assert!(a.is_bounded());
    }

    #[test]
    fn test_unmerged_duplicates_get_same_cell() {
        let p = pts(&[
            [0.0, 0.0],
            [4.0, 0.0],
            [0.0, 4.0],
            [4.0, 4.0],
            [2.0, 2.0],
            [2.0, 2.0],
        ]);
        let out = build_tessellation(&p, TerminationConfig::default(), None).unwrap();
        assert_eq!(out.merged_points, 0);
        let a = polygon_area(out.diagram.cell(4).vertices);
        let b = polygon_area(out.diagram.cell(5).vertices);
        assert!((a - 8.0).abs() < 1e-9);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_rejected() {
        let p = pts(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
        assert_eq!(
            build_tessellation(&p, TerminationConfig::default(), None).unwrap_err(),
            DensityError::CollinearInput
        );
    }
}
