//! Adversarial geometry tests.
//!
//! Tests using degenerate or stress-inducing point distributions to verify
//! robustness. These tests document expected behavior (success, graceful
//! degradation, or defined error) rather than asserting perfect results.

mod support;

use voronoi_density::geometry::polygon_area;
use voronoi_density::validation::validate;
use voronoi_density::{
    compute, compute_with, tessellate, tessellate_with, CellKind, DensityConfig, DensityError, Point2,
};
use support::points::*;

// =============================================================================
// Coincident Points
// =============================================================================

#[test]
fn test_duplicates_merged() {
    let points = with_duplicates(500, 10, 1);
    let masses = vec![1.0; 500];
    let output = compute(&points, &masses).unwrap();

    assert_eq!(output.diagnostics.merged_points, 49);
    assert_eq!(output.diagram.num_cells(), 500);
    for i in (10..500).step_by(10) {
        let a = output.diagram.cell(i - 1);
        let b = output.diagram.cell(i);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.vertices, b.vertices, "duplicate {} should share its cell", i);
        assert_eq!(output.areas.get(i - 1), output.areas.get(i));
        // Both copies pool with each other at distance 0.
        assert_eq!(output.density.values[i - 1], output.density.values[i]);
    }
    let report = validate(&output.diagram, 2000, 2);
    assert!(report.is_valid(), "{}", report);
}

#[test]
fn test_duplicates_without_preprocess() {
    let points = with_duplicates(300, 7, 3);
    let cfg = DensityConfig {
        preprocess: false,
        ..Default::default()
    };
    let output = compute_with(&points, &vec![1.0; 300], &cfg).unwrap();

    assert_eq!(output.diagnostics.merged_points, 0);
    for i in (7..300).step_by(7) {
        let (a, b) = (output.diagram.cell(i - 1), output.diagram.cell(i));
        assert_eq!(a.vertices, b.vertices, "duplicate {} should get an identical cell", i);
    }
    let report = validate(&output.diagram, 2000, 4);
    assert!(report.is_valid(), "{}", report);
}

#[test]
fn test_all_points_identical() {
    let points = vec![Point2::new(0.3, 0.7); 6];
    assert_eq!(tessellate(&points).unwrap_err(), DensityError::CollinearInput);

    let cfg = DensityConfig {
        preprocess: false,
        ..Default::default()
    };
    assert_eq!(
        tessellate_with(&points, &cfg).unwrap_err(),
        DensityError::CollinearInput
    );
}

#[test]
fn test_near_duplicates_with_threshold() {
    let mut points = uniform_points(200, 11);
    points[50] = Point2::new(points[49].x + 1e-9, points[49].y);
    let cfg = DensityConfig {
        merge_threshold: Some(1e-6),
        ..Default::default()
    };
    let output = compute_with(&points, &vec![1.0; 200], &cfg).unwrap();
    assert_eq!(output.diagnostics.merged_points, 1);
    assert_eq!(output.diagram.cell(49).vertices, output.diagram.cell(50).vertices);

    // The default threshold keeps them apart.
    let output = compute(&points, &vec![1.0; 200]).unwrap();
    assert_eq!(output.diagnostics.merged_points, 0);
    assert_ne!(output.diagram.cell(49).vertices, output.diagram.cell(50).vertices);
}

// =============================================================================
// Collinear and Near-Collinear Inputs
// =============================================================================

#[test]
fn test_exactly_collinear_rejected() {
    let points = line_points(50, 0.0, 0);
    assert_eq!(tessellate(&points).unwrap_err(), DensityError::CollinearInput);
}

#[test]
fn test_near_collinear() {
    let points = line_points(200, 1e-3, 5);
    let diagram = tessellate(&points).expect("a jittered line is two-dimensional");
    assert_eq!(diagram.num_cells(), 200);
    for (i, vertices) in diagram.bounded_cells() {
        assert!(polygon_area(vertices) > 0.0, "cell {} has no area", i);
    }
    assert!(diagram.num_unbounded() >= 3);
}

// =============================================================================
// Co-circular and Multi-Scale Inputs
// =============================================================================

#[test]
fn test_circle_with_center() {
    let n = 64;
    let points = circle_with_center(n);
    let diagram = tessellate(&points).unwrap();

    for i in 0..n {
        assert!(!diagram.cell(i).is_bounded(), "circle point {} is on the hull", i);
    }
    let centre = diagram.cell(n);
    assert!(centre.is_bounded());
    assert_eq!(centre.len(), n);

    // Regular n-gon with inradius 1/2.
    let expected = n as f64 * 0.25 * (std::f64::consts::PI / n as f64).tan();
    let area = polygon_area(centre.vertices);
    assert!((area - expected).abs() < 1e-9, "area {} vs {}", area, expected);
}

#[test]
fn test_point_hugging_hull_edge() {
    let square = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.5, 0.5]];

    // 1e-8 from the bottom edge: the true cell reaches about 1.25e7 below it.
    let mut points: Vec<[f64; 2]> = square.to_vec();
    points.push([0.5, 1e-8]);
    let output = compute(&points, &[1.0; 6]).unwrap();
    assert_eq!(output.diagram.cell(5).kind, CellKind::Promoted);
    assert_eq!(output.diagnostics.promoted_cells, vec![5]);
    assert_eq!(output.areas.get(5), f64::INFINITY);
    assert!(output.diagram.cell(4).is_bounded());

    // 1e-4 away the cell closes at about 1250 below the edge.
    points[5] = [0.5, 1e-4];
    let output = compute(&points, &[1.0; 6]).unwrap();
    assert_eq!(output.diagram.cell(5).kind, CellKind::Bounded);
    assert!(output.diagnostics.promoted_cells.is_empty());
    assert!(output.areas.get(5) > 100.0);
}

#[test]
fn test_clustered() {
    let points = clustered_points(2000, 0.3, 5);
    let output = compute(&points, &vec![1.0; 2000]).unwrap();
    assert_eq!(output.diagnostics.uncertified_cells, 0);
    assert!(output.diagnostics.promoted_cells.is_empty());

    let report = validate(&output.diagram, 5000, 6);
    assert!(report.is_valid(), "{}", report);

    // Cluster members are packed far tighter than the field.
    let cluster_max = output.density.values[..600].iter().copied().fold(0.0, f64::max);
    let field_max = output.density.values[600..].iter().copied().fold(0.0, f64::max);
    assert!(cluster_max > 100.0 * field_max);
}

#[test]
fn test_large_offset() {
    let base = uniform_points(500, 8);
    let shifted = offset_points(500, 1e6, 8);
    let a = tessellate(&base).unwrap();
    let b = tessellate(&shifted).unwrap();

    for cell in a.iter_cells() {
        let other = b.cell(cell.generator_index);
        assert_eq!(cell.is_bounded(), other.is_bounded());
        if cell.is_bounded() {
            let (x, y) = (polygon_area(cell.vertices), polygon_area(other.vertices));
            assert!((x - y).abs() <= 1e-6 * x, "cell {}: {} vs {}", cell.generator_index, x, y);
        }
    }
}

#[test]
fn test_tiny_extent() {
    let points: Vec<Point2> = uniform_points(300, 9)
        .into_iter()
        .map(|p| Point2::new(p.x * 1e-8, p.y * 1e-8))
        .collect();
    let diagram = tessellate(&points).unwrap();
    let report = validate(&diagram, 2000, 10);
    assert!(report.is_valid(), "{}", report);
}
