//! Neighborhood density estimation.
//!
//! For each point, the k nearest points (including the point itself) pool
//! their masses and cell areas; the density is mass over area.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::diagram::PlanarVoronoi;
use crate::geometry::CellAreas;
use crate::plane_grid::{PlaneGrid, PlaneGridScratch};
use crate::{fp, DensityError};

/// How a point's neighborhood resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborhoodKind {
    /// Finite, positive area sum.
    Finite,
    /// Some neighbor cell is unbounded, so the area sum is infinite.
    Unbounded,
    /// Finite area sum that is zero (or negative through rounding).
    Degenerate,
}

/// Density per point plus the bookkeeping needed for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityField {
    /// Mass per unit area in input units. Saturates to `f64::INFINITY` when
    /// the true density is beyond the `f64` range (huge masses or tiny
    /// coordinates); `relative()` is unaffected.
    pub values: Vec<f64>,
    /// Points whose neighborhood had a zero area sum.
    pub degenerate_points: Vec<usize>,
    /// Number of points whose neighborhood touched an unbounded cell.
    pub unbounded_neighborhoods: usize,
    /// `values` divided by a power of two, computed from masses and areas
    /// brought near 1 first.
    relative: Vec<f64>,
}

impl DensityField {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest density value, or `None` when empty.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Densities up to a common power-of-two factor. Ratios between entries
    /// match `values` but stay finite where `values` saturate; normalization
    /// works from these.
    #[inline]
    pub fn relative(&self) -> &[f64] {
        &self.relative
    }
}

/// Density of one neighborhood.
///
/// Finite mass over infinite area is 0, and a zero (or negative) area sum
/// yields 0 rather than NaN or an error.
#[inline]
pub fn neighborhood_density(mass_sum: f64, area_sum: f64) -> f64 {
    classify(mass_sum, area_sum).0
}

#[inline]
fn classify(mass_sum: f64, area_sum: f64) -> (f64, NeighborhoodKind) {
    if area_sum.is_infinite() {
        (0.0, NeighborhoodKind::Unbounded)
    } else if area_sum <= 0.0 {
        (0.0, NeighborhoodKind::Degenerate)
    } else {
        (mass_sum / area_sum, NeighborhoodKind::Finite)
    }
}

/// Estimate densities from a diagram, computing its cell areas first.
pub fn estimate(
    masses: &[f64],
    diagram: &PlanarVoronoi,
    index: &PlaneGrid,
    k: usize,
) -> Result<DensityField, DensityError> {
    let areas = CellAreas::compute(diagram)?;
    estimate_with_areas(masses, &areas, index, k)
}

/// Estimate densities from a precomputed area table.
///
/// `masses`, `areas` and `index` must all describe the same N points.
pub fn estimate_with_areas(
    masses: &[f64],
    areas: &CellAreas,
    index: &PlaneGrid,
    k: usize,
) -> Result<DensityField, DensityError> {
    let n = index.len();
    if masses.len() != n {
        return Err(DensityError::LengthMismatch {
            points: n,
            masses: masses.len(),
        });
    }
    if areas.len() != n {
        return Err(DensityError::AreaTableMismatch {
            points: n,
            areas: areas.len(),
        });
    }
    if k == 0 || k > n {
        return Err(DensityError::InvalidNeighborCount { k, n });
    }
    check_masses(masses)?;
    if k == 1 {
        tracing::debug!("k = 1: every neighborhood is a single cell");
    }

    // Masses and areas are summed in power-of-two units near their largest
    // values, so neither sum overflows or loses precision to subnormals.
    // Scaling by a power of two is exact, so `values` match the unscaled
    // quotient whenever it is representable.
    let mass_exp = fp::exponent_of(masses.iter().copied().fold(0.0, f64::max));
    let inv_mass = fp::ldexp(1.0, -mass_exp);
    let to_input_units = mass_exp - 2 * areas.unit_exponent();
    let scaled_areas = areas.scaled();

    let per_point = |(scratch, knn): &mut (PlaneGridScratch, Vec<usize>), i: usize| {
        index.find_k_nearest_self_into(i, k, scratch, knn);
        let mut mass_sum = 0.0;
        let mut area_sum = 0.0;
        for &j in knn.iter() {
            mass_sum += masses[j] * inv_mass;
            area_sum += scaled_areas[j];
        }
        classify(mass_sum, area_sum)
    };
    let init = || (index.make_scratch(), Vec::with_capacity(k));

    #[cfg(feature = "parallel")]
    let results: Vec<(f64, NeighborhoodKind)> =
        (0..n).into_par_iter().map_init(init, per_point).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<(f64, NeighborhoodKind)> = {
        let mut state = init();
        (0..n).map(|i| per_point(&mut state, i)).collect()
    };

    let mut values = Vec::with_capacity(n);
    let mut relative = Vec::with_capacity(n);
    let mut degenerate_points = Vec::new();
    let mut unbounded_neighborhoods = 0usize;
    for (i, (value, kind)) in results.into_iter().enumerate() {
        match kind {
            NeighborhoodKind::Finite => {}
            NeighborhoodKind::Unbounded => unbounded_neighborhoods += 1,
            NeighborhoodKind::Degenerate => degenerate_points.push(i),
        }
        values.push(fp::ldexp(value, to_input_units));
        relative.push(value);
    }

    if !degenerate_points.is_empty() {
        tracing::warn!(
            count = degenerate_points.len(),
            first = degenerate_points[0],
            "neighborhoods with zero total area; density set to 0"
        );
    }
    tracing::debug!(n, k, unbounded_neighborhoods, "density estimated");

    Ok(DensityField {
        values,
        degenerate_points,
        unbounded_neighborhoods,
        relative,
    })
}

/// Reject masses that are negative, NaN or infinite.
pub fn check_masses(masses: &[f64]) -> Result<(), DensityError> {
    match masses
        .iter()
        .enumerate()
        .find(|(_, m)| !(m.is_finite() && **m >= 0.0))
    {
        Some((index, &value)) => Err(DensityError::InvalidMass { index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point2;

    #[test]
    fn test_division_conventions() {
        assert_eq!(neighborhood_density(5.0, f64::INFINITY), 0.0);
        assert_eq!(neighborhood_density(0.0, 0.0), 0.0);
        assert_eq!(neighborhood_density(3.0, 0.0), 0.0);
        assert_eq!(neighborhood_density(3.0, 1.5), 2.0);
    }

    fn line_grid() -> (Vec<Point2>, PlaneGrid) {
        let pts: Vec<Point2> = (0..5).map(|i| Point2::new(i as f64, 0.0)).collect();
        let grid = PlaneGrid::new(&pts);
        (pts, grid)
    }

    #[test]
    fn test_estimate_with_areas() {
        let (_, grid) = line_grid();
        let masses = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let areas = CellAreas::from_vec(vec![f64::INFINITY, 1.0, 1.0, 1.0, f64::INFINITY]);
        let field = estimate_with_areas(&masses, &areas, &grid, 2).unwrap();

        // Point 1's nearest other point ties between 0 and 2; 0 wins.
        assert_eq!(field.values[0], 0.0);
        assert_eq!(field.values[1], 0.0);
        assert_eq!(field.values[2], (3.0 + 2.0) / 2.0);
        assert_eq!(field.values[3], (4.0 + 3.0) / 2.0);
        assert_eq!(field.values[4], 0.0);
        assert_eq!(field.unbounded_neighborhoods, 3);
        assert!(field.degenerate_points.is_empty());
        assert_eq!(field.max(), Some(3.5));
    }

    #[test]
    fn test_zero_area_recorded() {
        let (_, grid) = line_grid();
        let masses = vec![0.0; 5];
        let areas = CellAreas::from_vec(vec![1.0, 0.0, 0.0, 1.0, 1.0]);
        let field = estimate_with_areas(&masses, &areas, &grid, 2).unwrap();
        // Only point 2 pools two zero-area cells: its neighborhood is {2, 1}.
        assert_eq!(field.degenerate_points, vec![2]);
        assert!(field.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let (_, grid) = line_grid();
        let areas = CellAreas::from_vec(vec![1.0; 5]);
        assert_eq!(
            estimate_with_areas(&[1.0; 4], &areas, &grid, 2).unwrap_err(),
            DensityError::LengthMismatch {
                points: 5,
                masses: 4
            }
        );
        assert_eq!(
            estimate_with_areas(&[1.0; 5], &CellAreas::from_vec(vec![1.0; 4]), &grid, 2).unwrap_err(),
            DensityError::AreaTableMismatch { points: 5, areas: 4 }
        );
        assert_eq!(
            estimate_with_areas(&[1.0; 5], &areas, &grid, 0).unwrap_err(),
            DensityError::InvalidNeighborCount { k: 0, n: 5 }
        );
        assert_eq!(
            estimate_with_areas(&[1.0; 5], &areas, &grid, 6).unwrap_err(),
            DensityError::InvalidNeighborCount { k: 6, n: 5 }
        );
        let mut masses = vec![1.0; 5];
        masses[3] = -0.5;
        assert_eq!(
            estimate_with_areas(&masses, &areas, &grid, 2).unwrap_err(),
            DensityError::InvalidMass {
                index: 3,
                value: -0.5
            }
        );
    }

    #[test]
    fn test_huge_masses_stay_finite_relative() {
        let (_, grid) = line_grid();
        let masses = vec![1e308; 5];
        let areas = CellAreas::from_vec(vec![f64::INFINITY, 1.0, 1.0, 1.0, f64::INFINITY]);
        let field = estimate_with_areas(&masses, &areas, &grid, 2).unwrap();

        // (1e308 + 1e308) / 2 is representable even though the mass sum is not.
        assert_eq!(field.values[2], 1e308);
        assert_eq!(field.values[3], 1e308);
        assert!(field.relative().iter().all(|v| v.is_finite()));
        assert_eq!(field.relative()[2], field.relative()[3]);
        assert_eq!(field.relative()[0], 0.0);
    }

    #[test]
    fn test_check_masses() {
        assert!(check_masses(&[0.0, 1.0, 1e300]).is_ok());
        assert_eq!(
            check_masses(&[1.0, f64::INFINITY]).unwrap_err(),
            DensityError::InvalidMass {
                index: 1,
                value: f64::INFINITY
            }
        );
    }
}
