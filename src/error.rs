//! Error types for density estimation.

use thiserror::Error;

/// Errors that can occur while building the tessellation or estimating density.
///
/// Every variant is fatal for the stage that reports it; the pipeline never
/// retries or substitutes defaults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DensityError {
    /// Not enough points to form a planar tessellation. Need at least 3.
    #[error("insufficient points: need at least 3, got {0}")]
    InsufficientPoints(usize),

    /// Coordinates and masses are not index-aligned.
    #[error("length mismatch: {points} points but {masses} masses")]
    LengthMismatch { points: usize, masses: usize },

    /// An area table built for a different number of points.
    #[error("area table mismatch: {points} points but {areas} cell areas")]
    AreaTableMismatch { points: usize, areas: usize },

    /// Neighbor count outside `1..=n`.
    #[error("invalid neighbor count: k={k} must satisfy 1 <= k <= {n}")]
    InvalidNeighborCount { k: usize, n: usize },

    /// All points lie on a single line (or coincide), so no cell is bounded
    /// in two dimensions and the tessellation is undefined.
    #[error("degenerate input: all points are collinear")]
    CollinearInput,

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate at point {index}")]
    NonFiniteCoordinate { index: usize },

    /// A mass is negative, NaN or infinite.
    #[error("invalid mass {value} at point {index}: masses must be finite and >= 0")]
    InvalidMass { index: usize, value: f64 },

    /// A polygon cell with fewer than 3 vertices.
    /// This should not happen with valid input and indicates a bug.
    #[error("malformed cell {index}: polygon has {vertices} vertices (need at least 3)")]
    MalformedCell { index: usize, vertices: usize },

    /// A density passed to normalization is negative, NaN or infinite.
    #[error("invalid density {value} at point {index}: densities must be finite and >= 0")]
    InvalidDensity { index: usize, value: f64 },

    /// Normalization of an empty density array.
    #[error("cannot normalize an empty density array")]
    EmptyDensity,

    /// The masking threshold must be finite and in `[0, 1)`.
    #[error("invalid lower limit {0}: must be finite and in [0, 1)")]
    InvalidLowerLimit(f64),
}

impl DensityError {
    /// Returns true for errors caused by the caller's inputs or configuration,
    /// as opposed to internal failures.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, DensityError::MalformedCell { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = DensityError::InvalidNeighborCount { k: 7, n: 5 };
        assert_eq!(
            err.to_string(),
            "invalid neighbor count: k=7 must satisfy 1 <= k <= 5"
        );
        let err = DensityError::LengthMismatch {
            points: 4,
            masses: 3,
        };
        assert!(err.to_string().contains("4 points but 3 masses"));
        let err = DensityError::AreaTableMismatch {
            points: 4,
            areas: 3,
        };
        assert!(err.to_string().contains("4 points but 3 cell areas"));
    }

    #[test]
    fn test_configuration_classification() {
        assert!(DensityError::CollinearInput.is_configuration_error());
        assert!(DensityError::InsufficientPoints(2).is_configuration_error());
        assert!(!DensityError::MalformedCell {
            index: 0,
            vertices: 2
        }
        .is_configuration_error());
    }
}
