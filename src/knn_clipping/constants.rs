//! Shared constants for kNN clipping cell construction.

/// Half-size of the seed square around each generator, as a multiple of the
/// input extent. Cells still touching the square after all neighbors are
/// clipped are treated as unbounded.
pub const BOUNDING_SCALE: f64 = 1e6;

/// Inside tolerance for half-plane tests, relative to the squared distance
/// between the generator and the clipping neighbor.
pub const EPS_INSIDE: f64 = 1e-12;

/// Relative padding on the security-radius test.
///
/// A neighbor whose bisector only touches the cell cannot change its area,
/// so the pad just absorbs rounding in `max_r2`.
pub const TERMINATION_PAD: f64 = 1e-9;

/// Consecutive cell vertices closer than this fraction of the input extent
/// are collapsed into one.
pub const VERTEX_MERGE_EPS: f64 = 1e-12;

/// Default coincidence threshold as a fraction of the input extent.
pub const MERGE_THRESHOLD_FRACTION: f64 = 1e-12;

/// Compute the default merge threshold for an input of the given extent.
///
/// Only numerically coincident generators merge; anything farther apart gets
/// its own (possibly tiny) cell.
#[inline]
pub fn merge_threshold_for_extent(extent: f64) -> f64 {
    if extent > 0.0 {
        extent * MERGE_THRESHOLD_FRACTION
    } else {
        0.0
    }
}
