//! Planar Voronoi cells via kNN-driven half-plane clipping.
//!
//! Each bounded cell is computed independently: a seed square around the
//! generator is clipped by the bisectors of its nearest neighbors until the
//! security radius shows no farther neighbor can cut it. Cells are
//! embarrassingly parallel.

mod cell_builder;
mod clipper;
mod compute;
pub(crate) mod constants;
mod preprocess;
pub(crate) mod timing;

pub(crate) use compute::{build_tessellation, TessellationOutput};
pub use preprocess::{merge_close_points, MergeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationConfig {
    /// Neighbors fetched on the first kNN pass (including the generator).
    pub initial_k: usize,
    /// Optional cap on k if termination keeps requesting more neighbors.
    /// None means unbounded. Cells that hit the cap are reported as
    /// uncertified.
    pub max_k_cap: Option<usize>,
}

// Keep the k-NN schedule in one place.
pub(super) const KNN_INITIAL_K: usize = 12;
pub(super) const KNN_RESTART_KS: [usize; 2] = [24, 48];

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            initial_k: KNN_INITIAL_K,
            max_k_cap: None,
        }
    }
}

impl TerminationConfig {
    /// First pass size for `n` indexed points. Always at least the
    /// generator plus one neighbor.
    #[inline]
    pub(crate) fn first_k(&self, n: usize) -> usize {
        let k = self.initial_k.max(2);
        match self.max_k_cap {
            Some(cap) => k.min(cap.max(2)),
            None => k,
        }
        .min(n)
    }

    /// Next k on the restart schedule, or `None` once k cannot grow.
    ///
    /// Walks the fixed restarts, then doubles.
    pub(crate) fn next_k(&self, k: usize, n: usize) -> Option<usize> {
        let limit = match self.max_k_cap {
            Some(cap) => cap.min(n),
            None => n,
        };
        if k >= limit {
            return None;
        }
        let next = KNN_RESTART_KS
            .iter()
            .copied()
            .find(|&r| r > k)
            .unwrap_or(k.saturating_mul(2));
        Some(next.min(limit))
    }
}
