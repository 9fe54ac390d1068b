//! Rescale densities to a maximum of 1 and mask small values.

use crate::density::DensityField;
use crate::DensityError;

/// Values at or below this after normalization are set to 0.
pub const DEFAULT_LOWER_LIMIT: f64 = 1e-6;

/// Normalized density in `[0, 1]`, index-aligned with the input points.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDensity {
    values: Vec<f64>,
    max_density: f64,
    degenerate_max: bool,
    lower_limit: f64,
    masked: usize,
}

impl NormalizedDensity {
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum of the raw density before rescaling. May be
    /// `f64::INFINITY` for a field whose densities saturate; the normalized
    /// values are still exact ratios.
    #[inline]
    pub fn max_density(&self) -> f64 {
        self.max_density
    }

    #[inline]
    pub fn lower_limit(&self) -> f64 {
        self.lower_limit
    }

    /// True when the raw maximum was not positive, so nothing was rescaled
    /// and every value is 0.
    #[inline]
    pub fn is_degenerate_max(&self) -> bool {
        self.degenerate_max
    }

    /// Number of values set to 0 by the lower limit (excluding values that
    /// were already 0).
    #[inline]
    pub fn masked_count(&self) -> usize {
        self.masked
    }

    /// Value range for a logarithmic color scale, `None` when every value is 0.
    pub fn log_range(&self) -> Option<(f64, f64)> {
        if self.is_degenerate_max() {
            None
        } else {
            Some((self.lower_limit, 1.0))
        }
    }
}

/// Divide by the maximum, then zero every value `<= lower_limit`.
///
/// Densities must be finite and non-negative (`InvalidDensity` otherwise).
/// A zero maximum is not an error: the result is all zeros and
/// `is_degenerate_max` reports it, leaving the decision to log-scale callers.
pub fn normalize(density: &[f64], lower_limit: f64) -> Result<NormalizedDensity, DensityError> {
    if density.is_empty() {
        return Err(DensityError::EmptyDensity);
    }
    check_lower_limit(lower_limit)?;
    if let Some((index, &value)) = density
        .iter()
        .enumerate()
        .find(|(_, d)| !(d.is_finite() && **d >= 0.0))
    {
        return Err(DensityError::InvalidDensity { index, value });
    }

    let max_density = density.iter().copied().fold(0.0, f64::max);
    if max_density == 0.0 {
        tracing::warn!("density maximum is zero; output is all zeros");
        return Ok(NormalizedDensity {
            values: vec![0.0; density.len()],
            max_density,
            degenerate_max: true,
            lower_limit,
            masked: 0,
        });
    }

    let mut values: Vec<f64> = density.iter().map(|&d| d / max_density).collect();
    let masked = mask_below(&mut values, lower_limit);

    Ok(NormalizedDensity {
        values,
        max_density,
        degenerate_max: false,
        lower_limit,
        masked,
    })
}

/// Normalize a density field through its relative values, which stay finite
/// where the densities in input units saturate.
pub fn normalize_field(field: &DensityField, lower_limit: f64) -> Result<NormalizedDensity, DensityError> {
    let mut normalized = normalize(field.relative(), lower_limit)?;
    normalized.max_density = field.max().unwrap_or(0.0);
    Ok(normalized)
}

/// Set every value `<= lower_limit` to 0 in place. Returns how many nonzero
/// values were masked.
pub fn mask_below(values: &mut [f64], lower_limit: f64) -> usize {
    let mut masked = 0;
    for v in values.iter_mut() {
        if *v <= lower_limit {
            if *v != 0.0 {
                masked += 1;
            }
            *v = 0.0;
        }
    }
    masked
}

pub(crate) fn check_lower_limit(lower_limit: f64) -> Result<(), DensityError> {
    if lower_limit.is_finite() && (0.0..1.0).contains(&lower_limit) {
        Ok(())
    } else {
        Err(DensityError::InvalidLowerLimit(lower_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_to_one() {
        let n = normalize(&[2.0, 4.0, 1.0], DEFAULT_LOWER_LIMIT).unwrap();
        assert_eq!(n.values(), &[0.5, 1.0, 0.25]);
        assert_eq!(n.max_density(), 4.0);
        assert_eq!(n.log_range(), Some((DEFAULT_LOWER_LIMIT, 1.0)));
    }

    #[test]
    fn test_idempotent() {
        let input = vec![1.0, 0.5, 0.001, 0.0];
        let n = normalize(&input, DEFAULT_LOWER_LIMIT).unwrap();
        assert_eq!(n.values(), input.as_slice());
        assert_eq!(n.masked_count(), 0);
    }

    #[test]
    fn test_masking_boundary() {
        let limit = 0.25;
        let eps = 1e-9;
        let n = normalize(&[1.0, limit, limit + eps], limit).unwrap();
        assert_eq!(n.values(), &[1.0, 0.0, limit + eps]);
        assert_eq!(n.masked_count(), 1);
    }

    #[test]
    fn test_degenerate_max() {
        let n = normalize(&[0.0, 0.0, 0.0, 0.0], DEFAULT_LOWER_LIMIT).unwrap();
        assert!(n.is_degenerate_max());
        assert_eq!(n.values(), &[0.0; 4]);
        assert_eq!(n.log_range(), None);
        assert!(n.into_values().iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_rejects_invalid_densities() {
        assert_eq!(
            normalize(&[1.0, f64::INFINITY, 0.5], DEFAULT_LOWER_LIMIT).unwrap_err(),
            DensityError::InvalidDensity {
                index: 1,
                value: f64::INFINITY
            }
        );
        assert!(matches!(
            normalize(&[0.0, f64::NAN], DEFAULT_LOWER_LIMIT),
            Err(DensityError::InvalidDensity { index: 1, .. })
        ));
        assert_eq!(
            normalize(&[1.0, -2.0], DEFAULT_LOWER_LIMIT).unwrap_err(),
            DensityError::InvalidDensity {
                index: 1,
                value: -2.0
            }
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            normalize(&[], DEFAULT_LOWER_LIMIT).unwrap_err(),
            DensityError::EmptyDensity
        );
        assert_eq!(
            normalize(&[1.0], 1.0).unwrap_err(),
            DensityError::InvalidLowerLimit(1.0)
        );
        assert!(normalize(&[1.0], f64::NAN).is_err());
        assert!(normalize(&[1.0], -0.1).is_err());
    }

    #[test]
    fn test_mask_below_in_place() {
        let mut v = vec![0.0, 1e-7, 1e-6, 2e-6, 1.0];
        assert_eq!(mask_below(&mut v, 1e-6), 2);
        assert_eq!(v, vec![0.0, 0.0, 0.0, 2e-6, 1.0]);
    }
}
