//! Floating-point helpers (feature-gated).

#[inline(always)]
pub(crate) fn fma_f64(a: f64, b: f64, c: f64) -> f64 {
    #[cfg(feature = "fma")]
    {
        a.mul_add(b, c)
    }
    #[cfg(not(feature = "fma"))]
    {
        a * b + c
    }
}

/// Twice the signed area of triangle (a, b, c). Positive when counter-clockwise.
#[inline(always)]
pub(crate) fn orient2d(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> f64 {
    let abx = bx - ax;
    let aby = by - ay;
    let acx = cx - ax;
    let acy = cy - ay;
    fma_f64(abx, acy, -(aby * acx))
}

/// Binary exponent of `x` (`floor(log2 x)`), clamped to the normal range.
/// Returns 0 for zero, negative and non-finite inputs.
#[inline]
pub(crate) fn exponent_of(x: f64) -> i32 {
    if x > 0.0 && x.is_finite() {
        x.log2().floor().clamp(-1022.0, 1023.0) as i32
    } else {
        0
    }
}

/// `x * 2^e`, exact unless the result leaves the normal range.
pub(crate) fn ldexp(mut x: f64, mut e: i32) -> f64 {
    while e > 1000 {
        x *= pow2(1000);
        e -= 1000;
    }
    while e < -1000 {
        x *= pow2(-1000);
        e += 1000;
    }
    x * pow2(e)
}

/// `2^e` for `e` in `-1022..=1023`.
#[inline]
fn pow2(e: i32) -> f64 {
    f64::from_bits(((e + 1023) as u64) << 52)
}
