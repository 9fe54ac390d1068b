//! Core types for planar density computation.

use bytemuck::{Pod, Zeroable};
use glam::DVec2;

/// A point in the plane.
///
/// This type provides a small `#[repr(C)]` representation with a stable layout,
/// so coordinate buffers loaded elsewhere can be reinterpreted with `bytemuck`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create from any type implementing `Point2Like`.
    #[inline]
    pub fn from_like<P: Point2Like>(p: &P) -> Self {
        Self::new(p.x(), p.y())
    }

    #[inline]
    pub fn to_glam(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn from_glam(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2 {
    #[inline]
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point2> for [f64; 2] {
    #[inline]
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

impl From<DVec2> for Point2 {
    #[inline]
    fn from(v: DVec2) -> Self {
        Self::from_glam(v)
    }
}

impl From<Point2> for DVec2 {
    #[inline]
    fn from(p: Point2) -> DVec2 {
        p.to_glam()
    }
}

/// Trait for types that can be used as input points.
///
/// This allows zero-copy input from various math libraries.
pub trait Point2Like {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
}

impl Point2Like for Point2 {
    #[inline]
    fn x(&self) -> f64 {
        self.x
    }
    #[inline]
    fn y(&self) -> f64 {
        self.y
    }
}

impl Point2Like for [f64; 2] {
    #[inline]
    fn x(&self) -> f64 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f64 {
        self[1]
    }
}

impl Point2Like for (f64, f64) {
    #[inline]
    fn x(&self) -> f64 {
        self.0
    }
    #[inline]
    fn y(&self) -> f64 {
        self.1
    }
}

impl Point2Like for DVec2 {
    #[inline]
    fn x(&self) -> f64 {
        self.x
    }
    #[inline]
    fn y(&self) -> f64 {
        self.y
    }
}
