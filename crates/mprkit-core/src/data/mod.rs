//! Geometric primitives shared by the pipeline
//!
//! All lengths are millimetres. There is no unit switching anywhere in the
//! generator: inch input is rejected at normalization time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance below which two coordinates are treated as the same point (mm)
pub const POSITION_TOLERANCE: f64 = 0.001;

/// A point in machine coordinates (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Point3 {
    /// Create a point from its three coordinates
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The machine origin
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Euclidean distance in the XY plane
    pub fn distance_xy(&self, other: &Point3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean distance in space
    pub fn distance_to(&self, other: &Point3) -> f64 {
        let dz = other.z - self.z;
        let xy = self.distance_xy(other);
        (xy * xy + dz * dz).sqrt()
    }

    /// Whether both points coincide within [`POSITION_TOLERANCE`] on every axis
    pub fn approx_eq(&self, other: &Point3) -> bool {
        (self.x - other.x).abs() <= POSITION_TOLERANCE
            && (self.y - other.y).abs() <= POSITION_TOLERANCE
            && (self.z - other.z).abs() <= POSITION_TOLERANCE
    }

    /// Component-wise translation
    pub fn offset(&self, by: &Point3) -> Point3 {
        Point3::new(self.x + by.x, self.y + by.y, self.z + by.z)
    }

    /// Whether every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Axis-aligned bounding box, used for stock geometry and part extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    /// Minimum corner
    pub min: Point3,
    /// Maximum corner
    pub max: Point3,
}

impl Bounds3 {
    /// Create bounds from two corners in any order
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Bounds containing a single point
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow to contain `p`
    pub fn include(&mut self, p: Point3) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// Extent along X
    pub fn size_x(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along Y
    pub fn size_y(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Extent along Z
    pub fn size_z(&self) -> f64 {
        self.max.z - self.min.z
    }
}
