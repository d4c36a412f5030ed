//! Math utilities and types
//!
//! Provides the vector type and the axis-aligned bounding volume that every
//! spatial structure in this crate partitions and queries against.

use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Axis-Aligned Bounding Box used for tree cells and item regions
///
/// Both corners are inclusive: a box contains another box that shares a face
/// with it, and two boxes that only touch are considered intersecting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents (half-size)
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Create a cube of the given side length centered at a point
    pub fn cube(center: Vec3, side: f32) -> Self {
        let half = side * 0.5;
        Self::from_center_extents(center, Vec3::new(half, half, half))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full side length along each axis
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Minimum and maximum corners, in that order
    pub const fn bounding_region(&self) -> [Vec3; 2] {
        [self.min, self.max]
    }

    /// Re-bound this box in place
    pub fn update_position(&mut self, min: Vec3, max: Vec3) {
        self.min = min;
        self.max = max;
    }

    /// Copy of this box moved by `offset`
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Check if this AABB fully encloses another AABB
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.max.x >= other.max.x
            && self.min.y <= other.min.y
            && self.max.y >= other.max.y
            && self.min.z <= other.min.z
            && self.max.z >= other.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Volume shared by the interiors of both boxes (zero when they only touch)
    pub fn overlap_volume(&self, other: &Self) -> f32 {
        let min = self.min.sup(&other.min);
        let max = self.max.inf(&other.max);
        let span = (max - min).map(|d| d.max(0.0));
        span.x * span.y * span.z
    }
}

impl AbsDiffEq for AABB {
    type Epsilon = f32;

    fn default_epsilon() -> Self::Epsilon {
        f32::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.min.abs_diff_eq(&other.min, epsilon) && self.max.abs_diff_eq(&other.max, epsilon)
    }
}

impl RelativeEq for AABB {
    fn default_max_relative() -> Self::Epsilon {
        f32::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        self.min.relative_eq(&other.min, epsilon, max_relative)
            && self.max.relative_eq(&other.max, epsilon, max_relative)
    }
}
