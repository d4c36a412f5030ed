//! Subdivision layouts
//!
//! A [`Partition`] decides how many child slots a node has and which region
//! each slot covers. Both layouts split at the parent's center; they differ in
//! which axes get halved.

use std::fmt::Debug;

use crate::foundation::math::{Vec3, AABB};

/// How a node's region is split into child slots
pub trait Partition: Copy + Debug + Default + 'static {
    /// Number of child slots per node
    const BRANCHES: usize;

    /// Region of child slot `slot` (in `0..BRANCHES`) of a node bounded by `parent`
    fn child_bounds(parent: &AABB, slot: usize) -> AABB;

    /// Regions of every child slot, in slot order
    fn all_child_bounds(parent: &AABB) -> Vec<AABB> {
        (0..Self::BRANCHES)
            .map(|slot| Self::child_bounds(parent, slot))
            .collect()
    }
}

/// Pick the lower or upper half of `[min, max]` split at `center`
fn half(min: f32, center: f32, max: f32, upper: bool) -> (f32, f32) {
    if upper {
        (center, max)
    } else {
        (min, center)
    }
}

/// Volumetric split into 8 octants, halving x, y and z
///
/// Octant layout (bit set = upper half):
/// - bit 0: +X
/// - bit 1: +Y
/// - bit 2: +Z
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Octants;

impl Partition for Octants {
    const BRANCHES: usize = 8;

    fn child_bounds(parent: &AABB, slot: usize) -> AABB {
        let center = parent.center();
        let (min_x, max_x) = half(parent.min.x, center.x, parent.max.x, slot & 1 != 0);
        let (min_y, max_y) = half(parent.min.y, center.y, parent.max.y, slot & 2 != 0);
        let (min_z, max_z) = half(parent.min.z, center.z, parent.max.z, slot & 4 != 0);
        AABB::new(Vec3::new(min_x, min_y, min_z), Vec3::new(max_x, max_y, max_z))
    }
}

/// Horizontal-slab split into 4 quadrants, halving x and z only
///
/// Every quadrant inherits the parent's full y span, so the tree partitions
/// a slab of 3D space (a chunk map) rather than a plane.
///
/// Quadrant layout (bit set = upper half):
/// - bit 0: +X
/// - bit 1: +Z
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quadrants;

impl Partition for Quadrants {
    const BRANCHES: usize = 4;

    fn child_bounds(parent: &AABB, slot: usize) -> AABB {
        let center = parent.center();
        let (min_x, max_x) = half(parent.min.x, center.x, parent.max.x, slot & 1 != 0);
        let (min_z, max_z) = half(parent.min.z, center.z, parent.max.z, slot & 2 != 0);
        AABB::new(
            Vec3::new(min_x, parent.min.y, min_z),
            Vec3::new(max_x, parent.max.y, max_z),
        )
    }
}
