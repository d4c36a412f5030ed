//! A single node of a bounded spatial tree
//!
//! Nodes live in the tree's arena and refer to their children by [`NodeKey`].
//! Each node precomputes the regions of all of its child slots, whether or not
//! the children exist yet, and holds at most one occupant.

use crate::foundation::collections::NodeKey;
use crate::foundation::math::AABB;

use super::error::{Rejected, SpatialError};
use super::partition::Partition;

/// Item reference held by a node, with the region it was placed with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant<R> {
    /// The stored reference
    pub item: R,
    /// Region supplied when the item was inserted
    pub region: AABB,
}

/// Single node in the tree hierarchy
#[derive(Debug, Clone)]
pub struct SpatialNode<R> {
    /// World-space bounds of this node
    bounds: AABB,

    /// Depth in the tree (0 = root)
    depth: usize,

    /// Regions of the child slots, one per branch
    child_bounds: Vec<AABB>,

    /// Materialized children; `None` means "not allocated", not "no space"
    children: Vec<Option<NodeKey>>,

    /// True until a child has been materialized
    is_leaf: bool,

    /// At most one item per node, regardless of how many could fit
    occupant: Option<Occupant<R>>,
}

impl<R> SpatialNode<R> {
    /// Create a new leaf node with its child slot regions precomputed
    pub(crate) fn new<P: Partition>(bounds: AABB, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            child_bounds: P::all_child_bounds(&bounds),
            children: vec![None; P::BRANCHES],
            is_leaf: true,
            occupant: None,
        }
    }

    /// World-space bounds of this node
    pub const fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Depth in the tree (0 = root)
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Regions of every child slot, in slot order
    pub fn child_bounds(&self) -> &[AABB] {
        &self.child_bounds
    }

    /// Child handles, in slot order
    pub fn children(&self) -> &[Option<NodeKey>] {
        &self.children
    }

    /// Handle of the child in `slot`, if it has been materialized
    pub fn child(&self, slot: usize) -> Option<NodeKey> {
        self.children.get(slot).copied().flatten()
    }

    /// Check if this node is a leaf (has never been subdivided)
    pub const fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// True when every child slot has been materialized
    pub fn has_all_children(&self) -> bool {
        self.children.iter().all(Option::is_some)
    }

    /// The item this node holds, if any
    pub const fn occupant(&self) -> Option<&Occupant<R>> {
        self.occupant.as_ref()
    }

    /// First child slot whose region fully contains `region`
    ///
    /// Sibling regions only share faces, so at most one slot can contain a
    /// region that has any thickness.
    pub fn slot_containing(&self, region: &AABB) -> Option<usize> {
        self.child_bounds.iter().position(|bounds| bounds.contains(region))
    }

    /// Whether this node's occupant belongs in a query over `area`
    ///
    /// `leaf_test` enables the "leaf cell touches the area" clause; the
    /// breadth-first walk turns it off for the root.
    pub fn reports(&self, area: &AABB, leaf_test: bool) -> bool {
        let Some(occupant) = &self.occupant else {
            return false;
        };
        area.contains(&self.bounds)
            || occupant.region.intersects(area)
            || (leaf_test && self.is_leaf && self.bounds.intersects(area))
    }

    /// Record a materialized child
    pub(crate) fn set_child(&mut self, slot: usize, key: NodeKey) {
        self.children[slot] = Some(key);
        self.is_leaf = false;
    }

    /// Why `region` could not be stored here, if it could not
    pub fn vacancy(&self, region: &AABB) -> Result<(), SpatialError> {
        if !self.bounds.contains(region) {
            Err(SpatialError::OutOfBounds)
        } else if self.occupant.is_some() {
            Err(SpatialError::Occupied)
        } else {
            Ok(())
        }
    }

    /// Store `item` here if the node is free and contains `region`
    pub(crate) fn place(&mut self, item: R, region: AABB) -> Result<(), Rejected<R>> {
        if let Err(reason) = self.vacancy(&region) {
            return Err(Rejected { item, region, reason });
        }
        self.occupant = Some(Occupant { item, region });
        Ok(())
    }

    /// Vacate the occupant slot
    pub(crate) fn take_occupant(&mut self) -> Option<Occupant<R>> {
        self.occupant.take()
    }

    /// Give this node new bounds, recomputing child slot regions
    ///
    /// The occupant is dropped from the node and handed back; children keep
    /// their place in the structure but must be re-bounded by the caller.
    pub(crate) fn rebound<P: Partition>(&mut self, bounds: AABB) -> Option<Occupant<R>> {
        let [min, max] = bounds.bounding_region();
        self.bounds.update_position(min, max);
        for (slot, child_bounds) in self.child_bounds.iter_mut().enumerate() {
            *child_bounds = P::child_bounds(&bounds, slot);
        }
        self.occupant.take()
    }
}
