//! Spatial partitioning data structures
//!
//! Bounded trees that hold at most one item per cell, in two layouts:
//! volumetric octrees and horizontal-slab quadtrees. [`SpatialTree`] indexes
//! item references the caller owns; [`ContainedTree`] owns its items and
//! removes them in constant time through their stored [`Location`].

mod contained;
mod error;
mod node;
mod partition;
mod tree;

pub use contained::ContainedTree;
pub use error::{Rejected, SpatialError};
pub use node::{Occupant, SpatialNode};
pub use partition::{Octants, Partition, Quadrants};
pub use tree::{Direction, Location, Materialization, SpatialTree, TreeConfig};

/// 8-ary tree over item references
pub type Octree<R> = SpatialTree<R, Octants>;

/// 4-ary tree over item references, splitting x and z only
pub type QuadTree<R> = SpatialTree<R, Quadrants>;

/// 8-ary tree owning its items
pub type ContainedOctree<T> = ContainedTree<T, Octants>;

/// 4-ary tree owning its items, splitting x and z only
pub type ContainedQuadTree<T> = ContainedTree<T, Quadrants>;
