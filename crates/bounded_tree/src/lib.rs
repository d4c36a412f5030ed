//! # Bounded Tree
//!
//! Fixed-region spatial trees for game worlds.
//!
//! ## Features
//!
//! - **Octrees and Quadtrees**: volumetric 8-way or horizontal 4-way splits
//! - **One Item per Cell**: items sink to the smallest cell that contains them
//! - **Owning Index**: constant-time removal through generational handles
//! - **Sliding Windows**: shift a tree by whole cells and get back what fell out
//! - **Lazy or Eager Nodes**: grow nodes on demand or build them up front
//!
//! ## Quick Start
//!
//! ```rust
//! use bounded_tree::prelude::*;
//!
//! let world = AABB::cube(Vec3::zeros(), 8.0);
//! let mut rocks: ContainedOctree<&str> = ContainedTree::new(world, &TreeConfig::new(2, 1.0));
//!
//! let small = AABB::new(Vec3::new(3.0, 3.0, 3.0), Vec3::new(4.0, 4.0, 4.0));
//! let key = rocks.insert("pebble", small).expect("cell is free");
//! assert_eq!(rocks.dfs(&small), vec![&"pebble"]);
//!
//! let unloaded = rocks.shift(1, Direction::East);
//! assert!(unloaded.is_empty());
//! assert_eq!(rocks.remove(key), Ok("pebble"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod spatial;

/// Common imports for tree users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        foundation::{
            collections::{ItemKey, NodeKey},
            math::{Vec3, AABB},
        },
        spatial::{
            ContainedOctree, ContainedQuadTree, ContainedTree, Direction, Location,
            Materialization, Octree, QuadTree, Rejected, SpatialError, SpatialTree, TreeConfig,
        },
    };
}
