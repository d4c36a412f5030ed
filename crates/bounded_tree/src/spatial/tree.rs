//! Bounded spatial tree
//!
//! Recursively divides a fixed region into child cells (8 octants or 4
//! horizontal quadrants, see [`Partition`]) and stores at most one item
//! reference per node. Items sink to the deepest cell that fully contains
//! them; anything straddling a cell boundary stays at the smallest ancestor
//! that still contains it.
//!
//! Nodes live in a slot-map arena and refer to each other by [`NodeKey`].
//! Depending on [`Materialization`] the full node set is built up front or
//! grown lazily as insertions descend into cells that do not exist yet.

use std::marker::PhantomData;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::collections::{NodeArena, NodeKey};
use crate::foundation::math::{Vec3, AABB};

use super::error::{Rejected, SpatialError};
use super::node::{Occupant, SpatialNode};
use super::partition::Partition;

/// Eager trees above this many nodes get a warning at construction
const EAGER_NODE_WARNING: usize = 1 << 20;

/// When child nodes are created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Materialization {
    /// Build every node down to `max_depth` when the tree is created
    Eager,
    /// Create children only when an insertion descends into them
    #[default]
    Lazy,
}

/// Configuration for tree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum subdivision depth; nodes at this depth are the smallest cells
    pub max_depth: usize,

    /// Minimum per-axis child size (prevents excessive subdivision)
    pub min_extent: f32,

    /// Whether nodes are built up front or on demand
    pub materialization: Materialization,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_extent: 1.0,
            materialization: Materialization::Lazy,
        }
    }
}

impl TreeConfig {
    /// Lazily materialized tree with the given limits
    pub const fn new(max_depth: usize, min_extent: f32) -> Self {
        Self {
            max_depth,
            min_extent,
            materialization: Materialization::Lazy,
        }
    }

    /// Same limits, with every node built at construction
    #[must_use]
    pub const fn eager(mut self) -> Self {
        self.materialization = Materialization::Eager;
        self
    }
}

impl Config for TreeConfig {}

/// Cardinal directions a tree window can be shifted in
///
/// North/South move along z, East/West along x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards -Z
    North,
    /// Towards +Z
    South,
    /// Towards +X
    East,
    /// Towards -X
    West,
}

impl Direction {
    /// Every direction, in declaration order
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// Translation of `distance` world units in this direction
    pub fn offset(self, distance: f32) -> Vec3 {
        match self {
            Self::North => Vec3::new(0.0, 0.0, -distance),
            Self::South => Vec3::new(0.0, 0.0, distance),
            Self::East => Vec3::new(distance, 0.0, 0.0),
            Self::West => Vec3::new(-distance, 0.0, 0.0),
        }
    }

    /// The direction that undoes this one
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }
}

/// Where an insertion put its item
///
/// Names the hosting node directly so the item can be vacated without walking
/// the tree. A location goes stale once its item is removed, erased, or
/// dropped by `resize`/`clear`; stale locations are detected, not trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    node: NodeKey,
    region: AABB,
}

impl Location {
    /// Node holding the item
    pub const fn node(&self) -> NodeKey {
        self.node
    }

    /// Region the item was inserted with
    pub const fn region(&self) -> &AABB {
        &self.region
    }
}

/// Bounded spatial tree over item references `R`, split according to `P`
#[derive(Debug, Clone)]
pub struct SpatialTree<R, P: Partition> {
    /// Every node of the tree; nodes are never freed while the tree lives
    nodes: NodeArena<SpatialNode<R>>,

    /// Node covering the whole tree region
    root: NodeKey,

    max_depth: usize,
    min_extent: f32,

    /// Side length of a max-depth cell (assumes a cubic root region)
    leaf_side: f32,

    materialization: Materialization,
    _partition: PhantomData<P>,
}

impl<R, P: Partition> SpatialTree<R, P> {
    /// Create a tree over `bounds`
    ///
    /// An eager tree is fully subdivided before this returns. If `min_extent`
    /// exceeds the root's size the tree stays a single leaf.
    pub fn new(bounds: AABB, config: &TreeConfig) -> Self {
        let mut nodes = NodeArena::with_key();
        let root = nodes.insert(SpatialNode::new::<P>(bounds, 0));
        let mut tree = Self {
            nodes,
            root,
            max_depth: config.max_depth,
            min_extent: config.min_extent,
            leaf_side: leaf_side_for(&bounds, config.max_depth),
            materialization: config.materialization,
            _partition: PhantomData,
        };

        if tree.materialization == Materialization::Eager {
            if tree.full_node_count() > EAGER_NODE_WARNING {
                warn!(
                    "Eagerly building a {}-way tree of depth {} (~{} nodes)",
                    P::BRANCHES,
                    tree.max_depth,
                    tree.full_node_count()
                );
            }
            tree.subdivide_all(root);
        }

        debug!(
            "Created {}-way tree: {} nodes, max depth {}, leaf side {}",
            P::BRANCHES,
            tree.nodes.len(),
            tree.max_depth,
            tree.leaf_side
        );
        tree
    }

    // ----------------------------------------------------------------------
    // Dimensions & position
    // ----------------------------------------------------------------------

    /// Region covered by the whole tree
    pub fn bounds(&self) -> &AABB {
        self.nodes[self.root].bounds()
    }

    /// Regions of the root's child slots
    pub fn child_bounds(&self) -> &[AABB] {
        self.nodes[self.root].child_bounds()
    }

    /// Check whether the tree's region fully contains `area`
    pub fn contains(&self, area: &AABB) -> bool {
        self.bounds().contains(area)
    }

    /// Side length of a max-depth cell; `shift` moves in multiples of it
    pub const fn leaf_side(&self) -> f32 {
        self.leaf_side
    }

    /// Minimum per-axis child size
    pub const fn min_extent(&self) -> f32 {
        self.min_extent
    }

    /// Construction mode of this tree
    pub const fn materialization(&self) -> Materialization {
        self.materialization
    }

    // ----------------------------------------------------------------------
    // Capacity
    // ----------------------------------------------------------------------

    /// Number of occupied nodes
    pub fn size(&self) -> usize {
        self.nodes.values().filter(|node| node.occupant().is_some()).count()
    }

    /// Theoretical capacity: the number of max-depth cells, `B^max_depth`
    pub fn max_size(&self) -> usize {
        u32::try_from(self.max_depth)
            .ok()
            .and_then(|depth| P::BRANCHES.checked_pow(depth))
            .unwrap_or(usize::MAX)
    }

    /// Depth of the root node
    pub fn depth(&self) -> usize {
        self.nodes[self.root].depth()
    }

    /// Maximum subdivision depth
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// True when the root has never been subdivided
    ///
    /// This says nothing about occupants: an unsubdivided root may still hold
    /// an item. Use [`size`](Self::size) to count items.
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root].children().iter().all(Option::is_none)
    }

    /// Number of materialized nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest materialized node
    pub fn materialized_depth(&self) -> usize {
        self.nodes.values().map(SpatialNode::depth).max().unwrap_or(0)
    }

    // ----------------------------------------------------------------------
    // Node access
    // ----------------------------------------------------------------------

    /// Handle of the root node
    pub const fn root(&self) -> NodeKey {
        self.root
    }

    /// Look up a node by handle
    pub fn node(&self, key: NodeKey) -> Option<&SpatialNode<R>> {
        self.nodes.get(key)
    }

    /// Every occupant with the node holding it, in arena order
    pub fn occupants(&self) -> impl Iterator<Item = (NodeKey, &Occupant<R>)> + '_ {
        self.nodes
            .iter()
            .filter_map(|(key, node)| node.occupant().map(|occupant| (key, occupant)))
    }

    // ----------------------------------------------------------------------
    // Modifiers
    // ----------------------------------------------------------------------

    /// Insert an item reference covering `region`
    ///
    /// The item descends into the first child slot that fully contains the
    /// region, creating the child if needed, until no child contains it or
    /// the depth/extent limits stop subdivision. It is stored at that node if
    /// the node is free; otherwise the item is handed back in the error.
    pub fn insert(&mut self, item: R, region: AABB) -> Result<Location, Rejected<R>> {
        let mut key = self.root;
        loop {
            let descend = {
                let node = &self.nodes[key];
                node.slot_containing(&region)
                    .filter(|_| self.can_subdivide(node))
            };
            match descend {
                Some(slot) => key = self.child_or_materialize(key, slot),
                None => break,
            }
        }

        let node = &mut self.nodes[key];
        let depth = node.depth();
        match node.place(item, region) {
            Ok(()) => {
                trace!("Placed item at depth {}", depth);
                Ok(Location { node: key, region })
            }
            Err(rejected) => {
                trace!("Rejected item at depth {}: {}", depth, rejected.reason);
                Err(rejected)
            }
        }
    }

    /// Put an item back into the node a location names
    ///
    /// Fails if the node is gone, already occupied, or does not contain the
    /// location's region.
    pub fn occupy(&mut self, location: &Location, item: R) -> Result<(), Rejected<R>> {
        match self.nodes.get_mut(location.node) {
            Some(node) => node.place(item, location.region),
            None => Err(Rejected {
                item,
                region: location.region,
                reason: SpatialError::StaleLocation,
            }),
        }
    }

    /// Vacate every node, keeping the materialized structure
    pub fn clear(&mut self) {
        for node in self.nodes.values_mut() {
            node.take_occupant();
        }
    }

    // ----------------------------------------------------------------------
    // Element access
    // ----------------------------------------------------------------------

    /// Depth-first search for occupants overlapping `area`
    ///
    /// A node reports its occupant when `area` covers the node, when the
    /// occupant's own region intersects `area`, or when the node is a leaf
    /// cell touching `area`. Children are visited in slot order, only when
    /// their slot region intersects `area`.
    pub fn dfs(&self, area: &AABB) -> Vec<R>
    where
        R: Clone,
    {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if node.reports(area, true) {
                if let Some(occupant) = node.occupant() {
                    found.push(occupant.item.clone());
                }
            }
            self.push_intersecting_children(node, area, &mut stack);
        }
        found
    }

    /// Breadth-first search for occupants overlapping `area`
    ///
    /// Uses the same test as [`dfs`](Self::dfs) except that the root ignores
    /// the leaf clause. The walk goes level by level and stops outright as
    /// soon as a node that may still subdivide is missing any child, so on partially
    /// materialized trees it returns a subset of what `dfs` finds. On a fully
    /// materialized tree both searches report the same occupants.
    pub fn bfs(&self, area: &AABB) -> Vec<R>
    where
        R: Clone,
    {
        let mut found = Vec::new();
        let root = &self.nodes[self.root];
        if root.reports(area, false) {
            if let Some(occupant) = root.occupant() {
                found.push(occupant.item.clone());
            }
        }

        let mut frontier: Vec<NodeKey> = root.children().iter().flatten().copied().collect();
        let mut lower = Vec::new();
        while !frontier.is_empty() {
            for &key in &frontier {
                let node = &self.nodes[key];
                if node.reports(area, true) {
                    if let Some(occupant) = node.occupant() {
                        found.push(occupant.item.clone());
                    }
                }
                if !self.can_subdivide(node) {
                    continue;
                }
                if !node.has_all_children() {
                    trace!("Breadth-first walk stopped at depth {}", node.depth());
                    return found;
                }
                lower.extend(node.children().iter().flatten().copied());
            }
            frontier.clear();
            std::mem::swap(&mut frontier, &mut lower);
        }
        found
    }

    /// Remove and return every occupant a depth-first search of `area` reports
    pub fn erase_area(&mut self, area: &AABB) -> Vec<Occupant<R>> {
        let mut removed = Vec::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = &mut self.nodes[key];
            if node.reports(area, true) {
                removed.extend(node.take_occupant());
            }
            let node = &self.nodes[key];
            self.push_intersecting_children(node, area, &mut stack);
        }
        debug!("Erased {} items from area", removed.len());
        removed
    }

    /// Vacate the node a location names, if it still holds `expected`
    ///
    /// O(1): no traversal. A location whose node no longer holds `expected`
    /// yields [`SpatialError::StaleLocation`] and changes nothing.
    pub fn vacate(&mut self, location: &Location, expected: &R) -> Result<R, SpatialError>
    where
        R: PartialEq,
    {
        let node = self
            .nodes
            .get_mut(location.node)
            .ok_or(SpatialError::StaleLocation)?;
        match node.occupant() {
            Some(occupant) if occupant.item == *expected => node
                .take_occupant()
                .map(|occupant| occupant.item)
                .ok_or(SpatialError::StaleLocation),
            _ => Err(SpatialError::StaleLocation),
        }
    }

    // ----------------------------------------------------------------------
    // Space altering
    // ----------------------------------------------------------------------

    /// Move the tree onto `bounds`, dropping every occupant
    ///
    /// The node structure is kept; only geometry is recomputed. The dropped
    /// occupants are returned in depth-first order so nothing disappears
    /// silently.
    pub fn resize(&mut self, bounds: AABB) -> Vec<Occupant<R>> {
        self.leaf_side = leaf_side_for(&bounds, self.max_depth);

        let mut dropped = Vec::new();
        let mut stack = vec![(self.root, bounds)];
        while let Some((key, bounds)) = stack.pop() {
            let node = &mut self.nodes[key];
            dropped.extend(node.rebound::<P>(bounds));
            for slot in (0..P::BRANCHES).rev() {
                if let Some(child) = node.child(slot) {
                    stack.push((child, node.child_bounds()[slot]));
                }
            }
        }

        debug!("Resized tree, dropped {} items", dropped.len());
        dropped
    }

    /// Slide the tree `cells` leaf cells in `direction`
    ///
    /// Every occupant is collected with its original region, the tree is
    /// moved, and the occupants are reinserted. Those that no longer fit (out
    /// of the new bounds, or beaten to their node by an earlier one) are
    /// returned; the shift itself never fails.
    pub fn shift(&mut self, cells: usize, direction: Direction) -> Vec<Rejected<R>> {
        self.shift_with(cells, direction, |_, _| {})
    }

    /// [`shift`](Self::shift), reporting the new location of every item that was kept
    pub fn shift_with(
        &mut self,
        cells: usize,
        direction: Direction,
        mut on_placed: impl FnMut(&R, Location),
    ) -> Vec<Rejected<R>> {
        #[allow(clippy::cast_precision_loss)]
        let distance = cells as f32 * self.leaf_side;
        let target = self.bounds().translated(direction.offset(distance));

        let collected = self.resize(target);
        let total = collected.len();
        let mut displaced = Vec::new();
        for Occupant { item, region } in collected {
            match self.insert(item, region) {
                Ok(location) => {
                    if let Some(occupant) = self.nodes[location.node].occupant() {
                        on_placed(&occupant.item, location);
                    }
                }
                Err(rejected) => displaced.push(rejected),
            }
        }

        debug!(
            "Shifted {:?} by {} cells: kept {}, displaced {}",
            direction,
            cells,
            total - displaced.len(),
            displaced.len()
        );
        displaced
    }

    // ----------------------------------------------------------------------
    // Internals
    // ----------------------------------------------------------------------

    /// Whether `node` may get children: above max depth and children not too small
    fn can_subdivide(&self, node: &SpatialNode<R>) -> bool {
        node.depth() < self.max_depth
            && node
                .child_bounds()
                .first()
                .is_some_and(|child| child.dimensions().min() >= self.min_extent)
    }

    fn child_or_materialize(&mut self, parent: NodeKey, slot: usize) -> NodeKey {
        if let Some(child) = self.nodes[parent].child(slot) {
            return child;
        }
        let (bounds, depth) = {
            let node = &self.nodes[parent];
            (node.child_bounds()[slot], node.depth() + 1)
        };
        let child = self.nodes.insert(SpatialNode::new::<P>(bounds, depth));
        self.nodes[parent].set_child(slot, child);
        child
    }

    /// Materialize every allowed descendant of `from`
    fn subdivide_all(&mut self, from: NodeKey) {
        let mut stack = vec![from];
        while let Some(key) = stack.pop() {
            if !self.can_subdivide(&self.nodes[key]) {
                continue;
            }
            for slot in 0..P::BRANCHES {
                stack.push(self.child_or_materialize(key, slot));
            }
        }
    }

    /// Push `node`'s children whose slots touch `area`, so they pop in slot order
    fn push_intersecting_children(&self, node: &SpatialNode<R>, area: &AABB, stack: &mut Vec<NodeKey>) {
        for slot in (0..P::BRANCHES).rev() {
            if let Some(child) = node.child(slot) {
                if node.child_bounds()[slot].intersects(area) {
                    stack.push(child);
                }
            }
        }
    }

    /// Node count of a fully materialized tree, ignoring `min_extent`
    fn full_node_count(&self) -> usize {
        let mut total: usize = 0;
        let mut level: usize = 1;
        for _ in 0..=self.max_depth {
            total = total.saturating_add(level);
            level = level.saturating_mul(P::BRANCHES);
        }
        total
    }
}

fn leaf_side_for(bounds: &AABB, max_depth: usize) -> f32 {
    let exponent = i32::try_from(max_depth).unwrap_or(i32::MAX);
    bounds.dimensions().x / 2.0_f32.powi(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::partition::{Octants, Quadrants};
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    type Tree = SpatialTree<u32, Octants>;

    fn world() -> AABB {
        AABB::cube(Vec3::zeros(), 8.0)
    }

    fn unit_at(x: f32, y: f32, z: f32) -> AABB {
        AABB::new(Vec3::new(x, y, z), Vec3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    fn depth_of(tree: &Tree, location: &Location) -> usize {
        tree.node(location.node()).map(SpatialNode::depth).unwrap()
    }

    /// One unit cube per integer cell of the world, with distinct ids
    fn fill_unit_cells(tree: &mut Tree) -> Vec<(u32, AABB)> {
        let mut placed = Vec::new();
        let mut id = 0;
        for x in -4..4 {
            for y in -4..4 {
                for z in -4..4 {
                    #[allow(clippy::cast_precision_loss)]
                    let region = unit_at(x as f32, y as f32, z as f32);
                    if tree.insert(id, region).is_ok() {
                        placed.push((id, region));
                    }
                    id += 1;
                }
            }
        }
        placed
    }

    #[test]
    fn test_eager_tree_is_fully_built() {
        crate::foundation::logging::init();
        let tree = Tree::new(world(), &TreeConfig::new(2, 1.0).eager());
        assert_eq!(tree.node_count(), 1 + 8 + 64);
        assert_eq!(tree.materialized_depth(), 2);
        assert!(!tree.is_empty());
        assert_eq!(tree.max_size(), 64);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.max_depth(), 2);
        assert_eq!(tree.size(), 0);
        assert_relative_eq!(tree.leaf_side(), 2.0);
        assert_relative_eq!(tree.min_extent(), 1.0);
        assert_eq!(tree.materialization(), Materialization::Eager);
        assert_eq!(tree.child_bounds().len(), 8);
        assert!(tree.contains(&AABB::cube(Vec3::zeros(), 8.0)));
        assert!(!tree.contains(&AABB::cube(Vec3::zeros(), 9.0)));
    }

    #[test]
    fn test_lazy_tree_starts_with_root_only() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        assert_eq!(tree.node_count(), 1);
        assert!(tree.is_empty());

        tree.insert(1, unit_at(3.0, 3.0, 3.0)).unwrap();
        assert_eq!(tree.node_count(), 3);
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_min_extent_limits_subdivision() {
        // children would be 4 wide, below the minimum of 5
        let tree = Tree::new(world(), &TreeConfig::new(3, 5.0).eager());
        assert_eq!(tree.node_count(), 1);

        // larger than the whole root: degenerates to a single leaf
        let mut tree = Tree::new(world(), &TreeConfig::new(3, 100.0).eager());
        assert_eq!(tree.node_count(), 1);
        let location = tree.insert(7, unit_at(3.0, 3.0, 3.0)).unwrap();
        assert_eq!(location.node(), tree.root());
        assert_eq!(tree.insert(8, unit_at(0.0, 0.0, 0.0)).unwrap_err().reason, SpatialError::Occupied);
    }

    #[test]
    fn test_placement_sinks_to_smallest_containing_cell() {
        for config in [TreeConfig::new(2, 1.0), TreeConfig::new(2, 1.0).eager()] {
            let mut tree = Tree::new(world(), &config);

            let deep = tree.insert(1, unit_at(3.0, 3.0, 3.0)).unwrap();
            assert_eq!(depth_of(&tree, &deep), 2);

            let straddling = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
            let top = tree.insert(2, straddling).unwrap();
            assert_eq!(top.node(), tree.root());
            assert_eq!(depth_of(&tree, &top), 0);

            // fits the (0..4) octant but crosses the depth-2 split at 2
            let middle = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
            let mid = tree.insert(3, middle).unwrap();
            assert_eq!(depth_of(&tree, &mid), 1);
            assert_relative_eq!(*mid.region(), middle);

            assert_eq!(tree.size(), 3);
        }
    }

    #[test]
    fn test_occupied_or_outside_is_rejected() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        tree.insert(1, unit_at(3.0, 3.0, 3.0)).unwrap();

        let rejected = tree.insert(2, unit_at(2.0, 2.0, 2.0)).unwrap_err();
        assert_eq!(rejected.reason, SpatialError::Occupied);
        assert_eq!(rejected.item, 2);
        assert_relative_eq!(rejected.region, unit_at(2.0, 2.0, 2.0));

        let outside = tree.insert(3, unit_at(10.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(outside.reason, SpatialError::OutOfBounds);
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_children_are_disjoint_and_nested() {
        let tree = SpatialTree::<u32, Octants>::new(world(), &TreeConfig::new(3, 1.0).eager());
        for (_, node) in &tree.nodes {
            let slots = node.child_bounds();
            for (i, child_bounds) in slots.iter().enumerate() {
                assert!(node.bounds().contains(child_bounds));
                assert!(child_bounds != node.bounds());
                for other in &slots[i + 1..] {
                    assert_eq!(child_bounds.overlap_volume(other), 0.0);
                }
                if let Some(child) = node.child(i) {
                    assert_eq!(tree.nodes[child].bounds(), child_bounds);
                    assert_eq!(tree.nodes[child].depth(), node.depth() + 1);
                }
            }
        }
    }

    #[test]
    fn test_dfs_finds_every_inserted_item() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        let mut placed = fill_unit_cells(&mut tree);
        let straddling = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        tree.insert(1000, straddling).unwrap();
        placed.push((1000, straddling));

        assert_eq!(placed.len(), tree.size());
        for (id, region) in &placed {
            assert!(tree.dfs(region).contains(id), "item {id} not found by its own region");
        }
    }

    #[test]
    fn test_queries_outside_bounds_are_empty() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0).eager());
        fill_unit_cells(&mut tree);
        let far = AABB::cube(Vec3::new(100.0, 0.0, 0.0), 2.0);
        assert!(tree.dfs(&far).is_empty());
        assert!(tree.bfs(&far).is_empty());
    }

    #[test]
    fn test_bfs_matches_dfs_on_complete_tree() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0).eager());
        let placed = fill_unit_cells(&mut tree);
        tree.insert(500, AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0)))
            .unwrap();

        let areas = [
            world(),
            AABB::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(3.5, 3.5, 3.5)),
            AABB::new(Vec3::new(-4.0, -4.0, -4.0), Vec3::new(-3.0, 4.0, 4.0)),
        ];
        for area in &areas {
            let dfs: HashSet<u32> = tree.dfs(area).into_iter().collect();
            let bfs: HashSet<u32> = tree.bfs(area).into_iter().collect();
            assert_eq!(dfs, bfs);
        }
        for (id, region) in &placed {
            assert!(tree.bfs(region).contains(id));
        }
    }

    #[test]
    fn test_bfs_matches_dfs_when_min_extent_caps_depth() {
        // cells stop at side 2, one level above max_depth
        let mut tree = Tree::new(world(), &TreeConfig::new(3, 2.0).eager());
        assert_eq!(tree.node_count(), 1 + 8 + 64);
        assert_eq!(tree.materialized_depth(), 2);

        let placed = fill_unit_cells(&mut tree);
        assert_eq!(placed.len(), 64);

        let dfs: HashSet<u32> = tree.dfs(&world()).into_iter().collect();
        let bfs: HashSet<u32> = tree.bfs(&world()).into_iter().collect();
        assert_eq!(dfs.len(), 64);
        assert_eq!(bfs, dfs);
        for (id, region) in &placed {
            assert!(tree.bfs(region).contains(id));
        }
    }

    #[test]
    fn test_bfs_stops_at_incomplete_child_sets() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        tree.insert(1, unit_at(3.0, 3.0, 3.0)).unwrap();
        tree.insert(2, unit_at(-4.0, -4.0, -4.0)).unwrap();

        let mut dfs = tree.dfs(&world());
        dfs.sort_unstable();
        assert_eq!(dfs, vec![1, 2]);
        // the first depth-1 node lacks seven children, so the walk ends there
        assert!(tree.bfs(&world()).is_empty());
    }

    #[test]
    fn test_bfs_root_skips_leaf_clause() {
        let mut tree = Tree::new(world(), &TreeConfig::new(0, 1.0));
        tree.insert(1, unit_at(-4.0, -4.0, -4.0)).unwrap();
        let touching = AABB::new(Vec3::new(3.5, 3.5, 3.5), Vec3::new(5.0, 5.0, 5.0));

        assert_eq!(tree.dfs(&touching), vec![1]);
        assert!(tree.bfs(&touching).is_empty());
        assert_eq!(tree.bfs(&AABB::cube(Vec3::zeros(), 20.0)), vec![1]);
    }

    #[test]
    fn test_erase_area_vacates_matching_nodes() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        tree.insert(1, unit_at(3.0, 3.0, 3.0)).unwrap();
        tree.insert(2, unit_at(-4.0, -4.0, -4.0)).unwrap();

        let erased = tree.erase_area(&AABB::new(Vec3::new(2.5, 2.5, 2.5), Vec3::new(4.0, 4.0, 4.0)));
        assert_eq!(erased.len(), 1);
        assert_eq!(erased[0].item, 1);
        assert_relative_eq!(erased[0].region, unit_at(3.0, 3.0, 3.0));
        assert_eq!(tree.size(), 1);
        assert!(tree.insert(3, unit_at(2.0, 2.0, 2.0)).is_ok());
    }

    #[test]
    fn test_vacate_by_location() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        let location = tree.insert(1, unit_at(3.0, 3.0, 3.0)).unwrap();

        assert_eq!(tree.vacate(&location, &2), Err(SpatialError::StaleLocation));
        assert_eq!(tree.vacate(&location, &1), Ok(1));
        assert_eq!(tree.vacate(&location, &1), Err(SpatialError::StaleLocation));

        // the vacated node accepts a new item
        let again = tree.insert(4, unit_at(2.0, 2.0, 2.0)).unwrap();
        assert_eq!(again.node(), location.node());
        assert!(tree.occupy(&location, 5).is_err());
    }

    #[test]
    fn test_clear_keeps_structure() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0).eager());
        fill_unit_cells(&mut tree);
        assert_eq!(tree.occupants().count(), tree.size());
        let nodes = tree.node_count();
        tree.clear();
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.node_count(), nodes);
    }

    #[test]
    fn test_resize_drops_content_and_moves_cells() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        tree.insert(1, unit_at(3.0, 3.0, 3.0)).unwrap();
        tree.insert(2, AABB::cube(Vec3::zeros(), 2.0)).unwrap();
        let nodes = tree.node_count();

        let moved = world().translated(Vec3::new(8.0, 0.0, 0.0));
        let dropped = tree.resize(moved);

        let ids: HashSet<u32> = dropped.iter().map(|o| o.item).collect();
        assert_eq!(ids, HashSet::from([1, 2]));
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.node_count(), nodes);
        assert_relative_eq!(*tree.bounds(), moved);
        for (_, node) in &tree.nodes {
            assert!(moved.contains(node.bounds()));
        }
    }

    #[test]
    fn test_shift_conserves_items() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0).eager());
        let mut before = fill_unit_cells(&mut tree);
        let straddling = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        tree.insert(1000, straddling).unwrap();
        before.push((1000, straddling));

        let displaced = tree.shift(1, Direction::East);
        assert_relative_eq!(
            *tree.bounds(),
            AABB::new(Vec3::new(-2.0, -4.0, -4.0), Vec3::new(6.0, 4.0, 4.0))
        );

        let kept = tree.dfs(tree.bounds());
        let kept_set: HashSet<u32> = kept.iter().copied().collect();
        assert_eq!(kept.len(), kept_set.len());
        assert_eq!(kept.len(), tree.size());

        for (id, region) in &before {
            let in_kept = kept_set.contains(id);
            let dropped: Vec<_> = displaced.iter().filter(|r| r.item == *id).collect();
            assert!(in_kept ^ (dropped.len() == 1), "item {id} must land in exactly one place");
            assert!(dropped.len() <= 1);
            if let Some(rejected) = dropped.first() {
                assert_relative_eq!(rejected.region, *region);
            }
        }
        assert!(displaced
            .iter()
            .any(|r| r.reason == SpatialError::OutOfBounds && r.region.min.x < -2.0));
    }

    #[test]
    fn test_shift_displaces_items_landing_on_occupied_nodes() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        let straddling = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let middle = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        tree.insert(1, straddling).unwrap();
        let before = tree.insert(2, middle).unwrap();
        assert_eq!(depth_of(&tree, &before), 1);

        // the new x split at 2 cuts the second item, sending it to the busy root
        let displaced = tree.shift(1, Direction::East);
        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].item, 2);
        assert_eq!(displaced[0].reason, SpatialError::Occupied);
        assert_relative_eq!(displaced[0].region, middle);

        let kept = tree.dfs(tree.bounds());
        assert_eq!(kept, vec![1]);
        assert_eq!(tree.node(tree.root()).and_then(|n| n.occupant()).map(|o| o.item), Some(1));
    }

    #[test]
    fn test_shift_with_reports_new_locations() {
        let mut tree = Tree::new(world(), &TreeConfig::new(2, 1.0));
        tree.insert(1, unit_at(2.0, 0.0, -4.0)).unwrap();
        tree.insert(2, unit_at(2.0, 0.0, 3.0)).unwrap();

        let mut placed = Vec::new();
        let displaced = tree.shift_with(1, Direction::North, |item, location| {
            placed.push((*item, location));
        });

        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].item, 2);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].0, 1);
        assert_eq!(tree.vacate(&placed[0].1, &1), Ok(1));
    }

    #[test]
    fn test_quadtree_ignores_vertical_position() {
        let bounds = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(16.0, 64.0, 16.0));
        let mut tree = SpatialTree::<u32, Quadrants>::new(bounds, &TreeConfig::new(2, 1.0).eager());
        assert_eq!(tree.node_count(), 1 + 4 + 16);
        assert_eq!(tree.max_size(), 16);
        assert_relative_eq!(tree.leaf_side(), 4.0);

        let column = AABB::new(Vec3::new(12.0, 0.0, 12.0), Vec3::new(16.0, 64.0, 16.0));
        let location = tree.insert(1, column).unwrap();
        assert_eq!(tree.node(location.node()).map(SpatialNode::depth), Some(2));

        let short = AABB::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(4.0, 11.0, 4.0));
        let location = tree.insert(2, short).unwrap();
        assert_eq!(tree.node(location.node()).map(SpatialNode::depth), Some(2));

        let displaced = tree.shift(1, Direction::West);
        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].item, 1);
    }

    #[test]
    fn test_direction_offsets() {
        assert_relative_eq!(Direction::North.offset(2.0), Vec3::new(0.0, 0.0, -2.0));
        assert_relative_eq!(Direction::South.offset(2.0), Vec3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(Direction::East.offset(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(Direction::West.offset(2.0), Vec3::new(-2.0, 0.0, 0.0));
        for direction in Direction::ALL {
            assert_relative_eq!(direction.offset(1.0) + direction.opposite().offset(1.0), Vec3::zeros());
        }
    }

    #[test]
    fn test_tree_config_parses_from_toml() {
        let config: TreeConfig = crate::config::ConfigFormat::Toml
            .parse("max_depth = 3\nmaterialization = \"Eager\"\n")
            .unwrap();
        assert_eq!(config, TreeConfig { max_depth: 3, ..TreeConfig::default() }.eager());
    }
}
