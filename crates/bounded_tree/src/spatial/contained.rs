//! Owning spatial index
//!
//! [`ContainedTree`] owns its items in a slot map and lets a
//! [`SpatialTree`] index them by [`ItemKey`]. Each record remembers the
//! [`Location`] its key was placed at, so removal goes straight to the hosting
//! node instead of searching the tree.

use log::debug;

use crate::foundation::collections::{ItemArena, ItemKey};
use crate::foundation::math::AABB;

use super::error::{Rejected, SpatialError};
use super::partition::Partition;
use super::tree::{Direction, Location, SpatialTree, TreeConfig};

/// An owned item and where the tree put it
#[derive(Debug, Clone)]
struct Record<T> {
    item: T,
    location: Location,
    /// Insertion order, used by [`ContainedTree::items`]
    sequence: u64,
}

/// Spatial tree that owns the items it indexes
#[derive(Debug, Clone)]
pub struct ContainedTree<T, P: Partition> {
    items: ItemArena<Record<T>>,
    tree: SpatialTree<ItemKey, P>,
    next_sequence: u64,
}

impl<T, P: Partition> ContainedTree<T, P> {
    /// Create an empty index over `bounds`
    pub fn new(bounds: AABB, config: &TreeConfig) -> Self {
        Self {
            items: ItemArena::with_key(),
            tree: SpatialTree::new(bounds, config),
            next_sequence: 0,
        }
    }

    /// Read access to the underlying tree of item keys
    pub const fn tree(&self) -> &SpatialTree<ItemKey, P> {
        &self.tree
    }

    // ----------------------------------------------------------------------
    // Modifiers
    // ----------------------------------------------------------------------

    /// Take ownership of `item` and index it under `region`
    ///
    /// If the tree refuses the region nothing is stored and the item comes
    /// back inside the error.
    pub fn insert(&mut self, item: T, region: AABB) -> Result<ItemKey, Rejected<T>> {
        let sequence = self.next_sequence;
        let tree = &mut self.tree;
        let key = self.items.try_insert_with_key(|key| match tree.insert(key, region) {
            Ok(location) => Ok(Record {
                item,
                location,
                sequence,
            }),
            Err(rejected) => Err(Rejected {
                item,
                region,
                reason: rejected.reason,
            }),
        })?;
        self.next_sequence += 1;
        Ok(key)
    }

    /// Remove an item from both the tree and the owning map
    pub fn remove(&mut self, key: ItemKey) -> Result<T, SpatialError> {
        let record = self.items.get(key).ok_or(SpatialError::UnknownItem)?;
        self.tree.vacate(&record.location, &key)?;
        self.items
            .remove(key)
            .map(|record| record.item)
            .ok_or(SpatialError::UnknownItem)
    }

    /// Move an item to a new region
    ///
    /// On rejection the item stays where it was.
    pub fn relocate(&mut self, key: ItemKey, region: AABB) -> Result<(), SpatialError> {
        let old = self.items.get(key).ok_or(SpatialError::UnknownItem)?.location;
        self.tree.vacate(&old, &key)?;
        match self.tree.insert(key, region) {
            Ok(location) => {
                if let Some(record) = self.items.get_mut(key) {
                    record.location = location;
                }
                Ok(())
            }
            Err(rejected) => {
                self.tree.occupy(&old, key).map_err(|restore| restore.reason)?;
                Err(rejected.reason)
            }
        }
    }

    /// Drop every item, keeping the tree's structure
    pub fn clear(&mut self) {
        self.tree.clear();
        self.items.clear();
    }

    // ----------------------------------------------------------------------
    // Element access
    // ----------------------------------------------------------------------

    /// The item behind `key`
    pub fn get(&self, key: ItemKey) -> Option<&T> {
        self.items.get(key).map(|record| &record.item)
    }

    /// Mutable access to the item behind `key`; its region cannot change here
    pub fn get_mut(&mut self, key: ItemKey) -> Option<&mut T> {
        self.items.get_mut(key).map(|record| &mut record.item)
    }

    /// Where the item behind `key` is stored in the tree
    pub fn location(&self, key: ItemKey) -> Option<&Location> {
        self.items.get(key).map(|record| &record.location)
    }

    /// Every item with its key, in storage order
    pub fn iter(&self) -> impl Iterator<Item = (ItemKey, &T)> + '_ {
        self.items.iter().map(|(key, record)| (key, &record.item))
    }

    /// Number of owned items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no item is owned
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys and items a depth-first search of `area` reports
    pub fn query(&self, area: &AABB) -> Vec<(ItemKey, &T)> {
        self.resolve(self.tree.dfs(area))
    }

    /// Items a depth-first search of `area` reports
    pub fn dfs(&self, area: &AABB) -> Vec<&T> {
        self.resolve(self.tree.dfs(area))
            .into_iter()
            .map(|(_, item)| item)
            .collect()
    }

    /// Items a breadth-first search of `area` reports
    ///
    /// See [`SpatialTree::bfs`] for when this finds less than [`dfs`](Self::dfs).
    pub fn bfs(&self, area: &AABB) -> Vec<&T> {
        self.resolve(self.tree.bfs(area))
            .into_iter()
            .map(|(_, item)| item)
            .collect()
    }

    /// Clones of every item, in insertion order
    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut records: Vec<&Record<T>> = self.items.values().collect();
        records.sort_by_key(|record| record.sequence);
        records.into_iter().map(|record| record.item.clone()).collect()
    }

    /// Remove and return every item a depth-first search of `area` reports
    pub fn erase_area(&mut self, area: &AABB) -> Vec<T> {
        self.tree
            .erase_area(area)
            .into_iter()
            .filter_map(|occupant| self.items.remove(occupant.item))
            .map(|record| record.item)
            .collect()
    }

    // ----------------------------------------------------------------------
    // Space altering
    // ----------------------------------------------------------------------

    /// Move the index onto `bounds`, giving back every item with its region
    pub fn resize(&mut self, bounds: AABB) -> Vec<(T, AABB)> {
        let dropped: Vec<(T, AABB)> = self
            .tree
            .resize(bounds)
            .into_iter()
            .filter_map(|occupant| {
                self.items
                    .remove(occupant.item)
                    .map(|record| (record.item, occupant.region))
            })
            .collect();
        debug_assert!(self.items.is_empty());
        dropped
    }

    /// Slide the index `cells` leaf cells in `direction`
    ///
    /// Items that no longer fit are removed and returned with the region they
    /// had before the shift. Everything else keeps its key.
    pub fn shift(&mut self, cells: usize, direction: Direction) -> Vec<(T, AABB)> {
        let items = &mut self.items;
        let displaced = self.tree.shift_with(cells, direction, |key, location| {
            if let Some(record) = items.get_mut(*key) {
                record.location = location;
            }
        });

        let displaced: Vec<(T, AABB)> = displaced
            .into_iter()
            .filter_map(|rejected| {
                self.items
                    .remove(rejected.item)
                    .map(|record| (record.item, rejected.region))
            })
            .collect();
        debug!("Index shift released {} items, {} remain", displaced.len(), self.items.len());
        displaced
    }

    // ----------------------------------------------------------------------
    // Capacity & dimensions
    // ----------------------------------------------------------------------

    /// Number of occupied tree nodes; equals [`len`](Self::len)
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Theoretical capacity of the tree
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Depth of the root node
    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Maximum subdivision depth
    pub const fn max_depth(&self) -> usize {
        self.tree.max_depth()
    }

    /// Region covered by the index
    pub fn bounds(&self) -> &AABB {
        self.tree.bounds()
    }

    /// Side length of a max-depth cell
    pub const fn leaf_side(&self) -> f32 {
        self.tree.leaf_side()
    }

    /// Check whether the index region fully contains `area`
    pub fn contains(&self, area: &AABB) -> bool {
        self.tree.contains(area)
    }

    fn resolve(&self, keys: Vec<ItemKey>) -> Vec<(ItemKey, &T)> {
        keys.into_iter()
            .filter_map(|key| self.items.get(key).map(|record| (key, &record.item)))
            .collect()
    }
}
