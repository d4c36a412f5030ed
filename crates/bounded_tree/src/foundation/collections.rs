//! Generational handle types backing the spatial arenas

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a node inside a tree's node arena
    pub struct NodeKey;

    /// Stable handle to an item owned by a contained tree
    ///
    /// Stays valid while other items are inserted or removed, and is detected
    /// as stale once its own item has been removed.
    pub struct ItemKey;
}

/// Arena of tree nodes addressed by [`NodeKey`]
pub type NodeArena<N> = SlotMap<NodeKey, N>;

/// Owning item sequence addressed by [`ItemKey`]
pub type ItemArena<T> = SlotMap<ItemKey, T>;
