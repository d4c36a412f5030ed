//! Error types for spatial trees

use std::fmt;

use thiserror::Error;

use crate::foundation::math::AABB;

/// Reasons a spatial operation was refused
///
/// None of these are fatal: the tree is left exactly as it was before the
/// refused call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpatialError {
    /// The only node able to hold the region already has an occupant
    #[error("the node that would hold this region is already occupied")]
    Occupied,

    /// The region is not fully inside the tree's bounds
    #[error("region lies outside the tree bounds")]
    OutOfBounds,

    /// The location no longer names a node holding the expected item
    #[error("location is stale: its node no longer holds the expected item")]
    StaleLocation,

    /// The item handle does not refer to a live item
    #[error("item handle does not refer to a live item")]
    UnknownItem,
}

/// An insertion the tree refused, handing the item back to the caller
///
/// Returned by inserts and collected by `shift` for every item that no longer
/// fits; the caller decides whether to retry, persist or drop it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected<T> {
    /// The item that was not placed
    pub item: T,
    /// Region the item was offered with
    pub region: AABB,
    /// Why the tree refused it
    pub reason: SpatialError,
}

impl<T> Rejected<T> {
    /// Split into the item and its region, discarding the reason
    pub fn into_parts(self) -> (T, AABB) {
        (self.item, self.region)
    }

    /// Replace the rejected item, keeping region and reason
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Rejected<U> {
        Rejected {
            item: f(self.item),
            region: self.region,
            reason: self.reason,
        }
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rejected region {:?}..{:?}: {}",
            self.region.min.as_slice(),
            self.region.max.as_slice(),
            self.reason
        )
    }
}

impl<T: fmt::Debug> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}
