//! Observer traits for selection change notification.

use crate::record::DatumId;

/// Trait for visualisations that follow a whole data set.
pub trait SelectionObserver: Send + Sync {
    /// Called after a commit with the filtered, ascending id-sorted set
    /// of data whose selection state actually changed.
    fn selection_changed(&self, changed: &[DatumId]);
}

/// Refresh hook for a visual element bound to a single partition,
/// invoked whenever that partition's selected count changes.
pub trait PartitionObserver: Send + Sync {
    fn partition_changed(&self);
}
