//! The selection-propagation graph.
//!
//! A [`DataSet`] owns the raw data and a forest of partitionings built
//! over it. Selection requests originate either at raw-data resolution
//! (a brush over a scatter plot) or at a partition (a click on a
//! histogram bar); both are routed to the data set root, committed
//! there, and pushed back down into every partition aggregate before
//! observers are notified. Partition membership is fixed at
//! construction, so the downward pass is a sorted merge between the
//! changed set and each partition's members rather than a rescan.

mod dataset;
mod intersect;
mod partition;
mod subscriber;

pub use dataset::DataSet;
pub use intersect::count_intersection;
pub use partition::{
    Parent, Partition, PartitionId, PartitionLabel, Partitioning, PartitioningId,
};
pub use subscriber::{PartitionObserver, SelectionObserver};
