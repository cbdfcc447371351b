//! Partition aggregates and the partitionings that hold them.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::{write_number, DatumId};
use crate::units::AxisUnits;

/// Handle of a partition in its data set's arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PartitionId(pub(crate) usize);

impl PartitionId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Handle of a partitioning in its data set's arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PartitioningId(pub(crate) usize);

impl PartitioningId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Parent link of a partitioning: the data set root or a shallower
/// partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Root,
    Partitioning(PartitioningId),
}

/// Label of a partition: a category's value, or a numeric bin's lower
/// bound.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionLabel {
    Value(String),
    Bound(f64),
}

impl PartitionLabel {
    /// The numeric lower bound, for bin partitions.
    pub fn bound(&self) -> Option<f64> {
        match self {
            PartitionLabel::Bound(v) => Some(*v),
            PartitionLabel::Value(_) => None,
        }
    }
}

impl fmt::Display for PartitionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionLabel::Value(s) => write!(f, "{}", s),
            PartitionLabel::Bound(v) => write_number(f, *v),
        }
    }
}

/// A pseudo-datum aggregating a fixed subset of the data: one bin or
/// one category. Disjoint from its siblings within a partitioning.
///
/// Membership never changes after construction; only the selected count
/// does, and only through the owning data set's commit path.
#[derive(Debug)]
pub struct Partition {
    label: PartitionLabel,
    /// Member data, ascending by id. These are the raw data the
    /// partition ultimately aggregates, even for deeper partitions.
    members: Vec<DatumId>,
    selected_size: usize,
    /// Deeper partitions covering this one; they receive the same
    /// selected-count deltas. Rare, usually empty.
    children: Vec<PartitionId>,
}

impl Partition {
    pub(crate) fn new(label: PartitionLabel, members: Vec<DatumId>, selected_size: usize) -> Self {
        Self {
            label,
            members,
            selected_size,
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &PartitionLabel {
        &self.label
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[DatumId] {
        &self.members
    }

    pub fn selected_size(&self) -> usize {
        self.selected_size
    }

    /// Fraction of members currently selected, 0 for an empty partition.
    pub fn selected(&self) -> f64 {
        if self.members.is_empty() {
            0.0
        } else {
            self.selected_size as f64 / self.members.len() as f64
        }
    }

    pub fn children(&self) -> &[PartitionId] {
        &self.children
    }

    pub(crate) fn apply_delta(&mut self, delta: isize) {
        self.selected_size = (self.selected_size as isize + delta) as usize;
    }

    pub(crate) fn add_child(&mut self, child: PartitionId) {
        self.children.push(child);
    }
}

/// An ordered set of disjoint partitions over one data set, usable as a
/// data source for a chart (one bar or curve point per partition).
///
/// Selection requests made against its partitions are routed up the
/// parent chain to the data set root; aggregate updates flow back down
/// from there.
#[derive(Debug)]
pub struct Partitioning {
    name: String,
    depth: usize,
    parent: Parent,
    partitions: Vec<PartitionId>,
    units: AHashMap<String, AxisUnits>,
}

impl Partitioning {
    pub(crate) fn new(
        name: String,
        depth: usize,
        parent: Parent,
        partitions: Vec<PartitionId>,
    ) -> Self {
        Self {
            name,
            depth,
            parent,
            partitions,
            units: AHashMap::new(),
        }
    }

    /// The attribute this partitioning groups by, or a synthetic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Levels below the data set root; direct partitionings are depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    pub fn partitions(&self) -> &[PartitionId] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub(crate) fn units(&self, attribute: &str) -> Option<&AxisUnits> {
        self.units.get(attribute)
    }

    pub(crate) fn set_units(&mut self, attribute: &str, units: AxisUnits) {
        self.units.insert(attribute.to_string(), units);
    }
}
