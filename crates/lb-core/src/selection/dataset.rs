//! The depth-0 root of the selection-propagation graph.

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use super::intersect::count_intersection;
use super::partition::{
    Parent, Partition, PartitionId, PartitionLabel, Partitioning, PartitioningId,
};
use super::subscriber::{PartitionObserver, SelectionObserver};
use crate::binning::{BinBounds, BinLayout};
use crate::record::{Datum, DatumId, Record, Value};
use crate::units::{self, AxisUnits};
use crate::CoreError;

/// The authoritative owner of per-datum selection state, and the root
/// of the partition forest built over one data set.
///
/// Partitionings and partitions live in arenas on the data set and are
/// addressed by handle, so parent and child edges are index pairs
/// rather than owning references. Every selection mutation funnels
/// through [`select`](DataSet::select) / [`deselect`](DataSet::deselect)
/// (partition-originated requests included); the commit flips the
/// per-datum flags, pushes incremental deltas into every partition via
/// a sorted merge against the changed set, and only then notifies
/// observers. One commit runs to completion before the next is
/// accepted, which a `&mut self` receiver enforces for free. A host
/// that shares the data set across threads serializes through one lock
/// around the whole graph.
#[derive(Debug)]
pub struct DataSet {
    data: Vec<Datum>,
    selected_size: usize,
    attributes: Vec<String>,
    units: AHashMap<String, AxisUnits>,
    partitionings: Vec<Partitioning>,
    partitions: Vec<Partition>,
    observers: RwLock<Vec<Weak<dyn SelectionObserver>>>,
    partition_observers: RwLock<AHashMap<PartitionId, Vec<Weak<dyn PartitionObserver>>>>,
}

impl DataSet {
    /// Ingest an ordered sequence of records. Each is assigned a
    /// sequential identity, a cleared selection flag and a default
    /// label; attribute names are collected in first-seen order.
    pub fn new(records: Vec<Record>) -> Self {
        let mut attributes: Vec<String> = Vec::new();
        let mut seen: AHashSet<String> = AHashSet::new();
        for record in &records {
            for name in record.keys() {
                if seen.insert(name.clone()) {
                    attributes.push(name.clone());
                }
            }
        }
        let data: Vec<Datum> = records
            .into_iter()
            .enumerate()
            .map(|(i, values)| Datum::new(DatumId(i), values))
            .collect();
        debug!(
            "Ingested {} rows with {} attributes",
            data.len(),
            attributes.len()
        );
        Self {
            data,
            selected_size: 0,
            attributes,
            units: AHashMap::new(),
            partitionings: Vec::new(),
            partitions: Vec::new(),
            observers: RwLock::new(Vec::new()),
            partition_observers: RwLock::new(AHashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[Datum] {
        &self.data
    }

    pub fn datum(&self, id: DatumId) -> &Datum {
        &self.data[id.index()]
    }

    /// Attribute names in first-seen order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Count of currently selected data.
    pub fn selected_size(&self) -> usize {
        self.selected_size
    }

    /// Fraction of the data currently selected, 0 for an empty set.
    pub fn selected(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.selected_size as f64 / self.data.len() as f64
        }
    }

    pub fn partitioning(&self, id: PartitioningId) -> &Partitioning {
        &self.partitionings[id.index()]
    }

    pub fn partition(&self, id: PartitionId) -> &Partition {
        &self.partitions[id.index()]
    }

    // ---- selection -----------------------------------------------------

    /// Select the given data, skipping any already selected. Returns
    /// the set that actually changed, ascending by id, after every
    /// partition aggregate and observer has been brought up to date.
    ///
    /// Duplicate ids are tolerated (the first occurrence flips the
    /// flag, the rest fall out in the filter). Ids must belong to this
    /// data set.
    pub fn select(&mut self, ids: &[DatumId]) -> Vec<DatumId> {
        self.commit(ids, true)
    }

    /// Mirror of [`select`](DataSet::select) toward the cleared state.
    pub fn deselect(&mut self, ids: &[DatumId]) -> Vec<DatumId> {
        self.commit(ids, false)
    }

    /// Wholly select the given partitions. Every member not already
    /// selected is gathered and pushed through the root commit, which
    /// updates every partitioning exactly once on its way back down;
    /// the originating partitioning is never updated directly, so
    /// nothing is counted twice.
    pub fn select_partitions(&mut self, ids: &[PartitionId]) -> Vec<DatumId> {
        let wanted = self.gather_members(ids, false);
        self.commit(&wanted, true)
    }

    /// Mirror of [`select_partitions`](DataSet::select_partitions).
    pub fn deselect_partitions(&mut self, ids: &[PartitionId]) -> Vec<DatumId> {
        let wanted = self.gather_members(ids, true);
        self.commit(&wanted, false)
    }

    fn gather_members(&self, ids: &[PartitionId], selected: bool) -> Vec<DatumId> {
        let mut out = Vec::new();
        for &pid in ids {
            for &d in self.partitions[pid.index()].members() {
                if self.data[d.index()].selected() == selected {
                    out.push(d);
                }
            }
        }
        out
    }

    /// The single authoritative commit path for selection state.
    fn commit(&mut self, ids: &[DatumId], target: bool) -> Vec<DatumId> {
        let mut changed = Vec::with_capacity(ids.len());
        for &id in ids {
            let datum = &mut self.data[id.index()];
            if datum.selected() != target {
                datum.set_selected(target);
                changed.push(id);
                if target {
                    self.selected_size += 1;
                } else {
                    self.selected_size -= 1;
                }
            }
        }
        if changed.is_empty() {
            return changed;
        }
        changed.sort_unstable();
        debug!(
            "Committed {} of {} requested, {} now selected",
            changed.len(),
            ids.len(),
            self.selected_size
        );

        // Root partitionings take the merge-intersection path. Deeper
        // levels receive the same deltas through partition child edges,
        // never both.
        let root_partitions: Vec<PartitionId> = self
            .partitionings
            .iter()
            .filter(|p| p.parent() == Parent::Root)
            .flat_map(|p| p.partitions().iter().copied())
            .collect();
        for pid in root_partitions {
            let overlap =
                count_intersection(&changed, self.partitions[pid.index()].members()) as isize;
            self.shift_partition(pid, if target { overlap } else { -overlap });
        }

        self.notify_observers(&changed);
        changed
    }

    /// Apply a selected-count delta to a partition, refresh its
    /// observers and push the same delta into deeper partitions.
    fn shift_partition(&mut self, id: PartitionId, delta: isize) {
        if delta == 0 {
            return;
        }
        let mut stack = vec![id];
        while let Some(pid) = stack.pop() {
            let partition = &mut self.partitions[pid.index()];
            partition.apply_delta(delta);
            stack.extend_from_slice(partition.children());
            self.notify_partition(pid);
        }
    }

    // ---- observers -----------------------------------------------------

    /// Register a visualisation following the whole data set. Held
    /// weakly; dropped observers are pruned at the next notification.
    pub fn add_observer(&self, observer: Arc<dyn SelectionObserver>) {
        self.observers.write().push(Arc::downgrade(&observer));
    }

    /// Register a refresh hook on a single partition, for elements that
    /// render one partition directly.
    pub fn observe_partition(&self, id: PartitionId, observer: Arc<dyn PartitionObserver>) {
        self.partition_observers
            .write()
            .entry(id)
            .or_default()
            .push(Arc::downgrade(&observer));
    }

    fn notify_observers(&self, changed: &[DatumId]) {
        let mut observers = self.observers.write();
        observers.retain(|weak| weak.strong_count() > 0);
        for weak in observers.iter() {
            if let Some(observer) = weak.upgrade() {
                observer.selection_changed(changed);
            }
        }
    }

    fn notify_partition(&self, id: PartitionId) {
        let mut registry = self.partition_observers.write();
        if let Some(observers) = registry.get_mut(&id) {
            observers.retain(|weak| weak.strong_count() > 0);
            for weak in observers.iter() {
                if let Some(observer) = weak.upgrade() {
                    observer.partition_changed();
                }
            }
        }
    }

    // ---- partitioning factories ----------------------------------------

    /// Partition by exact equality of `field`: one partition per
    /// distinct value, labelled with it, in first-seen order. Members
    /// keep ascending id order. The order is stable across runs for a
    /// fixed input order.
    pub fn partition_by_field(&mut self, field: &str) -> Result<PartitioningId, CoreError> {
        if self.data.is_empty() {
            return Err(CoreError::EmptyDataSet);
        }
        let mut groups: IndexMap<String, Vec<DatumId>> = IndexMap::new();
        for datum in &self.data {
            if let Some(value) = datum.value(field) {
                groups.entry(value.to_string()).or_default().push(datum.id());
            }
        }
        if groups.is_empty() {
            return Err(CoreError::MissingAttribute(field.to_string()));
        }
        info!("Partitioned '{}' into {} distinct values", field, groups.len());
        let parts = groups
            .into_iter()
            .map(|(label, members)| (PartitionLabel::Value(label), members))
            .collect();
        Ok(self.insert_partitioning(field, parts))
    }

    /// Bin the numeric values of `field` by the Freedman-Diaconis rule,
    /// bounded by `bounds`. Labels are the bins' lower bounds.
    /// Non-finite values are left out of every bin, so the partitioning
    /// need not cover the data exhaustively.
    pub fn partition_to_bins(
        &mut self,
        field: &str,
        bounds: BinBounds,
    ) -> Result<PartitioningId, CoreError> {
        if self.data.is_empty() {
            return Err(CoreError::EmptyDataSet);
        }
        let mut present = false;
        let mut values: Vec<(DatumId, f64)> = Vec::with_capacity(self.data.len());
        for datum in &self.data {
            if let Some(value) = datum.value(field) {
                present = true;
                if let Some(v) = value.as_number() {
                    if v.is_finite() {
                        values.push((datum.id(), v));
                    }
                }
            }
        }
        if !present {
            return Err(CoreError::MissingAttribute(field.to_string()));
        }
        if values.is_empty() {
            return Err(CoreError::NonNumericAttribute(field.to_string()));
        }

        let mut sorted: Vec<f64> = values.iter().map(|&(_, v)| v).collect();
        sorted.sort_unstable_by(f64::total_cmp);
        let layout = BinLayout::freedman_diaconis(&sorted, bounds);

        let mut splits: Vec<Vec<DatumId>> = vec![Vec::new(); layout.num_bins];
        for (id, v) in values {
            splits[layout.bin_of(v)].push(id);
        }
        info!(
            "Binned '{}' into {} bins of width {}",
            field, layout.num_bins, layout.width
        );
        let parts = splits
            .into_iter()
            .enumerate()
            .map(|(i, members)| (PartitionLabel::Bound(layout.lower_bound(i)), members))
            .collect();
        Ok(self.insert_partitioning(field, parts))
    }

    /// Compose a coarser partitioning over an existing one: one
    /// partition per named group of `parent`'s partitions, with the
    /// groups' member sets merged. Each constituent partition gains a
    /// child edge so commit deltas propagate into the new level.
    /// Groups must not share a constituent.
    pub fn group_partitions(
        &mut self,
        parent: PartitioningId,
        name: &str,
        groups: &[(String, Vec<PartitionId>)],
    ) -> Result<PartitioningId, CoreError> {
        let owned: AHashSet<PartitionId> = self.partitionings[parent.index()]
            .partitions()
            .iter()
            .copied()
            .collect();
        for (_, constituents) in groups {
            if constituents.iter().any(|p| !owned.contains(p)) {
                return Err(CoreError::ForeignPartition);
            }
        }
        let depth = self.partitionings[parent.index()].depth() + 1;
        let mut ids = Vec::with_capacity(groups.len());
        for (label, constituents) in groups {
            let mut members: Vec<DatumId> = constituents
                .iter()
                .flat_map(|p| self.partitions[p.index()].members().iter().copied())
                .collect();
            members.sort_unstable();
            let pid = self.insert_partition(PartitionLabel::Value(label.clone()), members);
            for &constituent in constituents {
                self.partitions[constituent.index()].add_child(pid);
            }
            ids.push(pid);
        }
        let id = PartitioningId(self.partitionings.len());
        self.partitionings.push(Partitioning::new(
            name.to_string(),
            depth,
            Parent::Partitioning(parent),
            ids,
        ));
        Ok(id)
    }

    fn insert_partition(&mut self, label: PartitionLabel, members: Vec<DatumId>) -> PartitionId {
        // the data may already carry selections when a partition is built
        let selected = members
            .iter()
            .filter(|d| self.data[d.index()].selected())
            .count();
        let id = PartitionId(self.partitions.len());
        self.partitions.push(Partition::new(label, members, selected));
        id
    }

    fn insert_partitioning(
        &mut self,
        name: &str,
        parts: Vec<(PartitionLabel, Vec<DatumId>)>,
    ) -> PartitioningId {
        let mut ids = Vec::with_capacity(parts.len());
        for (label, members) in parts {
            ids.push(self.insert_partition(label, members));
        }
        let id = PartitioningId(self.partitionings.len());
        self.partitionings
            .push(Partitioning::new(name.to_string(), 1, Parent::Root, ids));
        id
    }

    // ---- units ---------------------------------------------------------

    /// Rescale every attribute for display, dividing stored numeric
    /// values into a readable range and recording the display units.
    /// The old attribute is removed only when `delete_old` is set;
    /// otherwise the original values remain alongside the rescaled
    /// ones.
    pub fn rescale(&mut self, delete_old: bool) {
        if self.data.is_empty() {
            return;
        }
        self.units.clear();
        let old_attributes = std::mem::take(&mut self.attributes);
        for attribute in old_attributes {
            let values: Vec<f64> = self
                .data
                .iter()
                .map(|d| d.number(&attribute).unwrap_or(f64::NAN))
                .collect();
            match units::rescale_axis(&attribute, &values) {
                Some(scale) => {
                    debug!(
                        "Rescaled '{}' to '{}' by {}",
                        attribute, scale.name, scale.factor
                    );
                    for datum in &mut self.data {
                        if let Some(v) = datum.number(&attribute) {
                            datum.set_value(scale.name.clone(), Value::Number(v / scale.factor));
                        }
                    }
                    if delete_old && scale.name != attribute {
                        for datum in &mut self.data {
                            datum.remove_value(&attribute);
                        }
                    }
                    self.units.insert(scale.name.clone(), scale.units);
                    self.attributes.push(scale.name);
                }
                None => {
                    self.units.insert(attribute.clone(), AxisUnits::default());
                    self.attributes.push(attribute);
                }
            }
        }
    }

    /// Compute display units for a partitioning's `count` axis. The
    /// stored counts are untouched; only the axis label scale is
    /// recorded.
    pub fn rescale_partitioning(&mut self, id: PartitioningId) -> AxisUnits {
        let counts: Vec<f64> = self.partitionings[id.index()]
            .partitions()
            .iter()
            .map(|p| self.partitions[p.index()].count() as f64)
            .collect();
        let units = match units::rescale_axis("count", &counts) {
            Some(scale) => scale.units,
            None => AxisUnits::default(),
        };
        self.partitionings[id.index()].set_units("count", units.clone());
        units
    }

    /// Display label for an attribute at data-set level.
    pub fn with_units(&self, attribute: &str) -> String {
        match self.units.get(attribute) {
            Some(units) => units.format(attribute),
            None => attribute.to_string(),
        }
    }

    /// Display label for an attribute as seen from a partitioning,
    /// deferring along the parent chain to the data-set record when a
    /// level has none of its own.
    pub fn with_partitioning_units(&self, id: PartitioningId, attribute: &str) -> String {
        let mut current = id;
        loop {
            let partitioning = &self.partitionings[current.index()];
            if let Some(units) = partitioning.units(attribute) {
                return units.format(attribute);
            }
            match partitioning.parent() {
                Parent::Partitioning(next) => current = next,
                Parent::Root => return self.with_units(attribute),
            }
        }
    }
}
