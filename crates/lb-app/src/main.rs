//! Terminal demonstration of linked brushing.
//!
//! Wires the selection core to console stand-ins for two coordinated
//! charts: brushing a range of the numeric axis updates the category
//! histogram, and clicking a category bar updates the numeric bins.

use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::Mutex;
use tracing::info;

use lb_core::{
    BinBounds, DataSet, DatumId, PartitionObserver, PartitioningId, SelectionObserver,
};
use lb_data::{sample, CsvSource};

/// Console stand-in for a chart following the whole data set.
struct ConsoleView {
    name: &'static str,
}

impl SelectionObserver for ConsoleView {
    fn selection_changed(&self, changed: &[DatumId]) {
        println!("  [{}] repainting {} points", self.name, changed.len());
    }
}

/// Console stand-in for a single histogram bar.
#[derive(Default)]
struct BarView {
    refreshes: Mutex<usize>,
}

impl PartitionObserver for BarView {
    fn partition_changed(&self) {
        *self.refreshes.lock() += 1;
    }
}

fn print_partitioning(dataset: &DataSet, id: PartitioningId) {
    let partitioning = dataset.partitioning(id);
    println!(
        "{} ({}, {} partitions):",
        partitioning.name(),
        dataset.with_partitioning_units(id, "count"),
        partitioning.len(),
    );
    for &pid in partitioning.partitions() {
        let partition = dataset.partition(pid);
        let bar = "#".repeat((partition.selected() * 30.0).round() as usize);
        println!(
            "  {:>12.12} | {:>4}/{:<4} {}",
            partition.label().to_string(),
            partition.selected_size(),
            partition.count(),
            bar
        );
    }
}

/// First attribute carrying text values, for the category chart.
fn categorical_attribute(dataset: &DataSet) -> Option<String> {
    dataset
        .attributes()
        .iter()
        .find(|a| {
            dataset
                .data()
                .iter()
                .any(|d| d.value(a.as_str()).is_some_and(|v| !v.is_number()))
        })
        .cloned()
}

/// First attribute carrying finite numeric values, for the brush axis.
fn numeric_attribute(dataset: &DataSet) -> Option<String> {
    dataset
        .attributes()
        .iter()
        .find(|a| {
            dataset
                .data()
                .iter()
                .any(|d| d.number(a.as_str()).is_some_and(f64::is_finite))
        })
        .cloned()
}

fn value_range(dataset: &DataSet, attribute: &str) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for datum in dataset.data() {
        if let Some(v) = datum.number(attribute) {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }
    (lo, hi)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut dataset = match std::env::args().nth(1) {
        Some(path) => CsvSource::load(&path)?,
        None => sample::request_log(400, 7),
    };
    if dataset.is_empty() {
        bail!("no rows to visualise");
    }

    dataset.rescale(true);
    for attribute in dataset.attributes().to_vec() {
        info!("axis: {}", dataset.with_units(&attribute));
    }

    let Some(category) = categorical_attribute(&dataset) else {
        bail!("no categorical attribute to chart");
    };
    let Some(metric) = numeric_attribute(&dataset) else {
        bail!("no numeric attribute to brush");
    };

    let categories = dataset.partition_by_field(&category)?;
    let bins = dataset.partition_to_bins(&metric, BinBounds::new(4, 12))?;
    dataset.rescale_partitioning(categories);

    let scatter = Arc::new(ConsoleView { name: "scatter" });
    let histogram = Arc::new(ConsoleView { name: "histogram" });
    dataset.add_observer(scatter.clone());
    dataset.add_observer(histogram.clone());

    let first_bar_id = dataset.partitioning(categories).partitions()[0];
    let first_bar = Arc::new(BarView::default());
    dataset.observe_partition(first_bar_id, first_bar.clone());

    // Brush the upper half of the numeric range.
    let (lo, hi) = value_range(&dataset, &metric);
    let threshold = (lo + hi) / 2.0;
    println!(
        "brush: {} >= {:.2}",
        dataset.with_units(&metric),
        threshold
    );
    let brushed: Vec<DatumId> = dataset
        .data()
        .iter()
        .filter(|d| d.number(&metric).is_some_and(|v| v >= threshold))
        .map(|d| d.id())
        .collect();
    dataset.select(&brushed);
    print_partitioning(&dataset, categories);
    print_partitioning(&dataset, bins);

    // Click the first category bar, wholly selecting it.
    println!("click: bar '{}'", dataset.partition(first_bar_id).label());
    dataset.select_partitions(&[first_bar_id]);
    print_partitioning(&dataset, categories);
    print_partitioning(&dataset, bins);

    // Clear everything.
    let everything: Vec<DatumId> = dataset.data().iter().map(|d| d.id()).collect();
    dataset.deselect(&everything);
    println!(
        "cleared; '{}' bar refreshed {} times",
        dataset.partition(first_bar_id).label(),
        *first_bar.refreshes.lock()
    );
    print_partitioning(&dataset, categories);

    Ok(())
}
