//! Selection-propagation core for linked brushing across coordinated
//! statistical charts.
//!
//! Multiple charts share one [`DataSet`]; each renders either the raw
//! data or a [`Partitioning`] of it. Brushing in any chart turns into
//! `select`/`deselect` calls on the data set, which keeps every
//! partition's selected count consistent incrementally and notifies
//! registered observers so views re-render only what changed.

pub mod binning;
pub mod record;
pub mod selection;
pub mod units;

// Re-export commonly used types
pub use binning::{BinBounds, BinLayout, DEFAULT_BINS};
pub use record::{Datum, DatumId, Record, Value};
pub use selection::{
    count_intersection, DataSet, Parent, Partition, PartitionId, PartitionLabel,
    PartitionObserver, Partitioning, PartitioningId, SelectionObserver,
};
pub use units::{rescale_axis, AxisScale, AxisUnits};

use thiserror::Error;

/// Errors from partition construction and rescaling.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Nothing to partition; an empty data set never yields a
    /// partitioning.
    #[error("data set has no rows")]
    EmptyDataSet,

    #[error("no record carries attribute '{0}'")]
    MissingAttribute(String),

    #[error("attribute '{0}' has no finite numeric values")]
    NonNumericAttribute(String),

    #[error("partition does not belong to the partitioning being grouped")]
    ForeignPartition,
}
