//! Sources that load external data into a `DataSet`.

pub mod csv_source;

pub use csv_source::CsvSource;
