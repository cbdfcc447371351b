//! CSV data source for loading files into a data set.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use lb_core::{DataSet, Record, Value};
use tracing::info;

use crate::DataError;

/// Rows sampled when deciding whether a column is numeric.
const MAX_SAMPLE_ROWS: usize = 5000;

/// Loads CSV data into a [`DataSet`], inferring column types from a
/// sample of the rows.
pub struct CsvSource;

impl CsvSource {
    /// Load a CSV file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<DataSet, DataError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!(
            "Loaded {:?}: {} rows, {} attributes",
            path,
            dataset.len(),
            dataset.attributes().len()
        );
        Ok(dataset)
    }

    /// Build a data set from any CSV byte stream. The first row is the
    /// header. A column is numeric when every non-empty sampled cell
    /// parses as a float; empty cells in a numeric column become NaN,
    /// which binning and rescaling skip.
    pub fn from_reader<R: Read>(reader: R) -> Result<DataSet, DataError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows: Vec<csv::StringRecord> = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }
        if rows.is_empty() {
            return Err(DataError::EmptyFile);
        }

        let numeric = infer_numeric_columns(&headers, &rows);
        let records = rows
            .iter()
            .map(|csv_row| {
                let mut values = Record::new();
                for (i, name) in headers.iter().enumerate() {
                    let cell = csv_row.get(i).unwrap_or("").trim();
                    let value = if numeric[i] {
                        Value::Number(cell.parse().unwrap_or(f64::NAN))
                    } else {
                        Value::Text(cell.to_string())
                    };
                    values.insert(name.clone(), value);
                }
                values
            })
            .collect();
        Ok(DataSet::new(records))
    }
}

/// A column is numeric when it has at least one non-empty cell in the
/// sample and every non-empty cell parses as a float.
fn infer_numeric_columns(headers: &[String], rows: &[csv::StringRecord]) -> Vec<bool> {
    let mut numeric = vec![true; headers.len()];
    let mut non_empty = vec![false; headers.len()];
    for csv_row in rows.iter().take(MAX_SAMPLE_ROWS) {
        for i in 0..headers.len() {
            let cell = csv_row.get(i).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            non_empty[i] = true;
            if cell.parse::<f64>().is_err() {
                numeric[i] = false;
            }
        }
    }
    for i in 0..headers.len() {
        if !non_empty[i] {
            numeric[i] = false;
        }
    }
    numeric
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
region,latency (ms),note
eu,120.5,ok
us,340.0,slow
eu,95.25,
";

    #[test]
    fn test_parses_rows_and_types() {
        let dataset = CsvSource::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.attributes(), &["region", "latency (ms)", "note"]);
        assert_eq!(
            dataset.data()[0].value("region"),
            Some(&Value::Text("eu".to_string()))
        );
        assert_eq!(dataset.data()[1].number("latency (ms)"), Some(340.0));
        // "note" has a non-numeric cell, so the whole column is text
        assert_eq!(
            dataset.data()[2].value("note"),
            Some(&Value::Text("".to_string()))
        );
    }

    #[test]
    fn test_empty_numeric_cell_becomes_nan() {
        let csv = "x,tag\n1.0,a\n,b\n2.0,c\n";
        let dataset = CsvSource::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(dataset.data()[1].number("x").unwrap().is_nan());
        assert_eq!(dataset.data()[2].number("x"), Some(2.0));
    }

    #[test]
    fn test_header_only_is_empty() {
        let err = CsvSource::from_reader("a,b\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::EmptyFile));
    }

    #[test]
    fn test_all_empty_column_is_text() {
        let csv = "x,y\n1.0,\n2.0,\n";
        let dataset = CsvSource::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(
            dataset.data()[0].value("y"),
            Some(&Value::Text("".to_string()))
        );
    }
}
