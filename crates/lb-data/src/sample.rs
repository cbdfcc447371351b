//! Deterministic synthetic data for demos and tests.

use lb_core::{DataSet, Record, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const REGIONS: &[&str] = &["eu-west", "us-east", "ap-south"];

/// Generate a request-log shaped data set: per-request latency and
/// payload size, an elapsed timestamp and a categorical region. Seeded,
/// so a given (rows, seed) pair always yields the same data.
pub fn request_log(rows: usize, seed: u64) -> DataSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(rows);
    for i in 0..rows {
        let region = REGIONS[rng.gen_range(0..REGIONS.len())];
        let base = match region {
            "eu-west" => 20.0,
            "us-east" => 35.0,
            _ => 60.0,
        };
        let latency = base + rng.gen::<f64>() * 2500.0;
        let payload = rng.gen_range(100.0..90_000.0);
        let elapsed = i as f64 * 0.25;

        let mut values = Record::new();
        values.insert("latency (ms)".to_string(), Value::Number(latency));
        values.insert("payload".to_string(), Value::Number(payload));
        values.insert("elapsed (s)".to_string(), Value::Number(elapsed));
        values.insert("region".to_string(), Value::Text(region.to_string()));
        records.push(values);
    }
    DataSet::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_log_is_deterministic() {
        let a = request_log(50, 7);
        let b = request_log(50, 7);
        assert_eq!(a.len(), 50);
        for (da, db) in a.data().iter().zip(b.data()) {
            assert_eq!(da.value("region"), db.value("region"));
            assert_eq!(da.number("latency (ms)"), db.number("latency (ms)"));
        }
    }

    #[test]
    fn test_request_log_shape() {
        let dataset = request_log(10, 1);
        assert_eq!(
            dataset.attributes(),
            &["latency (ms)", "payload", "elapsed (s)", "region"]
        );
        for datum in dataset.data() {
            assert!(datum.number("latency (ms)").unwrap() >= 20.0);
            assert!(REGIONS.contains(&datum.value("region").unwrap().to_string().as_str()));
        }
    }
}
