//! Axis unit rescaling.
//!
//! Picks a multiplicative display scale for an attribute so magnitudes
//! read with roughly three significant figures. An attribute name may
//! carry a short parenthesised metric annotation ("latency (ms)"); the
//! existing unit is then reused or compounded instead of inventing a
//! magnitude word.

use serde::{Deserialize, Serialize};

/// One entry of a scale table: multiplier and display name.
#[derive(Debug, Clone, Copy)]
pub struct ScaleEntry {
    pub factor: f64,
    pub name: &'static str,
}

const fn entry(factor: f64, name: &'static str) -> ScaleEntry {
    ScaleEntry { factor, name }
}

/// Magnitude words for attributes without a unit annotation.
pub const SCALE_TEXT: &[ScaleEntry] = &[
    entry(0.000_000_001, "billionths"),
    entry(0.000_001, "millionths"),
    entry(0.001, "thousandths"),
    entry(0.01, "hundredths"),
    entry(1.0, ""),
    entry(100.0, "hundreds"),
    entry(1_000.0, "thousands"),
    entry(1_000_000.0, "millions"),
    entry(1_000_000_000.0, "billions"),
];

/// Metric prefixes for annotated attributes.
pub const SCALE_METRIC: &[ScaleEntry] = &[
    entry(0.000_000_000_001, "p"),
    entry(0.000_000_001, "n"),
    entry(0.000_001, "u"),
    entry(0.001, "m"),
    entry(1.0, ""),
    entry(1_000.0, "k"),
    entry(1_000_000.0, "M"),
    entry(1_000_000_000.0, "G"),
];

/// Time units for attributes measured in seconds. The "s" unit suffix
/// pluralises the larger names ("minute" + "s").
pub const SCALE_TIME: &[ScaleEntry] = &[
    entry(0.000_000_000_001, "p"),
    entry(0.000_000_001, "n"),
    entry(0.000_001, "u"),
    entry(0.001, "m"),
    entry(1.0, ""),
    entry(60.0, "minute"),
    entry(3_600.0, "hour"),
    entry(86_400.0, "day"),
];

/// Display units recorded against a rescaled attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisUnits {
    /// Scale marker: a metric prefix, a magnitude word or a time unit.
    pub scale: String,
    /// Base unit suffix, e.g. "s".
    pub units: String,
}

impl AxisUnits {
    pub fn new(scale: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            scale: scale.into(),
            units: units.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scale.is_empty() && self.units.is_empty()
    }

    /// Human-readable axis label: `attr (scaleunits)`, or the bare name
    /// when no units are recorded.
    pub fn format(&self, attribute: &str) -> String {
        if self.is_empty() {
            attribute.to_string()
        } else {
            format!("{} ({}{})", attribute, self.scale, self.units)
        }
    }
}

/// Outcome of [`rescale_axis`]: the stripped attribute name, the display
/// units and the divisor to apply to every stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisScale {
    pub name: String,
    pub units: AxisUnits,
    pub factor: f64,
}

/// Trailing parenthesised annotation of 1 to 2 characters, if any.
fn annotation(label: &str) -> Option<&str> {
    let open = label.rfind('(')?;
    let close = label.rfind(')')?;
    if open == 0 || close <= open {
        return None;
    }
    let inner = &label[open + 1..close];
    let chars = inner.chars().count();
    if chars == 0 || chars > 2 {
        return None;
    }
    Some(inner)
}

/// Whether the label carries a short metric unit annotation. Labels
/// without one are rescaled against the magnitude-word table instead.
pub fn has_units(label: &str) -> bool {
    annotation(label).is_some()
}

/// Existing scale factor and unit suffix encoded in an annotated label.
///
/// A single-character annotation is a bare unit at scale 1. For longer
/// annotations a leading metric prefix is recognised ("ms" is 0.001 of
/// "s"); anything unrecognised passes through whole at scale 1.
pub fn parse_label_units(label: &str) -> (f64, String) {
    let Some(inner) = annotation(label) else {
        return (1.0, String::new());
    };
    let mut chars = inner.chars();
    let first = chars.next().expect("annotation is non-empty");
    let rest: String = chars.collect();
    if rest.is_empty() {
        return (1.0, first.to_string());
    }
    for e in SCALE_METRIC {
        if !e.name.is_empty() && e.name.chars().eq(std::iter::once(first)) {
            return (e.factor, rest);
        }
    }
    (1.0, inner.to_string())
}

/// Index into `table` of the scale whose factor is closest in log space
/// to what the data calls for, or `None` when the attribute has no
/// finite non-zero values and no rescale is needed.
///
/// `existing` is the factor already encoded in the attribute's
/// annotation (1 for none). When max |value| is already in [1, 1000)
/// the existing scale is kept; otherwise the target factor is chosen so
/// the largest magnitude lands just under 10.
pub fn pick_scale(values: &[f64], table: &[ScaleEntry], existing: f64) -> Option<usize> {
    let mut max = 0.0f64;
    for &v in values {
        if v.is_finite() && v.abs() > max {
            max = v.abs();
        }
    }
    if max == 0.0 {
        return None;
    }
    let target = if (1.0..1000.0).contains(&max) {
        existing
    } else {
        max * existing / 9.999
    };
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, e) in table.iter().enumerate() {
        let distance = (e.factor.ln() - target.ln()).abs();
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    Some(best)
}

/// Decide a display scale for `label` over `values`.
///
/// Returns `None` when nothing would change: the label has no
/// annotation to strip and the values already read well at scale 1, or
/// there are no finite non-zero values to judge by. Otherwise the
/// caller divides every stored value by `factor` and stores them under
/// `name`, keeping `units` for axis labelling.
pub fn rescale_axis(label: &str, values: &[f64]) -> Option<AxisScale> {
    if has_units(label) {
        let (existing, units) = parse_label_units(label);
        let mut chosen = 1.0;
        let mut scale_name = String::new();
        if units == "%" {
            // percentages keep their values, only the name is stripped
        } else {
            let table = if units == "s" { SCALE_TIME } else { SCALE_METRIC };
            let i = pick_scale(values, table, existing)?;
            chosen = table[i].factor;
            scale_name = table[i].name.to_string();
        }
        let name = label[..label.rfind('(').expect("annotated label")]
            .trim_end()
            .to_string();
        let factor = if units == "%" { 1.0 } else { chosen / existing };
        Some(AxisScale {
            name,
            units: AxisUnits::new(scale_name, units),
            factor,
        })
    } else {
        let i = pick_scale(values, SCALE_TEXT, 1.0)?;
        if SCALE_TEXT[i].factor == 1.0 {
            // already readable, no rename either
            return None;
        }
        Some(AxisScale {
            name: label.to_string(),
            units: AxisUnits::new(SCALE_TEXT[i].name, ""),
            factor: SCALE_TEXT[i].factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_detection() {
        assert!(has_units("latency (ms)"));
        assert!(has_units("elapsed (s)"));
        assert!(has_units("load (%)"));
        assert!(!has_units("latency"));
        assert!(!has_units("(ms)"));
        assert!(!has_units("notes (explanation)"));
        assert!(!has_units("broken (ms"));
    }

    #[test]
    fn test_parse_label_units() {
        assert_eq!(parse_label_units("latency (ms)"), (0.001, "s".to_string()));
        assert_eq!(parse_label_units("size (kB)"), (1_000.0, "B".to_string()));
        assert_eq!(parse_label_units("elapsed (s)"), (1.0, "s".to_string()));
        assert_eq!(parse_label_units("rate (Hz)"), (1.0, "Hz".to_string()));
    }

    #[test]
    fn test_pick_scale_thousands() {
        let i = pick_scale(&[1500.0, 2500.0, 3200.0], SCALE_TEXT, 1.0).unwrap();
        assert_eq!(SCALE_TEXT[i].name, "thousands");
    }

    #[test]
    fn test_pick_scale_keeps_readable_range() {
        let i = pick_scale(&[1.5, 250.0, 999.0], SCALE_METRIC, 0.001).unwrap();
        assert_eq!(SCALE_METRIC[i].factor, 0.001);
    }

    #[test]
    fn test_pick_scale_ignores_non_finite() {
        assert_eq!(pick_scale(&[f64::NAN, 0.0], SCALE_TEXT, 1.0), None);
        let i = pick_scale(&[f64::NAN, 5000.0], SCALE_TEXT, 1.0).unwrap();
        assert_eq!(SCALE_TEXT[i].name, "thousands");
    }

    #[test]
    fn test_rescale_axis_magnitude_words() {
        let scale = rescale_axis("latency", &[1500.0, 2500.0, 3200.0]).unwrap();
        assert_eq!(scale.name, "latency");
        assert_eq!(scale.units, AxisUnits::new("thousands", ""));
        assert_eq!(scale.factor, 1_000.0);
    }

    #[test]
    fn test_rescale_axis_readable_values_unchanged() {
        assert_eq!(rescale_axis("latency", &[1.5, 2.5, 3.2]), None);
    }

    #[test]
    fn test_rescale_axis_milliseconds_to_seconds() {
        let scale = rescale_axis("latency (ms)", &[1500.0, 2500.0, 3200.0]).unwrap();
        assert_eq!(scale.name, "latency");
        assert_eq!(scale.units, AxisUnits::new("", "s"));
        assert_eq!(scale.factor, 1_000.0);
        assert_eq!(scale.units.format(&scale.name), "latency (s)");
    }

    #[test]
    fn test_rescale_axis_keeps_existing_prefix() {
        let scale = rescale_axis("latency (ms)", &[1.5, 2.5, 3.2]).unwrap();
        assert_eq!(scale.name, "latency");
        assert_eq!(scale.units, AxisUnits::new("m", "s"));
        assert_eq!(scale.factor, 1.0);
    }

    #[test]
    fn test_rescale_axis_seconds_to_hours() {
        let scale = rescale_axis("elapsed (s)", &[4000.0, 5000.0]).unwrap();
        assert_eq!(scale.units, AxisUnits::new("hour", "s"));
        assert_eq!(scale.factor, 3_600.0);
        assert_eq!(scale.units.format(&scale.name), "elapsed (hours)");
    }

    #[test]
    fn test_rescale_axis_percent_passthrough() {
        let scale = rescale_axis("load (%)", &[15.0, 80.0]).unwrap();
        assert_eq!(scale.name, "load");
        assert_eq!(scale.units, AxisUnits::new("", "%"));
        assert_eq!(scale.factor, 1.0);
    }

    #[test]
    fn test_rescale_axis_all_zero_is_noop() {
        assert_eq!(rescale_axis("latency (ms)", &[0.0, 0.0]), None);
        assert_eq!(rescale_axis("latency", &[f64::NAN]), None);
    }
}
