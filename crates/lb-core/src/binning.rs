//! Histogram bin layout via the Freedman-Diaconis rule.

use serde::{Deserialize, Serialize};

/// Bin count to fall back on when the interquartile range degenerates
/// (all mass in the middle quartiles, or too few rows for a quartile
/// split).
pub const DEFAULT_BINS: usize = 10;

/// Bin count limits for binned partitionings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinBounds {
    pub min: usize,
    pub max: usize,
}

impl BinBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Request exactly `n` bins, skipping the Freedman-Diaconis rule.
    pub fn exact(n: usize) -> Self {
        Self { min: n, max: n }
    }
}

impl Default for BinBounds {
    fn default() -> Self {
        Self { min: 0, max: 1000 }
    }
}

/// A computed bin layout: `num_bins` bins of `width`, starting at
/// `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLayout {
    pub num_bins: usize,
    pub width: f64,
    pub origin: f64,
}

impl BinLayout {
    /// Freedman-Diaconis layout over ascending-sorted finite values.
    ///
    /// Quartiles are taken at indices n/4 and n-1-n/4 of the sorted
    /// input, so fewer than four values degenerate to the fallback
    /// width, as does a zero interquartile range. The width is slightly
    /// undersized relative to an even split (the 0.1 subtrahend) so the
    /// top value cannot fall off the last bin through rounding. A zero
    /// span still yields a positive width and at least one bin.
    pub fn freedman_diaconis(sorted: &[f64], bounds: BinBounds) -> Self {
        debug_assert!(!sorted.is_empty(), "bin layout needs at least one value");
        let n = sorted.len();
        let min = sorted[0];
        let max = sorted[n - 1];
        let span = max - min;

        let mut width;
        if bounds.min != bounds.max {
            let iqr = sorted[n - 1 - n / 4] - sorted[n / 4];
            width = 2.0 * iqr / (n as f64).cbrt();
            if !width.is_finite() || width <= 0.0 {
                width = span / (DEFAULT_BINS as f64 - 0.1);
            }
        } else {
            // fixed bin count requested, no rule to apply
            width = span / (bounds.min as f64 - 0.1);
        }

        let mut num_bins = if width.is_finite() && width > 0.0 {
            (span / width).ceil() as usize
        } else {
            0
        };
        if num_bins < bounds.min || num_bins > bounds.max {
            num_bins = num_bins.clamp(bounds.min, bounds.max);
            width = span / (num_bins as f64 - 0.1);
        }
        let num_bins = num_bins.max(1);
        if !width.is_finite() || width <= 0.0 {
            width = 1.0;
        }

        Self {
            num_bins,
            width,
            origin: min,
        }
    }

    /// Lower bound (and label) of bin `i`.
    pub fn lower_bound(&self, i: usize) -> f64 {
        self.origin + i as f64 * self.width
    }

    /// Bin index for a value. The origin itself lands in bin 0 and
    /// anything past the top edge is clamped into the last bin.
    pub fn bin_of(&self, value: f64) -> usize {
        let bin = ((value - self.origin) / self.width).ceil();
        if bin <= 0.0 {
            0
        } else {
            (bin as usize).min(self.num_bins - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_bin_count() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let layout = BinLayout::freedman_diaconis(&values, BinBounds::exact(5));
        assert_eq!(layout.num_bins, 5);
        // the last value must land inside the last bin
        assert_eq!(layout.bin_of(99.0), 4);
        assert!(layout.lower_bound(5) >= 99.0);
    }

    #[test]
    fn test_freedman_diaconis_uniform() {
        let values: Vec<f64> = (0..1000).map(|i| i as f64 / 10.0).collect();
        let layout = BinLayout::freedman_diaconis(&values, BinBounds::default());
        // IQR is ~half the span, so roughly cbrt(n) bins
        assert!(layout.num_bins >= 5 && layout.num_bins <= 1000);
        assert!(layout.width > 0.0);
        for v in &values {
            assert!(layout.bin_of(*v) < layout.num_bins);
        }
    }

    #[test]
    fn test_clamp_recomputes_width() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let layout = BinLayout::freedman_diaconis(&values, BinBounds::new(2, 3));
        assert_eq!(layout.num_bins, 3);
        assert!(layout.bin_of(99.0) == 2);
    }

    #[test]
    fn test_tiny_input_stays_positive() {
        let layout = BinLayout::freedman_diaconis(&[1.0, 2.0], BinBounds::default());
        assert!(layout.num_bins >= 1);
        assert!(layout.width > 0.0);
        assert_eq!(layout.bin_of(1.0), 0);
        assert!(layout.bin_of(2.0) < layout.num_bins);
    }

    #[test]
    fn test_zero_iqr_uses_fallback_width() {
        // all mass in the middle quartiles, IQR 0 but a nonzero span
        let values = [1.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 11.0];
        let layout = BinLayout::freedman_diaconis(&values, BinBounds::default());
        assert_eq!(layout.num_bins, DEFAULT_BINS);
        assert!((layout.width - 10.0 / 9.9).abs() < 1e-9);
        assert_eq!(layout.bin_of(11.0), DEFAULT_BINS - 1);
    }

    #[test]
    fn test_zero_span_is_guarded() {
        let layout = BinLayout::freedman_diaconis(&[5.0, 5.0, 5.0], BinBounds::default());
        assert!(layout.num_bins >= 1);
        assert!(layout.width > 0.0);
        assert_eq!(layout.bin_of(5.0), 0);

        let fixed = BinLayout::freedman_diaconis(&[5.0; 8], BinBounds::exact(4));
        assert_eq!(fixed.num_bins, 4);
        assert!(fixed.width > 0.0);
    }

    #[test]
    fn test_single_value() {
        let layout = BinLayout::freedman_diaconis(&[42.0], BinBounds::default());
        assert_eq!(layout.bin_of(42.0), 0);
        assert!(layout.num_bins >= 1);
        assert!(layout.width > 0.0);
    }
}
