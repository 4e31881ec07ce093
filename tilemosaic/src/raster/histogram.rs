//! Per-band value histograms.
//!
//! Samples are binned to the nearest integer value. Merging two histograms
//! sums their bin counts, which is commutative and associative, so the
//! combined distribution of several scenes does not depend on the order
//! in which they are folded together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Distribution of sample values for one band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    counts: BTreeMap<i64, u64>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from raw samples, skipping NoData.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a f32>) -> Self {
        let mut hist = Self::new();
        for &v in samples {
            hist.count_value(v as f64);
        }
        hist
    }

    /// Record one sample. Non-finite values are ignored.
    pub fn count_value(&mut self, value: f64) {
        self.count_value_n(value, 1);
    }

    /// Record `n` occurrences of a sample.
    pub fn count_value_n(&mut self, value: f64, n: u64) {
        if value.is_finite() && n > 0 {
            *self.counts.entry(value.round() as i64).or_insert(0) += n;
        }
    }

    /// Sum of two histograms.
    pub fn merge(&self, other: &Histogram) -> Histogram {
        let mut merged = self.clone();
        for (&bin, &count) in &other.counts {
            *merged.counts.entry(bin).or_insert(0) += count;
        }
        merged
    }

    /// Fold any number of histograms into one.
    pub fn merge_all<'a>(histograms: impl IntoIterator<Item = &'a Histogram>) -> Histogram {
        histograms
            .into_iter()
            .fold(Histogram::new(), |acc, h| acc.merge(h))
    }

    /// Move every count into the range `lo..=hi`, as if each sample had
    /// been clamped before binning.
    pub fn clamped(&self, lo: f64, hi: f64) -> Histogram {
        let mut out = Histogram::new();
        for (&bin, &count) in &self.counts {
            out.count_value_n((bin as f64).max(lo).min(hi), count);
        }
        out
    }

    pub fn total_count(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.counts.keys().next().map(|&v| v as f64)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.counts.keys().next_back().map(|&v| v as f64)
    }

    /// Distinct binned values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.counts.keys().map(|&v| v as f64)
    }

    /// Count recorded for a value's bin.
    pub fn item_count(&self, value: f64) -> u64 {
        self.counts.get(&(value.round() as i64)).copied().unwrap_or(0)
    }

    /// `n` break points splitting the distribution into equal-count classes.
    ///
    /// Break `i` is the smallest value whose cumulative count reaches
    /// `i / n` of the total. The last break is always the maximum value.
    /// Returns an empty vector for an empty histogram or `n == 0`.
    pub fn quantile_breaks(&self, n: usize) -> Vec<f64> {
        let total = self.total_count();
        if total == 0 || n == 0 {
            return Vec::new();
        }

        let mut breaks = Vec::with_capacity(n);
        let mut bins = self.counts.iter();
        let mut cumulative = 0u64;
        let mut current = None;

        for i in 1..=n {
            let target = (total as u128 * i as u128).div_ceil(n as u128) as u64;
            while cumulative < target {
                match bins.next() {
                    Some((&bin, &count)) => {
                        cumulative += count;
                        current = Some(bin);
                    }
                    None => break,
                }
            }
            if let Some(bin) = current {
                breaks.push(bin as f64);
            }
        }
        breaks
    }

    /// `n` equally spaced break points between the minimum and maximum.
    pub fn equal_interval_breaks(&self, n: usize) -> Vec<f64> {
        let (Some(min), Some(max)) = (self.min_value(), self.max_value()) else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }
        let step = (max - min) / n as f64;
        (1..=n).map(|i| if i == n { max } else { min + step * i as f64 }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_moves_counts_to_edges() {
        let hist = Histogram::from_samples(&[-5.0, 2.0, 3.0, 50.0, 60.0]);
        let clamped = hist.clamped(0.0, 10.0);

        assert_eq!(clamped.total_count(), 5);
        assert_eq!(clamped.item_count(0.0), 1);
        assert_eq!(clamped.item_count(2.0), 1);
        assert_eq!(clamped.item_count(10.0), 2);
        assert_eq!(clamped.max_value(), Some(10.0));
    }

    #[test]
    fn test_from_samples_skips_nodata() {
        let hist = Histogram::from_samples(&[1.0, 2.0, f32::NAN, 2.0]);
        assert_eq!(hist.total_count(), 3);
        assert_eq!(hist.item_count(2.0), 2);
        assert_eq!(hist.min_value(), Some(1.0));
        assert_eq!(hist.max_value(), Some(2.0));
    }

    #[test]
    fn test_merge_sums_counts() {
        let a = Histogram::from_samples(&[1.0, 1.0, 5.0]);
        let b = Histogram::from_samples(&[1.0, 9.0]);

        let merged = a.merge(&b);
        assert_eq!(merged.item_count(1.0), 3);
        assert_eq!(merged.item_count(9.0), 1);
        assert_eq!(merged.total_count(), 5);
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = Histogram::from_samples(&[1.0, 3.0, 3.0]);
        let b = Histogram::from_samples(&[2.0, 7.0]);
        let c = Histogram::from_samples(&[3.0]);

        assert_eq!(a.merge(&b), b.merge(&a));
        assert_eq!(
            Histogram::merge_all([&a, &b, &c]),
            Histogram::merge_all([&c, &a, &b])
        );
    }

    #[test]
    fn test_quantile_breaks_uniform() {
        let samples: Vec<f32> = (1..=100).map(|v| v as f32).collect();
        let hist = Histogram::from_samples(&samples);

        assert_eq!(hist.quantile_breaks(4), vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_quantile_breaks_skewed() {
        let mut hist = Histogram::new();
        hist.count_value_n(0.0, 90);
        hist.count_value_n(10.0, 10);

        let breaks = hist.quantile_breaks(4);
        assert_eq!(breaks, vec![0.0, 0.0, 0.0, 10.0]);
    }

    #[test]
    fn test_quantile_breaks_empty() {
        assert!(Histogram::new().quantile_breaks(5).is_empty());
        assert!(Histogram::from_samples(&[1.0]).quantile_breaks(0).is_empty());
    }

    #[test]
    fn test_equal_interval_breaks() {
        let hist = Histogram::from_samples(&[0.0, 100.0]);
        assert_eq!(hist.equal_interval_breaks(4), vec![25.0, 50.0, 75.0, 100.0]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_quantile_breaks_are_monotone(
                samples in proptest::collection::vec(-1000.0f32..1000.0, 1..200),
                n in 1usize..16,
            ) {
                let hist = Histogram::from_samples(&samples);
                let breaks = hist.quantile_breaks(n);

                prop_assert_eq!(breaks.len(), n);
                prop_assert!(breaks.windows(2).all(|w| w[0] <= w[1]));
                prop_assert_eq!(breaks.last().copied(), hist.max_value());
            }
        }
    }
}
