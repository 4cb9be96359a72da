//! Fixed-bucket histograms.
//!
//! Each observation lands in exactly one slot (the lowest bound that is
//! `>= value`, or the trailing `+Inf` slot). Cumulative bucket counts are
//! summed from the slots at read time, so any snapshot is non-decreasing in
//! the bound and its `+Inf` bucket always equals its count, even while other
//! tasks are observing.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::text;

/// Default latency buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Handle to a histogram. Cloning is cheap; all clones share state.
#[derive(Clone)]
pub struct Histogram {
    inner: Arc<HistogramCore>,
}

struct HistogramCore {
    bounds: Vec<f64>,
    // bounds.len() + 1 slots; the last one is +Inf.
    slots: Vec<AtomicU64>,
    sum_bits: AtomicU64,
}

/// Point-in-time view of a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper_bound, cumulative_count)`, ending with `(+Inf, count)`.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

impl Histogram {
    /// `bounds` must already be validated as finite and strictly increasing.
    pub(crate) fn new(bounds: &[f64]) -> Self {
        Self {
            inner: Arc::new(HistogramCore {
                bounds: bounds.to_vec(),
                slots: (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect(),
                sum_bits: AtomicU64::new(0f64.to_bits()),
            }),
        }
    }

    pub fn bounds(&self) -> &[f64] {
        &self.inner.bounds
    }

    /// Record one observation.
    ///
    /// NaN and infinite values are dropped: they would pin `_sum` to a
    /// non-finite value for the rest of the process.
    pub fn observe(&self, value: f64) {
        if !value.is_finite() {
            tracing::debug!(value, "dropping non-finite histogram observation");
            return;
        }
        let idx = self.inner.bounds.partition_point(|b| *b < value);
        if let Some(slot) = self.inner.slots.get(idx) {
            slot.fetch_add(1, Ordering::Relaxed);
        }

        let mut cur = self.inner.sum_bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(cur) + value).to_bits();
            match self.inner.sum_bits.compare_exchange_weak(
                cur,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let mut running = 0u64;
        let buckets: Vec<(f64, u64)> = self
            .inner
            .bounds
            .iter()
            .copied()
            .chain(std::iter::once(f64::INFINITY))
            .zip(&self.inner.slots)
            .map(|(le, slot)| {
                running += slot.load(Ordering::Relaxed);
                (le, running)
            })
            .collect();

        HistogramSnapshot {
            buckets,
            sum: f64::from_bits(self.inner.sum_bits.load(Ordering::Relaxed)),
            count: running,
        }
    }

    pub(crate) fn render(&self, name: &str, help: &str, out: &mut String) {
        text::write_header(out, name, help, "histogram");
        let snap = self.snapshot();
        for (le, count) in &snap.buckets {
            let _ = writeln!(out, "{}_bucket{{le=\"{}\"}} {}", name, text::fmt_float(*le), text::fmt_float(*count as f64));
        }
        let _ = writeln!(out, "{}_sum {}", name, text::fmt_float(snap.sum));
        let _ = writeln!(out, "{}_count {}", name, text::fmt_float(snap.count as f64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(h: &Histogram) -> Vec<u64> {
        h.snapshot().buckets.iter().map(|(_, c)| *c).collect()
    }

    #[test]
    fn observations_are_cumulative() {
        let h = Histogram::new(&[0.1, 0.5, 1.0]);
        h.observe(0.05);
        h.observe(0.1); // bound is inclusive
        h.observe(0.7);
        h.observe(3.0);
        assert_eq!(counts(&h), vec![2, 2, 3, 4]);

        let snap = h.snapshot();
        assert_eq!(snap.count, 4);
        assert!((snap.sum - 3.85).abs() < 1e-9);
    }

    #[test]
    fn inf_bucket_equals_count_for_any_sequence() {
        let h = Histogram::new(&DEFAULT_BUCKETS);
        let mut x = 0.0003f64;
        for _ in 0..200 {
            h.observe(x);
            x *= 1.07;
        }
        let snap = h.snapshot();
        let last = snap.buckets.last().copied();
        assert_eq!(last, Some((f64::INFINITY, snap.count)));
        assert!(snap.buckets.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(snap.count, 200);
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let h = Histogram::new(&[1.0]);
        h.observe(0.5);
        h.observe(f64::NAN);
        h.observe(f64::INFINITY);
        h.observe(f64::NEG_INFINITY);
        h.observe(2.0);

        let snap = h.snapshot();
        assert_eq!(counts(&h), vec![1, 2]);
        assert_eq!(snap.count, 2);
        assert_eq!(snap.sum, 2.5);
    }

    #[test]
    fn render_has_bucket_sum_count() {
        let h = Histogram::new(&[0.5, 1.0]);
        h.observe(0.25);
        let mut out = String::new();
        h.render("lat", "Latency", &mut out);
        let expected = "\
# HELP lat Latency
# TYPE lat histogram
lat_bucket{le=\"0.5\"} 1.0
lat_bucket{le=\"1.0\"} 1.0
lat_bucket{le=\"+Inf\"} 1.0
lat_sum 0.25
lat_count 1.0
";
        assert_eq!(out, expected);
    }
}
