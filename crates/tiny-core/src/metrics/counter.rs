//! Labelled monotonic counters.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Result, TinyError};

use super::text;

/// Handle to a counter family. Cloning is cheap; all clones share series.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<CounterFamily>,
}

struct CounterFamily {
    name: String,
    label_names: Vec<String>,
    series: DashMap<Vec<String>, AtomicU64>,
}

impl Counter {
    pub(crate) fn new(name: &str, label_names: &[&str]) -> Self {
        let series = DashMap::new();
        // An unlabelled counter has exactly one series; expose it from the start.
        if label_names.is_empty() {
            series.insert(Vec::new(), AtomicU64::new(0));
        }
        Self {
            inner: Arc::new(CounterFamily {
                name: name.to_string(),
                label_names: label_names.iter().map(|s| s.to_string()).collect(),
                series,
            }),
        }
    }

    pub fn label_names(&self) -> &[String] {
        &self.inner.label_names
    }

    /// Increment the series for `label_values` by 1.
    pub fn increment(&self, label_values: &[&str]) -> Result<()> {
        self.add(label_values, 1)
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, label_values: &[&str], v: u64) -> Result<()> {
        let key = self.key(label_values)?;
        let counter = self.inner.series.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
        Ok(())
    }

    /// Current value of one series; unseen tuples read as 0.
    pub fn get(&self, label_values: &[&str]) -> Result<u64> {
        let key = self.key(label_values)?;
        Ok(self
            .inner
            .series
            .get(&key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0))
    }

    /// Number of distinct label tuples seen so far.
    pub fn cardinality(&self) -> usize {
        self.inner.series.len()
    }

    fn key(&self, label_values: &[&str]) -> Result<Vec<String>> {
        let expected = self.inner.label_names.len();
        if label_values.len() != expected {
            return Err(TinyError::LabelMismatch {
                metric: self.inner.name.clone(),
                expected,
                got: label_values.len(),
            });
        }
        Ok(label_values.iter().map(|v| v.to_string()).collect())
    }

    pub(crate) fn render(&self, name: &str, help: &str, out: &mut String) {
        text::write_header(out, name, help, "counter");
        for r in self.inner.series.iter() {
            let labels = text::label_set(&self.inner.label_names, r.key());
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{} {}", name, labels, text::fmt_float(val as f64));
        }
    }
}
