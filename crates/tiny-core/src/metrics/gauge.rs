//! Unlabelled float samples that are set rather than accumulated.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::text;

/// Handle to a single float sample. Cloning is cheap; all clones share it.
///
/// Also backs counters whose value is read from an external monotonic source
/// (see [`super::Registry::register_sampled_counter`]).
#[derive(Clone)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Gauge {
    pub(crate) fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(0f64.to_bits())),
        }
    }

    pub fn set(&self, v: f64) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub(crate) fn render(&self, name: &str, help: &str, kind: &str, out: &mut String) {
        text::write_header(out, name, help, kind);
        let _ = writeln!(out, "{} {}", name, text::fmt_float(self.get()));
    }
}
