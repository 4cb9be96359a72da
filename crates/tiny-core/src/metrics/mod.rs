//! In-process metrics registry with Prometheus text exposition.
//!
//! Families are declared once on a [`Registry`] and recorded through cheap,
//! cloneable handles ([`Counter`], [`Histogram`], [`Gauge`]). Counter series
//! live in a `DashMap` keyed by label values in declared order; histograms are
//! a fixed array of atomic slots. Sampled values such as process statistics
//! are refreshed by collectors at export time. Nothing here is global: callers
//! own the registry and share it by `Arc`.

mod counter;
mod gauge;
mod histogram;
mod registry;
mod text;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::{Histogram, HistogramSnapshot, DEFAULT_BUCKETS};
pub use registry::Registry;
pub use text::CONTENT_TYPE;
