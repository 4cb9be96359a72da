use parking_lot::RwLock;

use crate::error::{Result, TinyError};

use super::{Counter, Gauge, Histogram};

type Collector = Box<dyn Fn() + Send + Sync>;

enum Family {
    Counter(Counter),
    Histogram(Histogram),
    Gauge(Gauge),
    SampledCounter(Gauge),
}

impl Family {
    fn kind(&self) -> &'static str {
        match self {
            Family::Counter(_) | Family::SampledCounter(_) => "counter",
            Family::Histogram(_) => "histogram",
            Family::Gauge(_) => "gauge",
        }
    }
}

struct Entry {
    name: String,
    help: String,
    family: Family,
}

impl Entry {
    /// Every sample name this family writes to the exposition.
    fn sample_names(&self) -> Vec<String> {
        sample_names(&self.name, &self.family)
    }
}

fn sample_names(name: &str, family: &Family) -> Vec<String> {
    match family {
        Family::Counter(_) | Family::Gauge(_) | Family::SampledCounter(_) => vec![name.to_string()],
        Family::Histogram(_) => vec![
            name.to_string(),
            format!("{name}_bucket"),
            format!("{name}_sum"),
            format!("{name}_count"),
        ],
    }
}

/// Holds every declared metric family in registration order.
///
/// Registration takes a write lock; recording never touches the registry at
/// all, only the returned handles. Collectors run at the start of every
/// export to refresh sampled values.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<Vec<Entry>>,
    collectors: RwLock<Vec<Collector>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a counter family.
    ///
    /// Re-declaring an identical counter returns a handle to the existing
    /// family; any other clash on the name is `DuplicateMetricName`.
    pub fn register_counter(&self, name: &str, help: &str, label_names: &[&str]) -> Result<Counter> {
        validate_metric_name(name)?;
        for label in label_names {
            validate_label_name(label)?;
        }

        let mut entries = self.entries.write();
        if let Some(existing) = entries.iter().find(|e| e.name == name) {
            if let Family::Counter(c) = &existing.family {
                if c.label_names().iter().map(String::as_str).eq(label_names.iter().copied()) {
                    return Ok(c.clone());
                }
            }
            tracing::warn!(metric = %name, kind = existing.family.kind(), "counter conflicts with registered metric");
            return Err(TinyError::DuplicateMetricName(name.to_string()));
        }

        let counter = Counter::new(name, label_names);
        let family = Family::Counter(counter.clone());
        check_collisions(&entries, name, &family)?;
        entries.push(Entry { name: name.to_string(), help: help.to_string(), family });
        Ok(counter)
    }

    /// Declare a histogram. An implicit `+Inf` bucket follows `buckets`.
    pub fn register_histogram(&self, name: &str, help: &str, buckets: &[f64]) -> Result<Histogram> {
        validate_metric_name(name)?;
        let increasing = buckets.windows(2).all(|w| w[0] < w[1]);
        if buckets.is_empty() || !increasing || buckets.iter().any(|b| !b.is_finite()) {
            return Err(TinyError::InvalidBuckets(name.to_string()));
        }

        let mut entries = self.entries.write();
        if let Some(existing) = entries.iter().find(|e| e.name == name) {
            if let Family::Histogram(h) = &existing.family {
                if h.bounds() == buckets {
                    return Ok(h.clone());
                }
            }
            tracing::warn!(metric = %name, kind = existing.family.kind(), "histogram conflicts with registered metric");
            return Err(TinyError::DuplicateMetricName(name.to_string()));
        }

        let histogram = Histogram::new(buckets);
        let family = Family::Histogram(histogram.clone());
        check_collisions(&entries, name, &family)?;
        entries.push(Entry { name: name.to_string(), help: help.to_string(), family });
        Ok(histogram)
    }

    /// Declare an unlabelled gauge.
    pub fn register_gauge(&self, name: &str, help: &str) -> Result<Gauge> {
        self.register_sampled(name, help, false)
    }

    /// Declare an unlabelled counter whose value is copied in from an
    /// external monotonic source (e.g. CPU time) rather than incremented.
    pub fn register_sampled_counter(&self, name: &str, help: &str) -> Result<Gauge> {
        self.register_sampled(name, help, true)
    }

    fn register_sampled(&self, name: &str, help: &str, counter: bool) -> Result<Gauge> {
        validate_metric_name(name)?;

        let mut entries = self.entries.write();
        if let Some(existing) = entries.iter().find(|e| e.name == name) {
            match (&existing.family, counter) {
                (Family::Gauge(g), false) | (Family::SampledCounter(g), true) => return Ok(g.clone()),
                _ => {}
            }
            tracing::warn!(metric = %name, kind = existing.family.kind(), "sample conflicts with registered metric");
            return Err(TinyError::DuplicateMetricName(name.to_string()));
        }

        let gauge = Gauge::new();
        let family = if counter {
            Family::SampledCounter(gauge.clone())
        } else {
            Family::Gauge(gauge.clone())
        };
        check_collisions(&entries, name, &family)?;
        entries.push(Entry { name: name.to_string(), help: help.to_string(), family });
        Ok(gauge)
    }

    /// Run `collect` before every export. Collectors only set values on
    /// handles they already own; they must not register metrics.
    pub fn register_collector<F>(&self, collect: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.collectors.write().push(Box::new(collect));
    }

    /// Render every family in Prometheus text format, in registration order.
    pub fn export_text(&self) -> String {
        for collect in self.collectors.read().iter() {
            collect();
        }

        let mut out = String::new();
        for e in self.entries.read().iter() {
            match &e.family {
                Family::Counter(c) => c.render(&e.name, &e.help, &mut out),
                Family::Histogram(h) => h.render(&e.name, &e.help, &mut out),
                Family::Gauge(g) | Family::SampledCounter(g) => {
                    g.render(&e.name, &e.help, e.family.kind(), &mut out)
                }
            }
        }
        out
    }

    /// Names of registered families, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.name.clone()).collect()
    }
}

/// A histogram `foo` owns `foo_count`; a counter of that name would corrupt the
/// exposition even though the family names differ.
fn check_collisions(entries: &[Entry], name: &str, family: &Family) -> Result<()> {
    let wanted = sample_names(name, family);
    for e in entries {
        if e.sample_names().iter().any(|s| wanted.contains(s)) {
            tracing::warn!(metric = %name, clashes_with = %e.name, "metric sample names collide");
            return Err(TinyError::DuplicateMetricName(name.to_string()));
        }
    }
    Ok(())
}

fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':') {
        Ok(())
    } else {
        Err(TinyError::InvalidMetricName(name.to_string()))
    }
}

fn validate_label_name(label: &str) -> Result<()> {
    let mut chars = label.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    // `le` belongs to histogram buckets; `__` prefixes are reserved.
    if head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && label != "le"
        && !label.starts_with("__")
    {
        Ok(())
    } else {
        Err(TinyError::InvalidMetricName(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::metrics::DEFAULT_BUCKETS;

    #[test]
    fn identical_counter_is_shared() {
        let r = Registry::new();
        let a = r.register_counter("reqs_total", "Requests", &["method"]).unwrap();
        let b = r.register_counter("reqs_total", "Requests", &["method"]).unwrap();
        a.increment(&["GET"]).unwrap();
        assert_eq!(b.get(&["GET"]).unwrap(), 1);
        assert_eq!(r.names(), vec!["reqs_total"]);
    }

    #[test]
    fn schema_or_type_clash_is_duplicate() {
        let r = Registry::new();
        r.register_counter("reqs_total", "Requests", &["method"]).unwrap();

        let err = r.register_counter("reqs_total", "Requests", &["method", "endpoint"]).err();
        assert!(matches!(err, Some(TinyError::DuplicateMetricName(_))));

        let err = r.register_histogram("reqs_total", "Requests", &DEFAULT_BUCKETS).err();
        assert!(matches!(err, Some(TinyError::DuplicateMetricName(_))));
    }

    #[test]
    fn histogram_suffixes_are_reserved() {
        let r = Registry::new();
        r.register_histogram("lat", "Latency", &[1.0]).unwrap();
        let err = r.register_counter("lat_count", "Oops", &[]).err();
        assert!(matches!(err, Some(TinyError::DuplicateMetricName(_))));
    }

    #[test]
    fn bad_buckets_are_rejected() {
        let r = Registry::new();
        for bad in [&[][..], &[1.0, 1.0][..], &[2.0, 1.0][..], &[1.0, f64::INFINITY][..]] {
            let err = r.register_histogram("lat", "Latency", bad).err();
            assert!(matches!(err, Some(TinyError::InvalidBuckets(_))), "{bad:?}");
        }
        assert!(r.names().is_empty());
    }

    #[test]
    fn bad_names_are_rejected() {
        let r = Registry::new();
        assert!(r.register_counter("9lives", "x", &[]).is_err());
        assert!(r.register_counter("has-dash", "x", &[]).is_err());
        assert!(r.register_counter("ok_name", "x", &["le"]).is_err());
        assert!(r.register_counter("ok_name", "x", &["__meta"]).is_err());
        assert!(r.register_counter("ns:ok_name", "x", &["method"]).is_ok());
    }

    #[test]
    fn export_follows_registration_order() {
        let r = Registry::new();
        let lat = r.register_histogram("b_seconds", "B", &[1.0]).unwrap();
        let reqs = r.register_counter("a_total", "A", &["method"]).unwrap();
        reqs.increment(&["GET"]).unwrap();
        lat.observe(0.5);

        let text = r.export_text();
        let b = text.find("# HELP b_seconds B").unwrap();
        let a = text.find("# HELP a_total A").unwrap();
        assert!(b < a);
        assert!(text.contains("# TYPE a_total counter\na_total{method=\"GET\"} 1.0\n"));
    }

    #[test]
    fn collectors_refresh_samples_on_export() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let r = Registry::new();
        let fds = r.register_gauge("open_fds", "Open fds").unwrap();
        let cpu = r.register_sampled_counter("cpu_seconds_total", "CPU").unwrap();
        let calls = Arc::new(AtomicU64::new(0));

        let seen = Arc::clone(&calls);
        r.register_collector(move || {
            let n = seen.fetch_add(1, Ordering::Relaxed) + 1;
            fds.set(n as f64 * 10.0);
            cpu.set(n as f64 * 0.5);
        });

        r.export_text();
        let text = r.export_text();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert!(text.contains("# TYPE open_fds gauge\nopen_fds 20.0\n"));
        assert!(text.contains("# TYPE cpu_seconds_total counter\ncpu_seconds_total 1.0\n"));
    }

    #[test]
    fn gauge_and_sampled_counter_share_the_duplicate_rule() {
        let r = Registry::new();
        let a = r.register_gauge("temp", "T").unwrap();
        let b = r.register_gauge("temp", "T").unwrap();
        a.set(4.0);
        assert_eq!(b.get(), 4.0);

        let err = r.register_sampled_counter("temp", "T").err();
        assert!(matches!(err, Some(TinyError::DuplicateMetricName(_))));
        let err = r.register_counter("temp", "T", &[]).err();
        assert!(matches!(err, Some(TinyError::DuplicateMetricName(_))));
    }
}
