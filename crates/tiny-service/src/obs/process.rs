//! Standard `process_*` metrics.
//!
//! `process_start_time_seconds` is exposed on every platform. On Linux the
//! CPU, memory and file descriptor families are read from `/proc/self` at
//! each scrape.

use tiny_core::error::Result;
use tiny_core::metrics::Registry;

use crate::ops::unix_timestamp;

pub const START_TIME: &str = "process_start_time_seconds";

/// Declare the process families on `registry` and install their collector.
pub fn register(registry: &Registry) -> Result<()> {
    let start = registry.register_gauge(START_TIME, "Start time of the process since unix epoch in seconds.")?;
    start.set(start_time());
    register_sampler(registry)
}

#[cfg(target_os = "linux")]
fn start_time() -> f64 {
    linux::start_time().unwrap_or_else(unix_timestamp)
}

#[cfg(not(target_os = "linux"))]
fn start_time() -> f64 {
    unix_timestamp()
}

#[cfg(target_os = "linux")]
fn register_sampler(registry: &Registry) -> Result<()> {
    linux::register(registry)
}

#[cfg(not(target_os = "linux"))]
fn register_sampler(_registry: &Registry) -> Result<()> {
    Ok(())
}

#[cfg(target_os = "linux")]
mod linux {
    use std::fs;

    use tiny_core::error::{Result, TinyError};
    use tiny_core::metrics::{Gauge, Registry};

    pub(super) struct StatFields {
        pub utime_ticks: u64,
        pub stime_ticks: u64,
        pub start_ticks: u64,
        pub vsize_bytes: u64,
        pub rss_pages: u64,
    }

    /// Parse `/proc/<pid>/stat`. Field numbers follow proc(5).
    pub(super) fn parse_stat(stat: &str) -> Option<StatFields> {
        // comm may itself contain spaces and parens; fields resume after the last ')'.
        let rest = stat.get(stat.rfind(')')? + 1..)?;
        let fields: Vec<&str> = rest.split_whitespace().collect();
        let field = |n: usize| -> Option<u64> { fields.get(n - 3)?.parse().ok() };
        Some(StatFields {
            utime_ticks: field(14)?,
            stime_ticks: field(15)?,
            start_ticks: field(22)?,
            vsize_bytes: field(23)?,
            rss_pages: field(24)?,
        })
    }

    /// Boot time from `/proc/stat`, in seconds since the epoch.
    pub(super) fn parse_btime(proc_stat: &str) -> Option<u64> {
        proc_stat
            .lines()
            .find_map(|l| l.strip_prefix("btime "))?
            .trim()
            .parse()
            .ok()
    }

    /// Soft "Max open files" limit from `/proc/<pid>/limits`.
    pub(super) fn parse_max_open_files(limits: &str) -> Option<f64> {
        let line = limits.lines().find_map(|l| l.strip_prefix("Max open files"))?;
        match line.split_whitespace().next()? {
            "unlimited" => Some(f64::INFINITY),
            soft => soft.parse().ok(),
        }
    }

    fn sysconf(name: libc::c_int) -> Option<u64> {
        // SAFETY: sysconf has no preconditions; it returns -1 for unknown names.
        let v = unsafe { libc::sysconf(name) };
        u64::try_from(v).ok().filter(|v| *v > 0)
    }

    fn read(path: &str) -> Result<String> {
        fs::read_to_string(path).map_err(|e| TinyError::Internal(format!("read {path} failed: {e}")))
    }

    pub(super) fn start_time() -> Option<f64> {
        let ticks = sysconf(libc::_SC_CLK_TCK)? as f64;
        let stat = parse_stat(&fs::read_to_string("/proc/self/stat").ok()?)?;
        let btime = parse_btime(&fs::read_to_string("/proc/stat").ok()?)?;
        Some(btime as f64 + stat.start_ticks as f64 / ticks)
    }

    struct Sampler {
        ticks: f64,
        page_size: f64,
        cpu: Gauge,
        rss: Gauge,
        vms: Gauge,
        open_fds: Gauge,
        max_fds: Gauge,
    }

    impl Sampler {
        fn sample(&self) -> Result<()> {
            let stat = read("/proc/self/stat")?;
            let f = parse_stat(&stat)
                .ok_or_else(|| TinyError::Internal("unparsable /proc/self/stat".into()))?;
            self.cpu.set((f.utime_ticks + f.stime_ticks) as f64 / self.ticks);
            self.vms.set(f.vsize_bytes as f64);
            self.rss.set(f.rss_pages as f64 * self.page_size);

            let fds = fs::read_dir("/proc/self/fd")
                .map_err(|e| TinyError::Internal(format!("read /proc/self/fd failed: {e}")))?
                .count();
            self.open_fds.set(fds as f64);

            if let Some(max) = parse_max_open_files(&read("/proc/self/limits")?) {
                self.max_fds.set(max);
            }
            Ok(())
        }
    }

    pub(super) fn register(registry: &Registry) -> Result<()> {
        let Some(ticks) = sysconf(libc::_SC_CLK_TCK) else {
            tracing::warn!("clock tick rate unavailable; process metrics disabled");
            return Ok(());
        };
        let page_size = sysconf(libc::_SC_PAGESIZE).unwrap_or(4096);

        let sampler = Sampler {
            ticks: ticks as f64,
            page_size: page_size as f64,
            cpu: registry.register_sampled_counter("process_cpu_seconds_total", "Total user and system CPU time spent in seconds.")?,
            vms: registry.register_gauge("process_virtual_memory_bytes", "Virtual memory size in bytes.")?,
            rss: registry.register_gauge("process_resident_memory_bytes", "Resident memory size in bytes.")?,
            open_fds: registry.register_gauge("process_open_fds", "Number of open file descriptors.")?,
            max_fds: registry.register_gauge("process_max_fds", "Maximum number of open file descriptors.")?,
        };

        registry.register_collector(move || {
            if let Err(e) = sampler.sample() {
                tracing::debug!(error = %e, "process metrics sample failed");
            }
        });
        Ok(())
    }

}
