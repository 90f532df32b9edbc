//! Opt-in timing hooks for the geometry pipeline.
//!
//! Timing is only collected when the `metrics` feature is enabled and the target is
//! not WASM (`std::time::Instant` is unavailable there). Otherwise every call
//! compiles down to running the closure.
//!
//! ```ignore
//! use hopf_engine::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let points = metrics.time(TimingBucket::Sampling, || sample_base_points(&mode, 80, transform));
//! if let Some(report) = metrics.end() {
//!     println!("sampling: {} ns", report.sampling_ns);
//! }
//! ```

/// Pipeline stages that can be timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Base point sampling on S2.
    Sampling,
    /// Fiber generation and projection.
    Fibration,
    /// Tube framing and triangulation.
    Tube,
    /// Polyline serialization.
    Export,
}

/// Cumulative nanoseconds per stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub sampling_ns: u64,
    pub fibration_ns: u64,
    pub tube_ns: u64,
    pub export_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.sampling_ns
            .saturating_add(self.fibration_ns)
            .saturating_add(self.tube_ns)
            .saturating_add(self.export_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing pipeline stages.
///
/// When the `metrics` feature is disabled (or on WASM), all methods are no-ops and
/// [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    /// Returns the accumulated report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Sampling => &mut self.report.sampling_ns,
            TimingBucket::Fibration => &mut self.report.fibration_ns,
            TimingBucket::Tube => &mut self.report.tube_ns,
            TimingBucket::Export => &mut self.report.export_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = GeomTimingReport {
            sampling_ns: 1000,
            fibration_ns: 2000,
            tube_ns: 3000,
            export_ns: 0,
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = GeomMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::Fibration, || 42);
        assert_eq!(result, 42);
    }

    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    #[test]
    fn test_export_bucket_accumulates() {
        let mut metrics = GeomMetrics::default();
        metrics.begin();
        metrics.time(TimingBucket::Export, || std::thread::sleep(std::time::Duration::from_millis(1)));
        let report = metrics.end().expect("metrics enabled");
        assert!(report.export_ns >= 1_000_000);
        assert_eq!(report.sampling_ns, 0);
        assert_eq!(report.total_ns(), report.export_ns);
    }

    #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
    #[test]
    fn test_disabled_metrics_report_nothing() {
        let mut metrics = GeomMetrics::default();
        metrics.begin();
        metrics.time(TimingBucket::Tube, || ());
        assert!(metrics.end().is_none());
    }
}
