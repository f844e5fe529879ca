//! Opt-in timing hooks for mesh builds.
//!
//! Timing is only collected when the `mesh_engine_metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise every
//! call compiles down to running the wrapped closure.
//!
//! # Usage
//!
//! ```ignore
//! use ghx_surface_mesh::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let points = metrics.time(TimingBucket::Evaluation, || evaluate_everything());
//! if let Some(report) = metrics.end() {
//!     println!("evaluation: {} ns", report.evaluation_ns);
//! }
//! ```

/// Pipeline stages of a mesh build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Sampling the surface over the parameter grid.
    Evaluation,
    /// Quad wiring and edge collapsing.
    Assembly,
    /// Seam detection and the face post-pass.
    Closure,
    /// Removing unreferenced vertices.
    Compaction,
}

/// Cumulative nanoseconds per stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub evaluation_ns: u64,
    pub assembly_ns: u64,
    pub closure_ns: u64,
    pub compaction_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.evaluation_ns
            .saturating_add(self.assembly_ns)
            .saturating_add(self.closure_ns)
            .saturating_add(self.compaction_ns)
    }

    /// Total in milliseconds, for display.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for stage timings.
///
/// Call [`begin`](Self::begin) to reset, wrap stages with [`time`](Self::time), and
/// read the report with [`end`](Self::end), which is `None` when metrics are off.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f` and adds its elapsed time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            #[allow(clippy::cast_possible_truncation)]
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Evaluation => &mut self.report.evaluation_ns,
            TimingBucket::Assembly => &mut self.report.assembly_ns,
            TimingBucket::Closure => &mut self.report.closure_ns,
            TimingBucket::Compaction => &mut self.report.compaction_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}
