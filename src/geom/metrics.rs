//! Opt-in timing hooks for the occlusion pipeline.
//!
//! Timing is only collected when the `metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call is a plain pass-through and [`GeomMetrics::end`] returns `None`.
//!
//! ```ignore
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let points = metrics.time(TimingBucket::Grid, || spec.points());
//! if let Some(report) = metrics.end() {
//!     println!("grid: {} ns", report.grid_ns);
//! }
//! ```

use serde::Serialize;

/// Pipeline phases that accumulate time separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Sample grid generation.
    Grid,
    /// Boundary polyline filling.
    BoundaryFill,
    /// Mesh validation and BVH construction.
    Prepare,
    /// Per-point boundary ray tests.
    Occlusion,
    /// Wall ray tests.
    Projection,
    /// Cube mesh generation.
    Cubes,
}

/// Nanoseconds per bucket; repeated calls to one bucket add up.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GeomTimingReport {
    pub grid_ns: u64,
    pub boundary_fill_ns: u64,
    pub prepare_ns: u64,
    pub occlusion_ns: u64,
    pub projection_ns: u64,
    pub cubes_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.grid_ns
            .saturating_add(self.boundary_fill_ns)
            .saturating_add(self.prepare_ns)
            .saturating_add(self.occlusion_ns)
            .saturating_add(self.projection_ns)
            .saturating_add(self.cubes_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[cfg_attr(not(all(feature = "metrics", not(target_arch = "wasm32"))), allow(dead_code))]
    fn add(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Grid => &mut self.grid_ns,
            TimingBucket::BoundaryFill => &mut self.boundary_fill_ns,
            TimingBucket::Prepare => &mut self.prepare_ns,
            TimingBucket::Occlusion => &mut self.occlusion_ns,
            TimingBucket::Projection => &mut self.projection_ns,
            TimingBucket::Cubes => &mut self.cubes_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

/// Accumulator for timing pipeline phases.
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

    /// Returns the accumulated timing report, or `None` if metrics are disabled.
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

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.report.add(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}
