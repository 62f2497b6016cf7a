/// Performance profiling helpers for tracking simulation timing.
///
/// Provides RAII-style profiling scopes, per-pass accumulators and a frame timer.
use rustc_hash::FxHashMap;
use std::time::Instant;
use tracing::trace;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is emitted as a `trace!` event when dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Creates a new profiling scope.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Gets elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        trace!(pass = self.name, elapsed_ms = self.elapsed_ms(), "pass complete");
    }
}

/// Accumulated timing for one pass label.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassStat {
    /// Number of recorded dispatches.
    pub calls: u32,
    /// Total time across all dispatches in milliseconds.
    pub total_ms: f64,
}

/// Per-pass timings for one frame, keyed by kernel label.
#[derive(Debug, Clone, Default)]
pub struct PassTimings {
    passes: FxHashMap<&'static str, PassStat>,
}

impl PassTimings {
    /// Creates an empty set of timings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one dispatch of `label` that took `elapsed_ms`.
    pub fn record(&mut self, label: &'static str, elapsed_ms: f64) {
        let stat = self.passes.entry(label).or_default();
        stat.calls += 1;
        stat.total_ms += elapsed_ms;
    }

    /// Gets the accumulated stat for a label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<PassStat> {
        self.passes.get(label).copied()
    }

    /// Sum of every recorded pass in milliseconds.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.passes.values().map(|s| s.total_ms).sum()
    }

    /// Total number of recorded dispatches.
    #[must_use]
    pub fn dispatch_count(&self) -> u32 {
        self.passes.values().map(|s| s.calls).sum()
    }

    /// Labels sorted by descending total time.
    #[must_use]
    pub fn slowest_first(&self) -> Vec<(&'static str, PassStat)> {
        let mut entries: Vec<_> = self.passes.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by(|a, b| b.1.total_ms.total_cmp(&a.1.total_ms));
        entries
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.passes.clear();
    }
}

/// Simple frame timer for tracking simulation performance.
pub struct FrameTimer {
    last_frame_time_ms: f64,
    frames: u64,
    total_ms: f64,
}

impl FrameTimer {
    /// Creates a new frame timer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_frame_time_ms: 0.0,
            frames: 0,
            total_ms: 0.0,
        }
    }

    /// Records frame time in milliseconds.
    pub fn record(&mut self, time_ms: f64) {
        self.last_frame_time_ms = time_ms;
        self.frames += 1;
        self.total_ms += time_ms;
    }

    /// Gets the last recorded frame time.
    #[must_use]
    pub fn last_frame_time_ms(&self) -> f64 {
        self.last_frame_time_ms
    }

    /// Mean of every recorded frame time, or zero before the first frame.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_ms(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_ms / self.frames as f64
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
