use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::registry::SelectionKey;

use super::time_sample::TimeSample;

/// Totals collected for one [`SelectionKey`].
///
/// A key that never completed a frame has zero elapsed time; such a key (or one
/// whose frames took no measurable time) is reported as failed, never divided.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleAccumulator {
    /// Number of completed frames.
    pub frame_count: u32,
    /// Summed frame durations in seconds.
    pub elapsed_seconds: f64,
    /// Problem-specific amount of work submitted (objects drawn, etc).
    pub work_count: u64,
}

impl SampleAccumulator {
    fn update(&mut self, frame_seconds: f64, work_delta: u64) {
        self.frame_count += 1;
        self.elapsed_seconds += frame_seconds;
        self.work_count += work_delta;
    }

    /// `true` when no statistic can be derived from these totals.
    pub fn is_degenerate(&self) -> bool {
        self.frame_count == 0 || self.elapsed_seconds == 0.0
    }
}

/// Per-configuration benchmark totals for one run.
///
/// Written by the render loop after every frame and read once at shutdown.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkResultStore {
    results: HashMap<SelectionKey, SampleAccumulator>,
}

impl BenchmarkResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one completed frame to the totals of `key`.
    ///
    /// # Panics
    /// If `frame_seconds` is negative or not finite.
    pub fn record_frame(&mut self, key: SelectionKey, frame_seconds: f64, work_delta: u64) {
        assert!(
            frame_seconds.is_finite() && frame_seconds >= 0.0,
            "frame duration must be a non-negative number of seconds, got {frame_seconds}"
        );
        self.results
            .entry(key)
            .or_default()
            .update(frame_seconds, work_delta);
    }

    /// Makes sure `key` shows up in the report even though it produced no frames.
    pub fn record_failure(&mut self, key: SelectionKey) {
        self.results.entry(key).or_default();
    }

    /// Totals of `key`, if anything was recorded for it.
    pub fn get(&self, key: &SelectionKey) -> Option<&SampleAccumulator> {
        self.results.get(key)
    }

    /// Number of keys with totals.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// `true` until the first frame or failure is recorded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Copy of every key and its totals. Order is unspecified; the report sorts.
    pub fn snapshot(&self) -> Vec<(SelectionKey, SampleAccumulator)> {
        self.results.iter().map(|(key, acc)| (*key, *acc)).collect()
    }
}

/// One line of live output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSummary {
    /// Average CPU submission time per frame, in milliseconds.
    pub cpu_ms: f64,
    /// Average GPU time per GPU-timed frame, in milliseconds.
    pub gpu_ms: Option<f64>,
    /// Frames per second the GPU time alone would allow.
    pub theoretical_fps: Option<f64>,
    /// Frames covered by this summary.
    pub frames: u32,
}

/// Rolling CPU/GPU totals between two live summaries.
///
/// Owned by the render loop; every summary resets the totals.
#[derive(Debug, Clone)]
pub struct LiveSummaryAccumulator {
    interval: Duration,
    window_start: Instant,
    frames: u32,
    cpu_total: TimeSample,
    gpu_frames: u32,
    gpu_total: TimeSample,
}

impl LiveSummaryAccumulator {
    /// Creates an accumulator that reports at most once per `interval`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            window_start: now,
            frames: 0,
            cpu_total: TimeSample::ZERO,
            gpu_frames: 0,
            gpu_total: TimeSample::ZERO,
        }
    }

    /// Adds one frame. `gpu` is `None` when no GPU result came back this frame.
    pub fn record(&mut self, cpu: TimeSample, gpu: Option<TimeSample>) {
        self.frames += 1;
        self.cpu_total += cpu;
        if let Some(gpu) = gpu {
            self.gpu_frames += 1;
            self.gpu_total += gpu;
        }
    }

    /// Returns a summary and starts a new window once `interval` has passed.
    pub fn take_if_due(&mut self, now: Instant) -> Option<LiveSummary> {
        if now.duration_since(self.window_start) < self.interval || self.frames == 0 {
            return None;
        }

        let cpu_ms = self.cpu_total.as_millis_f64() / f64::from(self.frames);
        let gpu_ms = (self.gpu_frames > 0)
            .then(|| self.gpu_total.as_millis_f64() / f64::from(self.gpu_frames));
        let theoretical_fps = gpu_ms.filter(|ms| *ms > 0.0).map(|ms| 1_000.0 / ms);

        let summary = LiveSummary {
            cpu_ms,
            gpu_ms,
            theoretical_fps,
            frames: self.frames,
        };
        *self = Self::new(self.interval, now);
        Some(summary)
    }
}
