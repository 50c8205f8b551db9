//! Benchmarking and Performance Analysis Library
//!
//! This module provides the measurement side of the application: CPU and GPU
//! frame timing, per-configuration result totals, and the comparison report
//! printed when a run ends.
//!
//! # Features
//! - **Time Samples**: one duration type for CPU stopwatches and GPU query results
//! - **GPU Timer**: double-buffered elapsed-time queries that never stall the CPU
//! - **Result Store**: frame, time and work totals per (API, problem, solution)
//! - **Report Formatting**: a sorted fixed-width table, with failed runs shown as `N/A`
//! - **Live Summary**: a CPU/GPU/FPS line printed about once per second
//! - **File Output**: the final table and a JSON copy of its rows

use std::time::Duration;

use crate::app::selection::SelectionMode;

/// When benchmark traversal moves on to the next configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvancePolicy {
    /// After this many frames were recorded for the active configuration.
    MinFrames(u32),
    /// After this much frame time was recorded for the active configuration.
    MinSeconds(f64),
}

impl AdvancePolicy {
    /// `true` once `acc` holds enough samples.
    pub fn is_satisfied(&self, acc: &SampleAccumulator) -> bool {
        match *self {
            AdvancePolicy::MinFrames(frames) => acc.frame_count >= frames,
            AdvancePolicy::MinSeconds(seconds) => acc.elapsed_seconds >= seconds,
        }
    }
}

impl Default for AdvancePolicy {
    fn default() -> Self {
        AdvancePolicy::MinSeconds(5.0)
    }
}

/// Configuration for benchmarking features
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Interactive or unattended traversal; fixed for the whole run.
    pub mode: SelectionMode,
    /// How long each configuration runs in benchmark mode.
    pub policy: AdvancePolicy,
    /// Minimum time between two live summary lines.
    pub summary_interval: Duration,
    /// Number of GPU query slots per API.
    pub query_depth: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Interactive,
            policy: AdvancePolicy::default(),
            summary_interval: Duration::from_secs(1),
            query_depth: 2,
        }
    }
}

/// Per-configuration totals and the live summary accumulator.
pub mod data;

/// Fixed-width report table and live summary formatting.
pub mod format;

/// Double-buffered GPU elapsed-time queries.
pub mod gpu_timer;

/// Report files.
pub mod output;

/// CPU stopwatch and the shared duration sample type.
pub mod time_sample;


// Re-export main types for convenience
pub use data::{BenchmarkResultStore, LiveSummary, LiveSummaryAccumulator, SampleAccumulator};
pub use format::{BenchmarkRow, as_table, build_rows, rows_as_json, rows_as_table};
pub use gpu_timer::{GpuTime, GpuTimer, QueryError, QueryPoll, QueryRing};
pub use time_sample::{Stopwatch, TimeSample};
