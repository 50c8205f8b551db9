//! Benchmark result formatting utilities
//!
//! Turns a [`BenchmarkResultStore`](super::data::BenchmarkResultStore) snapshot into
//! the final comparison table. Column widths are fixed so the output can be parsed
//! by scripts; rows that never produced a usable measurement print `N/A` in every
//! numeric column.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::registry::{Registry, SelectionKey};

use super::data::{LiveSummary, SampleAccumulator};

const NOT_AVAILABLE: &str = "N/A";

/// Derived statistics of a successful row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowStats {
    /// Frames per second.
    pub fps: f64,
    /// Milliseconds per frame.
    pub ms_per_frame: f64,
    /// Work units per second.
    pub work_per_second: f64,
}

/// One flattened report line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRow {
    /// Problem display name.
    pub problem: String,
    /// API display name.
    pub api: String,
    /// Solution display name.
    pub solution: String,
    /// Completed frames.
    pub frame_count: u32,
    /// Summed frame time in seconds.
    pub elapsed_seconds: f64,
    /// Summed work units.
    pub work_count: u64,
    /// `None` for a failed run.
    pub stats: Option<RowStats>,
}

impl BenchmarkRow {
    /// Flattens one store entry, computing its statistics when they are defined.
    pub fn new(registry: &Registry, key: &SelectionKey, acc: &SampleAccumulator) -> Self {
        let names = registry.describe(key);
        let stats = (!acc.is_degenerate()).then(|| {
            let frames = f64::from(acc.frame_count);
            RowStats {
                fps: frames / acc.elapsed_seconds,
                ms_per_frame: acc.elapsed_seconds * 1_000.0 / frames,
                work_per_second: acc.work_count as f64 / acc.elapsed_seconds,
            }
        });

        Self {
            problem: names.problem.to_string(),
            api: names.api.to_string(),
            solution: names.solution.to_string(),
            frame_count: acc.frame_count,
            elapsed_seconds: acc.elapsed_seconds,
            work_count: acc.work_count,
            stats,
        }
    }

    /// `true` when the row prints as `N/A`.
    pub fn is_failed(&self) -> bool {
        self.stats.is_none()
    }

    fn ms_per_frame_or_max(&self) -> f64 {
        self.stats.map_or(f64::INFINITY, |stats| stats.ms_per_frame)
    }
}

/// Report order: problem, then API, then fastest solution first.
///
/// Failed rows come after every measured row of the same problem and API.
pub fn compare_rows(lhs: &BenchmarkRow, rhs: &BenchmarkRow) -> Ordering {
    lhs.problem
        .cmp(&rhs.problem)
        .then_with(|| lhs.api.cmp(&rhs.api))
        .then_with(|| lhs.ms_per_frame_or_max().total_cmp(&rhs.ms_per_frame_or_max()))
        .then_with(|| lhs.solution.cmp(&rhs.solution))
}

/// Builds the sorted rows of a snapshot.
pub fn build_rows(
    registry: &Registry,
    snapshot: &[(SelectionKey, SampleAccumulator)],
) -> Vec<BenchmarkRow> {
    let mut rows: Vec<BenchmarkRow> = snapshot
        .iter()
        .map(|(key, acc)| BenchmarkRow::new(registry, key, acc))
        .collect();
    rows.sort_by(compare_rows);
    rows
}

fn header_line() -> String {
    format!(
        " {:<23} {:<10} {:<30} {:>7} {:>12} {:>12} {:>12}\n",
        "Problem", "API", "Solution", "Frames", "Elapsed (s)", "fps", "ms/f"
    )
}

fn row_line(row: &BenchmarkRow) -> String {
    match row.stats {
        Some(stats) => format!(
            " {:<23} {:<10} {:<30} {:>7} {:>12.3} {:>12.3} {:>12.3}\n",
            row.problem,
            row.api,
            row.solution,
            row.frame_count,
            row.elapsed_seconds,
            stats.fps,
            stats.ms_per_frame
        ),
        None => format!(
            " {:<23} {:<10} {:<30} {:>7} {:>12} {:>12} {:>12}\n",
            row.problem,
            row.api,
            row.solution,
            NOT_AVAILABLE,
            NOT_AVAILABLE,
            NOT_AVAILABLE,
            NOT_AVAILABLE
        ),
    }
}

/// Renders already sorted rows as the fixed-width table.
pub fn rows_as_table(rows: &[BenchmarkRow]) -> String {
    let mut table = header_line();
    for row in rows {
        table.push_str(&row_line(row));
    }
    table
}

/// Renders a store snapshot as the final comparison table.
pub fn as_table(registry: &Registry, snapshot: &[(SelectionKey, SampleAccumulator)]) -> String {
    rows_as_table(&build_rows(registry, snapshot))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: chrono::DateTime<chrono::Local>,
    rows: &'a [BenchmarkRow],
}

/// Serializes sorted rows, stamped with the local time, as pretty JSON.
pub fn rows_as_json(rows: &[BenchmarkRow]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        generated_at: chrono::Local::now(),
        rows,
    })
}

impl fmt::Display for LiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU time: {:.3}, ", self.cpu_ms)?;
        match self.gpu_ms {
            Some(gpu_ms) => write!(f, "GPU time: {gpu_ms:.3}, ")?,
            None => write!(f, "GPU time: {NOT_AVAILABLE}, ")?,
        }
        match self.theoretical_fps {
            Some(fps) => write!(f, "theor. FPS: {fps:.3}"),
            None => write!(f, "theor. FPS: {NOT_AVAILABLE}"),
        }
    }
}
