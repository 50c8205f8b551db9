//! Command-line options.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::selection::SelectionMode;
use crate::benchmarks::{AdvancePolicy, BenchmarkConfig};
use crate::renderer::wgpu_lib::ApiBackend;

/// Compares how graphics APIs and submission strategies cope with the same workloads.
#[derive(Debug, Clone, Parser)]
#[command(name = "apibench", version)]
pub struct Options {
    /// Walk every (problem, API, solution) combination unattended and print a report.
    #[arg(long)]
    pub benchmark: bool,

    /// Frames recorded per combination before moving on.
    #[arg(long, value_name = "N", conflicts_with = "min_seconds")]
    pub min_frames: Option<u32>,

    /// Seconds of frame time recorded per combination before moving on [default: 5].
    #[arg(long, value_name = "S")]
    pub min_seconds: Option<f64>,

    /// Restrict the run to these APIs (repeatable).
    #[arg(long = "api", value_enum, value_name = "NAME")]
    pub apis: Vec<ApiBackend>,

    /// Restrict the run to these problems, matched case-insensitively (repeatable).
    #[arg(long = "problem", value_name = "NAME")]
    pub problems: Vec<String>,

    /// Inner width of every window.
    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    /// Inner height of every window.
    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// Present with vsync.
    #[arg(long)]
    pub vsync: bool,

    /// Number of GPU timer queries in flight per API.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub query_depth: u32,

    /// Also write the final table to this file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write the final rows as JSON to this file.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Options {
    /// When benchmark traversal moves on. `--min-frames` wins over `--min-seconds`.
    pub fn policy(&self) -> AdvancePolicy {
        match (self.min_frames, self.min_seconds) {
            (Some(frames), _) => AdvancePolicy::MinFrames(frames),
            (None, Some(seconds)) => AdvancePolicy::MinSeconds(seconds.max(0.0)),
            (None, None) => AdvancePolicy::default(),
        }
    }

    /// Mode, policy and timing settings for the session.
    pub fn benchmark_config(&self) -> BenchmarkConfig {
        BenchmarkConfig {
            mode: if self.benchmark {
                SelectionMode::BenchmarkTraversal
            } else {
                SelectionMode::Interactive
            },
            policy: self.policy(),
            summary_interval: Duration::from_secs(1),
            query_depth: self.query_depth as usize,
        }
    }

    /// Requested APIs without duplicates, or all of them.
    pub fn apis(&self) -> Vec<ApiBackend> {
        if self.apis.is_empty() {
            return ApiBackend::all().to_vec();
        }
        let mut apis = Vec::with_capacity(self.apis.len());
        for api in &self.apis {
            if !apis.contains(api) {
                apis.push(*api);
            }
        }
        apis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        Options::try_parse_from(std::iter::once("apibench").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn defaults_are_interactive_with_five_seconds() {
        let options = parse(&[]);
        let config = options.benchmark_config();
        assert_eq!(config.mode, SelectionMode::Interactive);
        assert_eq!(config.policy, AdvancePolicy::MinSeconds(5.0));
        assert_eq!(config.query_depth, 2);
        assert_eq!((options.width, options.height), (1024, 768));
        assert_eq!(options.apis().len(), 4);
    }

    #[test]
    fn benchmark_with_frame_policy() {
        let options = parse(&["--benchmark", "--min-frames", "600", "--api", "gl", "--api", "gl"]);
        let config = options.benchmark_config();
        assert_eq!(config.mode, SelectionMode::BenchmarkTraversal);
        assert_eq!(config.policy, AdvancePolicy::MinFrames(600));
        assert_eq!(options.apis(), vec![ApiBackend::Gl]);
    }

    #[test]
    fn frame_and_second_policies_conflict() {
        let result = Options::try_parse_from([
            "apibench",
            "--min-frames",
            "10",
            "--min-seconds",
            "1.5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn query_depth_must_be_positive() {
        assert!(Options::try_parse_from(["apibench", "--query-depth", "0"]).is_err());
        assert_eq!(parse(&["--query-depth", "3"]).benchmark_config().query_depth, 3);
    }
}
