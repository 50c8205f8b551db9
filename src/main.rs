//! apibench - A Graphics API Benchmark
//!
//! This is the main entry point of apibench. It renders the same workloads
//! ("problems") through several graphics APIs and several submission strategies
//! ("solutions"), one window per API, and reports how each combination performs.
//!
//! # Features
//! - **Interactive mode**: step through problems, solutions and APIs with the
//!   arrow keys and `A`, watching a live CPU/GPU time summary
//! - **Benchmark mode**: visit every combination unattended and print a sorted
//!   comparison table (failed combinations show as `N/A`)
//! - **GPU timing**: timestamp queries read back without ever stalling the CPU
//!
//! # Architecture
//! - `app/`: event loop, selection state machine, window coordination
//! - `benchmarks/`: timing, result store, report formatting
//! - `problems/` and `solutions/`: the workloads and their submission strategies
//! - `renderer/`: per-API wgpu contexts and pipeline helpers
//! - `math/`: matrices for placing objects on screen
//!
//! # Usage
//! `apibench --benchmark --min-seconds 2 --output results.txt`

#![warn(missing_docs)]
pub mod app;
pub mod benchmarks;
pub mod error;
pub mod keys;
pub mod math;
pub mod options;
pub mod problems;
pub mod registry;
pub mod renderer;
pub mod solutions;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::{App, RunOutcome};
use crate::benchmarks::output::{write_json_file, write_table_file};
use crate::benchmarks::rows_as_table;
use crate::error::InitError;
use crate::options::Options;
use crate::problems::Problem;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> ExitCode {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let options = Options::parse();
    init_logging(options.verbose);

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("apibench={default_level},wgpu_core=warn,wgpu_hal=warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Problems named on the command line, or all of them.
fn select_problems(filter: &[String]) -> Result<Vec<Box<dyn Problem>>, InitError> {
    let mut problems = problems::all_problems();
    if !filter.is_empty() {
        problems.retain(|problem| {
            filter
                .iter()
                .any(|name| name.eq_ignore_ascii_case(problem.name()))
        });
        if problems.is_empty() {
            return Err(InitError::NoProblem(filter.to_vec()));
        }
    }
    for problem in &mut problems {
        problem.init();
    }
    Ok(problems)
}

fn run(options: Options) -> anyhow::Result<()> {
    let problems = select_problems(&options.problems)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        if let Err(err) = ctrlc::set_handler(move || interrupted.store(true, Ordering::Relaxed)) {
            warn!("Ctrl-C will not stop the run cleanly: {err}");
        }
    }

    let event_loop = EventLoop::new().map_err(InitError::from)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(options.clone(), problems, interrupted);
    event_loop
        .run_app(&mut app)
        .context("the event loop stopped unexpectedly")?;

    let outcome = app.finish()?;
    report(&options, &outcome)
}

/// Prints the table and writes the requested report files.
fn report(options: &Options, outcome: &RunOutcome) -> anyhow::Result<()> {
    if !outcome.benchmark && outcome.rows.is_empty() {
        info!("nothing recorded, no report");
        return Ok(());
    }

    println!("\n\nResults");
    print!("{}", rows_as_table(&outcome.rows));

    if let Some(path) = &options.output {
        write_table_file(path, &outcome.rows)
            .with_context(|| format!("unable to write the report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    if let Some(path) = &options.json {
        write_json_file(path, &outcome.rows)
            .with_context(|| format!("unable to write the JSON report to {}", path.display()))?;
        info!(path = %path.display(), "JSON report written");
    }
    Ok(())
}
