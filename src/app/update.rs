//! Per-frame update: render the active combination and record its timings.
//!
//! One frame is clear, render and swap on the active API's context. The whole
//! frame (clear to swap) is what the result store accumulates; the live summary
//! additionally reports the time spent submitting the problem's draws and the
//! GPU time of an earlier frame as it becomes available.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::activation::record_frame;
use crate::app::app_state::ApplicationState;
use crate::benchmarks::Stopwatch;
use crate::error::FrameError;

impl ApplicationState {
    /// Renders one frame of the active combination.
    pub fn render_frame(&mut self) {
        if self.selection.is_complete() {
            return;
        }
        let ready = self.activate_selection();
        // Nothing runnable at all: keep clearing the active API's window.
        let Some(api) = self.selection.active_api() else {
            return;
        };
        let problem_index = self.selection.active_problem().map(|problem| problem.index());

        let frame_time = Stopwatch::start();
        let context = &mut self.contexts[api.index()];
        let clear = problem_index
            .map(|index| self.problems[index].clear_values())
            .unwrap_or_default();
        match context.clear(clear) {
            Ok(()) => {}
            Err(FrameError::SurfaceReconfigured) => {
                debug!("surface reconfigured, frame skipped");
                return;
            }
            Err(err) => {
                warn!("frame skipped: {err}");
                return;
            }
        }

        let submit_time = Stopwatch::start();
        let work = match (ready, problem_index) {
            (Some(_), Some(index)) => {
                let problem = &mut self.problems[index];
                context.render(|frame| problem.render(frame)).unwrap_or(0)
            }
            _ => 0,
        };
        let cpu = submit_time.elapsed();
        let gpu = context.swap_buffers();
        let elapsed = frame_time.elapsed();

        self.live.record(cpu, gpu.elapsed());
        if let Some(summary) = self.live.take_if_due(Instant::now()) {
            println!("{summary}");
        }

        let advanced = record_frame(
            ready,
            elapsed.as_secs_f64(),
            work,
            &mut self.store,
            &mut self.selection,
            &self.config.policy,
        );
        if !advanced {
            return;
        }
        if let Some((key, acc)) = ready.and_then(|key| self.store.get(&key).map(|acc| (key, acc))) {
            info!(
                selection = %self.registry.describe(&key),
                frames = acc.frame_count,
                seconds = acc.elapsed_seconds,
                "combination done"
            );
        }
    }
}
