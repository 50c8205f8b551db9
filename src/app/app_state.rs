//! ApplicationState module.
//!
//! This module defines [`ApplicationState`], which holds everything a running
//! session needs once the windows exist: one graphics context per API, the
//! problems, the selection state machine, the result store and the window
//! coordinator.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use winit::window::{Window, WindowId};

use crate::app::activation::{Activation, SolutionBinding, SolutionHost};
use crate::app::selection::SelectionStateMachine;
use crate::app::windows::MultiWindowCoordinator;
use crate::benchmarks::{BenchmarkConfig, BenchmarkResultStore, BenchmarkRow, LiveSummaryAccumulator, build_rows};
use crate::keys::KeyAction;
use crate::problems::Problem;
use crate::registry::{Registry, SelectionKey};
use crate::renderer::wgpu_lib::GfxContext;
use crate::solutions::SolutionError;

/// Holds all state of a running session.
///
/// `contexts` is indexed by [`ApiId`](crate::registry::ApiId) and `problems`
/// by [`ProblemId`](crate::registry::ProblemId); both are sorted by name at
/// construction so their order matches the registry's.
pub struct ApplicationState {
    /// Display names of every API, problem and solution in the session.
    pub registry: Registry,
    pub(crate) contexts: Vec<GfxContext>,
    pub(crate) problems: Vec<Box<dyn Problem>>,
    /// Keeps the per-API windows together.
    pub coordinator: MultiWindowCoordinator<Arc<Window>>,
    /// The active combination.
    pub selection: SelectionStateMachine,
    /// Totals of every combination run so far.
    pub store: BenchmarkResultStore,
    pub(crate) live: LiveSummaryAccumulator,
    /// Mode, advance policy and timing settings of the run.
    pub config: BenchmarkConfig,
    pub(crate) binding: SolutionBinding,
    quit_key: bool,
}

/// The session's devices and problems, seen as the place solutions are created.
struct Devices<'a> {
    registry: &'a Registry,
    contexts: &'a mut [GfxContext],
    problems: &'a mut [Box<dyn Problem>],
}

impl SolutionHost for Devices<'_> {
    fn bind(&mut self, key: SelectionKey) -> Result<(), SolutionError> {
        let names = self.registry.describe(&key);
        let context = &mut self.contexts[key.api.index()];
        self.problems[key.problem.index()]
            .set_solution(&context.device_context(), names.solution)?;
        context.window().set_title(&format!("apibench - {names}"));
        context.discard_gpu_times();
        Ok(())
    }

    fn release(&mut self, key: SelectionKey) {
        debug!(selection = %self.registry.describe(&key), "releasing solution");
        self.problems[key.problem.index()].clear_solution();
    }
}

impl ApplicationState {
    /// Builds the session from one context per API and the problems to run.
    pub fn new(
        mut contexts: Vec<GfxContext>,
        mut problems: Vec<Box<dyn Problem>>,
        config: BenchmarkConfig,
    ) -> Self {
        contexts.sort_by_key(|context| context.api().display_name());
        problems.sort_by_key(|problem| problem.name());

        let registry = Registry::new(
            contexts.iter().map(|context| context.api().display_name()),
            problems
                .iter()
                .map(|problem| (problem.name().to_string(), problem.solution_names())),
        );
        let coordinator =
            MultiWindowCoordinator::new(contexts.iter().map(|context| context.window().clone()));
        let selection = SelectionStateMachine::new(config.mode, &registry);
        let live = LiveSummaryAccumulator::new(config.summary_interval, Instant::now());

        info!(
            apis = registry.api_count(),
            problems = registry.problem_count(),
            mode = ?config.mode,
            "session ready"
        );

        Self {
            registry,
            contexts,
            problems,
            coordinator,
            selection,
            store: BenchmarkResultStore::new(),
            live,
            config,
            binding: SolutionBinding::new(),
            quit_key: false,
        }
    }

    /// Applies a key action from any window.
    pub fn handle_key(&mut self, action: KeyAction) {
        match action {
            KeyAction::Quit => self.quit_key = true,
            KeyAction::Navigate(command) => {
                if self.selection.navigate(command) {
                    if let Some(key) = self.selection.active_key() {
                        info!(selection = %self.registry.describe(&key), "selection changed");
                    }
                }
            }
        }
    }

    /// Reconfigures the context presenting to `window`.
    pub fn resize(&mut self, window: WindowId, width: u32, height: u32) {
        if let Some(context) = self
            .contexts
            .iter_mut()
            .find(|context| context.window().id() == window)
        {
            context.resize(width, height);
        }
    }

    /// `true` once the loop should stop: a window was closed, the quit key
    /// was pressed, `interrupted` is set, or benchmark traversal finished.
    pub fn should_exit(&self, interrupted: bool) -> bool {
        self.coordinator.quit_requested()
            || self.quit_key
            || interrupted
            || self.selection.is_complete()
    }

    /// Makes sure the active combination's solution exists on its device.
    ///
    /// Returns the combination when it is ready to render. In benchmark mode a
    /// solution that cannot be created is recorded as a failure and skipped.
    pub fn activate_selection(&mut self) -> Option<SelectionKey> {
        let mut devices = Devices {
            registry: &self.registry,
            contexts: &mut self.contexts,
            problems: &mut self.problems,
        };
        let activation = self.binding.activate(
            &self.registry,
            &mut self.selection,
            &mut self.store,
            &mut devices,
        );
        if let Activation::Bound(_) = activation {
            self.live = LiveSummaryAccumulator::new(self.config.summary_interval, Instant::now());
        }
        activation.key()
    }

    /// Releases every problem's GPU resources.
    pub fn shutdown(&mut self) {
        self.binding = SolutionBinding::new();
        for problem in &mut self.problems {
            problem.shutdown();
        }
    }

    /// Sorted report rows of everything recorded so far.
    pub fn report_rows(&self) -> Vec<BenchmarkRow> {
        build_rows(&self.registry, &self.store.snapshot())
    }
}
