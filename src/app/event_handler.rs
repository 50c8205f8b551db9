//! Event handler module.
//!
//! Contains the [`App`] struct and its event handling logic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

use crate::app::app_state::ApplicationState;
use crate::benchmarks::BenchmarkRow;
use crate::error::InitError;
use crate::keys::winit_key_to_action;
use crate::options::Options;
use crate::problems::Problem;
use crate::renderer::wgpu_lib::{ApiBackend, GfxContext};

/// Horizontal gap between neighbouring windows.
const WINDOW_GAP: i32 = 16;

/// What a finished run leaves behind.
pub struct RunOutcome {
    /// `true` when the run was a benchmark traversal.
    pub benchmark: bool,
    /// Sorted report rows.
    pub rows: Vec<BenchmarkRow>,
}

/// Main application struct that manages the session lifecycle and event handling.
///
/// This struct implements the [`ApplicationHandler`] trait. Windows and graphics
/// contexts are created on the first `resumed` call; until then `state` is
/// `None`.
///
/// # Lifecycle
/// 1. Created with [`App::new`] from the parsed options and the problems to run
/// 2. `resumed` opens one window per API and builds the [`ApplicationState`]
/// 3. `about_to_wait` renders one frame per loop iteration until a quit signal
/// 4. [`App::finish`] hands the results (or the fatal error) back to `main`
pub struct App {
    options: Options,
    problems: Option<Vec<Box<dyn Problem>>>,
    interrupted: Arc<AtomicBool>,
    state: Option<ApplicationState>,
    error: Option<InitError>,
}

impl App {
    /// Creates the application. `interrupted` is polled once per loop iteration.
    pub fn new(
        options: Options,
        problems: Vec<Box<dyn Problem>>,
        interrupted: Arc<AtomicBool>,
    ) -> Self {
        Self {
            options,
            problems: Some(problems),
            interrupted,
            state: None,
            error: None,
        }
    }

    /// The results of the run, or the error that prevented it.
    pub fn finish(self) -> Result<RunOutcome, InitError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let Some(state) = self.state else {
            return Err(InitError::NoApi);
        };
        Ok(RunOutcome {
            benchmark: state.selection.is_benchmark(),
            rows: state.report_rows(),
        })
    }

    fn create_window(
        &self,
        event_loop: &ActiveEventLoop,
        api: ApiBackend,
        slot: i32,
    ) -> Result<Arc<Window>, InitError> {
        let (width, height) = (self.options.width, self.options.height);
        let attributes = Window::default_attributes()
            .with_title(format!("apibench - {}", api.display_name()))
            .with_inner_size(PhysicalSize::new(width, height))
            .with_position(PhysicalPosition::new(slot * (width as i32 + WINDOW_GAP), 0));
        event_loop
            .create_window(attributes)
            .map(Arc::new)
            .map_err(|source| InitError::Window {
                api: api.display_name().to_string(),
                source,
            })
    }

    /// Opens one window per requested API. APIs that cannot be initialized are
    /// dropped; it is only an error when none is left.
    fn create_contexts(&self, event_loop: &ActiveEventLoop) -> Result<Vec<GfxContext>, InitError> {
        let config = self.options.benchmark_config();
        let mut contexts = Vec::new();
        for api in self.options.apis() {
            let window = match self.create_window(event_loop, api, contexts.len() as i32) {
                Ok(window) => window,
                Err(err) => {
                    warn!("{err}, skipping {}", api.display_name());
                    continue;
                }
            };
            let context = pollster::block_on(GfxContext::new(
                api,
                window,
                self.options.vsync,
                config.query_depth,
            ));
            match context {
                Ok(context) => contexts.push(context),
                Err(err) => warn!("{err}, skipping {}", api.display_name()),
            }
        }

        if contexts.is_empty() {
            return Err(InitError::NoApi);
        }
        Ok(contexts)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: InitError) {
        error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.error.is_some() {
            return;
        }
        let Some(problems) = self.problems.take() else {
            return;
        };

        match self.create_contexts(event_loop) {
            Ok(contexts) => {
                let state =
                    ApplicationState::new(contexts, problems, self.options.benchmark_config());
                self.state = Some(state);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::Moved(position) => state.coordinator.on_window_moved(id, position),
            WindowEvent::CloseRequested => {
                info!("window closed, quitting");
                state.coordinator.on_close_requested(id);
            }
            WindowEvent::Resized(size) => state.resize(id, size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Released,
                        ..
                    },
                ..
            } => {
                if let Some(action) = winit_key_to_action(&logical_key) {
                    state.handle_key(action);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        if state.should_exit(self.interrupted.load(Ordering::Relaxed)) {
            if state.selection.is_complete() {
                info!("benchmark complete");
            }
            state.shutdown();
            event_loop.exit();
            return;
        }
        state.render_frame();
    }
}
