//! Rendering problems.
//!
//! A problem is a fixed workload; its solutions are different ways of submitting
//! that workload to the GPU. The application only talks to problems through
//! [`Problem`]: it picks a solution by name, asks for clear values, and has the
//! problem render one frame into an already open render pass.

use crate::renderer::wgpu_lib::{DeviceContext, FrameContext};
use crate::solutions::SolutionError;

pub mod null;
pub mod untextured_objects;

pub use null::NullProblem;
pub use untextured_objects::UntexturedObjects;

/// Values the frame's color and depth targets are cleared to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValues {
    /// Clear color.
    pub color: wgpu::Color,
    /// Clear depth.
    pub depth: f32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: wgpu::Color::BLACK,
            depth: 1.0,
        }
    }
}

/// Capabilities every problem offers to the application.
pub trait Problem {
    /// Display name, unique among problems.
    fn name(&self) -> &'static str;

    /// Names of the solutions that can render this problem.
    fn solution_names(&self) -> Vec<&'static str>;

    /// Builds the CPU-side data of the workload. Called once at startup.
    fn init(&mut self);

    /// What the frame is cleared to before [`Problem::render`].
    fn clear_values(&self) -> ClearValues {
        ClearValues::default()
    }

    /// Creates the GPU resources of solution `name` on `device`, replacing the
    /// active solution.
    fn set_solution(&mut self, device: &DeviceContext<'_>, name: &str)
    -> Result<(), SolutionError>;

    /// Releases the active solution, if any.
    fn clear_solution(&mut self);

    /// Records one frame of work into `frame` and returns the work submitted.
    fn render(&mut self, frame: &mut FrameContext<'_, '_>) -> u64;

    /// Releases everything before the application exits.
    fn shutdown(&mut self) {
        self.clear_solution();
    }
}

/// Every problem the application knows about.
pub fn all_problems() -> Vec<Box<dyn Problem>> {
    vec![
        Box::new(NullProblem::new()),
        Box::new(UntexturedObjects::new(UntexturedObjects::DEFAULT_SIDE)),
    ]
}
