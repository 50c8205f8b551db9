//! The empty workload: clear, present, nothing else.
//!
//! Its numbers are the floor every other problem is measured against.

use crate::problems::{ClearValues, Problem};
use crate::renderer::wgpu_lib::{DeviceContext, FrameContext};
use crate::solutions::SolutionError;

const NULL_SOLUTION: &str = "NullSolution";

/// Clears the window and submits no draws.
#[derive(Debug, Default)]
pub struct NullProblem;

impl NullProblem {
    /// Name under which this problem is registered.
    pub const NAME: &'static str = "NullProblem";

    /// Creates the problem.
    pub fn new() -> Self {
        Self
    }
}

impl Problem for NullProblem {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn solution_names(&self) -> Vec<&'static str> {
        vec![NULL_SOLUTION]
    }

    fn init(&mut self) {}

    fn clear_values(&self) -> ClearValues {
        ClearValues {
            color: wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.25,
                a: 1.0,
            },
            depth: 1.0,
        }
    }

    fn set_solution(
        &mut self,
        _device: &DeviceContext<'_>,
        name: &str,
    ) -> Result<(), SolutionError> {
        if name != NULL_SOLUTION {
            return Err(SolutionError::Unknown(name.to_string()));
        }
        Ok(())
    }

    fn clear_solution(&mut self) {}

    fn render(&mut self, _frame: &mut FrameContext<'_, '_>) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offers_a_single_solution_and_a_distinct_clear_color() {
        let problem = NullProblem::new();
        assert_eq!(problem.name(), NullProblem::NAME);
        assert_eq!(problem.solution_names(), vec![NULL_SOLUTION]);
        assert_ne!(problem.clear_values(), ClearValues::default());
    }
}
