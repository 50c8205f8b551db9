//! A cube of spinning cubes.
//!
//! The workload is `side³` copies of one small mesh, each with its own transform
//! updated every frame. Solutions only differ in how they submit the draws, so
//! the numbers isolate per-draw overhead of each API.

use rand::{Rng, SeedableRng};
use tracing::info;

use crate::benchmarks::Stopwatch;
use crate::math::{Mat4, Vec3};
use crate::problems::{ClearValues, Problem};
use crate::renderer::vertex::{self, Index, Vertex};
use crate::renderer::wgpu_lib::{DeviceContext, FrameContext};
use crate::solutions::untextured_objects::{self as solutions, UntexturedObjectsSolution};
use crate::solutions::{SolutionError, require_features};

/// Distance between neighbouring cube centers.
const SPACING: f32 = 2.0;
const COLOR_SEED: u64 = 0x5eed;

/// `side³` colored cubes on a grid, each spinning on its own.
pub struct UntexturedObjects {
    side: u32,
    vertices: Vec<Vertex>,
    indices: Vec<Index>,
    transforms: Vec<Mat4>,
    clock: Stopwatch,
    solution: Option<Box<dyn UntexturedObjectsSolution>>,
}

impl UntexturedObjects {
    /// Cubes along each edge of the grid when run from the command line.
    pub const DEFAULT_SIDE: u32 = 16;

    /// A grid of `side` cubes along each edge (at least one).
    pub fn new(side: u32) -> Self {
        Self {
            side: side.max(1),
            vertices: Vec::new(),
            indices: Vec::new(),
            transforms: Vec::new(),
            clock: Stopwatch::start(),
            solution: None,
        }
    }

    /// Number of cubes drawn per frame.
    pub fn object_count(&self) -> usize {
        (self.side as usize).pow(3)
    }

    /// World-space center of object `index` in a grid centered on the origin.
    fn grid_position(&self, index: usize) -> Vec3 {
        let side = self.side as usize;
        let half = (self.side - 1) as f32 * 0.5;
        let coord = |i: usize| (i as f32 - half) * SPACING;
        Vec3::new(
            coord(index % side),
            coord((index / side) % side),
            coord(index / (side * side)),
        )
    }

    fn update_transforms(&mut self, seconds: f32) {
        for index in 0..self.transforms.len() {
            let position = self.grid_position(index);
            let angle = seconds + index as f32 * 0.1;
            self.transforms[index] = Mat4::translation(position.x(), position.y(), position.z())
                .multiply(&Mat4::rotation_y(angle))
                .multiply(&Mat4::rotation_x(angle * 0.5));
        }
    }

    fn view_proj(&self, aspect: f32, seconds: f32) -> Mat4 {
        let extent = self.side as f32 * SPACING;
        let distance = extent * 1.5;
        let orbit = seconds * 0.1;
        let eye = Vec3::new(
            distance * orbit.sin(),
            extent * 0.4,
            distance * orbit.cos(),
        );
        let view = Mat4::look_at(eye, Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        Mat4::perspective(std::f32::consts::FRAC_PI_4, aspect, 0.1, distance * 4.0).multiply(&view)
    }
}

impl Problem for UntexturedObjects {
    fn name(&self) -> &'static str {
        "UntexturedObjects"
    }

    fn solution_names(&self) -> Vec<&'static str> {
        solutions::SOLUTION_NAMES.to_vec()
    }

    fn init(&mut self) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(COLOR_SEED);
        let colors = std::array::from_fn(|_| {
            [
                rng.gen_range(64..=255),
                rng.gen_range(64..=255),
                rng.gen_range(64..=255),
                255,
            ]
        });
        (self.vertices, self.indices) = vertex::cube(colors);
        self.transforms = vec![Mat4::identity(); self.object_count()];
        self.update_transforms(0.0);
        info!(objects = self.object_count(), "untextured objects ready");
    }

    fn clear_values(&self) -> ClearValues {
        ClearValues {
            color: wgpu::Color {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 1.0,
            },
            depth: 1.0,
        }
    }

    fn set_solution(
        &mut self,
        device: &DeviceContext<'_>,
        name: &str,
    ) -> Result<(), SolutionError> {
        self.clear_solution();

        let mut solution =
            solutions::create(name).ok_or_else(|| SolutionError::Unknown(name.to_string()))?;
        require_features(device.features(), solution.required_features())?;
        solution.init(device, &self.vertices, &self.indices, self.object_count())?;
        self.solution = Some(solution);
        Ok(())
    }

    fn clear_solution(&mut self) {
        if let Some(mut solution) = self.solution.take() {
            solution.shutdown();
        }
    }

    fn render(&mut self, frame: &mut FrameContext<'_, '_>) -> u64 {
        if self.solution.is_none() {
            return 0;
        }
        let seconds = self.clock.elapsed().as_secs_f64() as f32;
        self.update_transforms(seconds);
        let view_proj = self.view_proj(frame.aspect, seconds);

        let Some(solution) = self.solution.as_mut() else {
            return 0;
        };
        solution.render(frame, &view_proj, &self.transforms);
        self.transforms.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_builds_one_transform_per_object() {
        let mut problem = UntexturedObjects::new(3);
        problem.init();
        assert_eq!(problem.object_count(), 27);
        assert_eq!(problem.transforms.len(), 27);
        assert_eq!(problem.indices.len(), 36);
        assert!(problem.solution.is_none());
    }

    #[test]
    fn grid_is_centered_on_the_origin() {
        let mut problem = UntexturedObjects::new(4);
        problem.init();

        let mut sum = [0.0f32; 3];
        for transform in &problem.transforms {
            let center = transform.transform_point(Vec3::new(0.0, 0.0, 0.0));
            sum[0] += center[0];
            sum[1] += center[1];
            sum[2] += center[2];
        }
        for axis in sum {
            assert!(axis.abs() < 1e-3, "grid is off-center: {sum:?}");
        }
    }

    #[test]
    fn grid_positions_are_distinct() {
        let problem = UntexturedObjects::new(3);
        let positions: Vec<_> = (0..problem.object_count())
            .map(|i| problem.grid_position(i))
            .collect();
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!((*a - *b).length() > SPACING * 0.5);
            }
        }
    }

    #[test]
    fn colors_are_reproducible() {
        let mut first = UntexturedObjects::new(1);
        let mut second = UntexturedObjects::new(1);
        first.init();
        second.init();
        assert_eq!(first.vertices, second.vertices);
    }

    #[test]
    fn offers_every_submission_strategy() {
        let problem = UntexturedObjects::new(1);
        assert_eq!(
            problem.solution_names(),
            vec![
                "UntexturedObjectsDrawLoop",
                "UntexturedObjectsInstanced",
                "UntexturedObjectsMultiDrawIndirect",
            ]
        );
    }
}
