//! Solutions of the untextured objects problem.
//!
//! Every solution draws the same cube once per object with the same shader and
//! the same per-object transform buffer; they only differ in how the draws are
//! submitted. [`ObjectScene`] holds the shared part.

use crate::math::Mat4;
use crate::renderer::pipeline_builder::{PipelineBuilder, create_storage_buffer};
use crate::renderer::uniform::Uniforms;
use crate::renderer::vertex::{Index, Vertex};
use crate::renderer::wgpu_lib::{DeviceContext, FrameContext};
use crate::solutions::SolutionError;
use wgpu::util::DeviceExt;

/// One draw call per object.
pub mod draw_loop;
pub mod indirect;
/// One instanced draw for the whole grid.
pub mod instanced;

pub use draw_loop::DrawLoop;
pub use indirect::MultiDrawIndirect;
pub use instanced::Instanced;

const OBJECTS_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var<storage, read> transforms: array<mat4x4<f32>>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput, @builtin(instance_index) instance: u32) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * transforms[instance] * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// One way of submitting the untextured objects workload.
pub trait UntexturedObjectsSolution {
    /// Registered solution name.
    fn name(&self) -> &'static str;

    /// Device features the solution cannot work without.
    fn required_features(&self) -> wgpu::Features {
        wgpu::Features::empty()
    }

    /// Creates the GPU resources for `object_count` copies of the mesh.
    fn init(
        &mut self,
        device: &DeviceContext<'_>,
        vertices: &[Vertex],
        indices: &[Index],
        object_count: usize,
    ) -> Result<(), SolutionError>;

    /// Draws every object with its transform.
    fn render(&mut self, frame: &mut FrameContext<'_, '_>, view_proj: &Mat4, transforms: &[Mat4]);

    /// Releases the GPU resources created by `init`.
    fn shutdown(&mut self);
}

/// Names of the solutions [`create`] knows, in registration order.
pub const SOLUTION_NAMES: [&str; 3] = [
    DrawLoop::NAME,
    Instanced::NAME,
    MultiDrawIndirect::NAME,
];

/// A fresh, uninitialized solution called `name`.
pub fn create(name: &str) -> Option<Box<dyn UntexturedObjectsSolution>> {
    match name {
        DrawLoop::NAME => Some(Box::new(DrawLoop::default())),
        Instanced::NAME => Some(Box::new(Instanced::default())),
        MultiDrawIndirect::NAME => Some(Box::new(MultiDrawIndirect::default())),
        _ => None,
    }
}

/// Pipeline, mesh and per-object buffers shared by all solutions.
pub struct ObjectScene {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniforms: wgpu::Buffer,
    transforms: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    /// Indices of one mesh copy.
    pub index_count: u32,
    /// Copies of the mesh drawn per frame.
    pub object_count: u32,
}

impl ObjectScene {
    /// Builds the pipeline and uploads the mesh, capturing validation errors.
    pub fn new(
        device: &DeviceContext<'_>,
        vertices: &[Vertex],
        indices: &[Index],
        object_count: usize,
    ) -> Result<Self, SolutionError> {
        let scene = device.validated(|| {
            let layout = Uniforms::create_bind_group_layout(device.device);
            let pipeline = PipelineBuilder::new(device.device, device.color_format)
                .with_label("untextured_objects_pipeline")
                .with_shader(OBJECTS_SHADER)
                .with_vertex_buffer(Vertex::desc())
                .with_bind_group_layout(&layout)
                .with_depth(device.depth_format)
                .build();

            let uniforms = Uniforms::default().create_buffer(device.device);
            let transforms =
                create_storage_buffer::<Mat4>(device.device, object_count, "object_transforms");
            let bind_group =
                Uniforms::create_bind_group(device.device, &layout, &uniforms, &transforms);

            let vertex_buffer =
                device
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("object_vertices"),
                        contents: bytemuck::cast_slice(vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
            let index_buffer = device
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("object_indices"),
                    contents: bytemuck::cast_slice(&padded_indices(indices)),
                    usage: wgpu::BufferUsages::INDEX,
                });

            ObjectScene {
                pipeline,
                bind_group,
                uniforms,
                transforms,
                vertex_buffer,
                index_buffer,
                index_count: indices.len() as u32,
                object_count: object_count as u32,
            }
        })?;
        Ok(scene)
    }

    /// Writes this frame's camera and object transforms.
    pub fn upload(&self, queue: &wgpu::Queue, view_proj: &Mat4, transforms: &[Mat4]) {
        Uniforms::new(*view_proj).write(queue, &self.uniforms);
        let count = transforms.len().min(self.object_count as usize);
        if count > 0 {
            queue.write_buffer(&self.transforms, 0, bytemuck::cast_slice(&transforms[..count]));
        }
    }

    /// Sets the pipeline and every buffer the draws read.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    }
}

/// Buffer contents must be a multiple of four bytes.
fn padded_indices(indices: &[Index]) -> Vec<Index> {
    let mut padded = indices.to_vec();
    if padded.len() % 2 == 1 {
        padded.push(0);
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_name_creates_its_solution() {
        for name in SOLUTION_NAMES {
            let solution = create(name).expect("registered solution");
            assert_eq!(solution.name(), name);
        }
        assert!(create("UntexturedObjectsBogus").is_none());
    }

    #[test]
    fn only_indirect_needs_extra_features() {
        let needs: Vec<_> = SOLUTION_NAMES
            .iter()
            .filter_map(|name| create(name))
            .filter(|s| !s.required_features().is_empty())
            .map(|s| s.name())
            .collect();
        assert_eq!(needs, vec![MultiDrawIndirect::NAME]);
    }

    #[test]
    fn index_data_is_padded_to_four_bytes() {
        assert_eq!(padded_indices(&[0, 1, 2]), vec![0, 1, 2, 0]);
        assert_eq!(padded_indices(&[0, 1]).len(), 2);
    }
}
