//! Uniform buffer utilities for wgpu rendering.
//!
//! This module provides the [`Uniforms`] struct holding the camera matrix every
//! object shader reads, as well as helpers for buffer and bind group creation.

use crate::math::Mat4;
use crate::renderer::pipeline_builder::{BindGroupLayoutBuilder, create_uniform_buffer};

/// Uniforms for the object pipelines.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    /// View-projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::new(Mat4::identity())
    }
}

impl Uniforms {
    /// Uniforms for the given camera.
    pub fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.into(),
        }
    }

    /// Creates a GPU buffer containing the uniform data.
    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        create_uniform_buffer(device, self, "Uniform Buffer")
    }

    /// Uploads new contents into a buffer made by [`Uniforms::create_buffer`].
    pub fn write(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(self));
    }

    /// Creates the layout of the object bind group: uniforms at binding 0 and a
    /// storage buffer of per-object transforms at binding 1.
    pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        BindGroupLayoutBuilder::new(device)
            .with_label("objects_bind_group_layout")
            .with_uniform_buffer(0, wgpu::ShaderStages::VERTEX)
            .with_storage_buffer(1, wgpu::ShaderStages::VERTEX)
            .build()
    }

    /// Binds `uniforms` and `transforms` according to [`Uniforms::create_bind_group_layout`].
    pub fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        transforms: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: transforms.as_entire_binding(),
                },
            ],
            label: Some("objects_bind_group"),
        })
    }
}
