//! Multi-draw-indirect submission.
//!
//! The argument buffer holds one indexed draw per object whose first instance
//! selects the object's transform, so the whole grid is a single call.

use wgpu::util::{DeviceExt, DrawIndexedIndirectArgs};

use crate::math::Mat4;
use crate::renderer::vertex::{Index, Vertex};
use crate::renderer::wgpu_lib::{DeviceContext, FrameContext};
use crate::solutions::untextured_objects::{ObjectScene, UntexturedObjectsSolution};
use crate::solutions::{SolutionError, require_features};

/// One multi-draw-indirect call over an argument buffer of per-object draws.
#[derive(Default)]
pub struct MultiDrawIndirect {
    scene: Option<ObjectScene>,
    commands: Option<wgpu::Buffer>,
}

impl MultiDrawIndirect {
    /// Registered solution name.
    pub const NAME: &'static str = "UntexturedObjectsMultiDrawIndirect";
}

fn draw_commands(index_count: u32, object_count: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(
        object_count as usize * std::mem::size_of::<DrawIndexedIndirectArgs>(),
    );
    for object in 0..object_count {
        let args = DrawIndexedIndirectArgs {
            index_count,
            instance_count: 1,
            first_index: 0,
            base_vertex: 0,
            first_instance: object,
        };
        bytes.extend_from_slice(args.as_bytes());
    }
    bytes
}

impl UntexturedObjectsSolution for MultiDrawIndirect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn required_features(&self) -> wgpu::Features {
        wgpu::Features::MULTI_DRAW_INDIRECT | wgpu::Features::INDIRECT_FIRST_INSTANCE
    }

    fn init(
        &mut self,
        device: &DeviceContext<'_>,
        vertices: &[Vertex],
        indices: &[Index],
        object_count: usize,
    ) -> Result<(), SolutionError> {
        require_features(device.features(), self.required_features())?;

        let scene = ObjectScene::new(device, vertices, indices, object_count)?;
        let contents = draw_commands(scene.index_count, scene.object_count);
        let commands = device.validated(|| {
            device
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("object_draw_commands"),
                    contents: &contents,
                    usage: wgpu::BufferUsages::INDIRECT,
                })
        })?;

        self.scene = Some(scene);
        self.commands = Some(commands);
        Ok(())
    }

    fn render(&mut self, frame: &mut FrameContext<'_, '_>, view_proj: &Mat4, transforms: &[Mat4]) {
        let (Some(scene), Some(commands)) = (&self.scene, &self.commands) else {
            return;
        };
        scene.upload(frame.queue, view_proj, transforms);
        scene.bind(frame.pass);
        frame
            .pass
            .multi_draw_indexed_indirect(commands, 0, scene.object_count);
    }

    fn shutdown(&mut self) {
        self.commands = None;
        self.scene = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_command_per_object() {
        let bytes = draw_commands(36, 5);
        assert_eq!(bytes.len(), 5 * 20);

        let word = |at: usize| u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
        // The last command draws the last object with the whole mesh.
        assert_eq!(word(80), 36);
        assert_eq!(word(84), 1);
        assert_eq!(word(96), 4);
    }
}
