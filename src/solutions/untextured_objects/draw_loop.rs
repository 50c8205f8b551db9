use crate::math::Mat4;
use crate::renderer::vertex::{Index, Vertex};
use crate::renderer::wgpu_lib::{DeviceContext, FrameContext};
use crate::solutions::SolutionError;
use crate::solutions::untextured_objects::{ObjectScene, UntexturedObjectsSolution};

/// One indexed draw call per object.
#[derive(Default)]
pub struct DrawLoop {
    scene: Option<ObjectScene>,
}

impl DrawLoop {
    /// Registered solution name.
    pub const NAME: &'static str = "UntexturedObjectsDrawLoop";
}

impl UntexturedObjectsSolution for DrawLoop {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(
        &mut self,
        device: &DeviceContext<'_>,
        vertices: &[Vertex],
        indices: &[Index],
        object_count: usize,
    ) -> Result<(), SolutionError> {
        self.scene = Some(ObjectScene::new(device, vertices, indices, object_count)?);
        Ok(())
    }

    fn render(&mut self, frame: &mut FrameContext<'_, '_>, view_proj: &Mat4, transforms: &[Mat4]) {
        let Some(scene) = &self.scene else {
            return;
        };
        scene.upload(frame.queue, view_proj, transforms);
        scene.bind(frame.pass);
        for object in 0..scene.object_count {
            frame
                .pass
                .draw_indexed(0..scene.index_count, 0, object..object + 1);
        }
    }

    fn shutdown(&mut self) {
        self.scene = None;
    }
}
