//! Vertex layout and geometry for the object problems.
//!
//! This module provides the [`Vertex`] struct shared by every solution of a
//! problem, and [`cube`] which builds the unit cube drawn once per object.

/// One vertex: position in object space and an RGBA color.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in object space.
    pub position: [f32; 3],
    /// RGBA color (normalized 0-255).
    pub color: [u8; 4],
}

impl Vertex {
    /// Returns the vertex buffer layout for use in a wgpu pipeline.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
            ],
        }
    }
}

/// Index type of every problem's index buffer.
pub type Index = u16;

/// A unit cube centered at the origin, one color per corner, wound counter-clockwise.
pub fn cube(colors: [[u8; 4]; 8]) -> (Vec<Vertex>, Vec<Index>) {
    let corners: [[f32; 3]; 8] = [
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
    ];
    let vertices = corners
        .iter()
        .zip(colors)
        .map(|(position, color)| Vertex {
            position: *position,
            color,
        })
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2, 0, 2, 3, // front
        1, 5, 6, 1, 6, 2, // right
        5, 4, 7, 5, 7, 6, // back
        4, 0, 3, 4, 3, 7, // left
        3, 2, 6, 3, 6, 7, // top
        4, 5, 1, 4, 1, 0, // bottom
    ];

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_twelve_triangles_over_eight_corners() {
        let (vertices, indices) = cube([[255; 4]; 8]);
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn vertex_stride_matches_layout() {
        assert_eq!(Vertex::desc().array_stride, 16);
    }
}
