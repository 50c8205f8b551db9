//! Math utilities for placing objects on screen.
//!
//! Matrix and vector types laid out for direct upload to GPU buffers
//! (`bytemuck::Pod`, column-major, matching WGSL).

/// Column-major 4x4 matrices.
pub mod mat;
/// Three-component vectors.
pub mod vec;

pub use mat::Mat4;
pub use vec::Vec3;
