//! Main renderer module.
//!
//! This module contains the per-API device context, the pipeline and buffer
//! builders the solutions share, the common vertex and uniform layouts, and the
//! timestamp queries behind GPU frame timing.

/// Pipeline building utilities for WGPU.
pub mod pipeline_builder;
/// Timestamp query ring for GPU frame timing.
pub mod timestamp;
/// Camera uniforms and the object bind group.
pub mod uniform;
/// Vertex layout and cube geometry.
pub mod vertex;
/// Per-API surface, device and frame submission.
pub mod wgpu_lib;
