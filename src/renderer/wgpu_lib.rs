//! One wgpu device per graphics API, bound to its own window.
//!
//! This module provides [`GfxContext`], which owns the surface, device, queue and
//! depth target of one window together with that API's [`GpuTimer`]. A frame is
//! produced in three steps, each of which the application times:
//!
//! 1. [`GfxContext::clear`] acquires the next surface texture and opens a command
//!    encoder with the problem's clear values.
//! 2. [`GfxContext::render`] opens the frame's render pass (clearing, and
//!    bracketed by timestamp writes when GPU timing is available) and hands it to
//!    the problem.
//! 3. [`GfxContext::swap_buffers`] resolves the queries, submits, collects an
//!    earlier frame's GPU time without blocking and presents.

use std::sync::Arc;

use tracing::{debug, info, warn};
use winit::window::Window;

use crate::benchmarks::{GpuTime, GpuTimer};
use crate::error::{FrameError, InitError};
use crate::problems::ClearValues;
use crate::renderer::timestamp::TimestampRing;

/// Format of every depth target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Features requested when the adapter offers them. Missing ones only disable
/// the solutions that need them.
const OPTIONAL_FEATURES: wgpu::Features = wgpu::Features::TIMESTAMP_QUERY
    .union(wgpu::Features::MULTI_DRAW_INDIRECT)
    .union(wgpu::Features::INDIRECT_FIRST_INSTANCE);

/// A graphics API the application can benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ApiBackend {
    /// Vulkan.
    Vulkan,
    /// Apple Metal.
    Metal,
    /// Direct3D 12.
    Dx12,
    /// OpenGL (or GLES/WebGL through ANGLE).
    Gl,
}

impl ApiBackend {
    /// Every API, in the order windows are opened.
    pub fn all() -> [ApiBackend; 4] {
        [
            ApiBackend::Vulkan,
            ApiBackend::Metal,
            ApiBackend::Dx12,
            ApiBackend::Gl,
        ]
    }

    /// The single wgpu backend this API selects.
    pub fn backends(self) -> wgpu::Backends {
        match self {
            ApiBackend::Vulkan => wgpu::Backends::VULKAN,
            ApiBackend::Metal => wgpu::Backends::METAL,
            ApiBackend::Dx12 => wgpu::Backends::DX12,
            ApiBackend::Gl => wgpu::Backends::GL,
        }
    }

    /// Name shown in window titles and in the report.
    pub fn display_name(self) -> &'static str {
        match self {
            ApiBackend::Vulkan => "Vulkan",
            ApiBackend::Metal => "Metal",
            ApiBackend::Dx12 => "DX12",
            ApiBackend::Gl => "GL",
        }
    }
}

/// Device handles a solution needs to create its resources.
pub struct DeviceContext<'a> {
    /// Device the resources are created on.
    pub device: &'a wgpu::Device,
    /// Queue for initial uploads.
    pub queue: &'a wgpu::Queue,
    /// Format of the surface the solution renders into.
    pub color_format: wgpu::TextureFormat,
    /// Format of the depth target.
    pub depth_format: wgpu::TextureFormat,
}

impl DeviceContext<'_> {
    /// Features enabled on the device.
    pub fn features(&self) -> wgpu::Features {
        self.device.features()
    }

    /// Runs `create` inside a validation error scope and reports the first
    /// validation error it raised instead of letting it reach the device's
    /// uncaptured error handler.
    pub fn validated<T>(&self, create: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create();
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }
}

/// The open render pass of one frame.
pub struct FrameContext<'a, 'pass> {
    /// Queue for per-frame buffer writes.
    pub queue: &'a wgpu::Queue,
    /// The pass, already cleared.
    pub pass: &'a mut wgpu::RenderPass<'pass>,
    /// Width over height of the render target.
    pub aspect: f32,
}

struct FrameInFlight {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    clear: ClearValues,
    timed_slot: Option<usize>,
    pass_recorded: bool,
}

/// Surface, device and timer of one API's window.
pub struct GfxContext {
    api: ApiBackend,
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    timer: GpuTimer<TimestampRing>,
    frame: Option<FrameInFlight>,
}

impl GfxContext {
    /// Creates a device of `api` able to present to `window`.
    pub async fn new(
        api: ApiBackend,
        window: Arc<Window>,
        vsync: bool,
        query_depth: usize,
    ) -> Result<Self, InitError> {
        let name = api.display_name().to_string();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: api.backends(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|source| InitError::Surface {
                api: name.clone(),
                source,
            })?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or_else(|| InitError::Adapter { api: name.clone() })?;
        let adapter_info = adapter.get_info();
        info!(api = %name, adapter = %adapter_info.name, backend = ?adapter_info.backend, "adapter selected");

        let required_features = adapter.features() & OPTIONAL_FEATURES;
        if !required_features.contains(wgpu::Features::TIMESTAMP_QUERY) {
            warn!(api = %name, "adapter has no timestamp queries, GPU times will be N/A");
        }
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some(api.display_name()),
                    required_features,
                    required_limits: adapter.limits(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|source| InitError::Device {
                api: name.clone(),
                source,
            })?;

        let size = window.inner_size();
        let surface_config = Self::create_surface_config(
            &surface,
            &adapter,
            size.width.max(1),
            size.height.max(1),
            vsync,
        )
        .ok_or_else(|| InitError::SurfaceFormat { api: name.clone() })?;
        surface.configure(&device, &surface_config);
        let depth_view = Self::create_depth_view(&device, &surface_config);

        Ok(Self {
            api,
            window,
            surface,
            device,
            queue,
            surface_config,
            depth_view,
            timer: GpuTimer::new(query_depth),
            frame: None,
        })
    }

    /// The API this context was created for.
    pub fn api(&self) -> ApiBackend {
        self.api
    }

    /// The window this context presents to.
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Handles for creating a solution's resources on this device.
    pub fn device_context(&self) -> DeviceContext<'_> {
        DeviceContext {
            device: &self.device,
            queue: &self.queue,
            color_format: self.surface_config.format,
            depth_format: DEPTH_FORMAT,
        }
    }

    /// Reconfigures the surface and depth target for a new window size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = Self::create_depth_view(&self.device, &self.surface_config);
    }

    /// Stops GPU times of frames already submitted from being reported; they
    /// belong to the combination that was running before.
    pub fn discard_gpu_times(&mut self) {
        self.timer.discard_in_flight();
    }

    /// Begins a frame cleared to `clear`.
    pub fn clear(&mut self, clear: ClearValues) -> Result<(), FrameError> {
        if self.frame.is_some() {
            return Err(FrameError::FrameInProgress);
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!(api = self.api.display_name(), "surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Err(FrameError::SurfaceReconfigured);
            }
            Err(err) => return Err(err.into()),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let (device, queue) = (&self.device, &self.queue);
        let timed_slot = self
            .timer
            .begin_frame(|depth| TimestampRing::new(device, queue, depth));

        self.frame = Some(FrameInFlight {
            surface_texture,
            view,
            encoder,
            clear,
            timed_slot,
            pass_recorded: false,
        });
        Ok(())
    }

    /// Records the frame's render pass, letting `draw` fill it in. Returns
    /// what `draw` returned, or `None` when no frame was begun.
    pub fn render<R>(&mut self, draw: impl FnOnce(&mut FrameContext<'_, '_>) -> R) -> Option<R> {
        let frame = self.frame.as_mut()?;
        if frame.pass_recorded {
            return None;
        }
        frame.pass_recorded = true;

        let timestamp_writes = frame
            .timed_slot
            .zip(self.timer.queries())
            .map(|(slot, queries)| queries.timestamp_writes(slot));
        let mut pass = Self::begin_pass(
            &mut frame.encoder,
            &frame.view,
            &self.depth_view,
            frame.clear,
            timestamp_writes,
        );
        let mut context = FrameContext {
            queue: &self.queue,
            pass: &mut pass,
            aspect: self.surface_config.width as f32 / self.surface_config.height as f32,
        };
        Some(draw(&mut context))
    }

    /// Submits and presents the frame, returning the GPU time of an earlier one.
    pub fn swap_buffers(&mut self) -> GpuTime {
        let Some(mut frame) = self.frame.take() else {
            return GpuTime::Pending;
        };

        if !frame.pass_recorded {
            let timestamp_writes = frame
                .timed_slot
                .zip(self.timer.queries())
                .map(|(slot, queries)| queries.timestamp_writes(slot));
            let _ = Self::begin_pass(
                &mut frame.encoder,
                &frame.view,
                &self.depth_view,
                frame.clear,
                timestamp_writes,
            );
        }
        if let (Some(slot), Some(queries)) = (frame.timed_slot, self.timer.queries()) {
            queries.resolve(slot, &mut frame.encoder);
        }

        self.queue.submit(std::iter::once(frame.encoder.finish()));
        let _ = self.device.poll(wgpu::Maintain::Poll);
        let gpu_time = self.timer.end_frame();

        self.window.pre_present_notify();
        frame.surface_texture.present();
        gpu_time
    }

    fn begin_pass<'e>(
        encoder: &'e mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear: ClearValues,
        timestamp_writes: Option<wgpu::RenderPassTimestampWrites<'_>>,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("frame_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.depth),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes,
        })
    }

    fn create_surface_config(
        surface: &wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Option<wgpu::SurfaceConfiguration> {
        let capabilities = surface.get_capabilities(adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())?;

        Some(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            desired_maximum_frame_latency: 2,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        })
    }

    fn create_depth_view(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("depth_texture"),
                size: wgpu::Extent3d {
                    width: config.width,
                    height: config.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_distinct() {
        let mut names: Vec<_> = ApiBackend::all().iter().map(|a| a.display_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn each_api_maps_to_one_backend() {
        for api in ApiBackend::all() {
            assert_eq!(api.backends().iter().count(), 1);
        }
    }
}
