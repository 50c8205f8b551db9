//! Error types.
//!
//! [`InitError`] covers resource acquisition at startup; any of them ends the
//! process with a non-zero exit code. [`FrameError`] is local to one frame and
//! never stops a run.

/// Failure to acquire something the application cannot run without.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The windowing system is unavailable.
    #[error("unable to create the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// A window could not be opened.
    #[error("unable to create a window for {api}: {source}")]
    Window {
        /// API the window was meant for.
        api: String,
        /// Platform error.
        source: winit::error::OsError,
    },
    /// A surface could not be created for a window.
    #[error("unable to create a {api} surface: {source}")]
    Surface {
        /// API of the surface.
        api: String,
        /// wgpu error.
        source: wgpu::CreateSurfaceError,
    },
    /// The surface reports no usable texture format.
    #[error("the {api} surface supports no texture format")]
    SurfaceFormat {
        /// API of the surface.
        api: String,
    },
    /// No adapter of the requested backend can present to the window.
    #[error("no {api} adapter is compatible with the window")]
    Adapter {
        /// Requested API.
        api: String,
    },
    /// The adapter refused to create a device.
    #[error("unable to create a {api} device: {source}")]
    Device {
        /// API of the adapter.
        api: String,
        /// wgpu error.
        source: wgpu::RequestDeviceError,
    },
    /// Every requested API failed to initialize.
    #[error("none of the requested graphics APIs could be initialized")]
    NoApi,
    /// The problem filter matched nothing.
    #[error("no registered problem matches {0:?}")]
    NoProblem(Vec<String>),
}

/// Failure to produce one frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The surface was lost or outdated; it has been reconfigured for the next frame.
    #[error("the surface was lost or outdated and has been reconfigured")]
    SurfaceReconfigured,
    /// The next surface texture could not be acquired.
    #[error("unable to acquire the next surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    /// A frame was started while the previous one was still open.
    #[error("a frame is already being recorded")]
    FrameInProgress,
}
