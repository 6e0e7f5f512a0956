// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! GPU rendering for [`gravlens`] via the [`wgpu`] WebGPU-in-Rust graphics
//! library.
//!
//! The compute kernel in `in_wgpu/shaders/trace.wgsl` implements the
//! per-pixel routine defined by [`gravlens::trace`]; this crate owns the
//! device resources around it and drives one frame per
//! [`SurfaceRenderer::render_frame`] call.

use std::time::Duration;

mod in_wgpu;
pub use in_wgpu::{LensRenderer, SurfaceRenderer};

/// Errors arising from GPU rendering.
///
/// Allocation failures and shader miscompilation do not return through
/// `Result` in wgpu's model; they arrive on the uncaptured-error channel,
/// which the renderer hooks to log, classify, and halt further
/// submissions. The next `step_frame` then reports the classified error:
/// [`RenderError::ResourceCreation`] for rejected allocations,
/// [`RenderError::ShaderCompilation`] for validation failures, and
/// [`RenderError::DeviceLost`] only for an actual device loss.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// No graphics adapter, or the adapter refused a device.
    #[error("graphics device unavailable")]
    UnsupportedDevice(#[from] wgpu::RequestDeviceError),

    /// A buffer, texture, or pipeline allocation was rejected. Fatal for
    /// the frame; the outer driver may respond with a full
    /// reinitialization attempt.
    #[error("graphics resource allocation failed")]
    ResourceCreation,

    /// A shader failed to compile or a pipeline failed validation; no
    /// frames can be produced.
    #[error("shader compilation or validation failed")]
    ShaderCompilation,

    /// Could not acquire a frame from the window surface.
    #[error("window surface unavailable")]
    Surface(#[from] wgpu::SurfaceError),

    /// A texture file could not be read or decoded. The previously loaded
    /// texture is retained.
    #[error("texture load failed; keeping the previous texture")]
    TextureLoad(#[from] image::ImageError),

    /// Reading back the output image failed.
    #[error("image export failed")]
    ImageExport(#[from] wgpu::BufferAsyncError),

    /// The device was lost; no further frames will be submitted.
    #[error("graphics device lost; rendering halted")]
    DeviceLost,
}

/// Information about one completed frame, in the spirit of a render-info
/// struct: enough to drive progress display and logging.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct FrameInfo {
    /// Which frame of the progressive accumulation this was (0-based).
    pub frame_index: u32,
    /// Rays traced, i.e. one per pixel.
    pub ray_count: usize,
    /// Wall-clock time spent preparing and submitting the frame.
    pub frame_time: Duration,
}
