// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Frame driver: owns the device-side resources of the lensing kernel and
//! schedules one compute + blit submission per frame.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use instant::Instant;
use rand::{Rng as _, SeedableRng as _};
use rand_xoshiro::Xoshiro256Plus;

use gravlens::scene::{Quality, Scene};

use crate::{FrameInfo, RenderError};

mod blit;
mod texture;
use texture::{mirrored_atlas, upload_rgba};
mod uniforms;
use uniforms::{TraceUniforms, UNIFORM_BUFFER_SIZE};

/// Format of the kernel's output image.
pub(crate) const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Compute workgroup edge; must match `@workgroup_size` in `trace.wgsl`.
const WORKGROUP_SIZE: u32 = 16;

/// Codes for the first fatal device error, recorded by the
/// uncaptured-error hook and reported by the next `step_frame`.
const FATAL_NONE: u8 = 0;
const FATAL_RESOURCE_CREATION: u8 = 1;
const FATAL_VALIDATION: u8 = 2;

/// Entry point for rendering to a window. Construct this and hand it the
/// [`wgpu::Surface`] to draw on.
pub struct SurfaceRenderer {
    surface: wgpu::Surface,
    device: Arc<wgpu::Device>,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    lens: LensRenderer,
}

impl SurfaceRenderer {
    pub async fn new(
        scene: Scene,
        surface: wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: (u32, u32),
    ) -> Result<Self, RenderError> {
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await?;
        let device = Arc::new(device);

        let capabilities = surface.get_capabilities(adapter);
        let surface_format = capabilities
            .formats
            .first()
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let lens = LensRenderer::new(device.clone(), &queue, scene, size, surface_format);

        // Allocation failures and shader miscompilation arrive here; the
        // first one is classified and recorded, and step_frame refuses to
        // submit more work.
        let fatal = lens.fatal.clone();
        device.on_uncaptured_error(Box::new(move |error| {
            log::error!("uncaptured graphics device error: {error}");
            let code = match error {
                wgpu::Error::OutOfMemory { .. } => FATAL_RESOURCE_CREATION,
                wgpu::Error::Validation { .. } => FATAL_VALIDATION,
            };
            let _ = fatal.compare_exchange(
                FATAL_NONE,
                code,
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
        }));

        Ok(Self {
            surface,
            device,
            queue,
            config,
            lens,
        })
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn scene(&self) -> &Scene {
        self.lens.scene()
    }

    pub fn size(&self) -> (u32, u32) {
        self.lens.size()
    }

    /// Sets the framebuffer dimensions to use for the next frame.
    pub fn resize(&mut self, size: (u32, u32)) {
        // wgpu insists on nonzero values -- we'd rather skip than crash.
        if size.0 == 0 || size.1 == 0 {
            return;
        }
        self.config.width = size.0;
        self.config.height = size.1;
        self.surface.configure(&self.device, &self.config);
        self.lens.resize(size);
    }

    /// Reconfigures the surface after a [`wgpu::SurfaceError::Lost`] or
    /// `Outdated` frame.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Traces one frame into the accumulator and presents it.
    pub fn render_frame(&mut self) -> Result<FrameInfo, RenderError> {
        let output = self.surface.get_current_texture()?;
        let output_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let info = self.lens.step_frame(&self.queue, Some(&output_view))?;
        output.present();
        Ok(info)
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.lens.set_scene(scene);
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.lens.set_quality(quality);
    }

    pub fn set_max_iterations(&mut self, max_iterations: u32) {
        self.lens.set_max_iterations(max_iterations);
    }

    pub fn set_jitter_scale(&mut self, jitter_scale: f32) {
        self.lens.set_jitter_scale(jitter_scale);
    }

    pub fn reset(&mut self) {
        self.lens.reset();
    }

    pub fn load_disk_texture(&mut self, image: &image::RgbaImage) {
        self.lens.load_disk_texture(&self.queue, image);
    }

    pub fn load_sky_texture(&mut self, image: &image::RgbaImage) {
        self.lens.load_sky_texture(&self.queue, image);
    }

    /// Loads, preprocesses, and installs the disk texture from a file.
    ///
    /// On failure the previously installed texture is retained and no
    /// accumulation reset occurs.
    pub fn load_disk_texture_from_path(&mut self, path: &std::path::Path) -> Result<(), RenderError> {
        let image = image::open(path)?.to_rgba8();
        self.load_disk_texture(&image);
        Ok(())
    }

    /// Loads and installs the sky texture from a file; same failure
    /// contract as [`Self::load_disk_texture_from_path`].
    pub fn load_sky_texture_from_path(&mut self, path: &std::path::Path) -> Result<(), RenderError> {
        let image = image::open(path)?.to_rgba8();
        self.load_sky_texture(&image);
        Ok(())
    }

    /// Reads back the output image as tightly packed RGBA bytes.
    pub async fn image_data(&self) -> Result<Vec<u8>, RenderError> {
        self.lens.image_data(&self.queue).await
    }
}

/// All the state, both CPU and GPU side, needed to trace and accumulate
/// frames, but not the surface they are presented on. Usable headless for
/// export-only rendering.
pub struct LensRenderer {
    device: Arc<wgpu::Device>,

    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_group_layout: wgpu::BindGroupLayout,
    compute_bind_group: Option<wgpu::BindGroup>,

    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_bind_group: Option<wgpu::BindGroup>,

    uniform_buffer: wgpu::Buffer,
    accumulation_buffer: wgpu::Buffer,
    output_texture: wgpu::Texture,
    output_view: wgpu::TextureView,

    disk_texture: wgpu::Texture,
    disk_view: wgpu::TextureView,
    sky_texture: wgpu::Texture,
    sky_view: wgpu::TextureView,
    sampler: wgpu::Sampler,

    scene: Scene,
    size: (u32, u32),
    frame_count: u32,
    rays_per_frame: u32,
    max_iterations: u32,
    jitter_scale: f32,
    seed_rng: Xoshiro256Plus,

    /// First fatal device error (a `FATAL_*` code), set by the
    /// uncaptured-error hook; once nonzero, no more submissions.
    fatal: Arc<AtomicU8>,
}

impl LensRenderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: &wgpu::Queue,
        scene: Scene,
        size: (u32, u32),
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let compute_bind_group_layout = Self::create_compute_bind_group_layout(&device);
        let compute_pipeline = Self::create_compute_pipeline(&device, &compute_bind_group_layout);
        let blit_bind_group_layout = blit::create_blit_bind_group_layout(&device);
        let blit_pipeline =
            blit::create_blit_pipeline(&device, &blit_bind_group_layout, surface_format);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LensRenderer::uniform_buffer"),
            size: UNIFORM_BUFFER_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let accumulation_buffer = create_accumulation_buffer(&device, size);
        let (output_texture, output_view) = create_output_texture(&device, size);

        let placeholder = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let (disk_texture, disk_view) = upload_rgba(
            &device,
            queue,
            "LensRenderer::disk_texture",
            &mirrored_atlas(&placeholder),
        );
        let (sky_texture, sky_view) =
            upload_rgba(&device, queue, "LensRenderer::sky_texture", &placeholder);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("LensRenderer::sampler"),
            address_mode_u: wgpu::AddressMode::MirrorRepeat,
            address_mode_v: wgpu::AddressMode::MirrorRepeat,
            address_mode_w: wgpu::AddressMode::MirrorRepeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: 16,
            ..Default::default()
        });

        let quality = Quality::default();

        Self {
            device,
            compute_pipeline,
            compute_bind_group_layout,
            compute_bind_group: None,
            blit_pipeline,
            blit_bind_group_layout,
            blit_bind_group: None,
            uniform_buffer,
            accumulation_buffer,
            output_texture,
            output_view,
            disk_texture,
            disk_view,
            sky_texture,
            sky_view,
            sampler,
            scene,
            size,
            frame_count: 0,
            rays_per_frame: quality.rays_per_frame(),
            max_iterations: quality.max_iterations(),
            jitter_scale: 20.0,
            seed_rng: Xoshiro256Plus::seed_from_u64(0x6772_6176_6c65_6e73),
            fatal: Arc::new(AtomicU8::new(FATAL_NONE)),
        }
    }

    fn create_compute_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                // Binding for the uniform block
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding for the accumulation buffer
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding for the output image
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: OUTPUT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                // Binding for the disk texture
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                // Binding for the sky texture
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                // Binding for the sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("compute_bind_group_layout"),
        })
    }

    fn create_compute_pipeline(
        device: &wgpu::Device,
        compute_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::ComputePipeline {
        let trace_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("LensRenderer::trace_shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("in_wgpu/shaders/trace.wgsl"))),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("LensRenderer::compute_pipeline_layout"),
            bind_group_layouts: &[compute_bind_group_layout],
            push_constant_ranges: &[],
        });
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("LensRenderer::compute_pipeline"),
            layout: Some(&pipeline_layout),
            module: &trace_shader,
            entry_point: "trace_main",
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_compute_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        accumulation_buffer: &wgpu::Buffer,
        output_view: &wgpu::TextureView,
        disk_view: &wgpu::TextureView,
        sky_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: accumulation_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(disk_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(sky_view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("LensRenderer::compute_bind_group"),
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Frames accumulated since the last reset.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Whether the device has reported an unrecoverable error.
    pub fn halted(&self) -> bool {
        self.fatal.load(Ordering::Relaxed) != FATAL_NONE
    }

    /// The recorded fatal error, if any, as the variant `step_frame`
    /// reports.
    fn fatal_error(&self) -> Option<RenderError> {
        match self.fatal.load(Ordering::Relaxed) {
            FATAL_NONE => None,
            FATAL_RESOURCE_CREATION => Some(RenderError::ResourceCreation),
            FATAL_VALIDATION => Some(RenderError::ShaderCompilation),
            _ => Some(RenderError::DeviceLost),
        }
    }

    /// Restarts progressive accumulation; the next frame writes through.
    pub fn reset(&mut self) {
        self.frame_count = 0;
    }

    /// Destroys and recreates the size-dependent resources.
    pub fn resize(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 || size == self.size {
            return;
        }
        log::trace!("LensRenderer::resize {size:?}");
        self.size = size;
        let (output_texture, output_view) = create_output_texture(&self.device, size);
        let old_output = std::mem::replace(&mut self.output_texture, output_texture);
        self.output_view = output_view;
        let old_accumulation =
            std::mem::replace(&mut self.accumulation_buffer, create_accumulation_buffer(&self.device, size));
        self.compute_bind_group = None;
        self.blit_bind_group = None;
        old_output.destroy();
        old_accumulation.destroy();
        self.reset();
    }

    pub fn set_scene(&mut self, scene: Scene) {
        if scene != self.scene {
            self.scene = scene;
            self.reset();
        }
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.rays_per_frame = quality.rays_per_frame();
        self.set_max_iterations(quality.max_iterations());
    }

    pub fn set_max_iterations(&mut self, max_iterations: u32) {
        if max_iterations != self.max_iterations {
            self.max_iterations = max_iterations;
            self.reset();
        }
    }

    pub fn set_jitter_scale(&mut self, jitter_scale: f32) {
        if jitter_scale != self.jitter_scale {
            self.jitter_scale = jitter_scale;
            self.reset();
        }
    }

    /// Preprocesses `image` into the mirrored atlas and installs it as the
    /// disk texture. The old texture is destroyed only after the
    /// replacement bind group is in place.
    pub fn load_disk_texture(&mut self, queue: &wgpu::Queue, image: &image::RgbaImage) {
        let atlas = mirrored_atlas(image);
        let (texture, view) =
            upload_rgba(&self.device, queue, "LensRenderer::disk_texture", &atlas);
        self.disk_view = view;
        let old = std::mem::replace(&mut self.disk_texture, texture);
        self.rebind_textures();
        old.destroy();
        self.reset();
    }

    /// Installs `image`, unmodified, as the sky texture; same swap
    /// protocol as [`Self::load_disk_texture`].
    pub fn load_sky_texture(&mut self, queue: &wgpu::Queue, image: &image::RgbaImage) {
        let (texture, view) = upload_rgba(&self.device, queue, "LensRenderer::sky_texture", image);
        self.sky_view = view;
        let old = std::mem::replace(&mut self.sky_texture, texture);
        self.rebind_textures();
        old.destroy();
        self.reset();
    }

    fn rebind_textures(&mut self) {
        self.compute_bind_group = Some(Self::create_compute_bind_group(
            &self.device,
            &self.compute_bind_group_layout,
            &self.uniform_buffer,
            &self.accumulation_buffer,
            &self.output_view,
            &self.disk_view,
            &self.sky_view,
            &self.sampler,
        ));
    }

    /// Packs this frame's uniforms, dispatches the kernel over every
    /// pixel, and (when a target is given) records the presentation blit,
    /// all in one submission so the compute-to-blit ordering is enforced
    /// by the batch.
    pub fn step_frame(
        &mut self,
        queue: &wgpu::Queue,
        present_target: Option<&wgpu::TextureView>,
    ) -> Result<FrameInfo, RenderError> {
        if let Some(error) = self.fatal_error() {
            return Err(error);
        }
        let start_frame_time = Instant::now();
        let (width, height) = self.size;

        let uniforms = TraceUniforms::new(
            &self.scene,
            self.size,
            self.frame_count,
            self.rays_per_frame,
            self.seed_rng.gen(),
            self.max_iterations,
            self.jitter_scale,
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("LensRenderer::step_frame()"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("step_frame() trace pass"),
            });
            compute_pass.set_pipeline(&self.compute_pipeline);
            compute_pass.set_bind_group(
                0,
                self.compute_bind_group.get_or_insert_with(|| {
                    Self::create_compute_bind_group(
                        &self.device,
                        &self.compute_bind_group_layout,
                        &self.uniform_buffer,
                        &self.accumulation_buffer,
                        &self.output_view,
                        &self.disk_view,
                        &self.sky_view,
                        &self.sampler,
                    )
                }),
                &[],
            );
            compute_pass.dispatch_workgroups(
                (width + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE,
                (height + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE,
                1,
            );
        }

        if let Some(target) = present_target {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("step_frame() blit pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            render_pass.set_pipeline(&self.blit_pipeline);
            render_pass.set_bind_group(
                0,
                self.blit_bind_group.get_or_insert_with(|| {
                    self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout: &self.blit_bind_group_layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: wgpu::BindingResource::TextureView(&self.output_view),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::Sampler(&self.sampler),
                            },
                        ],
                        label: Some("LensRenderer::blit_bind_group"),
                    })
                }),
                &[],
            );
            render_pass.draw(0..6, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));

        let frame_index = self.frame_count;
        self.frame_count += 1;
        Ok(FrameInfo {
            frame_index,
            ray_count: width as usize * height as usize,
            frame_time: start_frame_time.elapsed(),
        })
    }

    /// Copies the output image to a staging buffer and maps it, returning
    /// tightly packed RGBA bytes of length `4·W·H`.
    pub async fn image_data(&self, queue: &wgpu::Queue) -> Result<Vec<u8>, RenderError> {
        let (width, height) = self.size;
        let unpadded_bytes_per_row = 4 * width;
        let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row =
            (unpadded_bytes_per_row + alignment - 1) / alignment * alignment;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LensRenderer::image_data() staging"),
            size: u64::from(padded_bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("LensRenderer::image_data()"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.output_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = futures_channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.await.map_err(|_| RenderError::DeviceLost)??;

        let mut pixels =
            Vec::with_capacity(unpadded_bytes_per_row as usize * height as usize);
        {
            let view = slice.get_mapped_range();
            for row in 0..height as usize {
                let begin = row * padded_bytes_per_row as usize;
                pixels.extend_from_slice(&view[begin..begin + unpadded_bytes_per_row as usize]);
            }
        }
        staging.unmap();
        staging.destroy();
        Ok(pixels)
    }
}

fn create_output_texture(
    device: &wgpu::Device,
    size: (u32, u32),
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("LensRenderer::output_texture"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// One RGBA `f32` quadruple per pixel.
fn create_accumulation_buffer(device: &wgpu::Device, size: (u32, u32)) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("LensRenderer::accumulation_buffer"),
        size: u64::from(size.0) * u64::from(size.1) * 16,
        usage: wgpu::BufferUsages::STORAGE,
        mapped_at_creation: false,
    })
}
