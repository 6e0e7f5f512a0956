// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Binary for the gravlens desktop viewer.

#![deny(rust_2018_idioms)]
#![warn(clippy::cast_lossless)]

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use clap::Parser as _;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use gravlens::scene::{Quality, Scene};
use gravlens_gpu::{RenderError, SurfaceRenderer};

mod command_options;
use command_options::GravlensOptions;
mod textures;

static TITLE: &str = "gravlens";

/// Orbit increment per key press, radians.
const ANGLE_STEP: f64 = 0.05;
/// Zoom increment per key press, natural units.
const DISTANCE_STEP: f64 = 1.0;
/// Potential-coefficient increment per key press.
const POTENTIAL_STEP: f64 = 0.25;

fn main() -> Result<(), anyhow::Error> {
    let options = GravlensOptions::parse();

    simplelog::TermLogger::init(
        match options.verbose {
            0 => simplelog::LevelFilter::Debug,
            _ => simplelog::LevelFilter::Trace,
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(TITLE)
        .with_inner_size(PhysicalSize::new(
            options.display_size.0,
            options.display_size.1,
        ))
        .build(&event_loop)?;

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

    let mut scene = Scene::new();
    let mut quality = Quality::new(options.quality);
    let mut renderer = create_renderer(&instance, &window, &scene, quality, &options)?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => renderer.resize((size.width, size.height)),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    renderer.resize((new_inner_size.width, new_inner_size.height));
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => match key {
                    VirtualKeyCode::Escape => *control_flow = ControlFlow::Exit,
                    VirtualKeyCode::R => renderer.reset(),
                    VirtualKeyCode::S => {
                        match save_capture(&renderer, &options.capture_path) {
                            Ok(()) => log::info!("wrote {}", options.capture_path.display()),
                            Err(error) => log::error!("capture failed: {error}"),
                        }
                    }
                    VirtualKeyCode::LBracket => {
                        quality = Quality::new(quality.get().saturating_sub(1));
                        renderer.set_quality(quality);
                        log::info!("quality {}", quality.get());
                    }
                    VirtualKeyCode::RBracket => {
                        quality = Quality::new(quality.get() + 1);
                        renderer.set_quality(quality);
                        log::info!("quality {}", quality.get());
                    }
                    key => {
                        if edit_scene(&mut scene, key) {
                            renderer.set_scene(scene.clone());
                        }
                    }
                },
                _ => {}
            },
            Event::MainEventsCleared => window.request_redraw(),
            Event::RedrawRequested(_) => match renderer.render_frame() {
                Ok(info) => log::trace!(
                    "frame {} traced {} rays in {:?}",
                    info.frame_index,
                    info.ray_count,
                    info.frame_time
                ),
                Err(RenderError::Surface(
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                )) => renderer.reconfigure(),
                Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {}
                // A rejected allocation is fatal for the renderer but not
                // necessarily for the process: tear everything down and
                // try to build a fresh device.
                Err(error @ RenderError::ResourceCreation) => {
                    log::error!("{error}; attempting reinitialization");
                    match create_renderer(&instance, &window, &scene, quality, &options) {
                        Ok(new_renderer) => renderer = new_renderer,
                        Err(error) => {
                            log::error!("reinitialization failed: {error}");
                            *control_flow = ControlFlow::Exit;
                        }
                    }
                }
                Err(error) => {
                    log::error!("rendering stopped: {error}");
                    *control_flow = ControlFlow::Exit;
                }
            },
            _ => {}
        }
    });
}

/// Builds the renderer for `window`, including quality and textures. Also
/// used to rebuild from scratch after a fatal resource failure.
fn create_renderer(
    instance: &wgpu::Instance,
    window: &Window,
    scene: &Scene,
    quality: Quality,
    options: &GravlensOptions,
) -> Result<SurfaceRenderer, anyhow::Error> {
    let surface = unsafe { instance.create_surface(window) }?;
    let adapter = futures_executor::block_on(instance.request_adapter(
        &wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        },
    ))
    .ok_or_else(|| anyhow::anyhow!("no suitable graphics adapter found"))?;
    log::debug!("rendering on {:?}", adapter.get_info());

    let inner_size = window.inner_size();
    let mut renderer = futures_executor::block_on(SurfaceRenderer::new(
        scene.clone(),
        surface,
        &adapter,
        (inner_size.width, inner_size.height),
    ))?;
    renderer.set_quality(quality);

    match &options.disk_texture {
        Some(path) => {
            if let Err(error) = renderer.load_disk_texture_from_path(path) {
                log::error!("disk texture {}: {error}", path.display());
            }
        }
        None => renderer.load_disk_texture(textures::default_disk()),
    }
    match &options.sky_texture {
        Some(path) => {
            if let Err(error) = renderer.load_sky_texture_from_path(path) {
                log::error!("sky texture {}: {error}", path.display());
            }
        }
        None => renderer.load_sky_texture(textures::default_sky()),
    }

    Ok(renderer)
}

/// Applies a camera/physics key binding to the scene. Returns whether
/// anything changed (every change resets accumulation via `set_scene`).
fn edit_scene(scene: &mut Scene, key: VirtualKeyCode) -> bool {
    let camera = &mut scene.camera;
    match key {
        VirtualKeyCode::Left => {
            camera.set_horizontal_angle(camera.horizontal_angle() - ANGLE_STEP);
        }
        VirtualKeyCode::Right => {
            camera.set_horizontal_angle(camera.horizontal_angle() + ANGLE_STEP);
        }
        VirtualKeyCode::Up => {
            camera.set_vertical_angle(camera.vertical_angle() - ANGLE_STEP);
        }
        VirtualKeyCode::Down => {
            camera.set_vertical_angle(camera.vertical_angle() + ANGLE_STEP);
        }
        VirtualKeyCode::Equals | VirtualKeyCode::Plus => {
            camera.set_distance(camera.distance() - DISTANCE_STEP);
        }
        VirtualKeyCode::Minus => {
            camera.set_distance(camera.distance() + DISTANCE_STEP);
        }
        VirtualKeyCode::Q => camera.set_tilt(camera.tilt() + ANGLE_STEP),
        VirtualKeyCode::A => camera.set_tilt(camera.tilt() - ANGLE_STEP),
        VirtualKeyCode::K => {
            let k = scene.ode.potential_coefficient();
            scene.ode.set_potential_coefficient(k + POTENTIAL_STEP);
            log::info!("potential coefficient {}", scene.ode.potential_coefficient());
        }
        VirtualKeyCode::J => {
            let k = scene.ode.potential_coefficient();
            scene.ode.set_potential_coefficient(k - POTENTIAL_STEP);
            log::info!("potential coefficient {}", scene.ode.potential_coefficient());
        }
        _ => return false,
    }
    true
}

/// Reads back the output image and writes it as a PNG.
fn save_capture(renderer: &SurfaceRenderer, path: &Path) -> Result<(), anyhow::Error> {
    let (width, height) = renderer.size();
    let data = futures_executor::block_on(renderer.image_data())?;
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    Ok(())
}
