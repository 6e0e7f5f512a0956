// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! The per-frame uniform block consumed by `trace.wgsl`.

use gravlens::scene::Scene;
use gravlens::trace::TraceParams;

/// Byte size of the uniform buffer; the block is padded to this with
/// reserved slots.
pub(crate) const UNIFORM_BUFFER_SIZE: u64 = 256;

/// Kernel inputs in GPU layout: 16-byte slots, all single-precision floats
/// except `rays_per_frame`.
///
/// Field order is load-bearing; `trace.wgsl` declares the same struct and
/// the tests below pin every offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct TraceUniforms {
    camera_position: [f32; 3],
    _pad0: f32,
    look_at: [f32; 3],
    _pad1: f32,
    up: [f32; 3],
    _pad2: f32,

    fov_degrees: f32,
    tan_half_fov: f32,
    _pad3: [f32; 2],

    potential_coefficient: f32,
    step_size: f32,
    _pad4: [f32; 2],

    width: f32,
    height: f32,
    frame_count: f32,
    rays_per_frame: u32,

    disk_inner_radius: f32,
    disk_outer_radius: f32,
    sky_radius: f32,
    horizon_radius: f32,

    random_seed: f32,
    max_iterations: f32,
    jitter_scale: f32,
    sky_phi_offset: f32,

    _reserved: [[f32; 4]; 8],
}

impl TraceUniforms {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        scene: &Scene,
        (width, height): (u32, u32),
        frame_count: u32,
        rays_per_frame: u32,
        random_seed: f32,
        max_iterations: u32,
        jitter_scale: f32,
    ) -> Self {
        let p = TraceParams::from_scene(
            scene,
            width,
            height,
            frame_count,
            random_seed,
            max_iterations,
            jitter_scale,
        );
        Self {
            camera_position: p.camera_position.into(),
            _pad0: 0.0,
            look_at: p.look_at.into(),
            _pad1: 0.0,
            up: p.up.into(),
            _pad2: 0.0,
            fov_degrees: scene.camera.fov_degrees() as f32,
            tan_half_fov: p.tan_half_fov,
            _pad3: [0.0; 2],
            potential_coefficient: p.potential_coefficient,
            step_size: p.step_size,
            _pad4: [0.0; 2],
            width: p.width as f32,
            height: p.height as f32,
            frame_count: p.frame as f32,
            rays_per_frame,
            disk_inner_radius: p.disk_inner_radius,
            disk_outer_radius: p.disk_outer_radius,
            sky_radius: p.sky_radius,
            horizon_radius: p.horizon_radius,
            random_seed: p.random_seed,
            max_iterations: p.max_iterations as f32,
            jitter_scale: p.jitter_scale,
            sky_phi_offset: p.sky_phi_offset,
            _reserved: [[0.0; 4]; 8],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn offset_of<T>(instance: &TraceUniforms, field: &T) -> usize {
        (field as *const T as usize) - (instance as *const TraceUniforms as usize)
    }

    #[test]
    fn size_is_pinned() {
        assert_eq!(
            std::mem::size_of::<TraceUniforms>() as u64,
            UNIFORM_BUFFER_SIZE
        );
    }

    #[test]
    fn slot_offsets_are_pinned() {
        let u = bytemuck::Zeroable::zeroed();
        let u: &TraceUniforms = &u;
        assert_eq!(offset_of(u, &u.camera_position), 0);
        assert_eq!(offset_of(u, &u.look_at), 16);
        assert_eq!(offset_of(u, &u.up), 32);
        assert_eq!(offset_of(u, &u.fov_degrees), 48);
        assert_eq!(offset_of(u, &u.tan_half_fov), 52);
        assert_eq!(offset_of(u, &u.potential_coefficient), 64);
        assert_eq!(offset_of(u, &u.step_size), 68);
        assert_eq!(offset_of(u, &u.width), 80);
        assert_eq!(offset_of(u, &u.height), 84);
        assert_eq!(offset_of(u, &u.frame_count), 88);
        assert_eq!(offset_of(u, &u.rays_per_frame), 92);
        assert_eq!(offset_of(u, &u.disk_inner_radius), 96);
        assert_eq!(offset_of(u, &u.disk_outer_radius), 100);
        assert_eq!(offset_of(u, &u.sky_radius), 104);
        assert_eq!(offset_of(u, &u.horizon_radius), 108);
        assert_eq!(offset_of(u, &u.random_seed), 112);
        assert_eq!(offset_of(u, &u.max_iterations), 116);
        assert_eq!(offset_of(u, &u.jitter_scale), 120);
        assert_eq!(offset_of(u, &u.sky_phi_offset), 124);
        assert_eq!(offset_of(u, &u._reserved), 128);
    }

    #[test]
    fn packing_from_scene() {
        let scene = Scene::new();
        let u = TraceUniforms::new(&scene, (640, 480), 3, 2500, 0.5, 40_000, 20.0);
        assert_eq!(u.width, 640.0);
        assert_eq!(u.height, 480.0);
        assert_eq!(u.frame_count, 3.0);
        assert_eq!(u.rays_per_frame, 2500);
        assert_eq!(u.disk_inner_radius, 2.6);
        assert_eq!(u.disk_outer_radius, 12.0);
        assert_eq!(u.sky_radius, 30.0);
        assert_eq!(u.horizon_radius, 2.0);
        assert_eq!(u.max_iterations, 40_000.0);
        assert_eq!(u.potential_coefficient, -1.5);
        assert_eq!(u.step_size, 0.16);
        assert_eq!(u.fov_degrees, 80.0);
        let tan = (40.0f64).to_radians().tan() as f32;
        assert!((u.tan_half_fov - tan).abs() < 1e-6);
    }
}
