// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Per-pixel semantics of the ray-tracing kernel.
//!
//! `trace.wgsl` in `gravlens-gpu` implements exactly this routine, constant
//! for constant, one compute invocation per pixel. The functions here are
//! the authoritative definition that the test suite can exercise without a
//! GPU device; they are not a product rendering path.

use cgmath::{EuclideanSpace as _, InnerSpace as _, Vector3};

use crate::color::RayColor;
use crate::mapping::{sample_disk, sky_uv};
use crate::math::{normalize_or_zero, sign, to_spherical};
use crate::physics::{adaptive_step, substep, Photon};
use crate::scene::Scene;
use crate::texture::RgbaTexture;

/// Rounds of bisection used to refine a horizon crossing.
const HORIZON_REFINE_ROUNDS: u32 = 10;
/// Half-thickness of the slab in which a refined horizon crossing counts as
/// hitting the disk on the way in.
const DISK_SLAB_HALF_THICKNESS: f32 = 0.1;

/// Everything the kernel reads per frame, in the kernel's `f32` precision.
///
/// Mirrors the GPU uniform block field for field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceParams {
    pub camera_position: Vector3<f32>,
    pub look_at: Vector3<f32>,
    pub up: Vector3<f32>,
    pub tan_half_fov: f32,
    pub potential_coefficient: f32,
    pub step_size: f32,
    pub width: u32,
    pub height: u32,
    pub frame: u32,
    pub random_seed: f32,
    pub max_iterations: u32,
    pub jitter_scale: f32,
    pub disk_inner_radius: f32,
    pub disk_outer_radius: f32,
    pub horizon_radius: f32,
    pub sky_radius: f32,
    pub sky_phi_offset: f32,
}

impl TraceParams {
    /// Narrows scene state to the kernel's inputs.
    ///
    /// Absent hitables disable their checks: a missing disk gets an empty
    /// annulus, a missing horizon a zero radius, a missing sky an infinite
    /// one.
    pub fn from_scene(
        scene: &Scene,
        width: u32,
        height: u32,
        frame: u32,
        random_seed: f32,
        max_iterations: u32,
        jitter_scale: f32,
    ) -> Self {
        let (disk_inner, disk_outer) = scene.disk().unwrap_or((0.0, 0.0));
        let horizon = scene.horizon().unwrap_or(0.0);
        let (sky, sky_phi_offset) = scene.sky().unwrap_or((f64::INFINITY, 0.0));
        let camera = &scene.camera;
        Self {
            camera_position: camera.position().to_vec().cast::<f32>().unwrap(),
            look_at: camera.look_at().to_vec().cast::<f32>().unwrap(),
            up: camera.up().cast::<f32>().unwrap(),
            tan_half_fov: camera.tan_half_fov() as f32,
            potential_coefficient: scene.ode.potential_coefficient() as f32,
            step_size: scene.ode.step_size() as f32,
            width,
            height,
            frame,
            random_seed,
            max_iterations,
            jitter_scale,
            disk_inner_radius: disk_inner as f32,
            disk_outer_radius: disk_outer as f32,
            horizon_radius: horizon as f32,
            sky_radius: sky as f32,
            sky_phi_offset: sky_phi_offset as f32,
        }
    }
}

/// PCG-style integer mix; identical constants in `trace.wgsl`.
fn pcg_hash(x: u32) -> u32 {
    let state = x.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Jitter offset in the unit disk, hashed from pixel, frame, and seed.
pub fn jitter_in_unit_disk(i: u32, j: u32, frame: u32, seed: f32) -> (f32, f32) {
    let mut h = pcg_hash(i ^ pcg_hash(j ^ pcg_hash(frame ^ seed.to_bits())));
    let u1 = (h >> 8) as f32 / 16_777_216.0;
    h = pcg_hash(h);
    let u2 = (h >> 8) as f32 / 16_777_216.0;
    let r = u1.sqrt();
    let angle = std::f32::consts::TAU * u2;
    (r * angle.cos(), r * angle.sin())
}

/// Refines a horizon crossing bracketed by `[0, s]` from `start`.
///
/// Each round re-runs the substep from `start` with the trial size; after
/// [`HORIZON_REFINE_ROUNDS`] rounds the bracket has width `2⁻¹⁰·s`.
fn refine_horizon_crossing(start: Photon, k: f32, h_sq: f32, s: f32, r_h_sq: f32) -> Photon {
    let mut lo = 0.0f32;
    let mut hi = s;
    let mut crossing = start;
    for _ in 0..HORIZON_REFINE_ROUNDS {
        let mid = 0.5 * (lo + hi);
        crossing = start;
        substep(&mut crossing, k, h_sq, mid);
        if crossing.position.magnitude2() < r_h_sq {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    crossing
}

/// Traces the photon for pixel `(i, j)` and returns its color for this
/// frame.
///
/// The returned color is *not* accumulated; fold it into the running mean
/// with [`crate::color::accumulate`].
pub fn trace_pixel(
    params: &TraceParams,
    disk_texture: &RgbaTexture,
    sky_texture: &RgbaTexture,
    i: u32,
    j: u32,
) -> RayColor {
    let width = params.width as f32;
    let height = params.height as f32;
    let aspect = width / height;
    let t = params.tan_half_fov;

    // Camera-space pixel coordinates with decaying jitter.
    let mut x = (i as f32 / width - 0.5) * t;
    let mut y = (-(j as f32) / height + 0.5) * aspect * t;
    let (jx, jy) = jitter_in_unit_disk(i, j, params.frame, params.random_seed);
    let amplitude = params.jitter_scale / (1.0 + 0.1 * params.frame as f32);
    x += jx * amplitude * t / width;
    y += jy * amplitude * aspect * t / height;

    let front = normalize_or_zero(params.look_at - params.camera_position);
    let left = normalize_or_zero(params.up.cross(front));
    let up = front.cross(left);

    let direction = normalize_or_zero(left * x + up * y + front);
    if direction == Vector3::new(0.0, 0.0, 0.0) {
        // Degenerate camera; skip the ray rather than integrate garbage.
        return RayColor::TRANSPARENT;
    }

    let mut photon = Photon::new(params.camera_position, direction);
    let h_sq = photon.angular_momentum_sq();
    let k = params.potential_coefficient;

    let r_h_sq = params.horizon_radius * params.horizon_radius;
    let r_sky_sq = params.sky_radius * params.sky_radius;
    let inner_sq = params.disk_inner_radius * params.disk_inner_radius;
    let outer_sq = params.disk_outer_radius * params.disk_outer_radius;

    let mut color = RayColor::TRANSPARENT;

    for _ in 0..params.max_iterations {
        let previous = photon;
        let r_sq_prev = previous.position.magnitude2();
        if r_sq_prev == 0.0 || !r_sq_prev.is_finite() {
            break;
        }
        let s = adaptive_step(r_sq_prev.sqrt(), params.step_size);
        substep(&mut photon, k, h_sq, s);
        let r_sq = photon.position.magnitude2();

        // Horizon crossing, refined by bisection. A crossing inside the
        // disk slab paints the disk; everything else is swallowed.
        if r_sq < r_h_sq && r_sq_prev > r_h_sq {
            let crossing = refine_horizon_crossing(previous, k, h_sq, s, r_h_sq);
            let c = crossing.position;
            let rho_sq = c.x * c.x + c.z * c.z;
            if c.y.abs() < DISK_SLAB_HALF_THICKNESS && rho_sq >= inner_sq && rho_sq <= outer_sq
            {
                color = sample_disk(
                    disk_texture,
                    rho_sq.sqrt(),
                    c.z.atan2(c.x),
                    params.disk_inner_radius,
                    params.disk_outer_radius,
                );
            } else {
                color = color.blend_additive(RayColor::BLACK);
            }
            return color;
        }

        // Disk plane crossing: composite and keep integrating, so the sky
        // behind a translucent disk still contributes.
        let side = -sign(previous.position.y);
        if photon.position.y * side >= 0.0 {
            let p = photon.position;
            let rho_sq = p.x * p.x + p.z * p.z;
            if rho_sq >= inner_sq && rho_sq <= outer_sq {
                let sample = sample_disk(
                    disk_texture,
                    rho_sq.sqrt(),
                    p.z.atan2(p.x),
                    params.disk_inner_radius,
                    params.disk_outer_radius,
                );
                color = color.blend_additive(sample);
            }
        }

        // Sky escape.
        if r_sq > r_sky_sq {
            let (_, theta, phi) = to_spherical(photon.position);
            let (u, v) = sky_uv(theta, phi + params.sky_phi_offset);
            color = color.blend_additive(sky_texture.sample(u, v));
            return color;
        }
    }

    // Iteration budget exhausted without escaping; whatever composited so
    // far (typically nothing) stands.
    color
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{accumulate, Rgba};
    use crate::scene::{Hitable, Scene};

    fn params_for(scene: &Scene, size: u32, max_iterations: u32) -> TraceParams {
        let mut p = TraceParams::from_scene(scene, size, size, 0, 0.123, max_iterations, 20.0);
        // The convergence tests want deterministic ray centers.
        p.jitter_scale = 0.0;
        p
    }

    fn camera_on_axis(scene: &mut Scene, distance: f64) {
        // Equatorial orbit position on the -z axis, looking at the origin.
        scene.camera.set_distance(distance);
        scene
            .camera
            .set_vertical_angle(std::f64::consts::FRAC_PI_2);
        scene
            .camera
            .set_horizontal_angle(std::f64::consts::FRAC_PI_2 * 3.0);
    }

    #[test]
    fn jitter_stays_in_unit_disk_and_is_deterministic() {
        for i in 0..16 {
            for j in 0..16 {
                let (x, y) = jitter_in_unit_disk(i, j, 7, 0.5);
                assert!(x * x + y * y <= 1.0 + 1e-6);
                assert_eq!((x, y), jitter_in_unit_disk(i, j, 7, 0.5));
            }
        }
        assert_ne!(
            jitter_in_unit_disk(1, 2, 3, 0.5),
            jitter_in_unit_disk(1, 2, 4, 0.5)
        );
    }

    #[test]
    fn bisection_narrows_to_scaled_tolerance() {
        let start = Photon::new(Vector3::new(0.0, 0.0, -3.0), Vector3::new(0.0, 0.0, 1.0));
        let s = 2.0;
        let crossing = refine_horizon_crossing(start, 0.0, 0.0, s, 4.0);
        // Straight-line motion: the true crossing of |p| = 2 is at
        // substep size 1.0.
        let crossed_at = (crossing.position.z - start.position.z) / start.velocity.z;
        assert!(
            (crossed_at - 1.0).abs() <= s * 2f32.powi(-10),
            "crossed at {crossed_at}"
        );
    }

    #[test]
    fn empty_scene_stays_transparent() {
        let mut scene = Scene::with_hitables(vec![]);
        scene.ode.set_potential_coefficient(0.0);
        camera_on_axis(&mut scene, 20.0);
        let params = params_for(&scene, 8, 500);
        let disk = RgbaTexture::solid(Rgba::WHITE);
        let sky = RgbaTexture::solid(Rgba::WHITE);
        for i in 0..8 {
            for j in 0..8 {
                assert_eq!(
                    trace_pixel(&params, &disk, &sky, i, j),
                    RayColor::TRANSPARENT
                );
            }
        }
    }

    #[test]
    fn white_sky_fills_every_pixel_in_one_frame() {
        let mut scene = Scene::with_hitables(vec![Hitable::Sky {
            r_sky: 30.0,
            phi_offset: 0.0,
        }]);
        scene.ode.set_potential_coefficient(0.0);
        camera_on_axis(&mut scene, 20.0);
        let params = params_for(&scene, 8, 5_000);
        let disk = RgbaTexture::solid(Rgba::TRANSPARENT);
        let sky = RgbaTexture::solid(Rgba::WHITE);
        for i in 0..8 {
            for j in 0..8 {
                let color = trace_pixel(&params, &disk, &sky, i, j);
                assert_eq!(color.to_rgba(), Rgba::WHITE, "pixel ({i}, {j})");
                // One frame of accumulation from reset state is the color
                // itself.
                assert_eq!(accumulate(RayColor::TRANSPARENT, color, 0), color);
            }
        }
    }

    #[test]
    fn horizon_silhouette_is_black_center_transparent_rim() {
        let mut scene = Scene::with_hitables(vec![Hitable::Horizon { r_h: 2.0 }]);
        camera_on_axis(&mut scene, 20.0);
        // Even size so pixel (16, 16) is the exact axial ray.
        let size = 32;
        let params = params_for(&scene, size, 5_000);
        let disk = RgbaTexture::solid(Rgba::WHITE);
        let sky = RgbaTexture::solid(Rgba::WHITE);
        let center = trace_pixel(&params, &disk, &sky, size / 2, size / 2);
        assert_eq!(center.to_rgba(), Rgba::BLACK);
        let corner = trace_pixel(&params, &disk, &sky, 0, 0);
        assert_eq!(corner, RayColor::TRANSPARENT);
    }

    #[test]
    fn disk_through_horizon_paints_disk() {
        // A disk reaching inside the horizon radius: the axial photon's
        // refined crossing at ρ ≈ r_h lies in both the slab and the
        // annulus, so the disk texture wins over black.
        let mut scene = Scene::with_hitables(vec![
            Hitable::TexturedDisk {
                r_inner: 0.5,
                r_outer: 12.0,
            },
            Hitable::Horizon { r_h: 2.0 },
        ]);
        scene.ode.set_potential_coefficient(0.0);
        camera_on_axis(&mut scene, 20.0);
        let size = 32;
        let params = params_for(&scene, size, 20_000);
        let red = RgbaTexture::solid(Rgba::new(255, 0, 0, 255));
        let sky = RgbaTexture::solid(Rgba::new(0, 0, 255, 255));
        // The central ray travels through y = 0 the whole way and crosses
        // the horizon at y exactly 0.
        let center = trace_pixel(&params, &red, &sky, size / 2, size / 2);
        assert!(
            center.r > 200.0 && center.g < 60.0,
            "expected disk color, got {center:?}"
        );
    }

    #[test]
    fn full_scene_rim_sees_sky() {
        let mut scene = Scene::new();
        camera_on_axis(&mut scene, 20.0);
        let size = 32;
        let params = params_for(&scene, size, 30_000);
        let red = RgbaTexture::solid(Rgba::new(255, 0, 0, 255));
        let blue = RgbaTexture::solid(Rgba::new(0, 0, 255, 255));
        // Off-axis pixels escape to the sky (possibly through the disk):
        // they carry blue.
        let corner = trace_pixel(&params, &red, &blue, 0, 0);
        assert!(corner.b > 200.0, "expected sky light, got {corner:?}");
        assert_eq!(corner.a, 255.0);
    }

    #[test]
    fn reset_semantics_write_through() {
        // After a parameter change the accumulator restarts: frame 0
        // ignores the prior value entirely.
        let mut scene = Scene::with_hitables(vec![Hitable::Sky {
            r_sky: 30.0,
            phi_offset: 0.0,
        }]);
        scene.ode.set_potential_coefficient(0.0);
        camera_on_axis(&mut scene, 20.0);
        let params = params_for(&scene, 8, 5_000);
        let disk = RgbaTexture::solid(Rgba::TRANSPARENT);
        let sky = RgbaTexture::solid(Rgba::new(10, 200, 30, 255));
        let fresh = trace_pixel(&params, &disk, &sky, 3, 3);
        let stale = RayColor::new(250.0, 250.0, 250.0, 255.0);
        assert_eq!(accumulate(stale, fresh, 0), fresh);
    }
}
