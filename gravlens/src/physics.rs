// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Photon transport through the effective potential of a non-rotating
//! black hole.
//!
//! The integrator is a symplectic-Euler scheme chosen for stability at the
//! horizon rather than for physical fidelity: position advances first, then
//! velocity picks up the radial acceleration evaluated at the new position.
//! It is not time-reversible and uses no affine reparametrization. The
//! photon's direction is unit length at launch and is never re-normalized
//! afterwards; the magnitude drift encodes the accumulated deflection and
//! the intersection tests rely on it.

use cgmath::{InnerSpace as _, Vector3};

/// Position and velocity of one photon, in the kernel's `f32` precision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Photon {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
}

impl Photon {
    pub fn new(position: Vector3<f32>, velocity: Vector3<f32>) -> Self {
        Self { position, velocity }
    }

    /// `h² = |p × v|²`, fixed at launch and constant for the photon's
    /// lifetime.
    pub fn angular_momentum_sq(&self) -> f32 {
        self.position.cross(self.velocity).magnitude2()
    }
}

/// Step size for the next substep: `(|p|/30)·h`.
///
/// Linear scaling with distance gives fine integration near the hole and
/// coarse integration far away.
pub fn adaptive_step(radius: f32, step_size: f32) -> f32 {
    radius / 30.0 * step_size
}

/// Advances `photon` by one substep of size `s`.
///
/// `p ← p + v·s`, then `v ← v + p·(k·h²/|p|⁵)·s` with the acceleration
/// evaluated at the new position. A photon exactly at the origin receives
/// no acceleration instead of a NaN one.
pub fn substep(photon: &mut Photon, k: f32, h_sq: f32, s: f32) {
    photon.position += photon.velocity * s;
    let r2 = photon.position.magnitude2();
    if r2 > 0.0 && r2.is_finite() {
        // |p|⁵ = (|p|²)^2.5
        let accel = photon.position * (k * h_sq / (r2 * r2 * r2.sqrt()));
        photon.velocity += accel * s;
    }
}
