// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Mathematical utilities on top of [`cgmath`]: spherical coordinates and
//! zero-safe vector operations.

use cgmath::{BaseFloat, InnerSpace as _, Vector3};

/// Coordinate type for CPU-side scene math.
///
/// The GPU kernel works in `f32`; scene state is kept in `f64` and narrowed
/// at the uniform-packing boundary.
pub type FreeCoordinate = f64;

/// Converts spherical coordinates to a Cartesian vector.
///
/// The convention is polar angle `theta` measured from the +Y axis and
/// azimuth `phi` measured in the XZ plane from +X toward +Z:
/// `(r·sinθ·cosφ, r·cosθ, r·sinθ·sinφ)`.
pub fn to_cartesian<S: BaseFloat>(r: S, theta: S, phi: S) -> Vector3<S> {
    Vector3::new(
        r * theta.sin() * phi.cos(),
        r * theta.cos(),
        r * theta.sin() * phi.sin(),
    )
}

/// Converts a Cartesian vector to spherical `(r, theta, phi)` in the same
/// convention as [`to_cartesian`].
///
/// The zero vector maps to `(0, 0, 0)` rather than NaN.
pub fn to_spherical<S: BaseFloat>(v: Vector3<S>) -> (S, S, S) {
    let r = v.magnitude();
    if r == S::zero() {
        return (S::zero(), S::zero(), S::zero());
    }
    let theta = (v.y / r).acos();
    let phi = v.z.atan2(v.x);
    (r, theta, phi)
}

/// Normalizes `v`, returning the zero vector when `v` has zero or non-finite
/// length instead of producing NaN components.
pub fn normalize_or_zero<S: BaseFloat>(v: Vector3<S>) -> Vector3<S> {
    let length2 = v.magnitude2();
    if length2 == S::zero() || !length2.is_finite() {
        Vector3::new(S::zero(), S::zero(), S::zero())
    } else {
        v / length2.sqrt()
    }
}

/// `sign` with the GPU's semantics: zero maps to zero.
///
/// (`f32::signum` maps +0.0 to 1.0, which is not what the kernel's
/// plane-crossing test wants.)
pub fn sign<S: BaseFloat>(x: S) -> S {
    if x > S::zero() {
        S::one()
    } else if x < S::zero() {
        -S::one()
    } else {
        S::zero()
    }
}

/// Fractional part wrapped into `[0, 1)`, non-negative for negative inputs.
pub fn fract<S: BaseFloat>(x: S) -> S {
    x - x.floor()
}
