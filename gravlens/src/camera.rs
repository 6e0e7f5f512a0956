// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Camera state: an orbiting pose around the hole with a derived Cartesian
//! position.

use cgmath::{Deg, EuclideanSpace as _, Matrix3, Matrix4, Point3, Rad, Vector3};

use crate::math::{normalize_or_zero, to_cartesian, FreeCoordinate};

/// Valid field-of-view range, degrees.
const FOV_RANGE: std::ops::RangeInclusive<FreeCoordinate> = 30.0..=150.0;
/// Valid orbit distance range, natural units.
const DISTANCE_RANGE: std::ops::RangeInclusive<FreeCoordinate> = 5.0..=50.0;
/// Vertical angle keeps clear of the poles so the orbit basis stays stable.
const VERTICAL_MARGIN: FreeCoordinate = 0.1;

/// Camera pose.
///
/// The spherical parametrization (distance, horizontal angle, vertical
/// angle, tilt) is authoritative: only spherical mutators are exposed, and
/// each one recomputes the Cartesian position
/// `(d·sinθ·cosφ, d·cosθ, d·sinθ·sinφ)` and the tilted up vector before the
/// next frame reads them. Out-of-range inputs are clamped, never rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraPose {
    position: Point3<FreeCoordinate>,
    look_at: Point3<FreeCoordinate>,
    up: Vector3<FreeCoordinate>,
    fov_degrees: FreeCoordinate,

    distance: FreeCoordinate,
    horizontal_angle: FreeCoordinate,
    vertical_angle: FreeCoordinate,
    tilt: FreeCoordinate,
}

impl CameraPose {
    /// A pose looking at the origin from slightly above the disk plane.
    pub fn new() -> Self {
        let mut pose = Self {
            position: Point3::new(0.0, 0.0, 0.0),
            look_at: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
            fov_degrees: 80.0,
            distance: 20.0,
            horizontal_angle: std::f64::consts::FRAC_PI_2 * 3.0,
            vertical_angle: 1.42,
            tilt: 0.0,
        };
        pose.recompute();
        pose
    }

    pub fn position(&self) -> Point3<FreeCoordinate> {
        self.position
    }

    pub fn look_at(&self) -> Point3<FreeCoordinate> {
        self.look_at
    }

    pub fn up(&self) -> Vector3<FreeCoordinate> {
        self.up
    }

    pub fn fov_degrees(&self) -> FreeCoordinate {
        self.fov_degrees
    }

    /// Precomputed `tan(fov/2)`, as consumed by the kernel.
    pub fn tan_half_fov(&self) -> FreeCoordinate {
        Rad::from(Deg(self.fov_degrees / 2.0)).0.tan()
    }

    pub fn distance(&self) -> FreeCoordinate {
        self.distance
    }

    pub fn horizontal_angle(&self) -> FreeCoordinate {
        self.horizontal_angle
    }

    pub fn vertical_angle(&self) -> FreeCoordinate {
        self.vertical_angle
    }

    pub fn tilt(&self) -> FreeCoordinate {
        self.tilt
    }

    pub fn set_fov_degrees(&mut self, fov: FreeCoordinate) {
        let clamped = fov.clamp(*FOV_RANGE.start(), *FOV_RANGE.end());
        if clamped != fov {
            log::trace!("fov {fov}° clamped to {clamped}°");
        }
        self.fov_degrees = clamped;
    }

    pub fn set_look_at(&mut self, look_at: Point3<FreeCoordinate>) {
        self.look_at = look_at;
    }

    pub fn set_distance(&mut self, distance: FreeCoordinate) {
        self.distance = distance.clamp(*DISTANCE_RANGE.start(), *DISTANCE_RANGE.end());
        self.recompute();
    }

    /// Azimuth, wrapped into `[0, 2π)`.
    pub fn set_horizontal_angle(&mut self, phi: FreeCoordinate) {
        self.horizontal_angle = phi.rem_euclid(std::f64::consts::TAU);
        self.recompute();
    }

    /// Polar angle from +Y, kept off the poles.
    pub fn set_vertical_angle(&mut self, theta: FreeCoordinate) {
        self.vertical_angle =
            theta.clamp(VERTICAL_MARGIN, std::f64::consts::PI - VERTICAL_MARGIN);
        self.recompute();
    }

    /// Roll about the view axis, radians.
    pub fn set_tilt(&mut self, tilt: FreeCoordinate) {
        self.tilt = tilt;
        self.recompute();
    }

    /// Derives Cartesian state from the spherical parameters.
    fn recompute(&mut self) {
        self.position = Point3::from_vec(to_cartesian(
            self.distance,
            self.vertical_angle,
            self.horizontal_angle,
        ));
        let front = normalize_or_zero(self.look_at - self.position);
        self.up = if front == Vector3::new(0.0, 0.0, 0.0) {
            Vector3::unit_y()
        } else {
            Matrix3::from_axis_angle(front, Rad(self.tilt)) * Vector3::unit_y()
        };
    }

    /// The kernel's right-handed view basis `(front, left, up)`.
    ///
    /// `front` points from the camera to the look-at point; `left` is
    /// `up × front`; the returned up vector is re-orthogonalized as
    /// `front × left`.
    pub fn basis(
        &self,
    ) -> (
        Vector3<FreeCoordinate>,
        Vector3<FreeCoordinate>,
        Vector3<FreeCoordinate>,
    ) {
        let front = normalize_or_zero(self.look_at - self.position);
        let left = normalize_or_zero(self.up.cross(front));
        let up = front.cross(left);
        (front, left, up)
    }

    /// View matrix for the same pose, for cross-checking the basis.
    pub fn view_matrix(&self) -> Matrix4<FreeCoordinate> {
        Matrix4::look_at_rh(self.position, self.look_at, self.up)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::assert_abs_diff_eq;
    use cgmath::{EuclideanSpace as _, InnerSpace as _, Transform as _};
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn spherical_recomputation_preserves_distance() {
        let mut pose = CameraPose::new();
        for d in [5.0, 7.25, 20.0, 50.0] {
            pose.set_distance(d);
            assert_abs_diff_eq!(pose.position().to_vec().magnitude(), d, epsilon = 1e-12);
        }
        for phi in [0.0, 1.0, 3.5, TAU - 0.001] {
            pose.set_horizontal_angle(phi);
            assert_abs_diff_eq!(
                pose.position().to_vec().magnitude(),
                pose.distance(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn position_matches_convention() {
        let mut pose = CameraPose::new();
        pose.set_distance(10.0);
        pose.set_vertical_angle(FRAC_PI_2);
        pose.set_horizontal_angle(0.0);
        assert_abs_diff_eq!(
            pose.position(),
            Point3::new(10.0, 0.0, 0.0),
            epsilon = 1e-9
        );
        pose.set_horizontal_angle(FRAC_PI_2);
        assert_abs_diff_eq!(
            pose.position(),
            Point3::new(0.0, 0.0, 10.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn parameters_are_clamped() {
        let mut pose = CameraPose::new();
        pose.set_fov_degrees(500.0);
        assert_eq!(pose.fov_degrees(), 150.0);
        pose.set_fov_degrees(1.0);
        assert_eq!(pose.fov_degrees(), 30.0);
        pose.set_distance(1000.0);
        assert_eq!(pose.distance(), 50.0);
        pose.set_vertical_angle(PI);
        assert_eq!(pose.vertical_angle(), PI - 0.1);
        pose.set_vertical_angle(-3.0);
        assert_eq!(pose.vertical_angle(), 0.1);
        pose.set_horizontal_angle(-FRAC_PI_2);
        assert_abs_diff_eq!(pose.horizontal_angle(), TAU - FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn basis_is_right_handed_and_orthonormal() {
        let mut pose = CameraPose::new();
        pose.set_vertical_angle(1.0);
        pose.set_horizontal_angle(2.0);
        let (front, left, up) = pose.basis();
        assert_abs_diff_eq!(front.magnitude(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(left.magnitude(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(up.magnitude(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(front.dot(left), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(front.dot(up), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(left.cross(up), front, epsilon = 1e-9);
    }

    #[test]
    fn basis_agrees_with_view_matrix() {
        let mut pose = CameraPose::new();
        pose.set_vertical_angle(0.8);
        pose.set_horizontal_angle(4.0);
        let (front, _, _) = pose.basis();
        // look_at_rh maps the view direction to -Z.
        let view = pose.view_matrix();
        let mapped = view.transform_vector(front);
        assert_abs_diff_eq!(mapped, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-9);
    }

    #[test]
    fn tilt_rolls_the_up_vector() {
        let mut pose = CameraPose::new();
        pose.set_vertical_angle(FRAC_PI_2);
        pose.set_horizontal_angle(0.0);
        let untilted = pose.up();
        pose.set_tilt(FRAC_PI_2);
        let tilted = pose.up();
        assert_abs_diff_eq!(untilted.dot(tilted), 0.0, epsilon = 1e-9);
        pose.set_tilt(0.0);
        assert_abs_diff_eq!(pose.up(), untilted, epsilon = 1e-12);
    }
}
