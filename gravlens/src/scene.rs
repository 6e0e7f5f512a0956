// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Scene model: the hitable surfaces, the integration parameters, and the
//! quality knob.

use crate::camera::CameraPose;
use crate::math::FreeCoordinate;

/// Surfaces a photon can intersect.
///
/// This is deliberately a closed set rather than a trait: the compute kernel
/// handles each case in a fixed order (horizon, disk, sky) with no dispatch
/// on the hot path, and the uniform layout has exactly one radius slot per
/// kind. Consequently the kernel traces at most one hitable of each kind:
/// the first in list order. Extra same-kind entries are accepted but never
/// bound (see [`Scene::set_hitables`]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hitable {
    /// Flat annulus in the y = 0 plane. Requires `0 < r_inner < r_outer`.
    TexturedDisk {
        r_inner: FreeCoordinate,
        r_outer: FreeCoordinate,
    },
    /// Event horizon; photons crossing inward are lost.
    Horizon { r_h: FreeCoordinate },
    /// Inside-out sphere holding the background; must enclose the disk.
    Sky {
        r_sky: FreeCoordinate,
        phi_offset: FreeCoordinate,
    },
}

/// Parameters of the photon transport equation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OdeParams {
    potential_coefficient: FreeCoordinate,
    step_size: FreeCoordinate,
}

impl OdeParams {
    pub const POTENTIAL_RANGE: std::ops::RangeInclusive<FreeCoordinate> = -5.0..=5.0;
    pub const STEP_SIZE_RANGE: std::ops::RangeInclusive<FreeCoordinate> = 0.01..=0.20;

    /// Strength of the effective potential; 0 is flat space.
    pub fn potential_coefficient(&self) -> FreeCoordinate {
        self.potential_coefficient
    }

    /// Base integration step; the per-iteration step also scales with the
    /// photon's distance from the hole.
    pub fn step_size(&self) -> FreeCoordinate {
        self.step_size
    }

    pub fn set_potential_coefficient(&mut self, k: FreeCoordinate) {
        self.potential_coefficient =
            k.clamp(*Self::POTENTIAL_RANGE.start(), *Self::POTENTIAL_RANGE.end());
    }

    pub fn set_step_size(&mut self, h: FreeCoordinate) {
        self.step_size = h.clamp(*Self::STEP_SIZE_RANGE.start(), *Self::STEP_SIZE_RANGE.end());
    }
}

impl Default for OdeParams {
    fn default() -> Self {
        Self {
            potential_coefficient: -1.5,
            step_size: 0.16,
        }
    }
}

/// Everything the kernel needs to trace one frame, minus the textures
/// (those are GPU resources owned by the frame driver).
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub camera: CameraPose,
    hitables: Vec<Hitable>,
    pub ode: OdeParams,
}

impl Scene {
    /// The supported configuration: one disk, one horizon, one sky.
    pub fn new() -> Self {
        Self::with_hitables(vec![
            Hitable::TexturedDisk {
                r_inner: 2.6,
                r_outer: 12.0,
            },
            Hitable::Horizon { r_h: 2.0 },
            Hitable::Sky {
                r_sky: 30.0,
                phi_offset: std::f64::consts::FRAC_PI_2,
            },
        ])
    }

    pub fn with_hitables(hitables: Vec<Hitable>) -> Self {
        let scene = Self {
            camera: CameraPose::new(),
            hitables,
            ode: OdeParams::default(),
        };
        scene.warn_if_unusual();
        scene
    }

    pub fn hitables(&self) -> &[Hitable] {
        &self.hitables
    }

    /// Replaces the hitable list.
    ///
    /// The kernel binds the first hitable of each kind in list order;
    /// any further same-kind entries are ignored, not layered.
    pub fn set_hitables(&mut self, hitables: Vec<Hitable>) {
        self.hitables = hitables;
        self.warn_if_unusual();
    }

    /// First disk in list order, if any; this is the one the kernel
    /// traces.
    pub fn disk(&self) -> Option<(FreeCoordinate, FreeCoordinate)> {
        self.hitables.iter().find_map(|h| match *h {
            Hitable::TexturedDisk { r_inner, r_outer } => Some((r_inner, r_outer)),
            _ => None,
        })
    }

    /// First horizon in list order, if any; this is the one the kernel
    /// traces.
    pub fn horizon(&self) -> Option<FreeCoordinate> {
        self.hitables.iter().find_map(|h| match *h {
            Hitable::Horizon { r_h } => Some(r_h),
            _ => None,
        })
    }

    /// First sky in list order, if any; this is the one the kernel
    /// traces.
    pub fn sky(&self) -> Option<(FreeCoordinate, FreeCoordinate)> {
        self.hitables.iter().find_map(|h| match *h {
            Hitable::Sky { r_sky, phi_offset } => Some((r_sky, phi_offset)),
            _ => None,
        })
    }

    fn warn_if_unusual(&self) {
        let disks = count(&self.hitables, |h| {
            matches!(h, Hitable::TexturedDisk { .. })
        });
        let horizons = count(&self.hitables, |h| matches!(h, Hitable::Horizon { .. }));
        let skies = count(&self.hitables, |h| matches!(h, Hitable::Sky { .. }));
        if (disks, horizons, skies) != (1, 1, 1) {
            log::warn!(
                "scene has {disks} disk(s), {horizons} horizon(s), {skies} sky(s); \
                 the kernel binds the first of each kind in list order and \
                 ignores the rest"
            );
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn count(hitables: &[Hitable], f: impl Fn(&Hitable) -> bool) -> usize {
    hitables.iter().filter(|h| f(h)).count()
}

/// Render quality, 1..=20.
///
/// The outer driver maps this to the kernel's iteration budget and the
/// advertised per-frame ray count.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Quality(u32);

impl Quality {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(20);

    pub fn new(q: u32) -> Self {
        Self(q.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn rays_per_frame(self) -> u32 {
        500 + 500 * self.0
    }

    pub fn max_iterations(self) -> u32 {
        20_000 + 5_000 * self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ode_params_are_clamped() {
        let mut ode = OdeParams::default();
        assert_eq!(ode.potential_coefficient(), -1.5);
        assert_eq!(ode.step_size(), 0.16);
        ode.set_potential_coefficient(-99.0);
        assert_eq!(ode.potential_coefficient(), -5.0);
        ode.set_potential_coefficient(0.0);
        assert_eq!(ode.potential_coefficient(), 0.0);
        ode.set_step_size(1.0);
        assert_eq!(ode.step_size(), 0.20);
        ode.set_step_size(0.0);
        assert_eq!(ode.step_size(), 0.01);
    }

    #[test]
    fn default_scene_is_the_supported_configuration() {
        let scene = Scene::new();
        assert_eq!(scene.disk(), Some((2.6, 12.0)));
        assert_eq!(scene.horizon(), Some(2.0));
        assert_eq!(scene.sky(), Some((30.0, std::f64::consts::FRAC_PI_2)));
    }

    #[test]
    fn first_of_each_kind_wins() {
        let scene = Scene::with_hitables(vec![
            Hitable::Horizon { r_h: 2.0 },
            Hitable::Horizon { r_h: 3.0 },
        ]);
        assert_eq!(scene.horizon(), Some(2.0));
        assert_eq!(scene.disk(), None);
        assert_eq!(scene.sky(), None);
    }

    #[test]
    fn quality_mapping() {
        assert_eq!(Quality::new(1).rays_per_frame(), 1000);
        assert_eq!(Quality::new(1).max_iterations(), 25_000);
        assert_eq!(Quality::new(20).rays_per_frame(), 10_500);
        assert_eq!(Quality::new(20).max_iterations(), 120_000);
        assert_eq!(Quality::new(0), Quality::MIN);
        assert_eq!(Quality::new(99), Quality::MAX);
    }
}
