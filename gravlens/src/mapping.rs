// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Texture-coordinate mappings from world geometry to UV.
//!
//! The disk mapping is intentionally quantized: the azimuthal coordinate
//! collapses onto two vertical strips of the (mirrored-atlas) texture, with
//! a blended seam band between them. These constants are the renderer's
//! visual signature; changing them changes every reference image.

use std::f32::consts::{PI, TAU};

use crate::color::RayColor;
use crate::math::fract;
use crate::texture::RgbaTexture;

/// Low edge of the seam-mitigation band in raw `u`.
const SEAM_LO: f32 = 0.52;
/// High edge of the seam-mitigation band in raw `u`.
const SEAM_HI: f32 = 0.99;

/// UV for a point on the disk annulus at radius `r`, azimuth `phi`.
///
/// Radii outside `[r_inner, r_outer]` map to `(0, 1)`. In range, `v` is the
/// normalized radial position and `u` snaps to 0.49 for the near half of
/// the angular range (`raw u < 0.5`) and 0.51 for the far half.
pub fn disk_uv(r: f32, phi: f32, r_inner: f32, r_outer: f32) -> (f32, f32) {
    if r < r_inner || r > r_outer {
        return (0.0, 1.0);
    }
    let u = if fract(phi / TAU) < 0.5 { 0.49 } else { 0.51 };
    let v = ((r - r_inner) / (r_outer - r_inner)).clamp(0.0, 1.0);
    (u, v)
}

/// Samples the disk texture at `(r, phi)`, applying the quantized mapping
/// and the seam band.
///
/// Raw `u` inside `[SEAM_LO, SEAM_HI]` divides into three equal sub-bands
/// which take the sample at `u = SEAM_LO`, the 50/50 mix of both edges, and
/// the sample at `u = SEAM_HI` respectively.
pub fn sample_disk(
    texture: &RgbaTexture,
    r: f32,
    phi: f32,
    r_inner: f32,
    r_outer: f32,
) -> RayColor {
    if r < r_inner || r > r_outer {
        return texture.sample(0.0, 1.0);
    }
    let v = ((r - r_inner) / (r_outer - r_inner)).clamp(0.0, 1.0);
    let u_raw = fract(phi / TAU);
    if (SEAM_LO..=SEAM_HI).contains(&u_raw) {
        let band = (u_raw - SEAM_LO) / (SEAM_HI - SEAM_LO);
        let lo = texture.sample(SEAM_LO, v);
        let hi = texture.sample(SEAM_HI, v);
        if band < 1.0 / 3.0 {
            lo
        } else if band < 2.0 / 3.0 {
            lo.lerp(hi, 0.5)
        } else {
            hi
        }
    } else {
        let (u, v) = disk_uv(r, phi, r_inner, r_outer);
        texture.sample(u, v)
    }
}

/// UV for a sky direction given spherical `(theta, phi)`; both coordinates
/// wrap into `[0, 1)`.
pub fn sky_uv(theta: f32, phi: f32) -> (f32, f32) {
    (fract(phi / TAU), fract(theta / PI))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn out_of_annulus_maps_to_corner() {
        assert_eq!(disk_uv(1.0, 0.3, 2.6, 12.0), (0.0, 1.0));
        assert_eq!(disk_uv(13.0, 0.3, 2.6, 12.0), (0.0, 1.0));
        assert_eq!(disk_uv(f32::INFINITY, 0.3, 2.6, 12.0), (0.0, 1.0));
    }

    #[test]
    fn in_annulus_snaps_to_two_strips() {
        // phi in the first half-turn: raw u < 0.5.
        assert_eq!(disk_uv(2.6, 0.1, 2.6, 12.0).0, 0.49);
        // Second half-turn: raw u >= 0.5.
        assert_eq!(disk_uv(2.6, 3.5, 2.6, 12.0).0, 0.51);
        // Negative phi wraps non-negative first.
        assert_eq!(disk_uv(2.6, -0.1, 2.6, 12.0).0, 0.51);
    }

    #[test]
    fn radial_coordinate_is_normalized() {
        assert_eq!(disk_uv(2.6, 0.1, 2.6, 12.0).1, 0.0);
        assert_eq!(disk_uv(12.0, 0.1, 2.6, 12.0).1, 1.0);
        let (_, v) = disk_uv(7.3, 0.1, 2.6, 12.0);
        assert!((v - 0.5).abs() < 1e-3);
    }

    #[test]
    fn seam_band_blends_in_thirds() {
        // A 100×1 gradient texture makes the three sub-bands
        // distinguishable.
        let texture = RgbaTexture::new(
            100,
            1,
            (0..100).map(|i| Rgba::new(i as u8, 0, 0, 255)).collect(),
        );
        let phi_at = |u: f32| u * TAU;
        let lo = texture.sample(SEAM_LO, 0.5);
        let hi = texture.sample(SEAM_HI, 0.5);

        let first = sample_disk(&texture, 7.0, phi_at(0.55), 2.6, 12.0);
        assert_eq!(first, lo);
        let mid = sample_disk(&texture, 7.0, phi_at(0.75), 2.6, 12.0);
        assert_eq!(mid, lo.lerp(hi, 0.5));
        let last = sample_disk(&texture, 7.0, phi_at(0.95), 2.6, 12.0);
        assert_eq!(last, hi);
    }

    #[test]
    fn sky_uv_wraps_to_unit_interval() {
        for &(theta, phi) in &[
            (0.5f32, 0.5f32),
            (-0.5, -0.5),
            (10.0, -20.0),
            (3.2, 7.0),
        ] {
            let (u, v) = sky_uv(theta, phi);
            assert!((0.0..1.0).contains(&u), "u = {u}");
            assert!((0.0..1.0).contains(&v), "v = {v}");
        }
    }
}
