// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Built-in procedural textures, so the viewer shows something without any
//! asset files.

use image::{Rgba, RgbaImage};
use once_cell::sync::Lazy;

static DISK: Lazy<RgbaImage> = Lazy::new(banded_disk);
static SKY: Lazy<RgbaImage> = Lazy::new(star_field);

pub(crate) fn default_disk() -> &'static RgbaImage {
    &DISK
}

pub(crate) fn default_sky() -> &'static RgbaImage {
    &SKY
}

/// Warm annulus bands, bright at the inner edge and fading outward.
/// (u is azimuthal, v radial; the GPU side mirrors this into the atlas.)
fn banded_disk() -> RgbaImage {
    let (width, height) = (256u32, 64u32);
    RgbaImage::from_fn(width, height, |_, y| {
        let v = y as f32 / (height - 1) as f32;
        let fade = (1.0 - v).powi(2);
        let bands = 0.75 + 0.25 * (v * 40.0).sin();
        let level = fade * bands;
        Rgba([
            (255.0 * level) as u8,
            (190.0 * level) as u8,
            (120.0 * level.powf(1.5)) as u8,
            255,
        ])
    })
}

/// Sparse white-ish stars on black, deterministic so captures are
/// reproducible.
fn star_field() -> RgbaImage {
    let (width, height) = (1024u32, 512u32);
    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    let mut state: u64 = 0x853c_49e6_748f_ea9b;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as u32
    };
    for _ in 0..1800 {
        let x = next() % width;
        let y = next() % height;
        let brightness = 100 + (next() % 156) as u8;
        let tint = (next() % 40) as u8;
        image.put_pixel(
            x,
            y,
            Rgba([
                brightness,
                brightness,
                brightness.saturating_sub(tint),
                255,
            ]),
        );
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textures_have_expected_shapes() {
        assert_eq!(default_disk().dimensions(), (256, 64));
        assert_eq!(default_sky().dimensions(), (1024, 512));
    }

    #[test]
    fn star_field_is_deterministic() {
        assert_eq!(star_field(), star_field());
    }

    #[test]
    fn disk_fades_outward() {
        let disk = default_disk();
        let inner = disk.get_pixel(0, 0)[0];
        let outer = disk.get_pixel(0, 63)[0];
        assert!(inner > outer);
    }
}
