// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! CPU-side texture sampling with the same addressing and filtering as the
//! GPU sampler (bilinear, mirror-repeat), so the trace module and the
//! compute shader agree on sampled colors.

use crate::color::{RayColor, Rgba};

/// Row-major RGBA image.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaTexture {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl RgbaTexture {
    /// # Panics
    /// If `pixels.len() != width * height` or either dimension is zero.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba>) -> Self {
        assert!(width > 0 && height > 0, "texture dimensions must be nonzero");
        assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// 1×1 texture of a single color.
    pub fn solid(color: Rgba) -> Self {
        Self::new(1, 1, vec![color])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel fetch with mirror-repeat addressing on both axes.
    pub fn get(&self, x: i64, y: i64) -> Rgba {
        let xi = mirror(x, i64::from(self.width));
        let yi = mirror(y, i64::from(self.height));
        self.pixels[yi * self.width as usize + xi]
    }

    /// Bilinear sample at normalized coordinates, mirror-repeat addressed.
    pub fn sample(&self, u: f32, v: f32) -> RayColor {
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as i64;
        let y0 = y0 as i64;

        let c00 = RayColor::from_rgba(self.get(x0, y0));
        let c10 = RayColor::from_rgba(self.get(x0 + 1, y0));
        let c01 = RayColor::from_rgba(self.get(x0, y0 + 1));
        let c11 = RayColor::from_rgba(self.get(x0 + 1, y0 + 1));

        c00.lerp(c10, fx).lerp(c01.lerp(c11, fx), fy)
    }
}

/// Mirror-repeat addressing: indices reflect off both edges with period
/// `2n`.
fn mirror(i: i64, n: i64) -> usize {
    let m = i.rem_euclid(2 * n);
    if m < n {
        m as usize
    } else {
        (2 * n - 1 - m) as usize
    }
}
