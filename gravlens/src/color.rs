// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Color representation and the renderer's two color operators: additive
//! compositing of samples along a ray, and progressive accumulation of
//! per-frame results into a running mean.

/// 8-bit RGBA color, as stored in textures and exported images.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black; the identity of [`RayColor::blend_additive`].
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Working color of a ray in flight.
///
/// Channels are `f32` in units of `0..=255`, matching the compute kernel's
/// arithmetic exactly; conversion to 8-bit happens only at the image
/// boundary. The alpha channel doubles as the "has this ray hit anything"
/// flag: a ray that never intersects a hitable keeps `a == 0` and writes
/// zeroes to the output image.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl RayColor {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Opaque black, as composited for a photon lost below the horizon.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba(c: Rgba) -> Self {
        Self::new(
            f32::from(c.r),
            f32::from(c.g),
            f32::from(c.b),
            f32::from(c.a),
        )
    }

    /// Rounds to 8-bit channels.
    pub fn to_rgba(self) -> Rgba {
        let q = |ch: f32| ch.clamp(0.0, 255.0).round() as u8;
        Rgba::new(q(self.r), q(self.g), q(self.b), q(self.a))
    }

    /// Composites the sample `s` onto `self`.
    ///
    /// A fully transparent sample leaves `self` unchanged. Otherwise the
    /// existing color is attenuated by the sample's lightness
    /// `b = (max(rgb) + min(rgb)) / 2` (normalized to `[0, 1]`) and the
    /// sample is added with a `255/205` gain; the result is clamped per
    /// channel and forced opaque. The gain is part of the renderer's visual
    /// signature and is kept bit-exact.
    #[must_use]
    pub fn blend_additive(self, s: RayColor) -> RayColor {
        if s.a == 0.0 {
            return self;
        }
        let lightness =
            (s.r.max(s.g).max(s.b) + s.r.min(s.g).min(s.b)) / 2.0 / 255.0;
        let ch = |existing: f32, sample: f32| {
            ((1.0 - lightness) * existing + sample.max(0.0) * 255.0 / 205.0).clamp(0.0, 255.0)
        };
        RayColor::new(ch(self.r, s.r), ch(self.g, s.g), ch(self.b, s.b), 255.0)
    }

    /// Linear interpolation, used by the disk seam band.
    #[must_use]
    pub fn lerp(self, other: RayColor, t: f32) -> RayColor {
        let l = |a: f32, b: f32| a + (b - a) * t;
        RayColor::new(
            l(self.r, other.r),
            l(self.g, other.g),
            l(self.b, other.b),
            l(self.a, other.a),
        )
    }
}

/// Folds the frame-`frame` ray color `sample` into the running accumulator
/// `prior`.
///
/// Frame 0 writes the sample directly; frame `F > 0` blends with weight
/// `w = F/(F+1)`, so that after `F+1` frames the accumulator is the
/// arithmetic mean of all per-frame samples.
#[must_use]
pub fn accumulate(prior: RayColor, sample: RayColor, frame: u32) -> RayColor {
    if frame == 0 {
        return sample;
    }
    let w = frame as f32 / (frame as f32 + 1.0);
    let ch = |a: f32, r: f32| a * w + r * (1.0 - w);
    RayColor::new(
        ch(prior.r, sample.r),
        ch(prior.g, sample.g),
        ch(prior.b, sample.b),
        ch(prior.a, sample.a),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn transparent_sample_is_identity() {
        let c = RayColor::new(12.0, 34.0, 56.0, 255.0);
        assert_eq!(c.blend_additive(RayColor::TRANSPARENT), c);
    }

    #[test]
    fn white_saturates() {
        let white = RayColor::from_rgba(Rgba::WHITE);
        assert_eq!(
            RayColor::TRANSPARENT.blend_additive(white),
            RayColor::new(255.0, 255.0, 255.0, 255.0)
        );
        // ...even over an existing color, since lightness 1 cancels it.
        assert_eq!(
            RayColor::new(10.0, 200.0, 35.0, 255.0).blend_additive(white),
            RayColor::new(255.0, 255.0, 255.0, 255.0)
        );
    }

    #[test]
    fn gain_is_255_over_205() {
        // A 205-valued channel with zero lightness contribution from the
        // other channels lands exactly on 255.
        let s = RayColor::new(205.0, 0.0, 0.0, 255.0);
        let out = RayColor::TRANSPARENT.blend_additive(s);
        let lightness = (205.0 + 0.0) / 2.0 / 255.0;
        assert_eq!(out.r, (205.0f32 * 255.0 / 205.0).clamp(0.0, 255.0));
        assert_eq!(out.g, (1.0 - lightness) * 0.0);
        assert_eq!(out.a, 255.0);
    }

    #[test]
    fn blend_forces_opaque_and_clamps() {
        let out = RayColor::new(250.0, 0.0, 0.0, 0.0)
            .blend_additive(RayColor::new(200.0, -30.0, 0.0, 128.0));
        assert_eq!(out.a, 255.0);
        assert!(out.r <= 255.0);
        // Negative sample channels contribute nothing.
        assert!(out.g >= 0.0);
    }

    #[test]
    fn accumulate_frame_zero_overwrites() {
        let stale = RayColor::new(99.0, 99.0, 99.0, 255.0);
        let fresh = RayColor::new(1.0, 2.0, 3.0, 255.0);
        assert_eq!(accumulate(stale, fresh, 0), fresh);
    }

    #[test]
    fn accumulator_is_running_mean() {
        let samples = [0.0f32, 255.0, 60.0, 120.0, 5.0, 240.0];
        let mut acc = RayColor::TRANSPARENT;
        for (frame, &v) in samples.iter().enumerate() {
            acc = accumulate(acc, RayColor::new(v, 0.0, 0.0, 255.0), frame as u32);
        }
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        assert!((acc.r - mean).abs() < 1e-3, "{} vs {}", acc.r, mean);
        assert!((acc.a - 255.0).abs() < 1e-3);
    }

    #[test]
    fn rgba_round_trip() {
        let c = Rgba::new(1, 2, 3, 4);
        assert_eq!(RayColor::from_rgba(c).to_rgba(), c);
    }
}
