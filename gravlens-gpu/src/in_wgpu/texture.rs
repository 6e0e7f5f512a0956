// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Texture upload helpers and the disk's mirrored-atlas preprocessing.

use image::RgbaImage;

/// Builds the 2W×2H four-quadrant atlas the disk mapping samples:
/// original top-left, horizontal mirror top-right, vertical mirror
/// bottom-left, both mirrors bottom-right.
pub(crate) fn mirrored_atlas(source: &RgbaImage) -> RgbaImage {
    let (w, h) = source.dimensions();
    let mut atlas = RgbaImage::new(w * 2, h * 2);
    image::imageops::replace(&mut atlas, source, 0, 0);
    image::imageops::replace(
        &mut atlas,
        &image::imageops::flip_horizontal(source),
        i64::from(w),
        0,
    );
    image::imageops::replace(
        &mut atlas,
        &image::imageops::flip_vertical(source),
        0,
        i64::from(h),
    );
    image::imageops::replace(
        &mut atlas,
        &image::imageops::rotate180(source),
        i64::from(w),
        i64::from(h),
    );
    atlas
}

/// Creates a sampled 2D texture and writes `image` into it.
pub(crate) fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &RgbaImage,
) -> (wgpu::Texture, wgpu::TextureView) {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn atlas_quadrants_are_mirrors() {
        let mut source = RgbaImage::new(2, 2);
        source.put_pixel(0, 0, Rgba([1, 0, 0, 255]));
        source.put_pixel(1, 0, Rgba([2, 0, 0, 255]));
        source.put_pixel(0, 1, Rgba([3, 0, 0, 255]));
        source.put_pixel(1, 1, Rgba([4, 0, 0, 255]));

        let atlas = mirrored_atlas(&source);
        assert_eq!(atlas.dimensions(), (4, 4));

        // Top-left: original.
        assert_eq!(atlas.get_pixel(0, 0)[0], 1);
        assert_eq!(atlas.get_pixel(1, 1)[0], 4);
        // Top-right: horizontally mirrored.
        assert_eq!(atlas.get_pixel(2, 0)[0], 2);
        assert_eq!(atlas.get_pixel(3, 0)[0], 1);
        // Bottom-left: vertically mirrored.
        assert_eq!(atlas.get_pixel(0, 2)[0], 3);
        assert_eq!(atlas.get_pixel(0, 3)[0], 1);
        // Bottom-right: both.
        assert_eq!(atlas.get_pixel(2, 2)[0], 4);
        assert_eq!(atlas.get_pixel(3, 3)[0], 1);
    }
}
