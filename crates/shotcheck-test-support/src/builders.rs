//! Synthetic product shots for tests.

use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use shotcheck_core::ImageInfo;

/// Builder for synthetic test images.
///
/// Shots are in-memory; use [`SyntheticImageBuilder::save_png`] when an
/// analyzer needs to read the file behind `ImageInfo::path`.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Uniform gray frame; no edges and no subject.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> ImageInfo {
        let img = GrayImage::from_pixel(width, height, Luma([value]));
        ImageInfo::new("synthetic://uniform_gray", DynamicImage::ImageLuma8(img))
    }

    /// All-black frame.
    #[must_use]
    pub fn black(width: u32, height: u32) -> ImageInfo {
        Self::uniform_gray(width, height, 0)
    }

    /// All-white frame.
    #[must_use]
    pub fn white(width: u32, height: u32) -> ImageInfo {
        Self::uniform_gray(width, height, 255)
    }

    /// High-contrast checkerboard with 8px cells.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> ImageInfo {
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        ImageInfo::new("synthetic://checkerboard", DynamicImage::ImageLuma8(img))
    }

    /// Smooth left-to-right ramp.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> ImageInfo {
        let img = GrayImage::from_fn(width, height, |x, _| {
            Luma([((255 * x) / width.max(1)) as u8])
        });
        ImageInfo::new("synthetic://gradient", DynamicImage::ImageLuma8(img))
    }

    /// Square subject of side `size` centered at `(cx, cy)`.
    ///
    /// Subject pixels are `subject`, everything else is `background`.
    #[must_use]
    pub fn square_subject(
        width: u32,
        height: u32,
        size: u32,
        center: (u32, u32),
        subject: u8,
        background: u8,
    ) -> ImageInfo {
        let half = size / 2;
        let x0 = center.0.saturating_sub(half);
        let y0 = center.1.saturating_sub(half);
        let img = GrayImage::from_fn(width, height, |x, y| {
            if (x0..x0 + size).contains(&x) && (y0..y0 + size).contains(&y) {
                Luma([subject])
            } else {
                Luma([background])
            }
        });
        ImageInfo::new("synthetic://square_subject", DynamicImage::ImageLuma8(img))
    }

    /// Dark product centered on a white backdrop.
    #[must_use]
    pub fn product_on_white(width: u32, height: u32, size: u32) -> ImageInfo {
        Self::square_subject(width, height, size, (width / 2, height / 2), 30, 255)
    }

    /// Dark product pushed toward the left edge of a white backdrop.
    #[must_use]
    pub fn product_off_center(width: u32, height: u32, size: u32) -> ImageInfo {
        Self::square_subject(width, height, size, (size / 2 + 2, height / 2), 30, 255)
    }

    /// Centered gray product on a mid-gray backdrop with a checkered label,
    /// so it is sharp and neither dark nor bright.
    #[must_use]
    pub fn studio_shot(width: u32, height: u32) -> ImageInfo {
        let (cx, cy) = (width / 2, height / 2);
        let half = width.min(height) / 4;
        let img = GrayImage::from_fn(width, height, |x, y| {
            let inside = x.abs_diff(cx) < half && y.abs_diff(cy) < half;
            if !inside {
                Luma([170u8])
            } else if (x / 4 + y / 4) % 2 == 0 {
                Luma([60u8])
            } else {
                Luma([140u8])
            }
        });
        ImageInfo::new("synthetic://studio_shot", DynamicImage::ImageLuma8(img))
    }

    /// Uniform RGB frame.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> ImageInfo {
        let img = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
        ImageInfo::new("synthetic://rgb_uniform", DynamicImage::ImageRgb8(img))
    }

    /// Writes `image` as `dir/name` and returns it with `path` pointing there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_png(image: &ImageInfo, dir: &Path, name: &str) -> anyhow::Result<ImageInfo> {
        let path = dir.join(name);
        image
            .image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(ImageInfo::new(path.to_string_lossy(), image.image.clone()))
    }
}
