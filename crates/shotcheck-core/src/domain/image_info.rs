//! Decoded input image.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};

use super::QaError;

/// A decoded image together with the file it was read from.
///
/// Analyzers borrow this immutably; luminance conversions are derived per call
/// and never stored back.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Path to the image file. The aesthetic analyzer decodes this file itself.
    pub path: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Decoded image data.
    pub image: DynamicImage,
}

impl ImageInfo {
    /// Wraps a decoded image, reading dimensions from the buffer.
    #[must_use]
    pub fn new(path: impl Into<String>, image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            path: path.into(),
            width,
            height,
            image,
        }
    }

    /// Single-channel luminance view of the image.
    ///
    /// Color input is weighted with BT.601 coefficients in 14-bit fixed point,
    /// rounded to nearest. 8-bit gray input passes through unchanged.
    #[must_use]
    pub fn to_luma8(&self) -> GrayImage {
        if let DynamicImage::ImageLuma8(gray) = &self.image {
            return gray.clone();
        }
        let rgb = self.image.to_rgb8();
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            Luma([bt601(r, g, b)])
        })
    }

    /// Luminance view, rejecting images without pixels.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::InvalidInput`] if either dimension is zero.
    pub fn checked_luma8(&self) -> Result<GrayImage, QaError> {
        if self.width == 0 || self.height == 0 {
            return Err(QaError::InvalidInput(format!(
                "{} has no pixels ({}x{})",
                self.path, self.width, self.height
            )));
        }
        Ok(self.to_luma8())
    }
}

/// `0.299 R + 0.587 G + 0.114 B` with the weights scaled by 2^14.
#[allow(clippy::cast_possible_truncation)]
const fn bt601(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const HALF: u32 = 1 << 13;
    ((R * r as u32 + G * g as u32 + B * b as u32 + HALF) >> 14) as u8
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reads_dimensions() {
        let info = ImageInfo::new("a.png", DynamicImage::new_rgb8(30, 20));
        assert_eq!(info.width, 30);
        assert_eq!(info.height, 20);
        assert_eq!(info.path, "a.png");
    }

    #[test]
    fn test_checked_luma_rejects_empty() {
        let info = ImageInfo::new("empty.png", DynamicImage::new_luma8(0, 0));
        let err = info.checked_luma8().expect_err("empty image must fail");
        assert!(matches!(err, QaError::InvalidInput(_)));
    }

    #[test]
    fn test_checked_luma_converts_color() {
        let rgb = image::RgbImage::from_fn(4, 4, |_, _| image::Rgb([255, 255, 255]));
        let info = ImageInfo::new("white.png", DynamicImage::ImageRgb8(rgb));
        let luma = info.checked_luma8().expect("non-empty");
        assert!(luma.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_color_luma_uses_bt601_weights() {
        let pixel = |r, g, b| {
            let rgb = image::RgbImage::from_pixel(2, 2, image::Rgb([r, g, b]));
            ImageInfo::new("c.png", DynamicImage::ImageRgb8(rgb))
                .to_luma8()
                .get_pixel(0, 0)
                .0[0]
        };
        assert_eq!(pixel(255, 0, 0), 76);
        assert_eq!(pixel(0, 255, 0), 150);
        assert_eq!(pixel(0, 0, 255), 29);
        assert_eq!(pixel(0, 255, 255), 179);
        assert_eq!(pixel(0, 165, 165), 116);
        assert_eq!(pixel(0, 0, 0), 0);
    }

    #[test]
    fn test_gray_input_passes_through() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[7u8, 128, 254][x as usize]]));
        let info = ImageInfo::new("g.png", DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(info.to_luma8(), gray);
    }
}
