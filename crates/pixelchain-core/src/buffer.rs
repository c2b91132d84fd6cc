//! RGBA8 pixel buffers and the pixel value type returned by queries.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Number of 8-bit samples per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// A single RGBA pixel value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(px: Rgba) -> Self {
        [px.r, px.g, px.b, px.a]
    }
}

impl From<palette::Srgba<u8>> for Rgba {
    fn from(color: palette::Srgba<u8>) -> Self {
        Self::new(color.red, color.green, color.blue, color.alpha)
    }
}

impl From<Rgba> for palette::Srgba<u8> {
    fn from(px: Rgba) -> Self {
        palette::Srgba::new(px.r, px.g, px.b, px.a)
    }
}

/// Flat RGBA8 raster, row-major, four samples per pixel.
///
/// The sample count always equals `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA samples, checking the length against the dimensions.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, EngineError> {
        let expected = sample_len(width, height);
        if samples.len() != expected {
            return Err(EngineError::BufferLength {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// A buffer where every pixel has the same value.
    pub fn filled(width: u32, height: u32, px: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            samples: px.repeat(count),
        }
    }

    /// A fully transparent black buffer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            samples: vec![0; sample_len(width, height)],
        }
    }

    /// Build a buffer from row-major pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> Result<Self, EngineError> {
        Self::new(width, height, bytemuck::cast_slice(pixels).to_vec())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True for a degenerate buffer with no pixels.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Pixel view over the samples.
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Mutable pixel view over the samples.
    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        bytemuck::cast_slice_mut(&mut self.samples)
    }

    /// Read one pixel, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels().get(idx).copied()
    }

    /// Overwrite one pixel. Returns `false` outside the buffer.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.width as usize + x as usize;
        match self.pixels_mut().get_mut(idx) {
            Some(slot) => {
                *slot = px;
                true
            }
            None => false,
        }
    }

    /// True if any pixel has alpha below 255. Stops at the first hit.
    pub fn has_transparency(&self) -> bool {
        self.pixels().iter().any(|px| px[3] < 255)
    }

    /// Copy into an `image::RgbaImage`.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let pixels = self.pixels();
        let width = self.width as usize;
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(pixels[y as usize * width + x as usize])
        })
    }
}

impl From<image::RgbaImage> for PixelBuffer {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            samples: img.into_raw(),
        }
    }
}

fn sample_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::BufferLength {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_sized_buffer_is_empty() {
        let buf = PixelBuffer::new(0, 5, Vec::new()).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.dimensions(), (0, 5));
        assert!(!buf.has_transparency());
    }

    #[test]
    fn test_pixel_is_row_major() {
        let buf = PixelBuffer::from_pixels(
            2,
            2,
            &[[1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255], [4, 0, 0, 255]],
        )
        .unwrap();
        assert_eq!(buf.pixel(1, 0), Some([2, 0, 0, 255]));
        assert_eq!(buf.pixel(0, 1), Some([3, 0, 0, 255]));
        assert_eq!(buf.pixel(2, 0), None);
    }

    #[test]
    fn test_set_pixel_out_of_bounds_is_ignored() {
        let mut buf = PixelBuffer::transparent(1, 1);
        assert!(!buf.set_pixel(1, 0, [9, 9, 9, 9]));
        assert!(buf.set_pixel(0, 0, [9, 9, 9, 9]));
        assert_eq!(buf.samples(), &[9, 9, 9, 9]);
        assert_eq!(buf.into_samples(), vec![9, 9, 9, 9]);
    }

    #[test]
    fn test_transparency_detection() {
        let opaque = PixelBuffer::filled(3, 3, [10, 20, 30, 255]);
        assert!(!opaque.has_transparency());

        let mut partly = opaque.clone();
        partly.set_pixel(2, 2, [10, 20, 30, 254]);
        assert!(partly.has_transparency());
    }

    #[test]
    fn test_rgba_image_interop_keeps_layout() {
        let buf = PixelBuffer::from_pixels(2, 1, &[[1, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
        let img = buf.to_rgba_image();
        assert_eq!(img.get_pixel(1, 0).0, [5, 6, 7, 8]);
        assert_eq!(PixelBuffer::from(img), buf);
    }

    #[test]
    fn test_palette_conversion() {
        let color = palette::Srgba::new(1u8, 2, 3, 4);
        let px = Rgba::from(color);
        assert_eq!(px, Rgba::new(1, 2, 3, 4));
        let back: palette::Srgba<u8> = px.into();
        assert_eq!(back, color);
    }
}
