//! The rasterizer capability and its CPU implementation.

use glam::{Affine2, Vec2};

use crate::buffer::PixelBuffer;
use crate::color::ops::to_channel;
use crate::config::{EngineConfig, Interpolation};
use crate::geometry::placement;
use crate::geometry::rect::Rect;

/// Draws source buffers into freshly allocated destination buffers.
///
/// Only [`draw_transformed`](Rasterizer::draw_transformed) is required; the
/// axis-aligned helpers are expressed through it.
pub trait Rasterizer {
    /// Draw `source` into a new `width × height` buffer through `transform`,
    /// which maps source coordinates to destination coordinates.
    ///
    /// Only source pixels inside `clip` are sampled. Destination pixels with
    /// no sample keep the rasterizer's fill color.
    fn draw_transformed(
        &self,
        source: &PixelBuffer,
        clip: Rect,
        width: u32,
        height: u32,
        transform: Affine2,
    ) -> PixelBuffer;

    /// Stretch the whole source into `dst` on a `dst.width × dst.height` canvas.
    fn draw(&self, source: &PixelBuffer, dst: Rect) -> PixelBuffer {
        let full = Rect::sized(source.width(), source.height());
        self.draw_region(source, full, dst)
    }

    /// Stretch the `src` region of the source into `dst` on a
    /// `dst.width × dst.height` canvas.
    fn draw_region(&self, source: &PixelBuffer, src: Rect, dst: Rect) -> PixelBuffer {
        let transform = placement::stretch(src, dst);
        self.draw_transformed(source, src, dst.width, dst.height, transform)
    }

    /// Copy the `rect` region out of `buffer` unscaled.
    fn read_pixels(&self, buffer: &PixelBuffer, rect: Rect) -> PixelBuffer {
        self.draw_region(buffer, rect, Rect::sized(rect.width, rect.height))
    }
}

/// Software rasterizer sampling destination pixel centers through the
/// inverse placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuRasterizer {
    /// Resampling filter.
    pub interpolation: Interpolation,
    /// Color of destination pixels with no source sample.
    pub fill: [u8; 4],
}

impl CpuRasterizer {
    pub fn new(interpolation: Interpolation, fill: [u8; 4]) -> Self {
        Self {
            interpolation,
            fill,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.interpolation, config.fill)
    }

    fn texel(&self, source: &PixelBuffer, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 {
            return self.fill;
        }
        source.pixel(x as u32, y as u32).unwrap_or(self.fill)
    }

    fn sample_nearest(&self, source: &PixelBuffer, clip: &Rect, p: Vec2) -> Option<[u8; 4]> {
        let x = p.x.floor() as i64;
        let y = p.y.floor() as i64;
        clip.contains(x, y).then(|| self.texel(source, x, y))
    }

    fn sample_bilinear(&self, source: &PixelBuffer, clip: &Rect, p: Vec2) -> Option<[u8; 4]> {
        if !clip.contains(p.x.floor() as i64, p.y.floor() as i64) {
            return None;
        }

        // Taps are clamped into the clip so edges extend instead of fading.
        let fx = p.x - 0.5;
        let fy = p.y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let min_x = clip.x as i64;
        let min_y = clip.y as i64;
        let max_x = clip.right() as i64 - 1;
        let max_y = clip.bottom() as i64 - 1;
        let cx = |x: f32| (x as i64).clamp(min_x, max_x);
        let cy = |y: f32| (y as i64).clamp(min_y, max_y);

        let taps = [
            (self.texel(source, cx(x0), cy(y0)), (1.0 - tx) * (1.0 - ty)),
            (self.texel(source, cx(x0 + 1.0), cy(y0)), tx * (1.0 - ty)),
            (self.texel(source, cx(x0), cy(y0 + 1.0)), (1.0 - tx) * ty),
            (self.texel(source, cx(x0 + 1.0), cy(y0 + 1.0)), tx * ty),
        ];

        let mut out = [0u8; 4];
        for (c, slot) in out.iter_mut().enumerate() {
            let value: f32 = taps.iter().map(|(px, w)| px[c] as f32 * w).sum();
            *slot = to_channel(value as f64);
        }
        Some(out)
    }
}

impl Rasterizer for CpuRasterizer {
    fn draw_transformed(
        &self,
        source: &PixelBuffer,
        clip: Rect,
        width: u32,
        height: u32,
        transform: Affine2,
    ) -> PixelBuffer {
        let mut out = PixelBuffer::filled(width, height, self.fill);
        let clip = clip.intersect(&Rect::sized(source.width(), source.height()));
        if out.is_empty() || clip.is_empty() {
            return out;
        }

        let det = transform.matrix2.determinant();
        if det == 0.0 || !det.is_finite() {
            return out;
        }
        let inverse = transform.inverse();

        let row_len = width as usize;
        for (idx, px) in out.pixels_mut().iter_mut().enumerate() {
            let center = Vec2::new(
                (idx % row_len) as f32 + 0.5,
                (idx / row_len) as f32 + 0.5,
            );
            let p = inverse.transform_point2(center);
            let sampled = match self.interpolation {
                Interpolation::Nearest => self.sample_nearest(source, &clip, p),
                Interpolation::Bilinear => self.sample_bilinear(source, &clip, p),
            };
            if let Some(value) = sampled {
                *px = value;
            }
        }
        out
    }
}
