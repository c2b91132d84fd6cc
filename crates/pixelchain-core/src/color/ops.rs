//! Per-pixel color operations and the executor that maps them over a buffer.
//!
//! Every operation reads and writes only the four samples of the pixel it is
//! given, so pixels may be visited in any order or in parallel.

use crate::buffer::PixelBuffer;
use crate::color::descriptor::ColorDescriptor;
use crate::config::SwapMatching;

/// Non-standard luma weights applied by [`ColorOp::Grayscale`].
pub const GRAYSCALE_WEIGHTS: [f64; 3] = [0.34, 0.5, 0.16];

/// A validated color operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOp {
    /// R = G = B = weighted luma, alpha untouched.
    Grayscale,
    /// R, G, B replaced by `255 - value`, alpha untouched.
    Invert,
    /// Alpha replaced by `value`; fully transparent pixels kept when
    /// `ignore_transparent` is set.
    Alpha { value: u8, ignore_transparent: bool },
    /// Pixels matching `from` get the channels set in `to`.
    Swap {
        from: ColorDescriptor,
        to: ColorDescriptor,
        matching: SwapMatching,
    },
}

impl ColorOp {
    /// Apply the operation to a single pixel in place.
    #[inline]
    pub fn apply(&self, px: &mut [u8; 4]) {
        match *self {
            Self::Grayscale => {
                let [wr, wg, wb] = GRAYSCALE_WEIGHTS;
                let luma = to_channel(wr * px[0] as f64 + wg * px[1] as f64 + wb * px[2] as f64);
                px[0] = luma;
                px[1] = luma;
                px[2] = luma;
            }
            Self::Invert => {
                px[0] = 255 - px[0];
                px[1] = 255 - px[1];
                px[2] = 255 - px[2];
            }
            Self::Alpha {
                value,
                ignore_transparent,
            } => {
                if !ignore_transparent || px[3] > 0 {
                    px[3] = value;
                }
            }
            Self::Swap { from, to, matching } => {
                if from.matches(px, matching) {
                    to.paint(px);
                }
            }
        }
    }

    /// Short label for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Invert => "invert",
            Self::Alpha { .. } => "alpha",
            Self::Swap { .. } => "swap",
        }
    }
}

/// Convert an opacity in `[0, 1]` to an 8-bit alpha value.
pub fn opacity_to_alpha(opacity: f64) -> u8 {
    to_channel(opacity * 255.0)
}

/// Store a computed channel value the way an 8-bit clamped array does:
/// clamp to `[0, 255]`, round half to even.
#[inline]
pub fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Apply `op` to every pixel of `buffer` in place.
///
/// With `parallel` set and the `parallel` feature enabled the pixels are
/// split across the rayon pool.
pub fn map_pixels(buffer: &mut PixelBuffer, op: &ColorOp, parallel: bool) {
    if parallel {
        map_parallel(buffer, op);
    } else {
        map_serial(buffer, op);
    }
}

fn map_serial(buffer: &mut PixelBuffer, op: &ColorOp) {
    for px in buffer.pixels_mut() {
        op.apply(px);
    }
}

#[cfg(feature = "parallel")]
fn map_parallel(buffer: &mut PixelBuffer, op: &ColorOp) {
    use rayon::prelude::*;

    buffer.pixels_mut().par_iter_mut().for_each(|px| op.apply(px));
}

#[cfg(not(feature = "parallel"))]
fn map_parallel(buffer: &mut PixelBuffer, op: &ColorOp) {
    map_serial(buffer, op);
}
