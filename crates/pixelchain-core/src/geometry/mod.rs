//! Geometric placement: rectangles, affine placements, and rasterizers.

pub mod placement;
pub mod rasterizer;
pub mod rect;

pub use rasterizer::{CpuRasterizer, Rasterizer};
pub use rect::Rect;
