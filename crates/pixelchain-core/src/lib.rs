//! Pixelchain Core: chainable RGBA pixel-buffer transformations.
//!
//! This crate holds the pixel buffers, the color and geometric operations,
//! and the engine that applies them to an ordered set of images. Locating,
//! decoding, and displaying images are left to an [`ImageSource`]
//! implementation supplied by the host.

pub mod buffer;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod image_set;
pub mod source;

// Re-exports for convenience.
pub use buffer::{PixelBuffer, Rgba};
pub use color::{ColorDescriptor, ColorOp};
pub use config::{EngineConfig, Interpolation, SwapMatching, ValidationPolicy};
pub use engine::{Engine, EngineInput, Operation, Pipeline};
pub use error::{EngineError, SourceError};
pub use geometry::{CpuRasterizer, Rasterizer, Rect};
pub use image_set::{ImageSet, ImageSize, TrackedImage};
pub use source::{ImageSource, MemorySource, SourceImage, SourceQuery};
