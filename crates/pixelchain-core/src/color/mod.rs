//! Color operations: channel descriptors and the per-pixel executor.

pub mod descriptor;
pub mod ops;

pub use descriptor::ColorDescriptor;
pub use ops::{ColorOp, map_pixels};
