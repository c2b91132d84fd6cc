//! Declarative operations, their validation, and JSON pipelines.
//!
//! An [`Operation`] carries arguments exactly as a caller supplied them,
//! including malformed or missing ones. Validation turns it into a
//! [`Step`] the engine can execute, or an argument error that the
//! configured [`ValidationPolicy`](crate::config::ValidationPolicy) decides
//! what to do with.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::color::descriptor::ColorDescriptor;
use crate::color::ops::{ColorOp, opacity_to_alpha};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::geometry::placement;
use crate::geometry::rasterizer::Rasterizer;
use crate::geometry::rect::Rect;

/// A chainable operation on every tracked image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Keep the `width × height` region at `(x, y)`.
    Crop {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    /// Multiply both dimensions by `factor`.
    Scale {
        #[serde(default)]
        factor: Option<f64>,
    },
    /// Resample to absolute dimensions.
    Resize { width: i64, height: i64 },
    /// Turn clockwise about the image center; dimensions are kept.
    Rotate {
        #[serde(default)]
        degrees: Option<f64>,
    },
    /// Flip about the vertical center line.
    Mirror,
    Grayscale,
    Invert,
    /// Set every pixel's alpha to `opacity * 255`.
    Alpha {
        #[serde(default)]
        opacity: Option<f64>,
        #[serde(default)]
        ignore_transparent: bool,
    },
    /// Replace channels of pixels matching `from` with those set in `to`.
    Swap {
        #[serde(default)]
        from: Option<ColorDescriptor>,
        #[serde(default)]
        to: Option<ColorDescriptor>,
    },
}

/// A validated geometric operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryStep {
    Crop(Rect),
    Scale(f64),
    Resize { width: u32, height: u32 },
    /// Angle in degrees, already reduced into `[0, 360)`.
    Rotate(f64),
    Mirror,
}

/// A validated operation ready to run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Geometry(GeometryStep),
    Color(ColorOp),
}

impl Operation {
    /// Short label for logging and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Crop { .. } => "crop",
            Self::Scale { .. } => "scale",
            Self::Resize { .. } => "resize",
            Self::Rotate { .. } => "rotate",
            Self::Mirror => "mirror",
            Self::Grayscale => "grayscale",
            Self::Invert => "invert",
            Self::Alpha { .. } => "alpha",
            Self::Swap { .. } => "swap",
        }
    }

    /// Check the arguments and build the executable step.
    pub fn validate(&self, config: &EngineConfig) -> Result<Step, EngineError> {
        let op = self.name();
        let step = match *self {
            Self::Crop {
                x,
                y,
                width,
                height,
            } => {
                if x < 0 || y < 0 || width <= 0 || height <= 0 {
                    return Err(invalid(
                        op,
                        format!(
                            "region {x},{y} {width}x{height} needs x, y >= 0 and a positive size"
                        ),
                    ));
                }
                Step::Geometry(GeometryStep::Crop(Rect::new(
                    to_u32(op, "x", x)?,
                    to_u32(op, "y", y)?,
                    to_u32(op, "width", width)?,
                    to_u32(op, "height", height)?,
                )))
            }
            Self::Scale { factor } => {
                let factor = factor.ok_or(EngineError::MissingArgument { op, name: "factor" })?;
                if !(factor > 0.0 && factor.is_finite()) {
                    return Err(invalid(op, format!("factor {factor} must be positive and finite")));
                }
                Step::Geometry(GeometryStep::Scale(factor))
            }
            Self::Resize { width, height } => {
                if width < 0 || height < 0 {
                    return Err(invalid(op, format!("size {width}x{height} must not be negative")));
                }
                Step::Geometry(GeometryStep::Resize {
                    width: to_u32(op, "width", width)?,
                    height: to_u32(op, "height", height)?,
                })
            }
            Self::Rotate { degrees } => {
                let degrees = degrees.ok_or(EngineError::MissingArgument { op, name: "degrees" })?;
                if !(degrees >= 0.0 && degrees.is_finite()) {
                    return Err(invalid(
                        op,
                        format!("angle {degrees} must be finite and not negative"),
                    ));
                }
                Step::Geometry(GeometryStep::Rotate(placement::normalize_degrees(degrees)))
            }
            Self::Mirror => Step::Geometry(GeometryStep::Mirror),
            Self::Grayscale => Step::Color(ColorOp::Grayscale),
            Self::Invert => Step::Color(ColorOp::Invert),
            Self::Alpha {
                opacity,
                ignore_transparent,
            } => {
                let opacity = opacity.ok_or(EngineError::MissingArgument { op, name: "opacity" })?;
                if !(0.0..=1.0).contains(&opacity) {
                    return Err(invalid(op, format!("opacity {opacity} is outside [0, 1]")));
                }
                Step::Color(ColorOp::Alpha {
                    value: opacity_to_alpha(opacity),
                    ignore_transparent,
                })
            }
            Self::Swap { from, to } => {
                let from = from.ok_or(EngineError::MissingArgument { op, name: "from" })?;
                let to = to.ok_or(EngineError::MissingArgument { op, name: "to" })?;
                Step::Color(ColorOp::Swap {
                    from,
                    to,
                    matching: config.swap_matching,
                })
            }
        };
        Ok(step)
    }
}

impl GeometryStep {
    /// Rasterize the new buffer for one image.
    pub fn render<R: Rasterizer + ?Sized>(
        &self,
        rasterizer: &R,
        buffer: &PixelBuffer,
    ) -> PixelBuffer {
        let (width, height) = buffer.dimensions();
        let full = Rect::sized(width, height);
        match *self {
            Self::Crop(region) => {
                rasterizer.draw_region(buffer, region, Rect::sized(region.width, region.height))
            }
            Self::Scale(factor) => {
                let target = Rect::sized(scaled(width, factor), scaled(height, factor));
                rasterizer.draw(buffer, target)
            }
            Self::Resize { width, height } => rasterizer.draw(buffer, Rect::sized(width, height)),
            Self::Rotate(degrees) => rasterizer.draw_transformed(
                buffer,
                full,
                width,
                height,
                placement::rotation_about_center(width, height, degrees),
            ),
            Self::Mirror => rasterizer.draw_transformed(
                buffer,
                full,
                width,
                height,
                placement::mirror_horizontal(width),
            ),
        }
    }
}

/// An ordered list of operations, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    pub operations: Vec<Operation>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn then(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }
}

impl FromIterator<Operation> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

fn invalid(op: &'static str, reason: String) -> EngineError {
    EngineError::InvalidArgument { op, reason }
}

fn to_u32(op: &'static str, name: &str, value: i64) -> Result<u32, EngineError> {
    u32::try_from(value).map_err(|_| invalid(op, format!("{name} {value} exceeds u32")))
}

/// `round(size * factor)`, saturating at `u32::MAX`.
fn scaled(size: u32, factor: f64) -> u32 {
    (size as f64 * factor).round().clamp(0.0, u32::MAX as f64) as u32
}
