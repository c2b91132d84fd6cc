//! The chainable transformation engine.
//!
//! An [`Engine`] owns its [`ImageSet`], an [`ImageSource`] to commit edits
//! to, and a [`Rasterizer`] for geometric work. Every mutating method
//! returns `&mut Self`, so operations chain:
//!
//! ```
//! use pixelchain_core::{Engine, EngineInput, MemorySource, PixelBuffer, SourceImage};
//!
//! let source = MemorySource::new()
//!     .with_image(SourceImage::new("logo", PixelBuffer::filled(4, 4, [200, 10, 10, 255])));
//! let mut engine = Engine::open(source, EngineInput::Resolved)?;
//! engine.crop(0, 0, 2, 2).mirror().grayscale();
//! engine.finish()?;
//! assert_eq!(engine.size()[0].display_width, 2);
//! # Ok::<(), pixelchain_core::EngineError>(())
//! ```
//!
//! The same chain can be expressed as data with [`Pipeline`] and run via
//! [`Engine::run`].

pub mod operation;

pub use operation::{GeometryStep, Operation, Pipeline, Step};

use crate::buffer::{PixelBuffer, Rgba};
use crate::color::descriptor::ColorDescriptor;
use crate::color::ops::{ColorOp, map_pixels};
use crate::config::{EngineConfig, ValidationPolicy};
use crate::error::EngineError;
use crate::geometry::rasterizer::{CpuRasterizer, Rasterizer};
use crate::geometry::rect::Rect;
use crate::image_set::{ImageSet, ImageSize, TrackedImage};
use crate::source::{ImageSource, SourceImage, SourceQuery};

/// The ways an engine can be pointed at its images.
#[derive(Debug, Clone)]
pub enum EngineInput {
    /// Ask the source for images matching a selector.
    Selector(String),
    /// Use an explicit ordered list; the source only receives commits.
    Images(Vec<SourceImage>),
    /// Take everything the source already holds.
    Resolved,
}

impl EngineInput {
    fn shape(&self) -> &'static str {
        match self {
            Self::Selector(_) => "selector",
            Self::Images(_) => "images",
            Self::Resolved => "resolved",
        }
    }
}

/// Chainable editor over an ordered set of images.
pub struct Engine<S: ImageSource, R: Rasterizer = CpuRasterizer> {
    source: S,
    rasterizer: R,
    config: EngineConfig,
    images: ImageSet,
    /// First error of a strict chain; later steps are skipped until taken.
    failure: Option<EngineError>,
}

impl<S: ImageSource> Engine<S, CpuRasterizer> {
    /// Open with the default configuration and CPU rasterizer.
    pub fn open(source: S, input: EngineInput) -> Result<Self, EngineError> {
        Self::open_with_config(source, EngineConfig::default(), input)
    }

    /// Open with a CPU rasterizer built from `config`.
    pub fn open_with_config(
        source: S,
        config: EngineConfig,
        input: EngineInput,
    ) -> Result<Self, EngineError> {
        let rasterizer = CpuRasterizer::from_config(&config);
        Self::open_with(source, rasterizer, config, input)
    }

    pub fn from_selector(source: S, selector: impl Into<String>) -> Result<Self, EngineError> {
        Self::open(source, EngineInput::Selector(selector.into()))
    }

    pub fn from_images(source: S, images: Vec<SourceImage>) -> Result<Self, EngineError> {
        Self::open(source, EngineInput::Images(images))
    }

    pub fn from_source(source: S) -> Result<Self, EngineError> {
        Self::open(source, EngineInput::Resolved)
    }
}

impl<S: ImageSource, R: Rasterizer> Engine<S, R> {
    /// Resolve `input` against `source` and register every image.
    ///
    /// An image whose buffer differs from its display size is drawn at
    /// display size first; that drawing is what [`reset`](Self::reset)
    /// restores.
    pub fn open_with(
        mut source: S,
        rasterizer: R,
        config: EngineConfig,
        input: EngineInput,
    ) -> Result<Self, EngineError> {
        let shape = input.shape();
        let resolved = match input {
            EngineInput::Selector(selector) => source
                .resolve(&SourceQuery::Selector(selector))
                .inspect_err(|e| tracing::warn!("failed to resolve selector: {e}"))?,
            EngineInput::Images(images) => images,
            EngineInput::Resolved => source.resolve(&SourceQuery::All)?,
        };

        let images: ImageSet = resolved
            .into_iter()
            .map(|image| register(&rasterizer, image))
            .collect();

        tracing::info!("engine opened from {shape} input with {} image(s)", images.len());

        Ok(Self {
            source,
            rasterizer,
            config,
            images,
            failure: None,
        })
    }

    // ── Mutating operations ──────────────────────────────────────

    /// Keep the `width × height` region at `(x, y)`. Pixels outside the
    /// image take the fill color.
    pub fn crop(&mut self, x: i64, y: i64, width: i64, height: i64) -> &mut Self {
        self.chain(Operation::Crop {
            x,
            y,
            width,
            height,
        })
    }

    /// Resize to `round(width * factor) × round(height * factor)`.
    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.chain(Operation::Scale {
            factor: Some(factor),
        })
    }

    pub fn resize(&mut self, width: i64, height: i64) -> &mut Self {
        self.chain(Operation::Resize { width, height })
    }

    /// Turn clockwise about the center. Corners uncovered by the turn take
    /// the fill color and content outside the frame is clipped.
    pub fn rotate(&mut self, degrees: f64) -> &mut Self {
        self.chain(Operation::Rotate {
            degrees: Some(degrees),
        })
    }

    pub fn mirror(&mut self) -> &mut Self {
        self.chain(Operation::Mirror)
    }

    pub fn grayscale(&mut self) -> &mut Self {
        self.chain(Operation::Grayscale)
    }

    pub fn invert(&mut self) -> &mut Self {
        self.chain(Operation::Invert)
    }

    /// Set alpha to `opacity * 255`. With `ignore_transparent`, pixels whose
    /// alpha is already zero stay untouched.
    pub fn alpha(&mut self, opacity: f64, ignore_transparent: bool) -> &mut Self {
        self.chain(Operation::Alpha {
            opacity: Some(opacity),
            ignore_transparent,
        })
    }

    /// Overwrite the channels set in `to` on every pixel matching `from`.
    pub fn swap(
        &mut self,
        from: impl Into<Option<ColorDescriptor>>,
        to: impl Into<Option<ColorDescriptor>>,
    ) -> &mut Self {
        self.chain(Operation::Swap {
            from: from.into(),
            to: to.into(),
        })
    }

    /// Restore every changed image to its registration snapshot.
    pub fn reset(&mut self) -> &mut Self {
        if self.skip_failed("reset") {
            return self;
        }

        let changed: Vec<bool> = self.images.iter_mut().map(TrackedImage::reset).collect();
        tracing::debug!(
            "reset: restored {} image(s)",
            changed.iter().filter(|c| **c).count()
        );

        let strict = self.config.policy == ValidationPolicy::Strict;
        for (image, _) in self.images.iter().zip(&changed).filter(|(_, c)| **c) {
            if let Err(err) = commit(&mut self.source, image) {
                if strict {
                    self.failure = Some(err);
                    break;
                }
            }
        }
        self
    }

    /// Validate and run one operation, then commit every image.
    ///
    /// Under the permissive policy malformed arguments are logged and the
    /// step is skipped; under the strict policy they are returned.
    pub fn apply(&mut self, op: &Operation) -> Result<&mut Self, EngineError> {
        let step = match op.validate(&self.config) {
            Ok(step) => step,
            Err(err) => return self.reject(op, err),
        };

        match step {
            Step::Geometry(geometry) => {
                let rasterizer = &self.rasterizer;
                for image in self.images.iter_mut() {
                    let next = geometry.render(rasterizer, image.current());
                    image.replace(next);
                }
            }
            Step::Color(color) => self.map_color(&color),
        }
        tracing::debug!("{}: applied to {} image(s)", op.name(), self.images.len());

        self.commit_all()?;
        Ok(self)
    }

    /// Apply every operation of `pipeline` in order.
    pub fn run(&mut self, pipeline: &Pipeline) -> Result<&mut Self, EngineError> {
        for op in pipeline.iter() {
            self.apply(op)?;
        }
        Ok(self)
    }

    /// Surface the error that stopped a strict chain, clearing it.
    pub fn finish(&mut self) -> Result<(), EngineError> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The error that stopped the chain, if any.
    pub fn failure(&self) -> Option<&EngineError> {
        self.failure.as_ref()
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Display and natural dimensions per image, in registration order.
    pub fn size(&self) -> Vec<ImageSize> {
        self.images.iter().map(TrackedImage::size).collect()
    }

    /// The pixel at `(x, y)` of every image.
    ///
    /// Negative coordinates yield `None` for the whole call. An image smaller
    /// than `(x, y)` reports transparent black.
    pub fn pixel(&self, x: i64, y: i64) -> Option<Vec<Rgba>> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (u32::try_from(x).ok(), u32::try_from(y).ok());
        Some(
            self.images
                .iter()
                .map(|image| match (x, y) {
                    (Some(x), Some(y)) => image.current().pixel(x, y).map(Rgba::from),
                    _ => None,
                })
                .map(|px| px.unwrap_or(Rgba::TRANSPARENT))
                .collect(),
        )
    }

    /// Whether each image has any pixel with alpha below 255.
    pub fn transparency(&self) -> Vec<bool> {
        self.images
            .iter()
            .map(|image| image.current().has_transparency())
            .collect()
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    /// Current buffer of the image with `id`.
    pub fn buffer(&self, id: &str) -> Option<&PixelBuffer> {
        self.images.get(id).map(TrackedImage::current)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn into_source(self) -> S {
        self.source
    }

    // ── Internals ────────────────────────────────────────────────

    fn chain(&mut self, op: Operation) -> &mut Self {
        if self.skip_failed(op.name()) {
            return self;
        }
        let result = self.apply(&op).map(|_| ());
        if let Err(err) = result {
            self.failure = Some(err);
        }
        self
    }

    fn skip_failed(&self, name: &str) -> bool {
        match &self.failure {
            Some(err) => {
                tracing::debug!("{name}: skipped, chain stopped by earlier error: {err}");
                true
            }
            None => false,
        }
    }

    fn reject(&mut self, op: &Operation, err: EngineError) -> Result<&mut Self, EngineError> {
        match self.config.policy {
            ValidationPolicy::Strict => Err(err),
            ValidationPolicy::Permissive => {
                tracing::debug!("{}: skipped: {err}", op.name());
                Ok(self)
            }
        }
    }

    fn map_color(&mut self, op: &ColorOp) {
        let parallel = self.config.parallel;
        for_each_image(self.images.as_mut_slice(), parallel, |image| {
            map_pixels(image.current_mut(), op, parallel);
        });
    }

    fn commit_all(&mut self) -> Result<(), EngineError> {
        let strict = self.config.policy == ValidationPolicy::Strict;
        for image in self.images.iter() {
            if let Err(err) = commit(&mut self.source, image) {
                if strict {
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

fn register<R: Rasterizer + ?Sized>(rasterizer: &R, image: SourceImage) -> TrackedImage {
    let SourceImage {
        id,
        buffer,
        display_width,
        display_height,
        natural_width,
        natural_height,
    } = image;

    let original = if buffer.dimensions() == (display_width, display_height) {
        buffer
    } else {
        rasterizer.draw(&buffer, Rect::sized(display_width, display_height))
    };
    TrackedImage::new(id, original, natural_width, natural_height)
}

fn commit<S: ImageSource + ?Sized>(
    source: &mut S,
    image: &TrackedImage,
) -> Result<(), EngineError> {
    source.commit(image.id(), image.current()).map_err(|err| {
        tracing::warn!("commit of image '{}' rejected: {err}", image.id());
        EngineError::from(err)
    })
}

#[cfg(feature = "parallel")]
fn for_each_image<F>(images: &mut [TrackedImage], parallel: bool, f: F)
where
    F: Fn(&mut TrackedImage) + Sync + Send,
{
    use rayon::prelude::*;

    if parallel {
        images.par_iter_mut().for_each(f);
    } else {
        images.iter_mut().for_each(f);
    }
}

#[cfg(not(feature = "parallel"))]
fn for_each_image<F>(images: &mut [TrackedImage], _parallel: bool, f: F)
where
    F: Fn(&mut TrackedImage),
{
    images.iter_mut().for_each(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::MemorySource;

    /// Source that refuses every commit.
    struct RejectingSource;

    impl ImageSource for RejectingSource {
        fn resolve(&mut self, _query: &SourceQuery) -> Result<Vec<SourceImage>, SourceError> {
            Ok(vec![SourceImage::new("only", PixelBuffer::filled(1, 1, [1, 2, 3, 255]))])
        }

        fn commit(&mut self, _id: &str, _buffer: &PixelBuffer) -> Result<(), SourceError> {
            Err(SourceError::Backend("read-only".into()))
        }
    }

    fn engine_with(pixels: &[[u8; 4]], width: u32, height: u32) -> Engine<MemorySource> {
        let buffer = PixelBuffer::from_pixels(width, height, pixels).unwrap();
        let source = MemorySource::new().with_image(SourceImage::new("img", buffer));
        Engine::from_source(source).unwrap()
    }

    #[test]
    fn test_display_size_mismatch_is_drawn_at_display_size() {
        let image = SourceImage::new("big", PixelBuffer::filled(4, 4, [7, 7, 7, 255]))
            .with_display_size(2, 2);
        let engine = Engine::from_images(MemorySource::new(), vec![image]).unwrap();
        let size = &engine.size()[0];
        assert_eq!((size.display_width, size.display_height), (2, 2));
        assert_eq!((size.natural_width, size.natural_height), (4, 4));
        assert_eq!(engine.images().iter().next().map(|i| i.original().dimensions()), Some((2, 2)));
    }

    #[test]
    fn test_mutation_commits_every_image() {
        let mut engine = engine_with(&[[1, 2, 3, 255]], 1, 1);
        engine.invert().mirror();
        assert_eq!(engine.source().commit_count(), 2);
        assert_eq!(
            engine.source().committed("img").and_then(|b| b.pixel(0, 0)),
            Some([254, 253, 252, 255])
        );
    }

    #[test]
    fn test_skipped_operation_does_not_commit() {
        let mut engine = engine_with(&[[1, 2, 3, 255]], 1, 1);
        engine.alpha(2.0, false).crop(-1, 0, 1, 1);
        assert_eq!(engine.source().commit_count(), 0);
        assert!(engine.finish().is_ok());
    }

    #[test]
    fn test_reset_commits_only_changed_images() {
        let mut engine = engine_with(&[[1, 2, 3, 255]], 1, 1);
        engine.reset();
        assert_eq!(engine.source().commit_count(), 0);
        engine.invert().reset();
        assert_eq!(engine.source().commit_count(), 2);
        assert_eq!(engine.buffer("img").and_then(|b| b.pixel(0, 0)), Some([1, 2, 3, 255]));
    }

    #[test]
    fn test_strict_chain_stops_at_first_error() {
        let buffer = PixelBuffer::filled(2, 2, [10, 10, 10, 255]);
        let source = MemorySource::new().with_image(SourceImage::new("img", buffer));
        let config = EngineConfig::default().with_policy(ValidationPolicy::Strict);
        let mut engine = Engine::open_with_config(source, config, EngineInput::Resolved).unwrap();

        engine.invert().crop(0, 0, 0, 1).invert();
        assert!(engine.failure().is_some());
        // Only the first invert ran.
        assert_eq!(engine.pixel(0, 0), Some(vec![Rgba::new(245, 245, 245, 255)]));

        let err = engine.finish().unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { op: "crop", .. }));
        assert!(err.is_argument_error());
        assert!(engine.finish().is_ok());
    }

    #[test]
    fn test_commit_failure_is_logged_when_permissive() {
        let mut engine = Engine::from_source(RejectingSource).unwrap();
        engine.invert();
        assert!(engine.finish().is_ok());
        assert_eq!(engine.pixel(0, 0), Some(vec![Rgba::new(254, 253, 252, 255)]));
    }

    #[test]
    fn test_commit_failure_surfaces_when_strict() {
        let config = EngineConfig::default().with_policy(ValidationPolicy::Strict);
        let mut engine =
            Engine::open_with_config(RejectingSource, config, EngineInput::Resolved).unwrap();
        let err = engine.apply(&Operation::Invert).map(|_| ()).unwrap_err();
        assert!(matches!(err, EngineError::Source(SourceError::Backend(_))));
        assert!(!err.is_argument_error());
    }

    #[test]
    fn test_pixel_beyond_image_is_transparent() {
        let engine = engine_with(&[[9, 9, 9, 255]], 1, 1);
        assert_eq!(engine.pixel(5, 0), Some(vec![Rgba::TRANSPARENT]));
        assert_eq!(engine.pixel(0, i64::MAX), Some(vec![Rgba::TRANSPARENT]));
        assert_eq!(engine.pixel(0, -1), None);
    }

    #[test]
    fn test_url_selector_fails_to_open() {
        let err = Engine::from_selector(MemorySource::new(), "http://example.com/cat.png").err();
        assert!(matches!(err, Some(EngineError::Source(SourceError::UnsupportedUrl(_)))));
    }
}
