//! The image-source capability: supplies initial buffers, receives edits.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::PixelBuffer;
use crate::error::SourceError;

/// Which images a source should hand over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceQuery {
    /// Images matching a selector string. Interpretation is up to the source.
    Selector(String),
    /// Every image the source holds.
    All,
}

/// One image as supplied by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// Identifier the source uses for commits.
    pub id: String,
    /// Initial pixel data.
    pub buffer: PixelBuffer,
    /// Size the image is displayed at.
    pub display_width: u32,
    pub display_height: u32,
    /// Intrinsic size of the image.
    pub natural_width: u32,
    pub natural_height: u32,
}

impl SourceImage {
    /// An image displayed at its natural size.
    pub fn new(id: impl Into<String>, buffer: PixelBuffer) -> Self {
        let (width, height) = buffer.dimensions();
        Self {
            id: id.into(),
            buffer,
            display_width: width,
            display_height: height,
            natural_width: width,
            natural_height: height,
        }
    }

    pub fn with_display_size(mut self, width: u32, height: u32) -> Self {
        self.display_width = width;
        self.display_height = height;
        self
    }
}

/// Supplies images to an engine and accepts the edited buffers back.
pub trait ImageSource {
    /// Resolve a query into an ordered list of images.
    fn resolve(&mut self, query: &SourceQuery) -> Result<Vec<SourceImage>, SourceError>;

    /// Accept the current buffer of image `id` after a mutating operation.
    fn commit(&mut self, id: &str, buffer: &PixelBuffer) -> Result<(), SourceError>;
}

impl<S: ImageSource> ImageSource for Arc<Mutex<S>> {
    fn resolve(&mut self, query: &SourceQuery) -> Result<Vec<SourceImage>, SourceError> {
        self.lock().resolve(query)
    }

    fn commit(&mut self, id: &str, buffer: &PixelBuffer) -> Result<(), SourceError> {
        self.lock().commit(id, buffer)
    }
}

/// Whether a selector names a remote resource.
pub fn is_url(selector: &str) -> bool {
    selector.starts_with("http://") || selector.starts_with("https://")
}

/// Ordered in-memory image source.
///
/// Selectors are `*` for everything, `prefix*` for an id prefix, or an exact
/// id. URL selectors are rejected.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    images: Vec<SourceImage>,
    committed: HashMap<String, PixelBuffer>,
    commit_count: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image; insertion order is preserved.
    pub fn insert(&mut self, image: SourceImage) {
        self.images.push(image);
    }

    pub fn with_image(mut self, image: SourceImage) -> Self {
        self.insert(image);
        self
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Last buffer committed for `id`.
    pub fn committed(&self, id: &str) -> Option<&PixelBuffer> {
        self.committed.get(id)
    }

    /// Total commits received.
    pub fn commit_count(&self) -> usize {
        self.commit_count
    }
}

impl ImageSource for MemorySource {
    fn resolve(&mut self, query: &SourceQuery) -> Result<Vec<SourceImage>, SourceError> {
        let selector = match query {
            SourceQuery::All => return Ok(self.images.clone()),
            SourceQuery::Selector(selector) => selector.trim(),
        };

        if is_url(selector) {
            return Err(SourceError::UnsupportedUrl(selector.to_string()));
        }

        let selected = |id: &str| match selector.strip_suffix('*') {
            Some(prefix) => id.starts_with(prefix),
            None => id == selector,
        };

        Ok(self
            .images
            .iter()
            .filter(|image| selected(&image.id))
            .cloned()
            .collect())
    }

    fn commit(&mut self, id: &str, buffer: &PixelBuffer) -> Result<(), SourceError> {
        self.committed.insert(id.to_string(), buffer.clone());
        self.commit_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_image(SourceImage::new("hero", PixelBuffer::transparent(2, 2)))
            .with_image(SourceImage::new("thumb-1", PixelBuffer::transparent(1, 1)))
            .with_image(SourceImage::new("thumb-2", PixelBuffer::transparent(1, 1)))
    }

    fn ids(images: &[SourceImage]) -> Vec<&str> {
        images.iter().map(|image| image.id.as_str()).collect()
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let images = source().resolve(&SourceQuery::All).unwrap();
        assert_eq!(ids(&images), vec!["hero", "thumb-1", "thumb-2"]);
    }

    #[test]
    fn test_resolve_selectors() {
        let mut src = source();
        let star = src.resolve(&SourceQuery::Selector("*".into())).unwrap();
        assert_eq!(star.len(), 3);
        let prefix = src.resolve(&SourceQuery::Selector("thumb*".into())).unwrap();
        assert_eq!(ids(&prefix), vec!["thumb-1", "thumb-2"]);
        let exact = src.resolve(&SourceQuery::Selector("hero".into())).unwrap();
        assert_eq!(ids(&exact), vec!["hero"]);
        let none = src.resolve(&SourceQuery::Selector("missing".into())).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_resolve_rejects_urls() {
        let err = source()
            .resolve(&SourceQuery::Selector("https://example.com/a.png".into()))
            .unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedUrl(_)));
    }

    #[test]
    fn test_commit_records_latest_buffer() {
        let mut src = source();
        src.commit("hero", &PixelBuffer::filled(1, 1, [1, 2, 3, 4])).unwrap();
        src.commit("hero", &PixelBuffer::filled(1, 1, [5, 6, 7, 8])).unwrap();
        assert_eq!(src.commit_count(), 2);
        assert_eq!(src.committed("hero").and_then(|b| b.pixel(0, 0)), Some([5, 6, 7, 8]));
        assert!(src.committed("thumb-1").is_none());
    }

    #[test]
    fn test_shared_source_forwards() {
        let shared = Arc::new(Mutex::new(source()));
        let mut handle = Arc::clone(&shared);
        handle.commit("thumb-2", &PixelBuffer::transparent(1, 1)).unwrap();
        assert_eq!(shared.lock().commit_count(), 1);
    }
}
