//! Session state: the ordered set of images an engine edits.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;

/// Dimensions reported by [`Engine::size`](crate::engine::Engine::size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Source identifier of the image.
    pub id: String,
    pub display_width: u32,
    pub display_height: u32,
    pub natural_width: u32,
    pub natural_height: u32,
}

/// One managed image: the snapshot to reset to and the live buffer.
#[derive(Debug, Clone)]
pub struct TrackedImage {
    id: String,
    original: PixelBuffer,
    current: PixelBuffer,
    natural_width: u32,
    natural_height: u32,
    dirty: bool,
}

impl TrackedImage {
    /// Register an image; `original` becomes both the reset target and the
    /// first current buffer.
    pub fn new(
        id: impl Into<String>,
        original: PixelBuffer,
        natural_width: u32,
        natural_height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            current: original.clone(),
            original,
            natural_width,
            natural_height,
            dirty: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn current(&self) -> &PixelBuffer {
        &self.current
    }

    /// Mutable access for in-place color operations. Marks the image changed.
    pub fn current_mut(&mut self) -> &mut PixelBuffer {
        self.dirty = true;
        &mut self.current
    }

    /// Swap in a new current buffer, dropping the old one.
    pub fn replace(&mut self, buffer: PixelBuffer) {
        self.current = buffer;
        self.dirty = true;
    }

    /// Restore the registration snapshot. Returns `false` if nothing changed
    /// since registration or the last reset.
    pub fn reset(&mut self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        self.current = self.original.clone();
        self.dirty = false;
        true
    }

    /// Whether the current buffer may differ from the original.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Display size follows the current buffer.
    pub fn display_size(&self) -> (u32, u32) {
        self.current.dimensions()
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn size(&self) -> ImageSize {
        let (display_width, display_height) = self.display_size();
        let (natural_width, natural_height) = self.natural_size();
        ImageSize {
            id: self.id.clone(),
            display_width,
            display_height,
            natural_width,
            natural_height,
        }
    }
}

/// Insertion-ordered collection of tracked images.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: Vec<TrackedImage>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: TrackedImage) {
        self.images.push(image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedImage> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedImage> {
        self.images.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TrackedImage> {
        self.images.iter_mut()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [TrackedImage] {
        &mut self.images
    }
}

impl FromIterator<TrackedImage> for ImageSet {
    fn from_iter<I: IntoIterator<Item = TrackedImage>>(iter: I) -> Self {
        Self {
            images: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ImageSet {
    type Item = &'a TrackedImage;
    type IntoIter = std::slice::Iter<'a, TrackedImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_only_after_change() {
        let mut image = TrackedImage::new("a", PixelBuffer::filled(1, 1, [1, 1, 1, 255]), 1, 1);
        assert!(!image.reset());

        image.replace(PixelBuffer::filled(2, 2, [9, 9, 9, 255]));
        assert_eq!(image.display_size(), (2, 2));
        assert!(image.reset());
        assert_eq!(image.current(), image.original());
        assert!(!image.is_dirty());
    }

    #[test]
    fn test_natural_size_is_fixed() {
        let mut image = TrackedImage::new("a", PixelBuffer::transparent(4, 4), 8, 8);
        image.replace(PixelBuffer::transparent(2, 1));
        let size = image.size();
        assert_eq!((size.display_width, size.display_height), (2, 1));
        assert_eq!((size.natural_width, size.natural_height), (8, 8));
    }

    #[test]
    fn test_set_keeps_insertion_order() {
        let set: ImageSet = ["c", "a", "b"]
            .into_iter()
            .map(|id| TrackedImage::new(id, PixelBuffer::transparent(1, 1), 1, 1))
            .collect();
        let ids: Vec<&str> = set.iter().map(TrackedImage::id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(set.get("a").is_some());
        assert!(set.get("z").is_none());
    }
}
