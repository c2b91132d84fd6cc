//! Axis-aligned pixel rectangles.

use serde::{Deserialize, Serialize};

/// A rectangle in whole pixels, origin at the top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin.
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Overlap of two rectangles; empty when they do not touch.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x as u64 || bottom <= y as u64 {
            return Rect::new(x, y, 0, 0);
        }
        Rect::new(x, y, (right - x as u64) as u32, (bottom - y as u64) as u32)
    }

    /// Whether the integer point lies inside.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64
            && y >= self.y as i64
            && (x as u64) < self.right()
            && (y as u64) < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_overlapping() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(2, 1, 10, 2);
        assert_eq!(a.intersect(&b), Rect::new(2, 1, 2, 2));
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = Rect::sized(2, 2);
        let b = Rect::new(5, 5, 1, 1);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn test_contains_edges() {
        let r = Rect::new(1, 1, 2, 2);
        assert!(r.contains(1, 1));
        assert!(r.contains(2, 2));
        assert!(!r.contains(3, 2));
        assert!(!r.contains(0, 1));
        assert!(!r.contains(-1, -1));
    }
}
