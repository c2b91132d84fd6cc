//! Affine placements mapping source pixel space into destination space.
//!
//! Coordinates are continuous with pixel `(x, y)` covering
//! `[x, x + 1) × [y, y + 1)` and y growing downward, so a positive angle
//! turns the image clockwise on screen.

use glam::{Affine2, Mat2, Vec2};

use crate::geometry::rect::Rect;

/// Map the `src` rectangle onto the `dst` rectangle.
///
/// An empty `src` yields a degenerate (non-invertible) transform.
pub fn stretch(src: Rect, dst: Rect) -> Affine2 {
    let scale = if src.is_empty() {
        Vec2::ZERO
    } else {
        Vec2::new(
            dst.width as f32 / src.width as f32,
            dst.height as f32 / src.height as f32,
        )
    };
    Affine2::from_translation(Vec2::new(dst.x as f32, dst.y as f32))
        * Affine2::from_scale(scale)
        * Affine2::from_translation(-Vec2::new(src.x as f32, src.y as f32))
}

/// Rotate a `width × height` image by `degrees` about its own center.
pub fn rotation_about_center(width: u32, height: u32, degrees: f64) -> Affine2 {
    let center = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
    let (sin, cos) = exact_sin_cos(degrees);
    let rotation = Mat2::from_cols(Vec2::new(cos, sin), Vec2::new(-sin, cos));
    Affine2::from_translation(center)
        * Affine2::from_mat2(rotation)
        * Affine2::from_translation(-center)
}

/// Flip a `width`-wide image about its vertical center line.
pub fn mirror_horizontal(width: u32) -> Affine2 {
    Affine2::from_translation(Vec2::new(width as f32, 0.0))
        * Affine2::from_scale(Vec2::new(-1.0, 1.0))
}

/// Reduce an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let turned = degrees % 360.0;
    if turned < 0.0 { turned + 360.0 } else { turned }
}

/// Sine and cosine, exact for quarter turns.
fn exact_sin_cos(degrees: f64) -> (f32, f32) {
    let degrees = normalize_degrees(degrees);
    if degrees == 0.0 {
        (0.0, 1.0)
    } else if degrees == 90.0 {
        (1.0, 0.0)
    } else if degrees == 180.0 {
        (0.0, -1.0)
    } else if degrees == 270.0 {
        (-1.0, 0.0)
    } else {
        let (sin, cos) = degrees.to_radians().sin_cos();
        (sin as f32, cos as f32)
    }
}
