//! Placement math for the two layers.

use crate::foundation::core::{Affine, Canvas, Rect, Vec2};
use crate::transform::model::OverlayTransform;

/// Uniform scale that fits `w`×`h` inside the canvas without distortion.
pub fn fit_scale(canvas: Canvas, w: f64, h: f64) -> f64 {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    (cw / w).min(ch / h)
}

/// Canvas rectangle covered by a fitted and centered base image.
pub fn fitted_rect(canvas: Canvas, w: f64, h: f64) -> Rect {
    let s = fit_scale(canvas, w, h);
    let (dw, dh) = (w * s, h * s);
    let x = (f64::from(canvas.width) - dw) / 2.0;
    let y = (f64::from(canvas.height) - dh) / 2.0;
    Rect::new(x, y, x + dw, y + dh)
}

/// Map base-image pixel space onto the canvas: uniform fit, centered, letterboxed.
pub fn base_affine(canvas: Canvas, w: f64, h: f64) -> Affine {
    let s = fit_scale(canvas, w, h);
    let r = fitted_rect(canvas, w, h);
    Affine::translate(Vec2::new(r.x0, r.y0)) * Affine::scale(s)
}

/// Map overlay pixel space onto the canvas.
///
/// Order: translate to center + position, rotate, scale, then shift so the overlay's own midpoint
/// sits at the origin.
pub fn overlay_affine(canvas: Canvas, t: &OverlayTransform, w: f64, h: f64) -> Affine {
    let anchor = canvas.center().to_vec2() + t.position;
    Affine::translate(anchor)
        * Affine::rotate(t.rotation.to_radians())
        * Affine::scale_non_uniform(t.scale.x, t.scale.y)
        * Affine::translate(Vec2::new(-w / 2.0, -h / 2.0))
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
