use crate::foundation::error::{SynthError, SynthResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Logical render surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// The editor's reference surface size.
    pub const DEFAULT: Canvas = Canvas {
        width: 800,
        height: 600,
    };

    /// Create a validated canvas.
    ///
    /// The CPU compositor addresses pixels with `u16`, so both sides must fit.
    pub fn new(width: u32, height: u32) -> SynthResult<Self> {
        if width == 0 || height == 0 {
            return Err(SynthError::invalid_input("canvas dimensions must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(SynthError::invalid_input("canvas dimensions exceed u16"));
        }
        Ok(Self { width, height })
    }

    /// Surface center in canvas coordinates.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Full-surface rectangle anchored at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
