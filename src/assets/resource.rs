use std::sync::Arc;

use crate::foundation::error::{SynthError, SynthResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded pixels plus intrinsic size.
///
/// Pixels are premultiplied RGBA8, tightly packed, row-major. Cloning shares the pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageResource {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl ImageResource {
    /// Build a resource from straight-alpha RGBA8 pixels.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> SynthResult<Self> {
        if width == 0 || height == 0 {
            return Err(SynthError::invalid_input("image dimensions must be > 0"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| SynthError::invalid_input("image size overflow"))?;
        if rgba.len() != expected {
            return Err(SynthError::invalid_input(format!(
                "expected {expected} rgba bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Intrinsic size as floats.
    pub fn size_f64(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }
}

/// Which of the two session images a resource belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// The user's photo.
    Base,
    /// The hair-style image.
    Overlay,
}

/// Readiness tracking for one layer.
///
/// Each load request gets a fresh generation. Only the completion of the newest generation is
/// accepted, so a slow decode can never replace a newer image. A failed or pending load keeps the
/// previously ready resource in place.
#[derive(Debug, Default)]
pub struct ResourceSlot {
    ready: Option<ImageResource>,
    pending: Option<u64>,
    next_generation: u64,
}

impl ResourceSlot {
    /// Reserve a generation for a new load and mark it pending.
    pub fn begin_load(&mut self) -> u64 {
        self.next_generation += 1;
        self.pending = Some(self.next_generation);
        self.next_generation
    }

    /// Accept a completed load. Returns `false` and drops `resource` when the generation is
    /// stale.
    pub fn complete(&mut self, generation: u64, resource: ImageResource) -> bool {
        if self.pending != Some(generation) {
            return false;
        }
        self.pending = None;
        self.ready = Some(resource);
        true
    }

    /// Record a failed load. Returns `false` when the generation is stale.
    pub fn fail(&mut self, generation: u64) -> bool {
        if self.pending != Some(generation) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Install a resource directly, superseding any pending load.
    pub fn install(&mut self, resource: ImageResource) {
        self.next_generation += 1;
        self.pending = None;
        self.ready = Some(resource);
    }

    /// Forget any pending load without touching the ready resource.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// The currently ready resource, if any.
    pub fn ready(&self) -> Option<&ImageResource> {
        self.ready.as_ref()
    }

    /// Return `true` while a load is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resource.rs"]
mod tests;
