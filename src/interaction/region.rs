//! Input capture regions.
//!
//! A [`CaptureRegion`] describes where the editor lives in host coordinates: the outer `bounds`
//! that own wheel input and the `surface` rectangle where the rendered canvas is shown. The host
//! keeps a [`CaptureRegistry`] and asks it whether an event must be kept from scrolling ancestors;
//! sessions hold a [`CaptureGuard`] that unregisters on drop.

use std::sync::{Arc, Mutex, Weak};

use crate::foundation::core::{Canvas, Point, Rect};
use crate::foundation::error::{SynthError, SynthResult};

/// Geometry of the editor in host coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureRegion {
    /// Area that owns wheel input (the editor container).
    pub bounds: Rect,
    /// Area where the surface is displayed; must lie inside `bounds`.
    pub surface: Rect,
    /// Logical size of the displayed surface.
    pub canvas: Canvas,
}

impl CaptureRegion {
    /// Surface displayed 1:1 at the origin, with no margin around it.
    pub fn for_canvas(canvas: Canvas) -> Self {
        Self {
            bounds: canvas.rect(),
            surface: canvas.rect(),
            canvas,
        }
    }

    /// Create a validated region.
    pub fn new(bounds: Rect, surface: Rect, canvas: Canvas) -> SynthResult<Self> {
        if surface.width() <= 0.0 || surface.height() <= 0.0 {
            return Err(SynthError::invalid_input("surface rectangle is empty"));
        }
        if surface.x0 < bounds.x0
            || surface.y0 < bounds.y0
            || surface.x1 > bounds.x1
            || surface.y1 > bounds.y1
        {
            return Err(SynthError::invalid_input(
                "surface rectangle must lie inside the capture bounds",
            ));
        }
        Ok(Self {
            bounds,
            surface,
            canvas,
        })
    }

    /// Return `true` when `p` is inside the capture bounds.
    pub fn claims(&self, p: Point) -> bool {
        self.bounds.contains(p)
    }

    /// Convert a host point to logical surface coordinates, or `None` outside the surface.
    pub fn to_surface(&self, p: Point) -> Option<Point> {
        if !self.surface.contains(p) {
            return None;
        }
        let sx = f64::from(self.canvas.width) / self.surface.width();
        let sy = f64::from(self.canvas.height) / self.surface.height();
        Some(Point::new(
            (p.x - self.surface.x0) * sx,
            (p.y - self.surface.y0) * sy,
        ))
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    regions: Vec<(u64, Rect)>,
}

/// Host-side table of areas whose wheel events must not reach scrollable ancestors.
#[derive(Clone, Debug, Default)]
pub struct CaptureRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl CaptureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bounds`; the returned guard unregisters it when dropped.
    pub fn register(&self, bounds: Rect) -> CaptureGuard {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_id += 1;
        let id = inner.next_id;
        inner.regions.push((id, bounds));
        tracing::debug!(id, "capture region registered");
        CaptureGuard {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Return `true` when a registered region contains `p`.
    pub fn captures(&self, p: Point) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.regions.iter().any(|(_, r)| r.contains(p))
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.regions.len()
    }

    /// Return `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live registration in a [`CaptureRegistry`].
#[derive(Debug)]
pub struct CaptureGuard {
    id: u64,
    registry: Weak<Mutex<RegistryInner>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.regions.retain(|(id, _)| *id != self.id);
            tracing::debug!(id = self.id, "capture region unregistered");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interaction/region.rs"]
mod tests;
