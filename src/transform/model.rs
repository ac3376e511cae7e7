//! Overlay transform state and its clamping update rules.
//!
//! Every update is a pure function `OverlayTransform -> OverlayTransform`. Out-of-range inputs are
//! clamped (scale, opacity) or wrapped (rotation); non-finite inputs leave the field unchanged.

use crate::foundation::core::Vec2;
use crate::foundation::error::{SynthError, SynthResult};

/// Inclusive range allowed for each scale component.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleLimits {
    /// Smallest allowed scale, strictly positive.
    pub min: f64,
    /// Largest allowed scale.
    pub max: f64,
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self { min: 0.1, max: 3.0 }
    }
}

impl ScaleLimits {
    /// Create validated limits with `0 < min <= max`.
    pub fn new(min: f64, max: f64) -> SynthResult<Self> {
        let limits = Self { min, max };
        limits.validate()?;
        Ok(limits)
    }

    /// Check `0 < min <= max` with both finite.
    pub fn validate(&self) -> SynthResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(SynthError::invalid_input("scale limits must be finite"));
        }
        if self.min <= 0.0 || self.min > self.max {
            return Err(SynthError::invalid_input(
                "scale limits must satisfy 0 < min <= max",
            ));
        }
        Ok(())
    }

    /// Clamp one scale component into the range.
    pub fn clamp(self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

/// Placement of the overlay relative to the surface center.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayTransform {
    /// Offset of the overlay midpoint from the surface center, in surface pixels.
    pub position: Vec2,
    /// Per-axis scale factors.
    pub scale: Vec2,
    /// Rotation in degrees, within `[-180, 180]`.
    pub rotation: f64,
    /// Global alpha, within `[0, 1]`.
    pub opacity: f64,
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One requested change to an [`OverlayTransform`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformDelta {
    /// Move the overlay by an offset.
    Translate {
        /// Offset to add to the current position.
        by: Vec2,
    },
    /// Place the overlay at an absolute offset from the center.
    SetPosition {
        /// New position.
        to: Vec2,
    },
    /// Add `step` to both scale axes, using the x axis as the base (uniform wheel scaling).
    ScaleUniform {
        /// Signed step.
        step: f64,
    },
    /// Set both scale axes independently.
    SetScale {
        /// New scale.
        to: Vec2,
    },
    /// Rotate by a signed number of degrees.
    RotateBy {
        /// Degrees to add.
        degrees: f64,
    },
    /// Set the rotation in degrees.
    SetRotation {
        /// New rotation.
        degrees: f64,
    },
    /// Set the global alpha.
    SetOpacity {
        /// New opacity.
        opacity: f64,
    },
}

impl OverlayTransform {
    /// Identity placement: centered, unscaled, unrotated, opaque.
    pub const IDENTITY: OverlayTransform = OverlayTransform {
        position: Vec2::ZERO,
        scale: Vec2::new(1.0, 1.0),
        rotation: 0.0,
        opacity: 1.0,
    };

    /// Return the identity transform.
    pub fn reset() -> Self {
        Self::IDENTITY
    }

    /// Apply one delta and return the clamped result.
    pub fn apply(self, delta: TransformDelta, limits: ScaleLimits) -> Self {
        let mut out = self;
        match delta {
            TransformDelta::Translate { by } => {
                if by.is_finite() {
                    out.position += by;
                }
            }
            TransformDelta::SetPosition { to } => {
                if to.is_finite() {
                    out.position = to;
                }
            }
            TransformDelta::ScaleUniform { step } => {
                if step.is_finite() {
                    let s = limits.clamp(self.scale.x + step);
                    out.scale = Vec2::new(s, s);
                }
            }
            TransformDelta::SetScale { to } => {
                if to.x.is_finite() {
                    out.scale.x = limits.clamp(to.x);
                }
                if to.y.is_finite() {
                    out.scale.y = limits.clamp(to.y);
                }
            }
            TransformDelta::RotateBy { degrees } => {
                if degrees.is_finite() {
                    out.rotation = wrap_degrees(self.rotation + degrees);
                }
            }
            TransformDelta::SetRotation { degrees } => {
                if degrees.is_finite() {
                    out.rotation = wrap_degrees(degrees);
                }
            }
            TransformDelta::SetOpacity { opacity } => {
                if opacity.is_finite() {
                    out.opacity = opacity.clamp(0.0, 1.0);
                }
            }
        }
        out.sanitized(limits)
    }

    /// Force every field into its declared range.
    ///
    /// Used on transforms that did not come from [`OverlayTransform::apply`], such as JSON bodies.
    pub fn sanitized(self, limits: ScaleLimits) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            position: Vec2::new(finite_or(self.position.x, 0.0), finite_or(self.position.y, 0.0)),
            scale: Vec2::new(
                limits.clamp(finite_or(self.scale.x, 1.0)),
                limits.clamp(finite_or(self.scale.y, 1.0)),
            ),
            rotation: wrap_degrees(finite_or(self.rotation, 0.0)),
            opacity: finite_or(self.opacity, 1.0).clamp(0.0, 1.0),
        }
    }

    /// Return `true` when every field is inside its declared range.
    pub fn is_within(&self, limits: ScaleLimits) -> bool {
        let in_scale = |v: f64| v >= limits.min && v <= limits.max;
        self.position.is_finite()
            && in_scale(self.scale.x)
            && in_scale(self.scale.y)
            && (-180.0..=180.0).contains(&self.rotation)
            && (0.0..=1.0).contains(&self.opacity)
    }
}

/// Wrap an angle into `[-180, 180]`, leaving in-range values untouched.
pub fn wrap_degrees(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        return deg;
    }
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
#[path = "../../tests/unit/transform/model.rs"]
mod tests;
