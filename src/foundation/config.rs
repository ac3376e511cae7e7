use std::path::Path;

use anyhow::Context as _;

use crate::acquisition::camera::StreamConstraints;
use crate::foundation::core::Canvas;
use crate::foundation::error::{SynthError, SynthResult};
use crate::transform::model::ScaleLimits;

/// Upload ceiling shared by the editor and the service (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Settings for one editing session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Logical render surface.
    pub canvas: Canvas,
    /// Allowed overlay scale range.
    pub scale_limits: ScaleLimits,
    /// Scale change per wheel notch.
    pub wheel_step: f64,
    /// Straight RGBA8 color painted under every frame. `None` leaves the surface transparent.
    pub clear_rgba: Option<[u8; 4]>,
    /// JPEG quality used for the save payload.
    pub jpeg_quality: u8,
    /// Largest accepted file in bytes.
    pub max_upload_bytes: u64,
    /// Worker threads for background image decode and device requests.
    pub worker_threads: usize,
    /// Camera request preferences.
    pub camera: StreamConstraints,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::DEFAULT,
            scale_limits: ScaleLimits::default(),
            wheel_step: 0.05,
            clear_rgba: Some([255, 255, 255, 255]),
            jpeg_quality: 80,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            worker_threads: 2,
            camera: StreamConstraints::default(),
        }
    }
}

impl EditorConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> SynthResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open editor config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(std::io::BufReader::new(f))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> SynthResult<()> {
        Canvas::new(self.canvas.width, self.canvas.height)?;
        self.scale_limits.validate()?;
        if !(self.wheel_step.is_finite() && self.wheel_step > 0.0) {
            return Err(SynthError::invalid_input("wheel_step must be finite and > 0"));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(SynthError::invalid_input("jpeg_quality must be in 1..=100"));
        }
        if self.max_upload_bytes == 0 {
            return Err(SynthError::invalid_input("max_upload_bytes must be > 0"));
        }
        if self.worker_threads == 0 {
            return Err(SynthError::invalid_input("worker_threads must be >= 1"));
        }
        Ok(())
    }
}

/// Settings for the synthesis persistence service.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
