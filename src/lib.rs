//! Hairsynth overlays a hair-style image on a personal photo and persists the result.
//!
//! Two halves share this crate:
//!
//! - the editor: an [`EditorSession`] acquires a base photo (file or camera), decodes the
//!   overlay, turns pointer and wheel input into an [`OverlayTransform`] and renders the composite
//!   on the CPU;
//! - the service: a [`SynthesisService`] stores finished composites with their transform and an
//!   idempotent like set, reachable through a REST-shaped [`Router`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Base image acquisition (file and camera).
pub mod acquisition;
/// REST-shaped routing.
pub mod api;
/// Decoding and layer resources.
pub mod assets;
/// Read-only hair style catalog.
pub mod catalog;
/// Core types, errors and configuration.
pub mod foundation;
/// Pointer and wheel handling.
pub mod interaction;
/// Synthesis storage and service.
pub mod persistence;
/// CPU compositing.
pub mod render;
/// Editing sessions.
pub mod session;
/// Overlay transform model.
pub mod transform;

pub use crate::foundation::config::{EditorConfig, ServiceConfig};
pub use crate::foundation::core::{Affine, Canvas, Point, Rect, Vec2};
pub use crate::foundation::error::{DeviceFailure, SynthError, SynthResult};

pub use crate::acquisition::AcquisitionMode;
pub use crate::acquisition::camera::{CameraDevice, FeedCamera, VideoFrame, VideoStream};
pub use crate::acquisition::file::FileSelection;
pub use crate::api::routes::{ApiRequest, ApiResponse, Method, Router, StaticTokens};
pub use crate::catalog::{HairStyle, HairStyleCatalog, HairStyleId, MemoryCatalog};
pub use crate::interaction::controller::{EventDisposition, InputEvent, InteractionController};
pub use crate::interaction::region::{CaptureRegion, CaptureRegistry};
pub use crate::persistence::model::{LikeState, Synthesis, SynthesisId, UserId, Visibility};
pub use crate::persistence::service::{NewSynthesis, SynthesisService, Upload};
pub use crate::render::compositor::Compositor;
pub use crate::render::frame::FrameRGBA;
pub use crate::session::editor::{CameraStatus, EditorSession, Notice, SynthesisDraft};
pub use crate::transform::model::{OverlayTransform, ScaleLimits, TransformDelta};
