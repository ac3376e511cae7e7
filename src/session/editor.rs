//! The editing session.
//!
//! An [`EditorSession`] owns everything one editor needs: the overlay transform, both layer slots,
//! the acquisition state, the interaction controller, the compositor and the background jobs.
//! Nothing is global. The host drives it from a single thread:
//!
//! 1. forward user actions (`handle_input`, `apply`, `accept_files`, `start_camera`, ...);
//! 2. call [`EditorSession::pump`] from its event loop to apply finished background work and
//!    produce at most one new frame.
//!
//! Input handlers only mark a render as requested. Rendering happens in `pump`, using the
//! transform current at that moment, so a decode that finishes after several edits is drawn with
//! the latest placement.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::acquisition::camera::CameraDevice;
use crate::acquisition::file::{AcceptedFile, FileSelection, accept_selection};
use crate::acquisition::{Acquisition, AcquisitionMode, CameraState, FileState};
use crate::assets::resource::{ImageResource, Layer, ResourceSlot};
use crate::catalog::HairStyleId;
use crate::foundation::config::EditorConfig;
use crate::foundation::error::{DeviceFailure, SynthError, SynthResult};
use crate::interaction::controller::{InputEvent, InteractionController, Response};
use crate::interaction::region::{CaptureGuard, CaptureRegion, CaptureRegistry};
use crate::persistence::model::Visibility;
use crate::persistence::service::{NewSynthesis, Upload};
use crate::render::compositor::Compositor;
use crate::render::frame::FrameRGBA;
use crate::session::jobs::{CancelToken, JobEvent, Jobs};
use crate::transform::model::{OverlayTransform, TransformDelta};

const PUMP_WAIT: Duration = Duration::from_millis(5);

/// User-facing message raised by the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// A selection or command was refused; nothing changed.
    Rejected {
        /// Reason shown to the user.
        reason: String,
    },
    /// An accepted image could not be decoded.
    DecodeFailed {
        /// Affected layer.
        layer: Layer,
        /// Reason shown to the user.
        reason: String,
    },
    /// The camera could not be opened.
    DeviceUnavailable(DeviceFailure),
}

/// Observable camera progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraStatus {
    /// File mode is active.
    Inactive,
    /// Camera mode, no device held.
    Stopped,
    /// Waiting for a device grant.
    Requesting,
    /// Frames are flowing.
    Streaming,
}

/// Create payload built from the current editor state.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisDraft {
    /// Flattened composite as JPEG.
    pub composite_jpeg: Vec<u8>,
    /// Transform snapshot.
    pub transform: OverlayTransform,
    /// Overlay style.
    pub hair_style_id: HairStyleId,
    /// The base photo exactly as it was accepted.
    pub base_image: Option<Upload>,
}

impl SynthesisDraft {
    /// Turn the draft into a service request.
    pub fn into_request(self, visibility: Visibility) -> NewSynthesis {
        NewSynthesis {
            composite: Upload::new("image/jpeg", self.composite_jpeg),
            base_image: self.base_image,
            hair_style_id: self.hair_style_id,
            transform: Some(self.transform),
            visibility,
        }
    }
}

/// One editing session.
pub struct EditorSession {
    config: EditorConfig,
    transform: OverlayTransform,
    controller: InteractionController,
    base: ResourceSlot,
    base_source: Option<Upload>,
    pending_source: Option<(u64, Upload)>,
    overlay: ResourceSlot,
    hair_style: Option<HairStyleId>,
    acquisition: Acquisition,
    camera: Option<Arc<dyn CameraDevice>>,
    next_ticket: u64,
    compositor: Compositor,
    jobs: Jobs,
    render_requested: bool,
    frame: Option<FrameRGBA>,
    renders: u64,
    notices: Vec<Notice>,
    capture: Option<CaptureGuard>,
}

impl EditorSession {
    /// Create a session in file mode with an identity transform.
    pub fn new(config: EditorConfig) -> SynthResult<Self> {
        config.validate()?;
        let compositor = Compositor::new(config.canvas, config.clear_rgba)?;
        let jobs = Jobs::new(config.worker_threads)?;
        let controller = InteractionController::new(
            CaptureRegion::for_canvas(config.canvas),
            config.wheel_step,
            config.scale_limits,
        );
        tracing::debug!(
            width = config.canvas.width,
            height = config.canvas.height,
            "editor session started"
        );
        Ok(Self {
            config,
            transform: OverlayTransform::IDENTITY,
            controller,
            base: ResourceSlot::default(),
            base_source: None,
            pending_source: None,
            overlay: ResourceSlot::default(),
            hair_style: None,
            acquisition: Acquisition::default(),
            camera: None,
            next_ticket: 0,
            compositor,
            jobs,
            render_requested: false,
            frame: None,
            renders: 0,
            notices: Vec::new(),
            capture: None,
        })
    }

    /// Attach a camera device for camera mode.
    pub fn with_camera(mut self, device: Arc<dyn CameraDevice>) -> Self {
        self.camera = Some(device);
        self
    }

    /// Place the editor in the host layout and claim wheel input over its bounds.
    ///
    /// The claim lasts until the next call or until the session ends.
    pub fn attach_capture(&mut self, registry: &CaptureRegistry, region: CaptureRegion) {
        self.capture = None;
        self.controller.set_region(region);
        self.capture = Some(registry.register(region.bounds));
    }

    /// Active configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current overlay transform.
    pub fn transform(&self) -> OverlayTransform {
        self.transform
    }

    /// Interaction controller (drag state, capture region).
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Active acquisition mode.
    pub fn mode(&self) -> AcquisitionMode {
        self.acquisition.mode()
    }

    /// Camera progress.
    pub fn camera_status(&self) -> CameraStatus {
        match &self.acquisition {
            Acquisition::File(_) => CameraStatus::Inactive,
            Acquisition::Camera(CameraState::Stopped) => CameraStatus::Stopped,
            Acquisition::Camera(CameraState::Requesting { .. }) => CameraStatus::Requesting,
            Acquisition::Camera(CameraState::Streaming { .. }) => CameraStatus::Streaming,
        }
    }

    /// Return `true` once a base image is decoded; drawing starts only from here.
    pub fn is_image_ready(&self) -> bool {
        self.base.ready().is_some()
    }

    /// Return `true` once the overlay is decoded.
    pub fn is_overlay_ready(&self) -> bool {
        self.overlay.ready().is_some()
    }

    /// Overlay style selected for this session.
    pub fn hair_style(&self) -> Option<&HairStyleId> {
        self.hair_style.as_ref()
    }

    /// Token shared with background jobs.
    pub fn cancel_token(&self) -> CancelToken {
        self.jobs.cancel_token()
    }

    /// Switch acquisition mode. Leaving camera mode releases the device.
    pub fn select_mode(&mut self, mode: AcquisitionMode) {
        if self.acquisition.mode() == mode {
            return;
        }
        if matches!(self.acquisition, Acquisition::File(FileState::Decoding { .. })) {
            self.base.cancel_pending();
            self.pending_source = None;
        }
        self.acquisition = Acquisition::for_mode(mode);
        tracing::debug!(?mode, "acquisition mode selected");
    }

    /// Offer files from the picker or a drop. Exactly one image is accepted.
    ///
    /// A rejection leaves the session untouched and is also posted as a [`Notice`].
    pub fn accept_files(&mut self, files: Vec<FileSelection>) -> SynthResult<()> {
        if self.acquisition.mode() != AcquisitionMode::File {
            return Err(self.reject(SynthError::invalid_input(
                "switch to file mode before selecting a file",
            )));
        }
        let accepted = accept_selection(files, self.config.max_upload_bytes)
            .map_err(|e| self.reject(e))?;
        self.begin_base_decode(accepted);
        Ok(())
    }

    /// Start decoding the overlay for `style`.
    pub fn load_overlay(&mut self, style: HairStyleId, encoded: Vec<u8>) -> SynthResult<()> {
        if encoded.is_empty() {
            return Err(SynthError::invalid_input("overlay image is empty"));
        }
        let generation = self.overlay.begin_load();
        self.hair_style = Some(style);
        self.jobs.spawn_decode(Layer::Overlay, generation, encoded);
        Ok(())
    }

    /// Ask the camera for a stream. The outcome arrives through [`EditorSession::pump`].
    pub fn start_camera(&mut self) -> SynthResult<()> {
        let Acquisition::Camera(state) = &self.acquisition else {
            return Err(self.reject(SynthError::invalid_input(
                "switch to camera mode before starting the camera",
            )));
        };
        if !matches!(state, CameraState::Stopped) {
            return Ok(());
        }
        let Some(device) = self.camera.clone() else {
            let failure = DeviceFailure::NotFound;
            self.notices.push(Notice::DeviceUnavailable(failure.clone()));
            return Err(SynthError::DeviceUnavailable(failure));
        };
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.acquisition = Acquisition::Camera(CameraState::Requesting { ticket });
        self.jobs
            .spawn_camera_request(ticket, device, self.config.camera);
        tracing::debug!(ticket, "camera requested");
        Ok(())
    }

    /// Take the current frame as the base image and stop the stream.
    pub fn capture(&mut self) -> SynthResult<()> {
        let Acquisition::Camera(CameraState::Streaming { stream }) = &self.acquisition else {
            return Err(self.reject(SynthError::invalid_input("camera is not streaming")));
        };
        let Some(frame) = stream.current_frame() else {
            return Err(self.reject(SynthError::invalid_input("no camera frame available yet")));
        };
        self.acquisition = Acquisition::Camera(CameraState::Stopped);
        let still = frame.to_still(self.config.jpeg_quality)?;
        let accepted = accept_selection(vec![still], u64::MAX)?;
        tracing::debug!(width = frame.width, height = frame.height, "camera still captured");
        self.begin_base_decode(accepted);
        Ok(())
    }

    /// Stop the camera, or abandon a pending request.
    pub fn stop_camera(&mut self) {
        if let Acquisition::Camera(state) = &mut self.acquisition
            && !matches!(state, CameraState::Stopped)
        {
            *state = CameraState::Stopped;
            tracing::debug!("camera stopped");
        }
    }

    /// Route one input event through the interaction controller.
    pub fn handle_input(&mut self, event: InputEvent) -> Response {
        let base_ready = self.is_image_ready();
        let response = self
            .controller
            .handle(event, &mut self.transform, base_ready);
        if response.changed {
            self.request_render();
        }
        response
    }

    /// Apply an explicit adjustment (slider). Returns `true` when the transform changed.
    pub fn apply(&mut self, delta: TransformDelta) -> bool {
        let next = self.transform.apply(delta, self.config.scale_limits);
        if next == self.transform {
            return false;
        }
        self.transform = next;
        self.request_render();
        true
    }

    /// Restore the identity transform. The drag state is kept.
    pub fn reset(&mut self) {
        if self.controller.reset(&mut self.transform) {
            self.request_render();
        }
    }

    /// Apply finished background work, then render once if needed. Returns the number of
    /// completion events applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.jobs.try_recv() {
            self.apply_event(event);
            applied += 1;
        }
        self.render_if_requested();
        applied
    }

    /// Pump until no background job is outstanding, or `timeout` elapses. Returns `true` when the
    /// session went idle.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.jobs.in_flight() == 0 {
                // Jobs post before they retire, so one more pump sees everything.
                self.pump();
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if let Some(event) = self.jobs.recv_timeout(PUMP_WAIT.min(deadline - now)) {
                self.apply_event(event);
            }
        }
    }

    /// Most recent frame.
    pub fn frame(&self) -> Option<&FrameRGBA> {
        self.frame.as_ref()
    }

    /// Number of frames rendered so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Return `true` while a render is waiting for the next pump.
    pub fn render_pending(&self) -> bool {
        self.render_requested
    }

    /// Drain user-facing notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Flatten the current composite to PNG (download).
    pub fn export_png(&mut self) -> SynthResult<Vec<u8>> {
        self.fresh_frame()?.encode_png()
    }

    /// Build the save payload: composite JPEG, base photo, transform snapshot and style id.
    pub fn draft(&mut self) -> SynthResult<SynthesisDraft> {
        let Some(hair_style_id) = self.hair_style.clone() else {
            return Err(SynthError::invalid_input("no hair style selected"));
        };
        let quality = self.config.jpeg_quality;
        let composite_jpeg = self.fresh_frame()?.encode_jpeg(quality)?;
        Ok(SynthesisDraft {
            composite_jpeg,
            transform: self.transform,
            hair_style_id,
            base_image: self.base_source.clone(),
        })
    }

    /// End the session: cancel jobs, release the camera and the capture region.
    pub fn close(self) {}

    fn fresh_frame(&mut self) -> SynthResult<&FrameRGBA> {
        if !self.is_image_ready() {
            return Err(SynthError::invalid_input("no base image loaded"));
        }
        if self.render_requested || self.frame.is_none() {
            self.render_requested = true;
            self.render_if_requested();
        }
        self.frame
            .as_ref()
            .ok_or_else(|| SynthError::invalid_input("no frame rendered"))
    }

    fn begin_base_decode(&mut self, accepted: AcceptedFile) {
        let generation = self.base.begin_load();
        if let Acquisition::File(state) = &mut self.acquisition {
            *state = FileState::Decoding { generation };
        }
        tracing::debug!(
            name = %accepted.name,
            mime = accepted.mime.as_str(),
            bytes = accepted.bytes.len(),
            generation,
            "base image accepted"
        );
        self.pending_source = Some((
            generation,
            Upload::new(accepted.mime.as_str(), accepted.bytes.clone()),
        ));
        self.jobs
            .spawn_decode(Layer::Base, generation, accepted.bytes);
    }

    fn reject(&mut self, err: SynthError) -> SynthError {
        tracing::warn!(error = %err, "request rejected");
        self.notices.push(Notice::Rejected {
            reason: err.to_string(),
        });
        err
    }

    fn request_render(&mut self) {
        self.render_requested = true;
    }

    fn render_if_requested(&mut self) {
        if !self.render_requested || !self.is_image_ready() {
            return;
        }
        self.render_requested = false;
        let frame = self.compositor.render(
            self.base.ready(),
            self.overlay.ready(),
            &self.transform,
        );
        self.frame = Some(frame);
        self.renders += 1;
    }

    fn apply_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Decoded {
                layer,
                generation,
                result,
            } => self.apply_decoded(layer, generation, result),
            JobEvent::CameraGranted { ticket, stream } => {
                if let Acquisition::Camera(state) = &mut self.acquisition
                    && matches!(state, CameraState::Requesting { ticket: t } if *t == ticket)
                {
                    *state = CameraState::Streaming { stream };
                    tracing::debug!(ticket, "camera streaming");
                } else {
                    tracing::warn!(ticket, "camera granted after the request was abandoned");
                    stream.release();
                }
            }
            JobEvent::CameraDenied { ticket, failure } => {
                if let Acquisition::Camera(state) = &mut self.acquisition
                    && matches!(state, CameraState::Requesting { ticket: t } if *t == ticket)
                {
                    *state = CameraState::Stopped;
                    tracing::warn!(ticket, %failure, "camera unavailable");
                    self.notices.push(Notice::DeviceUnavailable(failure));
                }
            }
        }
    }

    fn apply_decoded(
        &mut self,
        layer: Layer,
        generation: u64,
        result: SynthResult<ImageResource>,
    ) {
        let slot = match layer {
            Layer::Base => &mut self.base,
            Layer::Overlay => &mut self.overlay,
        };
        let decoded = result.is_ok();
        let current = match result {
            Ok(resource) => {
                let (w, h) = (resource.width, resource.height);
                let accepted = slot.complete(generation, resource);
                if accepted {
                    tracing::debug!(?layer, generation, width = w, height = h, "layer ready");
                    self.request_render();
                }
                accepted
            }
            Err(err) => {
                let accepted = slot.fail(generation);
                if accepted {
                    tracing::warn!(?layer, generation, error = %err, "decode failed");
                    self.notices.push(Notice::DecodeFailed {
                        layer,
                        reason: err.to_string(),
                    });
                }
                accepted
            }
        };
        if !current {
            tracing::debug!(?layer, generation, "stale decode dropped");
            return;
        }
        if layer == Layer::Base
            && let Some((g, upload)) = self.pending_source.take()
            && g == generation
            && decoded
        {
            self.base_source = Some(upload);
        }
        if layer == Layer::Base
            && let Acquisition::File(state) = &mut self.acquisition
            && *state == (FileState::Decoding { generation })
        {
            *state = FileState::Idle;
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.jobs.cancel();
        self.acquisition = Acquisition::default();
        self.capture = None;
        tracing::debug!("editor session ended");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
