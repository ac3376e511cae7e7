//! Live camera acquisition.
//!
//! Devices are abstracted behind [`CameraDevice`] and [`VideoStream`]. Frames arrive on the
//! device's own delivery path and land in a [`LatestFrame`] mailbox that keeps only the newest
//! frame, so a capture always reads what is on screen at that moment.
//!
//! An open stream is owned by a [`StreamGuard`], which stops the stream when dropped. Every path
//! that discards a guard (capture, mode switch, session teardown, a grant arriving after the user
//! moved on) therefore releases the device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::acquisition::file::FileSelection;
use crate::foundation::error::{DeviceFailure, SynthError, SynthResult};
use crate::render::frame::FrameRGBA;

/// Preferred camera direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Front camera, facing the user.
    #[default]
    User,
    /// Rear camera.
    Environment,
}

/// Stream request preferences; devices treat them as hints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StreamConstraints {
    /// Preferred frame width.
    pub ideal_width: u32,
    /// Preferred frame height.
    pub ideal_height: u32,
    /// Preferred direction.
    pub facing: Facing,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing: Facing::User,
        }
    }
}

/// One straight-alpha RGBA8 video frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight RGBA8 bytes, row-major.
    pub rgba8: Vec<u8>,
}

impl VideoFrame {
    /// Create a frame, checking the buffer length.
    pub fn new(width: u32, height: u32, rgba8: Vec<u8>) -> SynthResult<Self> {
        if width == 0 || height == 0 {
            return Err(SynthError::invalid_input("video frame is empty"));
        }
        if rgba8.len() != width as usize * height as usize * 4 {
            return Err(SynthError::invalid_input("video frame byte length mismatch"));
        }
        Ok(Self {
            width,
            height,
            rgba8,
        })
    }

    /// Encode the frame as a JPEG still shaped like a file selection.
    pub fn to_still(&self, quality: u8) -> SynthResult<FileSelection> {
        let frame = FrameRGBA {
            width: self.width,
            height: self.height,
            data: self.rgba8.clone(),
            premultiplied: false,
        };
        let jpeg = frame.encode_jpeg(quality)?;
        Ok(FileSelection::new("capture.jpg", "image/jpeg", jpeg))
    }
}

/// A camera that can be asked for a stream.
pub trait CameraDevice: Send + Sync {
    /// Request a stream. May block while the platform asks the user for permission.
    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, DeviceFailure>;
}

/// An open device stream.
pub trait VideoStream: Send {
    /// The frame currently being shown, if one has arrived.
    fn current_frame(&self) -> Option<VideoFrame>;
    /// Stop the stream and release the device. Must be idempotent.
    fn stop(&mut self);
}

/// Owner of an open stream; stops it on drop.
pub struct StreamGuard {
    stream: Option<Box<dyn VideoStream>>,
}

impl StreamGuard {
    /// Take ownership of an open stream.
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// The frame currently being shown.
    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.stream.as_ref().and_then(|s| s.current_frame())
    }

    /// Stop the stream now.
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::debug!("camera stream released");
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for StreamGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamGuard")
            .field("open", &self.stream.is_some())
            .finish()
    }
}

/// Single-slot mailbox holding the newest frame. Older frames are overwritten, never queued.
#[derive(Clone, Debug, Default)]
pub struct LatestFrame {
    slot: Arc<Mutex<Option<VideoFrame>>>,
}

impl LatestFrame {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame.
    pub fn publish(&self, frame: VideoFrame) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame);
    }

    /// Copy of the current frame.
    pub fn current(&self) -> Option<VideoFrame> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Camera fed by a host-side producer through a [`LatestFrame`] mailbox.
///
/// Hosts with their own capture loop publish frames into [`FeedCamera::feed`]. The camera can be
/// switched to deny requests, which models a refused permission prompt or a missing device.
#[derive(Debug, Default)]
pub struct FeedCamera {
    feed: LatestFrame,
    denial: Mutex<Option<DeviceFailure>>,
    open_streams: Arc<AtomicUsize>,
}

impl FeedCamera {
    /// Create a camera that grants every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera that refuses every request with `failure`.
    pub fn denying(failure: DeviceFailure) -> Self {
        let cam = Self::default();
        cam.deny(failure);
        cam
    }

    /// Producer side of the frame mailbox.
    pub fn feed(&self) -> LatestFrame {
        self.feed.clone()
    }

    /// Refuse subsequent requests.
    pub fn deny(&self, failure: DeviceFailure) {
        *self.denial.lock().unwrap_or_else(|e| e.into_inner()) = Some(failure);
    }

    /// Grant subsequent requests.
    pub fn allow(&self) {
        *self.denial.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Number of streams opened and not yet stopped.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

impl CameraDevice for FeedCamera {
    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, DeviceFailure> {
        if let Some(failure) = self.denial.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(failure);
        }
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            width = constraints.ideal_width,
            height = constraints.ideal_height,
            facing = ?constraints.facing,
            "camera stream opened"
        );
        Ok(Box::new(FeedStream {
            feed: self.feed.clone(),
            open_streams: Arc::clone(&self.open_streams),
            stopped: false,
        }))
    }
}

struct FeedStream {
    feed: LatestFrame,
    open_streams: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for FeedStream {
    fn current_frame(&self) -> Option<VideoFrame> {
        if self.stopped {
            return None;
        }
        self.feed.current()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FeedStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/acquisition/camera.rs"]
mod tests;
