//! Base image acquisition.
//!
//! Two mutually exclusive sources produce the base image: a file picked by the user and a still
//! captured from a live camera. Both end up as encoded bytes going through the same decode path,
//! so the compositor never sees which one produced the image.

/// Live camera device abstraction.
pub mod camera;
/// File intake checks.
pub mod file;

use camera::StreamGuard;

/// User-selected base image source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// File picker or drag and drop.
    File,
    /// Live camera capture.
    Camera,
}

/// Progress of a file acquisition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileState {
    /// Waiting for a selection.
    #[default]
    Idle,
    /// A decode job is running for the given base-slot generation.
    Decoding {
        /// Generation reserved in the base slot.
        generation: u64,
    },
}

/// Progress of a camera acquisition.
#[derive(Debug, Default)]
pub enum CameraState {
    /// No device held.
    #[default]
    Stopped,
    /// Waiting for the device grant identified by `ticket`.
    Requesting {
        /// Request identifier; grants carrying another ticket are stale.
        ticket: u64,
    },
    /// Device granted; frames are flowing.
    Streaming {
        /// Open stream, released when this state is left.
        stream: StreamGuard,
    },
}

/// Acquisition state of one editing session.
#[derive(Debug)]
pub enum Acquisition {
    /// File mode.
    File(FileState),
    /// Camera mode.
    Camera(CameraState),
}

impl Default for Acquisition {
    fn default() -> Self {
        Self::File(FileState::Idle)
    }
}

impl Acquisition {
    /// Fresh state for `mode`.
    pub fn for_mode(mode: AcquisitionMode) -> Self {
        match mode {
            AcquisitionMode::File => Self::File(FileState::Idle),
            AcquisitionMode::Camera => Self::Camera(CameraState::Stopped),
        }
    }

    /// Active mode.
    pub fn mode(&self) -> AcquisitionMode {
        match self {
            Self::File(_) => AcquisitionMode::File,
            Self::Camera(_) => AcquisitionMode::Camera,
        }
    }
}
