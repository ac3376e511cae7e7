/// Convenience result type used across hairsynth.
pub type SynthResult<T> = Result<T, SynthError>;

/// Why a camera device could not be opened.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DeviceFailure {
    /// The user or platform refused camera access.
    PermissionDenied,
    /// No capture device is attached.
    NotFound,
    /// Any other device error, with the platform's description.
    Other(String),
}

impl std::fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => f.write_str("camera permission denied"),
            Self::NotFound => f.write_str("no camera device found"),
            Self::Other(msg) => write!(f, "camera unavailable: {msg}"),
        }
    }
}

/// Top-level error taxonomy used by editor and service APIs.
#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    /// Wrong file type, missing field or otherwise malformed input. Recovered locally.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Camera could not be opened. Reported to the user, never retried automatically.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(DeviceFailure),

    /// Unknown record id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Requester does not own the record.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A referenced entity (hair style) does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// No authenticated identity was supplied.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Storage hiccup; the caller may retry once.
    #[error("transient storage failure: {0}")]
    TransientStorage(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SynthError {
    /// Build a [`SynthError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`SynthError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`SynthError::Forbidden`] value.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Build a [`SynthError::InvalidReference`] value.
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    /// Build a [`SynthError::Unauthorized`] value.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Build a [`SynthError::TransientStorage`] value.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientStorage(msg.into())
    }

    /// Build a [`SynthError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` when a single retry is allowed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStorage(_))
    }
}

impl From<DeviceFailure> for SynthError {
    fn from(value: DeviceFailure) -> Self {
        Self::DeviceUnavailable(value)
    }
}

impl From<serde_json::Error> for SynthError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value.to_string())
    }
}

/// Run `op`, retrying exactly once when it fails with a transient error.
pub fn retry_once<T>(mut op: impl FnMut() -> SynthResult<T>) -> SynthResult<T> {
    match op() {
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "transient failure, retrying once");
            op()
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
